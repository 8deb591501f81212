//! Annotation records

use crate::value::{Array, ArrayKey, Value};
use std::fmt;

/// A resolved annotation: fully qualified type name plus arguments.
///
/// Positional arguments use int keys, named arguments string keys. Two
/// annotations are equal when both the name and the arguments are.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_name: String,
    pub arguments: Array,
}

impl Annotation {
    pub fn new(type_name: impl Into<String>, arguments: Array) -> Self {
        Self {
            type_name: type_name.into(),
            arguments,
        }
    }

    /// Annotation without arguments.
    pub fn marker(type_name: impl Into<String>) -> Self {
        Self::new(type_name, Array::new())
    }

    /// Unqualified name, `Table` for `orm\Table`.
    pub fn name(&self) -> &str {
        crate::scope::short_name(&self.type_name)
    }

    /// Positional argument by index, or named argument by name.
    pub fn argument(&self, key: impl Into<ArrayKey>) -> Option<&Value> {
        self.arguments.get(&key.into())
    }

    /// The first positional argument.
    pub fn value(&self) -> Option<&Value> {
        self.arguments.get_index(0)
    }

    pub fn is_marker(&self) -> bool {
        self.arguments.is_empty()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[{}", self.type_name)?;
        if self.arguments.is_empty() {
            return write!(f, "]");
        }
        write!(f, "(")?;
        for (i, (key, value)) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match key {
                ArrayKey::Int(_) => write!(f, "{}", value)?,
                ArrayKey::Str(name) => write!(f, "{}: {}", name, value)?,
            }
        }
        write!(f, ")]")
    }
}

/// Annotations of one declaration, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    items: Vec<Annotation>,
}

fn matches_name(annotation: &Annotation, name: &str) -> bool {
    let name = name.trim_start_matches('\\');
    if name.contains('\\') {
        annotation.type_name.eq_ignore_ascii_case(name)
    } else {
        annotation.name().eq_ignore_ascii_case(name)
    }
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.items.push(annotation);
    }

    /// First annotation named `name`. A qualified name must match the full
    /// type name; a bare name matches the last segment. Case-insensitive.
    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.items.iter().find(|a| matches_name(a, name))
    }

    /// Every annotation named `name`, for repeated attributes.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.items.iter().filter(move |a| matches_name(a, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.items
    }
}

impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Annotations {
    type Item = Annotation;
    type IntoIter = std::vec::IntoIter<Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
