//! Declaration handles
//!
//! Lookup keys for the declarations metadata is attached to. They carry
//! names only; nothing here is resolved until a source is asked.

use std::fmt;

/// A member of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Fully qualified name of the declaring type
    pub owner: String,
    pub name: String,
}

impl MemberRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into().trim_start_matches('\\').to_string(),
            name: name.into(),
        }
    }
}

/// A method parameter, by name (without `$`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterRef {
    pub method: MemberRef,
    pub name: String,
}

impl ParameterRef {
    pub fn new(owner: impl Into<String>, method: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            method: MemberRef::new(owner, method),
            name: name.into().trim_start_matches('$').to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Declaration {
    Type(String),
    Constant(MemberRef),
    Property(MemberRef),
    Method(MemberRef),
    Parameter(ParameterRef),
}

impl Declaration {
    pub fn of_type(name: impl Into<String>) -> Self {
        Declaration::Type(name.into().trim_start_matches('\\').to_string())
    }

    pub fn constant(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Declaration::Constant(MemberRef::new(owner, name))
    }

    pub fn property(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Declaration::Property(MemberRef::new(owner, name))
    }

    pub fn method(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Declaration::Method(MemberRef::new(owner, name))
    }

    pub fn parameter(owner: impl Into<String>, method: impl Into<String>, name: impl Into<String>) -> Self {
        Declaration::Parameter(ParameterRef::new(owner, method, name))
    }

    /// Fully qualified name of the type the declaration belongs to.
    pub fn owner(&self) -> &str {
        match self {
            Declaration::Type(name) => name,
            Declaration::Constant(m) | Declaration::Property(m) | Declaration::Method(m) => &m.owner,
            Declaration::Parameter(p) => &p.method.owner,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Declaration::Type(_) => "type",
            Declaration::Constant(_) => "constant",
            Declaration::Property(_) => "property",
            Declaration::Method(_) => "method",
            Declaration::Parameter(_) => "parameter",
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Type(name) => write!(f, "{}", name),
            Declaration::Constant(m) => write!(f, "{}::{}", m.owner, m.name),
            Declaration::Property(m) => write!(f, "{}::${}", m.owner, m.name),
            Declaration::Method(m) => write!(f, "{}::{}()", m.owner, m.name),
            Declaration::Parameter(p) => write!(f, "{}::{}(${})", p.method.owner, p.method.name, p.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Declaration::of_type("\\app\\User").to_string(), "app\\User");
        assert_eq!(Declaration::constant("app\\User", "LIMIT").to_string(), "app\\User::LIMIT");
        assert_eq!(Declaration::property("app\\User", "name").to_string(), "app\\User::$name");
        assert_eq!(Declaration::method("app\\User", "run").to_string(), "app\\User::run()");
        assert_eq!(
            Declaration::parameter("app\\User", "run", "$times").to_string(),
            "app\\User::run($times)"
        );
    }

    #[test]
    fn test_owner() {
        assert_eq!(Declaration::parameter("\\a\\B", "m", "p").owner(), "a\\B");
        assert_eq!(Declaration::method("a\\B", "m").kind(), "method");
    }
}
