//! Annotation sources
//!
//! Two interchangeable ways of obtaining the annotations of a declaration:
//! precompiled attribute tables supplied by the host ([`FromAttributes`])
//! and attributes parsed from the declaring source file
//! ([`FromSyntaxTree`]). One is picked at startup with [`select_source`].

mod attributes;
mod syntax_tree;

pub use attributes::{AttributeTable, CompiledAttribute, FromAttributes, StaticAttributes};
pub use syntax_tree::FromSyntaxTree;

use crate::annotations::Annotations;
use crate::cache::TreeCache;
use crate::config::SourceMode;
use crate::declaration::{MemberRef, ParameterRef};
use crate::error::{MetaError, MetaResult};
use crate::eval::{Evaluator, DEFAULT_MAX_DEPTH};
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::value::{Array, ArrayKey, Value};
use indexmap::IndexMap;
use reflecta_parser::RawCodeExpression;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Argument name marking a computed annotation value.
pub const DEFAULT_COMPUTED_KEY: &str = "eval";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    SyntaxTree,
    Attributes,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::SyntaxTree => write!(f, "syntax-tree"),
            SourceKind::Attributes => write!(f, "attributes"),
        }
    }
}

/// Annotation lookup per declaration kind.
pub trait AnnotationSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn of_type(&self, type_name: &str) -> MetaResult<Annotations>;

    /// Class constants and enum cases.
    fn of_constant(&self, constant: &MemberRef) -> MetaResult<Annotations>;

    fn of_property(&self, property: &MemberRef) -> MetaResult<Annotations>;

    fn of_method(&self, method: &MemberRef) -> MetaResult<Annotations>;

    fn of_parameter(&self, parameter: &ParameterRef) -> MetaResult<Annotations>;

    /// Class imports of the file declaring `type_name`: alias → fully
    /// qualified name.
    fn imports(&self, type_name: &str) -> MetaResult<IndexMap<String, String>>;

    /// Evaluate `code` as one expression in the scope of `type_name`.
    fn evaluate(&self, type_name: &str, code: &str) -> MetaResult<Value>;
}

/// What every source evaluates with.
#[derive(Clone)]
pub struct Environment {
    pub trees: Arc<TreeCache>,
    pub runtime: Arc<dyn Runtime>,
    pub computed_key: String,
    pub max_depth: usize,
}

impl Environment {
    pub fn new(trees: Arc<TreeCache>, runtime: Arc<dyn Runtime>) -> Self {
        Self {
            trees,
            runtime,
            computed_key: DEFAULT_COMPUTED_KEY.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_computed_key(mut self, key: impl Into<String>) -> Self {
        self.computed_key = key.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::with_max_depth(&self.trees, self.runtime.as_ref(), self.max_depth)
    }

    /// Replace computed arguments by their values.
    ///
    /// `Name(eval: 'code')` becomes `Name(<value of code>)`;
    /// `Name(eval: ['key' => 'code', ...])` evaluates each entry under its
    /// key. Arguments without the computed key pass through unchanged.
    pub fn computed(&self, arguments: Array, scope: &Scope) -> MetaResult<Array> {
        let key = ArrayKey::Str(self.computed_key.clone());
        let Some(code) = arguments.get(&key) else {
            return Ok(arguments);
        };

        let evaluator = self.evaluator();
        match code {
            Value::String(code) => {
                trace!(code = %code, scope = scope.self_name(), "computed argument");
                let raw = RawCodeExpression::new(code.as_str());
                Ok(Array::list([evaluator.evaluate_raw(&raw, scope)?]))
            }
            Value::Array(entries) => {
                let mut result = Array::new();
                for (name, code) in entries.iter() {
                    let Value::String(code) = code else {
                        return Err(MetaError::evaluation(format!(
                            "Computed argument {} must be a string, {} given",
                            name,
                            code.type_name()
                        )));
                    };
                    let raw = RawCodeExpression::new(code.as_str());
                    result.insert(name.clone(), evaluator.evaluate_raw(&raw, scope)?);
                }
                Ok(result)
            }
            other => Err(MetaError::evaluation(format!(
                "Computed argument must be a string or an array, {} given",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("trees", &self.trees)
            .field("computed_key", &self.computed_key)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Pick the annotation source for this process.
///
/// `Auto` uses the attribute table when the host supplies one and the
/// syntax tree otherwise.
pub fn select_source(
    mode: SourceMode,
    attributes: Option<Arc<dyn AttributeTable>>,
    env: Environment,
) -> MetaResult<Arc<dyn AnnotationSource>> {
    let source: Arc<dyn AnnotationSource> = match (mode, attributes) {
        (SourceMode::SyntaxTree, _) | (SourceMode::Auto, None) => Arc::new(FromSyntaxTree::new(env)),
        (SourceMode::Attributes, Some(table)) | (SourceMode::Auto, Some(table)) => {
            Arc::new(FromAttributes::new(table, env))
        }
        (SourceMode::Attributes, None) => {
            return Err(MetaError::Options(
                "attribute mode requires an attribute table".to_string(),
            ))
        }
    };
    debug!(kind = %source.kind(), "selected annotation source");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryLocator;
    use crate::runtime::StaticRuntime;

    fn env() -> Environment {
        let trees = Arc::new(TreeCache::new(Arc::new(MemoryLocator::new())));
        Environment::new(trees, Arc::new(StaticRuntime::new()))
    }

    #[test]
    fn test_select_source() {
        let table: Arc<dyn AttributeTable> = Arc::new(StaticAttributes::new());

        let auto = select_source(SourceMode::Auto, None, env()).unwrap();
        assert_eq!(auto.kind(), SourceKind::SyntaxTree);

        let auto = select_source(SourceMode::Auto, Some(Arc::clone(&table)), env()).unwrap();
        assert_eq!(auto.kind(), SourceKind::Attributes);

        let forced = select_source(SourceMode::SyntaxTree, Some(table), env()).unwrap();
        assert_eq!(forced.kind(), SourceKind::SyntaxTree);

        assert!(matches!(
            select_source(SourceMode::Attributes, None, env()),
            Err(MetaError::Options(_))
        ));
    }

    #[test]
    fn test_computed_arguments() {
        let env = env();
        let scope = Scope::for_type("app\\T");

        let mut single = Array::new();
        single.insert(ArrayKey::from("eval"), Value::from("1 + 1"));
        assert_eq!(env.computed(single, &scope).unwrap(), Array::list([Value::Int(2)]));

        let mut codes = Array::new();
        codes.insert(ArrayKey::from("min"), Value::from("2 ** 3"));
        let mut keyed = Array::new();
        keyed.insert(ArrayKey::from("eval"), Value::Array(codes));
        let result = env.computed(keyed, &scope).unwrap();
        assert_eq!(result.get_str("min"), Some(&Value::Int(8)));

        let plain = Array::list([Value::from("1 + 1")]);
        assert_eq!(env.computed(plain.clone(), &scope).unwrap(), plain);
    }

    #[test]
    fn test_computed_code_is_one_expression() {
        let mut arguments = Array::new();
        arguments.insert(ArrayKey::from("eval"), Value::from("1; 2;"));
        assert!(matches!(
            env().computed(arguments, &Scope::for_type("app\\T")),
            Err(MetaError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_computed_key_is_configurable() {
        let env = env().with_computed_key("expr");
        let mut arguments = Array::new();
        arguments.insert(ArrayKey::from("expr"), Value::from("self::class"));
        let result = env.computed(arguments, &Scope::for_type("app\\T")).unwrap();
        assert_eq!(result, Array::list([Value::from("app\\T")]));
    }
}
