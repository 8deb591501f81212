//! Host runtime capabilities used during evaluation
//!
//! Object construction, static property reads, class constants of types
//! without source, and global constants come from the host. `StaticRuntime`
//! is a table-driven implementation for embedding and tests.

use crate::error::{MetaError, MetaResult};
use crate::value::{Array, Instance, Value};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub trait Runtime: Send + Sync {
    /// Create an instance of `class`. Arguments use int keys for
    /// positional and string keys for named arguments.
    fn construct(&self, class: &str, arguments: &Array) -> MetaResult<Value>;

    /// Current value of a static property, regardless of its visibility.
    fn static_property(&self, class: &str, name: &str) -> MetaResult<Value>;

    /// Constant of a class whose source is not available.
    fn class_constant(&self, class: &str, name: &str) -> Option<Value> {
        let _ = (class, name);
        None
    }

    /// Global constant by fully qualified name.
    fn constant(&self, name: &str) -> Option<Value> {
        builtin_constant(name)
    }
}

/// Predefined constants every host has.
pub fn builtin_constant(name: &str) -> Option<Value> {
    let value = match name {
        "PHP_INT_MAX" => Value::Int(i64::MAX),
        "PHP_INT_MIN" => Value::Int(i64::MIN),
        "PHP_INT_SIZE" => Value::Int(8),
        "PHP_FLOAT_EPSILON" => Value::Float(f64::EPSILON),
        "PHP_FLOAT_MAX" => Value::Float(f64::MAX),
        "PHP_FLOAT_MIN" => Value::Float(f64::MIN_POSITIVE),
        "PHP_FLOAT_DIG" => Value::Int(15),
        "PHP_EOL" => Value::from("\n"),
        "DIRECTORY_SEPARATOR" => Value::from("/"),
        "PATH_SEPARATOR" => Value::from(":"),
        "NAN" => Value::Float(f64::NAN),
        "INF" => Value::Float(f64::INFINITY),
        "M_PI" => Value::Float(std::f64::consts::PI),
        "M_E" => Value::Float(std::f64::consts::E),
        "M_SQRT2" => Value::Float(std::f64::consts::SQRT_2),
        "E_ERROR" => Value::Int(1),
        "E_WARNING" => Value::Int(2),
        "E_PARSE" => Value::Int(4),
        "E_NOTICE" => Value::Int(8),
        "E_USER_ERROR" => Value::Int(256),
        "E_USER_WARNING" => Value::Int(512),
        "E_USER_NOTICE" => Value::Int(1024),
        "E_STRICT" => Value::Int(2048),
        "E_DEPRECATED" => Value::Int(8192),
        "E_USER_DEPRECATED" => Value::Int(16384),
        "E_ALL" => Value::Int(32767),
        "SORT_REGULAR" => Value::Int(0),
        "SORT_NUMERIC" => Value::Int(1),
        "SORT_STRING" => Value::Int(2),
        "JSON_PRETTY_PRINT" => Value::Int(128),
        "JSON_UNESCAPED_SLASHES" => Value::Int(64),
        "JSON_THROW_ON_ERROR" => Value::Int(4_194_304),
        _ => return None,
    };
    Some(value)
}

pub type Factory = Arc<dyn Fn(&str, &Array) -> MetaResult<Value> + Send + Sync>;

/// Table-driven runtime.
///
/// Classes without a registered factory construct plain instances whose
/// properties are the arguments.
#[derive(Default, Clone)]
pub struct StaticRuntime {
    constants: FxHashMap<String, Value>,
    class_constants: FxHashMap<(String, String), Value>,
    statics: FxHashMap<(String, String), Value>,
    factories: FxHashMap<String, Factory>,
}

fn class_key(class: &str) -> String {
    class.trim_start_matches('\\').to_ascii_lowercase()
}

impl StaticRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_constant(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.constants
            .insert(name.trim_start_matches('\\').to_string(), value.into());
        self
    }

    pub fn define_class_constant(&mut self, class: &str, name: &str, value: impl Into<Value>) -> &mut Self {
        self.class_constants
            .insert((class_key(class), name.to_string()), value.into());
        self
    }

    pub fn set_static(&mut self, class: &str, name: &str, value: impl Into<Value>) -> &mut Self {
        self.statics.insert((class_key(class), name.to_string()), value.into());
        self
    }

    pub fn register_factory(
        &mut self,
        class: &str,
        factory: impl Fn(&str, &Array) -> MetaResult<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.factories.insert(class_key(class), Arc::new(factory));
        self
    }
}

impl Runtime for StaticRuntime {
    fn construct(&self, class: &str, arguments: &Array) -> MetaResult<Value> {
        match self.factories.get(&class_key(class)) {
            Some(factory) => factory(class, arguments),
            None => Ok(Value::from(Instance::new(class, arguments.clone()))),
        }
    }

    fn static_property(&self, class: &str, name: &str) -> MetaResult<Value> {
        self.statics
            .get(&(class_key(class), name.to_string()))
            .cloned()
            .ok_or_else(|| {
                MetaError::unresolved(
                    format!("{}::${}", class, name),
                    "access to undeclared static property",
                )
            })
    }

    fn class_constant(&self, class: &str, name: &str) -> Option<Value> {
        self.class_constants
            .get(&(class_key(class), name.to_string()))
            .cloned()
    }

    fn constant(&self, name: &str) -> Option<Value> {
        self.constants
            .get(name)
            .cloned()
            .or_else(|| builtin_constant(name))
    }
}

impl std::fmt::Debug for StaticRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticRuntime")
            .field("constants", &self.constants.len())
            .field("class_constants", &self.class_constants.len())
            .field("statics", &self.statics.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_constants() {
        let runtime = StaticRuntime::new();
        assert_eq!(runtime.constant("PHP_INT_MAX"), Some(Value::Int(i64::MAX)));
        assert_eq!(runtime.constant("php_int_max"), None);
    }

    #[test]
    fn test_defined_constants_strip_leading_backslash() {
        let mut runtime = StaticRuntime::new();
        runtime.define_constant("\\app\\LIMIT", 5);
        assert_eq!(runtime.constant("app\\LIMIT"), Some(Value::Int(5)));
    }

    #[test]
    fn test_static_properties_are_case_insensitive_on_class() {
        let mut runtime = StaticRuntime::new();
        runtime.set_static("app\\Registry", "instances", 3);
        assert_eq!(runtime.static_property("APP\\registry", "instances").unwrap(), Value::Int(3));
        assert!(runtime.static_property("app\\Registry", "missing").is_err());
    }

    #[test]
    fn test_default_construction_keeps_arguments() {
        let runtime = StaticRuntime::new();
        let value = runtime.construct("Point", &Array::list([Value::Int(1)])).unwrap();
        match value {
            Value::Object(instance) => {
                assert_eq!(instance.class, "Point");
                assert_eq!(instance.properties.get_index(0), Some(&Value::Int(1)));
            }
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_factory() {
        let mut runtime = StaticRuntime::new();
        runtime.register_factory("Money", |_, args| {
            let amount = args.get_index(0).cloned().unwrap_or(Value::Int(0));
            Ok(Value::Array(Array::list([amount, Value::from("EUR")])))
        });
        let value = runtime.construct("money", &Array::list([Value::Int(10)])).unwrap();
        assert_eq!(value, Value::Array(Array::list([Value::Int(10), Value::from("EUR")])));
    }
}
