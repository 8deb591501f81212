//! Expression evaluation against a scope

use reflecta_meta::*;
use std::sync::Arc;

struct Fixture {
    trees: TreeCache,
    runtime: StaticRuntime,
}

impl Fixture {
    fn new() -> Self {
        let locator = MemoryLocator::new()
            .with("app\\Sized", "<?php namespace app; interface Sized { const UNIT = 'kb'; }")
            .with(
                "app\\Limits",
                "<?php namespace app;\nclass Limits implements Sized {\n    const MAX = 10;\n    const PAIR = [self::MAX, self::MAX * 2];\n}\n",
            );
        let mut runtime = StaticRuntime::new();
        runtime
            .set_static("app\\Limits", "count", 3)
            .define_class_constant("ext\\Native", "VERSION", "1.2");
        Self {
            trees: TreeCache::new(Arc::new(locator)),
            runtime,
        }
    }

    fn eval(&self, code: &str) -> MetaResult<Value> {
        let scope = Scope::for_type("app\\Limits").with_import("Native", "ext\\Native");
        Evaluator::new(&self.trees, &self.runtime).evaluate_code(code, &scope)
    }
}

#[test]
fn test_literals_evaluate_to_themselves() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval("null").unwrap(), Value::Null);
    assert_eq!(fixture.eval("true").unwrap(), Value::Bool(true));
    assert_eq!(fixture.eval("42").unwrap(), Value::Int(42));
    assert_eq!(fixture.eval("1.5").unwrap(), Value::Float(1.5));
    assert_eq!(fixture.eval("'text'").unwrap(), Value::from("text"));
}

#[test]
fn test_arrays() {
    let fixture = Fixture::new();
    assert_eq!(
        fixture.eval("[3, 1, 2]").unwrap(),
        Value::Array(Array::list([Value::Int(3), Value::Int(1), Value::Int(2)]))
    );

    let keyed = fixture.eval("['a' => 1, 'b' => 2, 'a' => 3]").unwrap();
    let keyed = keyed.as_array().unwrap();
    assert_eq!(keyed.len(), 2);
    assert_eq!(keyed.get_str("a"), Some(&Value::Int(3)));
    assert_eq!(keyed.keys().next(), Some(&ArrayKey::from("a")));
}

#[test]
fn test_operators() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval("2 ** 3").unwrap(), Value::Int(8));
    assert_eq!(fixture.eval("4 % 3").unwrap(), Value::Int(1));
    assert_eq!(fixture.eval("2 << 1").unwrap(), Value::Int(4));
    assert_eq!(fixture.eval("true && false").unwrap(), Value::Bool(false));
    assert_eq!(fixture.eval("'a' . 1 . 'b'").unwrap(), Value::from("a1b"));
    assert_eq!(fixture.eval("null ?? 'fallback'").unwrap(), Value::from("fallback"));
}

#[test]
fn test_ternary_only_evaluates_taken_branch() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval("true ? 1 : 1 % 0").unwrap(), Value::Int(1));
    assert_eq!(fixture.eval("false ? 1 % 0 : 2").unwrap(), Value::Int(2));
    assert_eq!(fixture.eval("0 ?: 'empty'").unwrap(), Value::from("empty"));
    assert!(matches!(fixture.eval("true ? 1 % 0 : 1"), Err(MetaError::EvaluationError { .. })));
}

#[test]
fn test_class_references() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval("self::class").unwrap(), Value::from("app\\Limits"));
    assert_eq!(fixture.eval("self::MAX").unwrap(), Value::Int(10));
    assert_eq!(fixture.eval("self::PAIR[1]").unwrap(), Value::Int(20));
    assert_eq!(fixture.eval("self::UNIT").unwrap(), Value::from("kb"));
    assert_eq!(fixture.eval("self::$count").unwrap(), Value::Int(3));
    assert_eq!(fixture.eval("Native::VERSION").unwrap(), Value::from("1.2"));
    assert!(matches!(
        fixture.eval("self::MISSING"),
        Err(MetaError::UnresolvedReference { .. })
    ));
}

#[test]
fn test_only_single_expressions() {
    let fixture = Fixture::new();
    assert!(matches!(fixture.eval("1; 2;"), Err(MetaError::InvalidExpression { .. })));
    assert!(matches!(fixture.eval("$x"), Err(MetaError::InvalidExpression { .. })));
    assert_eq!(fixture.eval("1 + 1;").unwrap(), Value::Int(2));
}
