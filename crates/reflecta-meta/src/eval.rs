//! Expression evaluation
//!
//! Walks a parsed constant expression in the lexical scope of the
//! declaration that contains it. Class constants are read from their
//! declaring syntax tree (inherited through parents and interfaces) before
//! falling back to the runtime; static properties always come from the
//! runtime, since they hold current state rather than declared defaults.

use crate::cache::TreeCache;
use crate::error::{MetaError, MetaResult};
use crate::operators;
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::tree::{find_case, find_constant, SyntaxTree};
use crate::value::{Array, ArrayKey, Instance, Value};
use reflecta_parser::{
    parse_expression_source, Argument, ArrayExpression, BinaryExpression, BinaryOperator, Expression,
    IndexExpression, Interner, LiteralValue, PropertyAccessExpression, RawCodeExpression, ScopeMember,
    TernaryExpression, TypeKind,
};
use std::cell::Cell;
use tracing::{trace, warn};

/// Default bound on nested evaluations.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Lexical context an expression is evaluated in.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    pub scope: &'a Scope,
    /// Interner of the tree the expression was parsed into
    pub interner: &'a Interner,
}

impl<'a> Frame<'a> {
    pub fn new(scope: &'a Scope, interner: &'a Interner) -> Self {
        Self { scope, interner }
    }

    /// Context of the type a syntax tree was built for.
    pub fn of_tree(tree: &'a SyntaxTree) -> Self {
        Self::new(tree.scope(), tree.interner())
    }
}

pub struct Evaluator<'r> {
    trees: &'r TreeCache,
    runtime: &'r dyn Runtime,
    max_depth: usize,
    depth: Cell<usize>,
}

impl<'r> Evaluator<'r> {
    pub fn new(trees: &'r TreeCache, runtime: &'r dyn Runtime) -> Self {
        Self::with_max_depth(trees, runtime, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(trees: &'r TreeCache, runtime: &'r dyn Runtime, max_depth: usize) -> Self {
        Self {
            trees,
            runtime,
            max_depth,
            depth: Cell::new(0),
        }
    }

    /// Run `f` one level deeper, failing once the bound is reached.
    fn nested<T>(&self, f: impl FnOnce() -> MetaResult<T>) -> MetaResult<T> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(MetaError::evaluation(format!(
                "Maximum evaluation depth ({}) exceeded",
                self.max_depth
            )));
        }
        self.depth.set(depth + 1);
        let result = f();
        self.depth.set(depth);
        result
    }

    pub fn evaluate(&self, expr: &Expression, frame: &Frame<'_>) -> MetaResult<Value> {
        self.nested(|| self.evaluate_node(expr, frame))
    }

    /// Parse `code` as exactly one expression and evaluate it in `scope`.
    pub fn evaluate_code(&self, code: &str, scope: &Scope) -> MetaResult<Value> {
        trace!(code, scope = scope.self_name(), "evaluating code");
        let (expr, interner) = parse_expression_source(code)
            .map_err(|err| MetaError::invalid_expression(code, err.message))?;
        let frame = Frame::new(scope, &interner);
        self.evaluate(&expr, &frame)
    }

    /// Evaluate a raw code node in the scope of the declaration it belongs to.
    pub fn evaluate_raw(&self, raw: &RawCodeExpression, scope: &Scope) -> MetaResult<Value> {
        self.nested(|| self.evaluate_code(&raw.code, scope))
    }

    fn evaluate_node(&self, expr: &Expression, frame: &Frame<'_>) -> MetaResult<Value> {
        match expr {
            Expression::Literal(literal) => Ok(match literal.value {
                LiteralValue::Null => Value::Null,
                LiteralValue::Bool(b) => Value::Bool(b),
                LiteralValue::Int(n) => Value::Int(n),
                LiteralValue::Float(f) => Value::Float(f),
                LiteralValue::String(s) => Value::from(frame.interner.resolve(s)),
            }),

            Expression::Array(array) => self.evaluate_array(array, frame),

            Expression::New(new) => {
                let class = frame.scope.resolve_class_ref(&new.class, frame.interner)?;
                let arguments = self.arguments(&new.arguments, frame)?;
                trace!(class = %class, "constructing instance");
                self.runtime.construct(&class, &arguments)
            }

            Expression::ScopeResolution(access) => {
                let class = frame.scope.resolve_class_ref(&access.class, frame.interner)?;
                match access.member {
                    ScopeMember::Class => Ok(Value::String(class)),
                    ScopeMember::StaticProperty(name) => {
                        self.runtime.static_property(&class, frame.interner.resolve(name.name))
                    }
                    ScopeMember::Constant(name) => self.class_constant(&class, frame.interner.resolve(name.name)),
                }
            }

            Expression::ConstAccess(access) => {
                let text = access.name.as_str(frame.interner);
                match text {
                    "__CLASS__" => return Ok(Value::from(frame.scope.self_name())),
                    "__NAMESPACE__" => return Ok(Value::from(frame.scope.namespace().unwrap_or(""))),
                    _ => {}
                }
                let candidates = frame.scope.constant_candidates(&access.name, frame.interner);
                candidates
                    .iter()
                    .find_map(|name| self.runtime.constant(name))
                    .ok_or_else(|| MetaError::unresolved(text, "undefined constant"))
            }

            Expression::PropertyAccess(access) => self.evaluate_property(access, frame),
            Expression::Index(index) => self.evaluate_index(index, frame),

            Expression::Unary(unary) => {
                let operand = self.evaluate(&unary.operand, frame)?;
                operators::unary(unary.operator, &operand)
            }

            Expression::Binary(binary) => self.evaluate_binary(binary, frame),
            Expression::Ternary(ternary) => self.evaluate_ternary(ternary, frame),

            Expression::RawCode(raw) => self.evaluate_raw(raw, frame.scope),
        }
    }

    fn evaluate_array(&self, array: &ArrayExpression, frame: &Frame<'_>) -> MetaResult<Value> {
        let mut result = Array::new();
        for element in &array.elements {
            let value = self.evaluate(&element.value, frame)?;
            if element.spread {
                match value {
                    Value::Array(items) => result.extend_spread(&items),
                    other => {
                        return Err(MetaError::evaluation(format!(
                            "Only arrays can be unpacked, {} given",
                            other.type_name()
                        )))
                    }
                }
                continue;
            }
            match &element.key {
                Some(key) => {
                    let key = self.evaluate(key, frame)?;
                    result.insert(ArrayKey::from_value(&key)?, value);
                }
                None => result.push(value),
            }
        }
        Ok(Value::Array(result))
    }

    /// Evaluate call arguments: positional under int keys, named under
    /// their names.
    pub fn arguments(&self, arguments: &[Argument], frame: &Frame<'_>) -> MetaResult<Array> {
        let mut result = Array::new();
        let mut seen_named = false;

        for argument in arguments {
            let value = self.evaluate(&argument.value, frame)?;
            if argument.spread {
                let Value::Array(items) = value else {
                    return Err(MetaError::evaluation("Only arrays can be unpacked"));
                };
                for (key, item) in items.iter() {
                    match key {
                        ArrayKey::Int(_) if seen_named => {
                            return Err(MetaError::evaluation(
                                "Cannot use positional argument after named argument during unpacking",
                            ))
                        }
                        ArrayKey::Int(_) => result.push(item.clone()),
                        ArrayKey::Str(_) => {
                            seen_named = true;
                            result.insert(key.clone(), item.clone());
                        }
                    }
                }
                continue;
            }

            match argument.name {
                Some(name) => {
                    let name = frame.interner.resolve(name.name);
                    let key = ArrayKey::Str(name.to_string());
                    if result.contains_key(&key) {
                        return Err(MetaError::evaluation(format!(
                            "Named parameter ${} overwrites previous argument",
                            name
                        )));
                    }
                    seen_named = true;
                    result.insert(key, value);
                }
                None if seen_named => {
                    return Err(MetaError::evaluation(
                        "Cannot use positional argument after named argument",
                    ))
                }
                None => result.push(value),
            }
        }
        Ok(result)
    }

    fn evaluate_property(&self, access: &PropertyAccessExpression, frame: &Frame<'_>) -> MetaResult<Value> {
        let object = self.evaluate(&access.object, frame)?;
        let name = frame.interner.resolve(access.property.name);
        match object {
            Value::Null if access.nullsafe => Ok(Value::Null),
            Value::Object(instance) => instance.property(name).cloned().ok_or_else(|| {
                MetaError::unresolved(format!("{}::${}", instance.class, name), "undefined property")
            }),
            other => {
                warn!(property = name, "Attempt to read property on {}", other.type_name());
                Ok(Value::Null)
            }
        }
    }

    fn evaluate_index(&self, index: &IndexExpression, frame: &Frame<'_>) -> MetaResult<Value> {
        let container = self.evaluate(&index.object, frame)?;
        let offset = self.evaluate(&index.index, frame)?;
        match container {
            Value::Array(array) => {
                let key = ArrayKey::from_value(&offset)?;
                match array.get(&key) {
                    Some(value) => Ok(value.clone()),
                    None => {
                        warn!(key = %key, "Undefined array key");
                        Ok(Value::Null)
                    }
                }
            }
            Value::String(s) => {
                let position = offset.to_int("[]")?;
                let bytes = s.as_bytes();
                let index = if position < 0 {
                    bytes.len() as i64 + position
                } else {
                    position
                };
                match usize::try_from(index).ok().and_then(|i| bytes.get(i)) {
                    Some(byte) => Ok(Value::String(String::from_utf8_lossy(&[*byte]).into_owned())),
                    None => {
                        warn!(offset = position, "Uninitialized string offset");
                        Ok(Value::String(String::new()))
                    }
                }
            }
            Value::Object(instance) => Err(MetaError::evaluation(format!(
                "Cannot use object of type {} as array",
                instance.class
            ))),
            other => {
                warn!("Trying to access array offset on value of type {}", other.type_name());
                Ok(Value::Null)
            }
        }
    }

    fn evaluate_binary(&self, binary: &BinaryExpression, frame: &Frame<'_>) -> MetaResult<Value> {
        let left = self.evaluate(&binary.left, frame)?;
        match binary.operator {
            BinaryOperator::LogicalAnd => {
                if !left.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.evaluate(&binary.right, frame)?.is_truthy()))
            }
            BinaryOperator::LogicalOr => {
                if left.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.evaluate(&binary.right, frame)?.is_truthy()))
            }
            BinaryOperator::Coalesce => {
                if !left.is_null() {
                    return Ok(left);
                }
                self.evaluate(&binary.right, frame)
            }
            op => {
                let right = self.evaluate(&binary.right, frame)?;
                operators::binary(op, &left, &right)
            }
        }
    }

    /// Only the taken branch is evaluated.
    fn evaluate_ternary(&self, ternary: &TernaryExpression, frame: &Frame<'_>) -> MetaResult<Value> {
        let condition = self.evaluate(&ternary.condition, frame)?;
        match &ternary.then_branch {
            Some(then) if condition.is_truthy() => self.evaluate(then, frame),
            None if condition.is_truthy() => Ok(condition),
            _ => self.evaluate(&ternary.else_branch, frame),
        }
    }

    // ========================================================================
    // Class constants
    // ========================================================================

    /// `Class::NAME`: declared constants and enum cases from source,
    /// inherited ones, then the runtime.
    pub fn class_constant(&self, class: &str, name: &str) -> MetaResult<Value> {
        self.nested(|| self.lookup_constant(class, name))?
            .ok_or_else(|| MetaError::unresolved(format!("{}::{}", class, name), "undefined class constant"))
    }

    fn lookup_constant(&self, class: &str, name: &str) -> MetaResult<Option<Value>> {
        let tree = match self.trees.tree(class) {
            Ok(tree) => tree,
            Err(MetaError::SourceUnavailable { .. }) => {
                trace!(class, name, "no source, asking runtime for constant");
                return Ok(self.runtime.class_constant(class, name));
            }
            Err(err) => return Err(err),
        };

        let decl = tree.type_decl();
        let frame = Frame::of_tree(&tree);

        if decl.kind == TypeKind::Enum {
            if let Some(case) = find_case(decl, name, tree.interner()) {
                let backing = match &case.value {
                    Some(value) => Some(self.evaluate(value, &frame)?),
                    None => None,
                };
                return Ok(Some(Value::from(Instance::enum_case(tree.name(), name, backing))));
            }
        }

        if let Some(constant) = find_constant(decl, name, tree.interner()) {
            return self.evaluate(&constant.value, &frame).map(Some);
        }

        let scope = tree.scope();
        let traits: Vec<String> = decl
            .traits
            .iter()
            .map(|t| scope.resolve_name(t, tree.interner()))
            .collect();
        let ancestors = scope
            .parent()
            .into_iter()
            .chain(scope.interfaces().iter().map(String::as_str))
            .chain(traits.iter().map(String::as_str));

        for ancestor in ancestors {
            if let Some(value) = self.nested(|| self.lookup_constant(ancestor, name))? {
                return Ok(Some(value));
            }
        }

        Ok(self.runtime.class_constant(class, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryLocator;
    use crate::runtime::StaticRuntime;
    use std::sync::Arc;

    fn eval(code: &str) -> MetaResult<Value> {
        let cache = TreeCache::new(Arc::new(MemoryLocator::new()));
        let runtime = StaticRuntime::new();
        let evaluator = Evaluator::new(&cache, &runtime);
        evaluator.evaluate_code(code, &Scope::for_type("app\\Test"))
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("null").unwrap(), Value::Null);
        assert_eq!(eval("true").unwrap(), Value::Bool(true));
        assert_eq!(eval("-5").unwrap(), Value::Int(-5));
        assert_eq!(eval("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(eval("'text'").unwrap(), Value::from("text"));
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            eval("[1, 2, 3]").unwrap(),
            Value::Array(Array::list([Value::Int(1), Value::Int(2), Value::Int(3)]))
        );

        let map = eval("['a' => 1, 'b' => 2, 'a' => 3]").unwrap();
        let map = map.as_array().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str("a"), Some(&Value::Int(3)));

        let spread = eval("[1, ...[2, 3], 'k' => 4]").unwrap();
        assert_eq!(spread.as_array().unwrap().len(), 4);

        let computed = eval("[1 + 1 => 'two', '5' => 'five']").unwrap();
        let computed = computed.as_array().unwrap();
        assert_eq!(computed.get_index(2), Some(&Value::from("two")));
        assert_eq!(computed.get_index(5), Some(&Value::from("five")));
    }

    #[test]
    fn test_operators() {
        assert_eq!(eval("2 ** 3").unwrap(), Value::Int(8));
        assert_eq!(eval("4 % 3").unwrap(), Value::Int(1));
        assert_eq!(eval("2 << 1").unwrap(), Value::Int(4));
        assert_eq!(eval("true && false").unwrap(), Value::Bool(false));
        assert_eq!(eval("'a' . 1 + 2").unwrap(), Value::from("a3"));
        assert_eq!(eval("null ?? 'x'").unwrap(), Value::from("x"));
        assert_eq!(eval("0 ?: 'y'").unwrap(), Value::from("y"));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        assert_eq!(eval("true ? 1 : 1 % 0").unwrap(), Value::Int(1));
        assert_eq!(eval("false ? 1 % 0 : 2").unwrap(), Value::Int(2));
        assert_eq!(eval("false && UNDEFINED_CONSTANT").unwrap(), Value::Bool(false));
        assert_eq!(eval("1 ?? 1 % 0").unwrap(), Value::Int(1));
        assert!(eval("false ? 1 : 1 % 0").is_err());
    }

    #[test]
    fn test_constants_and_magic_names() {
        assert_eq!(eval("PHP_INT_MAX").unwrap(), Value::Int(i64::MAX));
        assert_eq!(eval("\\PHP_EOL").unwrap(), Value::from("\n"));
        assert_eq!(eval("__CLASS__").unwrap(), Value::from("app\\Test"));
        assert!(matches!(eval("NOPE"), Err(MetaError::UnresolvedReference { .. })));
    }

    #[test]
    fn test_raw_code_nodes() {
        let cache = TreeCache::new(Arc::new(MemoryLocator::new()));
        let runtime = StaticRuntime::new();
        let evaluator = Evaluator::new(&cache, &runtime);
        let scope = Scope::for_type("app\\Test");
        let interner = Interner::new();
        let frame = Frame::new(&scope, &interner);

        let single = Expression::RawCode(RawCodeExpression::new("self::class . '!'"));
        assert_eq!(evaluator.evaluate(&single, &frame).unwrap(), Value::from("app\\Test!"));

        let two = Expression::RawCode(RawCodeExpression::new("1; 2;"));
        assert!(matches!(
            evaluator.evaluate(&two, &frame),
            Err(MetaError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_self_class_and_parent_errors() {
        assert_eq!(eval("self::class").unwrap(), Value::from("app\\Test"));
        assert!(matches!(eval("parent::class"), Err(MetaError::UnresolvedReference { .. })));
    }

    #[test]
    fn test_index_and_property_access() {
        assert_eq!(eval("['a' => [1, 2]]['a'][1]").unwrap(), Value::Int(2));
        assert_eq!(eval("'abc'[-1]").unwrap(), Value::from("c"));
        assert_eq!(eval("[1][5]").unwrap(), Value::Null);
        assert_eq!(eval("null?->name").unwrap(), Value::Null);
        assert_eq!(eval("(new Point(x: 1))->x").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_new_resolves_class_in_scope() {
        match eval("new Point(1, name: 'p')").unwrap() {
            Value::Object(instance) => {
                assert_eq!(instance.class, "app\\Point");
                assert_eq!(instance.properties.get_index(0), Some(&Value::Int(1)));
                assert_eq!(instance.property("name"), Some(&Value::from("p")));
            }
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_argument_order_rules() {
        assert!(eval("new Point(x: 1, 2)").is_err());
        assert!(eval("new Point(x: 1, x: 2)").is_err());
    }

    #[test]
    fn test_invalid_code() {
        assert!(matches!(eval("1; 2;"), Err(MetaError::InvalidExpression { .. })));
        assert!(matches!(eval("$a"), Err(MetaError::InvalidExpression { .. })));
        assert_eq!(eval("1 + 1;").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_depth_bound() {
        let cache = TreeCache::new(Arc::new(MemoryLocator::new()));
        let runtime = StaticRuntime::new();
        let evaluator = Evaluator::with_max_depth(&cache, &runtime, 3);
        let scope = Scope::for_type("T");
        assert!(evaluator.evaluate_code("1 + 1", &scope).is_ok());
        assert!(matches!(
            evaluator.evaluate_code("1 + (2 + (3 + 4))", &scope),
            Err(MetaError::EvaluationError { .. })
        ));
    }
}
