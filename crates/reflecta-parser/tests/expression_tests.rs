//! Tests for expression parsing

use reflecta_parser::ast::*;
use reflecta_parser::parser::{parse_expression_source, ParseErrorKind};
use reflecta_parser::Interner;

fn parse(code: &str) -> (Expression, Interner) {
    parse_expression_source(code).unwrap()
}

fn binary(expr: &Expression) -> &BinaryExpression {
    match expr {
        Expression::Binary(bin) => bin,
        other => panic!("Expected binary expression, got {:?}", other),
    }
}

#[test]
fn test_parse_literals() {
    let (expr, _) = parse("42");
    assert!(matches!(expr, Expression::Literal(Literal { value: LiteralValue::Int(42), .. })));

    let (expr, _) = parse("1.5");
    assert!(matches!(expr, Expression::Literal(Literal { value: LiteralValue::Float(f), .. }) if f == 1.5));

    let (expr, _) = parse("NULL");
    assert!(matches!(expr, Expression::Literal(Literal { value: LiteralValue::Null, .. })));

    let (expr, interner) = parse("'text'");
    match expr {
        Expression::Literal(Literal { value: LiteralValue::String(s), .. }) => {
            assert_eq!(interner.resolve(s), "text")
        }
        _ => panic!("Expected string literal"),
    }
}

#[test]
fn test_parse_array_forms() {
    let (expr, _) = parse("[1, 'a' => 2, ...[3],]");
    match expr {
        Expression::Array(array) => {
            assert_eq!(array.elements.len(), 3);
            assert!(array.elements[0].key.is_none());
            assert!(array.elements[1].key.is_some());
            assert!(array.elements[2].spread);
        }
        _ => panic!("Expected array"),
    }

    let (expr, _) = parse("array(1, 2)");
    match expr {
        Expression::Array(array) => assert_eq!(array.elements.len(), 2),
        _ => panic!("Expected array"),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let (expr, _) = parse("1 + 2 * 3");
    let add = binary(&expr);
    assert_eq!(add.operator, BinaryOperator::Add);
    assert_eq!(binary(&add.right).operator, BinaryOperator::Multiply);
}

#[test]
fn test_exponent_is_right_associative() {
    let (expr, _) = parse("2 ** 3 ** 2");
    let outer = binary(&expr);
    assert_eq!(outer.operator, BinaryOperator::Exponent);
    assert!(matches!(*outer.left, Expression::Literal(_)));
    assert_eq!(binary(&outer.right).operator, BinaryOperator::Exponent);
}

#[test]
fn test_unary_minus_applies_after_exponent() {
    let (expr, _) = parse("-2 ** 2");
    match expr {
        Expression::Unary(unary) => {
            assert_eq!(unary.operator, UnaryOperator::Minus);
            assert_eq!(binary(&unary.operand).operator, BinaryOperator::Exponent);
        }
        _ => panic!("Expected unary minus"),
    }
}

#[test]
fn test_subtraction_is_left_associative() {
    let (expr, _) = parse("10 - 4 - 3");
    let outer = binary(&expr);
    assert_eq!(outer.operator, BinaryOperator::Subtract);
    assert_eq!(binary(&outer.left).operator, BinaryOperator::Subtract);
}

#[test]
fn test_ternary_forms() {
    let (expr, _) = parse("true ? 1 : 2");
    match expr {
        Expression::Ternary(t) => assert!(t.then_branch.is_some()),
        _ => panic!("Expected ternary"),
    }

    let (expr, _) = parse("0 ?: 'fallback'");
    match expr {
        Expression::Ternary(t) => assert!(t.then_branch.is_none()),
        _ => panic!("Expected short ternary"),
    }
}

#[test]
fn test_nested_ternary_needs_parentheses() {
    for code in ["1 ? 2 : 3 ? 4 : 5", "1 ?: 2 ? 3 : 4", "1 ? 2 : 3 ?: 4"] {
        let err = parse_expression_source(code).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidSyntax { .. }), "{}", code);
    }

    let (expr, _) = parse("1 ? 2 : (3 ? 4 : 5)");
    assert!(matches!(expr, Expression::Ternary(_)));
    let (expr, _) = parse("1 ? (2 ? 3 : 4) : 5");
    assert!(matches!(expr, Expression::Ternary(_)));
    let (expr, _) = parse("1 ? 2 ? 3 : 4 : 5");
    assert!(matches!(expr, Expression::Ternary(_)));

    let (expr, _) = parse("0 ?: null ?: 'last'");
    match expr {
        Expression::Ternary(t) => assert!(matches!(*t.condition, Expression::Ternary(_))),
        _ => panic!("Expected short ternary chain"),
    }
}

#[test]
fn test_coalesce_binds_tighter_than_ternary() {
    let (expr, _) = parse("null ?? 1 ? 'a' : 'b'");
    match expr {
        Expression::Ternary(t) => assert_eq!(binary(&t.condition).operator, BinaryOperator::Coalesce),
        _ => panic!("Expected ternary"),
    }
}

#[test]
fn test_scope_resolution_members() {
    let (expr, _) = parse("self::class");
    match expr {
        Expression::ScopeResolution(s) => {
            assert!(matches!(s.class, ClassRef::SelfType(_)));
            assert_eq!(s.member, ScopeMember::Class);
        }
        _ => panic!("Expected scope resolution"),
    }

    let (expr, interner) = parse("\\lang\\Type::$cache");
    match expr {
        Expression::ScopeResolution(s) => {
            match s.class {
                ClassRef::Named(name) => {
                    assert_eq!(name.kind, NameKind::FullyQualified);
                    assert_eq!(name.as_str(&interner), "lang\\Type");
                }
                _ => panic!("Expected named class"),
            }
            assert!(matches!(s.member, ScopeMember::StaticProperty(_)));
        }
        _ => panic!("Expected scope resolution"),
    }

    let (expr, _) = parse("parent::LIST");
    match expr {
        Expression::ScopeResolution(s) => {
            assert!(matches!(s.class, ClassRef::Parent(_)));
            assert!(matches!(s.member, ScopeMember::Constant(_)));
        }
        _ => panic!("Expected scope resolution"),
    }
}

#[test]
fn test_new_with_named_arguments() {
    let (expr, interner) = parse("new Fixture(1, name: 'x')");
    match expr {
        Expression::New(new) => {
            assert_eq!(new.arguments.len(), 2);
            assert!(new.arguments[0].name.is_none());
            let name = new.arguments[1].name.unwrap();
            assert_eq!(interner.resolve(name.name), "name");
        }
        _ => panic!("Expected new expression"),
    }
}

#[test]
fn test_property_and_index_access() {
    let (expr, _) = parse("Suit::Hearts->value");
    assert!(matches!(expr, Expression::PropertyAccess(_)));

    let (expr, _) = parse("self::MAP['key']");
    assert!(matches!(expr, Expression::Index(_)));
}

#[test]
fn test_const_access() {
    let (expr, interner) = parse("PHP_INT_MAX");
    match expr {
        Expression::ConstAccess(c) => assert_eq!(c.name.as_str(&interner), "PHP_INT_MAX"),
        _ => panic!("Expected constant access"),
    }
}

#[test]
fn test_trailing_semicolon_is_accepted() {
    assert!(parse_expression_source("1 + 1;").is_ok());
}

#[test]
fn test_two_statements_rejected() {
    let err = parse_expression_source("1; 2;").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::TrailingInput { .. }));
}

#[test]
fn test_runtime_constructs_rejected() {
    for code in ["$a", "strlen('x')", "fn() => 1", "Foo::create()", "$a = 1"] {
        let err = parse_expression_source(code).unwrap_err();
        assert!(
            matches!(err.kind, ParseErrorKind::Unsupported { .. }),
            "{} should be unsupported, got {:?}",
            code,
            err.kind
        );
    }
}

#[test]
fn test_deep_nesting_is_limited() {
    let code = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    let err = parse_expression_source(&code).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::ParserLimitExceeded { .. }));
}
