//! Annotation resolution through the facade, for both sources

use reflecta_meta::*;
use std::sync::Arc;

const FIXTURE: &str = r#"<?php
namespace app\fixture;

use orm\Table;
use orm\{Column, Id as Key};

/**
 * Annotated fixture
 *
 * @see https://example.com/fixture
 */
#[Table('fixtures'), Cached]
class Fixture extends Base {
    const int LIMIT = 10;

    #[Annotated(1 + 1)]
    public $sum;

    #[Annotated(using: "values")]
    public $named;

    #[Key, Column(name: 'fixture_id', size: self::LIMIT * 2)]
    public int $id;

    #[Annotated(eval: 'self::LIMIT . "/" . Base::KIND')]
    public $computed;

    #[Annotated(eval: ['min' => 'self::LIMIT - 9', 'max' => 'self::LIMIT'])]
    public $range;

    #[Annotated(new Column('created'))]
    public $created;

    /** Runs the fixture */
    #[Test, Values([[1, 2], [3, 4]])]
    public function run(#[Inject('db')] $connection, int ...$rest) { }
}
"#;

const BASE: &str = r#"<?php
namespace app\fixture;

abstract class Base {
    const KIND = 'base';
}
"#;

fn locator() -> MemoryLocator {
    MemoryLocator::new()
        .with("app\\fixture\\Fixture", FIXTURE)
        .with("app\\fixture\\Base", BASE)
}

fn facade() -> MetaInformation {
    MetaInformation::builder(Arc::new(StaticRuntime::new()))
        .locator(Arc::new(locator()))
        .build()
        .unwrap()
}

#[test]
fn test_arguments_are_evaluated() {
    let meta = facade();
    let sum = meta.property_annotations("app\\fixture\\Fixture", "sum").unwrap();
    assert_eq!(sum.get("Annotated").unwrap().arguments, Array::list([Value::Int(2)]));
}

#[test]
fn test_named_arguments_stay_named() {
    let meta = facade();
    let named = meta.property_annotations("app\\fixture\\Fixture", "named").unwrap();
    let annotated = named.get("Annotated").unwrap();

    let mut expected = Array::new();
    expected.insert(ArrayKey::from("using"), Value::from("values"));
    assert_eq!(annotated.arguments, expected);
    assert_eq!(annotated.value(), None);
}

#[test]
fn test_names_resolve_through_imports() {
    let meta = facade();
    let id = meta.property_annotations("app\\fixture\\Fixture", "id").unwrap();
    let names: Vec<_> = id.iter().map(|a| a.type_name.as_str()).collect();
    assert_eq!(names, ["orm\\Id", "orm\\Column"]);

    let column = id.get("orm\\Column").unwrap();
    assert_eq!(column.argument("name"), Some(&Value::from("fixture_id")));
    assert_eq!(column.argument("size"), Some(&Value::Int(20)));

    let class = meta.type_annotations("app\\fixture\\Fixture").unwrap();
    assert!(class.contains("Table"));
    assert!(class.get("app\\fixture\\Cached").unwrap().is_marker());
}

#[test]
fn test_computed_values() {
    let meta = facade();
    let computed = meta.property_annotations("app\\fixture\\Fixture", "computed").unwrap();
    assert_eq!(
        computed.get("Annotated").unwrap().arguments,
        Array::list([Value::from("10/base")])
    );

    let range = meta.property_annotations("app\\fixture\\Fixture", "range").unwrap();
    let range = range.get("Annotated").unwrap();
    assert_eq!(range.argument("min"), Some(&Value::Int(1)));
    assert_eq!(range.argument("max"), Some(&Value::Int(10)));
    assert_eq!(range.value(), None);
}

#[test]
fn test_new_constructs_through_runtime() {
    let meta = facade();
    let created = meta.property_annotations("app\\fixture\\Fixture", "created").unwrap();
    match created.get("Annotated").unwrap().value() {
        Some(Value::Object(instance)) => {
            assert_eq!(instance.class, "orm\\Column");
            assert_eq!(instance.property("0"), Some(&Value::from("created")));
        }
        other => panic!("expected object, got {:?}", other),
    }
}

#[test]
fn test_method_and_parameter_annotations() {
    let meta = facade();
    let run = meta.method_annotations("app\\fixture\\Fixture", "RUN").unwrap();
    assert_eq!(run.len(), 2);
    let values = run.get("Values").unwrap().value().unwrap().as_array().unwrap();
    assert_eq!(values.len(), 2);

    let connection = meta
        .parameter_annotations("app\\fixture\\Fixture", "run", "$connection")
        .unwrap();
    assert_eq!(connection.get("Inject").unwrap().value(), Some(&Value::from("db")));

    let rest = meta.parameter_annotations("app\\fixture\\Fixture", "run", "rest").unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_repeated_requests_are_identical() {
    let meta = facade();
    let first = meta.property_annotations("app\\fixture\\Fixture", "id").unwrap();
    let second = meta.property_annotations("app\\fixture\\Fixture", "id").unwrap();
    assert_eq!(first, second);
    assert_eq!(meta.trees().len(), 1);
}

#[test]
fn test_unknown_members() {
    let meta = facade();
    assert!(matches!(
        meta.property_annotations("app\\fixture\\Fixture", "missing"),
        Err(MetaError::UnresolvedReference { .. })
    ));
    assert!(matches!(
        meta.type_annotations("app\\fixture\\Missing"),
        Err(MetaError::SourceUnavailable { .. })
    ));
}

#[test]
fn test_evaluate_in_type_scope() {
    let meta = facade();
    assert_eq!(
        meta.evaluate("app\\fixture\\Fixture", "self::LIMIT ** 2").unwrap(),
        Value::Int(100)
    );
    assert_eq!(
        meta.evaluate("app\\fixture\\Fixture", "parent::class").unwrap(),
        Value::from("app\\fixture\\Base")
    );
    assert!(matches!(
        meta.evaluate("app\\fixture\\Fixture", "1; 2;"),
        Err(MetaError::InvalidExpression { .. })
    ));
}

#[test]
fn test_imports() {
    let meta = facade();
    let imports = meta.imports("app\\fixture\\Fixture").unwrap();
    assert_eq!(imports.get("Table").map(String::as_str), Some("orm\\Table"));
    assert_eq!(imports.get("Key").map(String::as_str), Some("orm\\Id"));
    assert_eq!(imports.len(), 3);
}

#[test]
fn test_attribute_tables() {
    let mut table = StaticAttributes::new();
    table
        .add(Declaration::of_type("app\\fixture\\Fixture"), "orm\\Table", Array::list([Value::from("compiled")]))
        .add(
            Declaration::property("app\\fixture\\Fixture", "sum"),
            "app\\fixture\\Annotated",
            {
                let mut arguments = Array::new();
                arguments.insert(ArrayKey::from("eval"), Value::from("self::LIMIT * 3"));
                arguments
            },
        );

    let meta = MetaInformation::builder(Arc::new(StaticRuntime::new()))
        .locator(Arc::new(locator()))
        .attributes(Arc::new(table))
        .build()
        .unwrap();
    assert_eq!(meta.source().kind(), SourceKind::Attributes);

    let class = meta.type_annotations("app\\fixture\\Fixture").unwrap();
    assert_eq!(class.get("Table").unwrap().value(), Some(&Value::from("compiled")));
    assert!(!class.contains("Cached"));

    let sum = meta.property_annotations("app\\fixture\\Fixture", "sum").unwrap();
    assert_eq!(sum.get("Annotated").unwrap().arguments, Array::list([Value::Int(30)]));
}

#[test]
fn test_forced_syntax_tree_mode_ignores_tables() {
    let mut table = StaticAttributes::new();
    table.declare(Declaration::of_type("app\\fixture\\Fixture"));

    let options = MetaOptions {
        mode: SourceMode::SyntaxTree,
        ..MetaOptions::default()
    };
    let meta = MetaInformation::builder(Arc::new(StaticRuntime::new()))
        .locator(Arc::new(locator()))
        .attributes(Arc::new(table))
        .options(options)
        .build()
        .unwrap();
    assert_eq!(meta.source().kind(), SourceKind::SyntaxTree);
    assert_eq!(meta.type_annotations("app\\fixture\\Fixture").unwrap().len(), 2);
}
