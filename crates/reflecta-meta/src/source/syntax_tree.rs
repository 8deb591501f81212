use super::{AnnotationSource, Environment, SourceKind};
use crate::annotations::{Annotation, Annotations};
use crate::declaration::{MemberRef, ParameterRef};
use crate::error::{MetaError, MetaResult};
use crate::eval::Frame;
use crate::tree::SyntaxTree;
use crate::value::Value;
use indexmap::IndexMap;
use reflecta_parser::Attribute;
use std::sync::Arc;

/// Annotations from attributes in the declaring source file.
#[derive(Debug, Clone)]
pub struct FromSyntaxTree {
    env: Environment,
}

impl FromSyntaxTree {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    fn tree(&self, type_name: &str) -> MetaResult<Arc<SyntaxTree>> {
        self.env.trees.tree(type_name)
    }

    /// Resolve names and evaluate arguments in the tree's scope.
    fn annotations(&self, attributes: &[Attribute], tree: &SyntaxTree) -> MetaResult<Annotations> {
        let frame = Frame::of_tree(tree);
        let evaluator = self.env.evaluator();
        attributes
            .iter()
            .map(|attribute| {
                let name = tree.scope().resolve_name(&attribute.name, tree.interner());
                let arguments = evaluator.arguments(&attribute.arguments, &frame)?;
                let arguments = self.env.computed(arguments, tree.scope())?;
                Ok(Annotation::new(name, arguments))
            })
            .collect()
    }
}

fn missing(member: &MemberRef, kind: &str) -> MetaError {
    MetaError::unresolved(
        format!("{}::{}", member.owner, member.name),
        format!("no such {}", kind),
    )
}

impl AnnotationSource for FromSyntaxTree {
    fn kind(&self) -> SourceKind {
        SourceKind::SyntaxTree
    }

    fn of_type(&self, type_name: &str) -> MetaResult<Annotations> {
        let tree = self.tree(type_name)?;
        self.annotations(&tree.type_decl().attributes, &tree)
    }

    fn of_constant(&self, constant: &MemberRef) -> MetaResult<Annotations> {
        let tree = self.tree(&constant.owner)?;
        if let Some(decl) = tree.constant(&constant.name) {
            return self.annotations(&decl.attributes, &tree);
        }
        match tree.case(&constant.name) {
            Some(case) => self.annotations(&case.attributes, &tree),
            None => Err(missing(constant, "constant")),
        }
    }

    fn of_property(&self, property: &MemberRef) -> MetaResult<Annotations> {
        let tree = self.tree(&property.owner)?;
        let decl = tree
            .property(&property.name)
            .ok_or_else(|| missing(property, "property"))?;
        self.annotations(&decl.attributes, &tree)
    }

    fn of_method(&self, method: &MemberRef) -> MetaResult<Annotations> {
        let tree = self.tree(&method.owner)?;
        let decl = tree.method(&method.name).ok_or_else(|| missing(method, "method"))?;
        self.annotations(&decl.attributes, &tree)
    }

    fn of_parameter(&self, parameter: &ParameterRef) -> MetaResult<Annotations> {
        let tree = self.tree(&parameter.method.owner)?;
        let decl = tree
            .parameter(&parameter.method.name, &parameter.name)
            .ok_or_else(|| {
                MetaError::unresolved(
                    format!("{}::{}(${})", parameter.method.owner, parameter.method.name, parameter.name),
                    "no such parameter",
                )
            })?;
        self.annotations(&decl.attributes, &tree)
    }

    fn imports(&self, type_name: &str) -> MetaResult<IndexMap<String, String>> {
        Ok(self.tree(type_name)?.scope().imports().clone())
    }

    fn evaluate(&self, type_name: &str, code: &str) -> MetaResult<Value> {
        let tree = self.tree(type_name)?;
        self.env.evaluator().evaluate_code(code, tree.scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryLocator, TreeCache};
    use crate::runtime::StaticRuntime;
    use crate::value::{Array, ArrayKey};

    const SOURCE: &str = r#"<?php
namespace app;

use orm\Table;
use orm\Column as Col;

#[Table('users'), Cached]
class User {
    const int LIMIT = 10;

    #[Col(name: 'user_id', size: self::LIMIT * 2)]
    public int $id;

    #[Values(eval: 'self::LIMIT + 1')]
    public array $range;

    #[Test]
    public function run(#[Inject('db')] $connection, int $times = 1) { return $times; }
}
"#;

    fn source() -> FromSyntaxTree {
        let locator = MemoryLocator::new().with("app\\User", SOURCE);
        let trees = Arc::new(TreeCache::new(Arc::new(locator)));
        FromSyntaxTree::new(Environment::new(trees, Arc::new(StaticRuntime::new())))
    }

    #[test]
    fn test_type_annotations_resolve_imports() {
        let annotations = source().of_type("app\\User").unwrap();
        let names: Vec<_> = annotations.iter().map(|a| a.type_name.as_str()).collect();
        assert_eq!(names, ["orm\\Table", "app\\Cached"]);
        assert_eq!(annotations.get("Table").unwrap().value(), Some(&Value::from("users")));
    }

    #[test]
    fn test_property_arguments_are_evaluated_in_scope() {
        let annotations = source().of_property(&MemberRef::new("app\\User", "id")).unwrap();
        let column = annotations.get("orm\\Column").unwrap();
        assert_eq!(column.argument("name"), Some(&Value::from("user_id")));
        assert_eq!(column.argument("size"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_computed_argument() {
        let annotations = source().of_property(&MemberRef::new("app\\User", "range")).unwrap();
        assert_eq!(
            annotations.get("Values").unwrap().arguments,
            Array::list([Value::Int(11)])
        );
    }

    #[test]
    fn test_method_and_parameter() {
        let source = source();
        assert!(source.of_method(&MemberRef::new("app\\User", "RUN")).unwrap().contains("Test"));

        let inject = source
            .of_parameter(&ParameterRef::new("app\\User", "run", "connection"))
            .unwrap();
        assert_eq!(inject.get("Inject").unwrap().argument(ArrayKey::Int(0)), Some(&Value::from("db")));

        let plain = source.of_parameter(&ParameterRef::new("app\\User", "run", "times")).unwrap();
        assert!(plain.is_empty());
    }

    #[test]
    fn test_missing_members() {
        let source = source();
        assert!(matches!(
            source.of_property(&MemberRef::new("app\\User", "nope")),
            Err(MetaError::UnresolvedReference { .. })
        ));
        assert!(matches!(source.of_type("app\\Nope"), Err(MetaError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_imports_and_evaluate() {
        let source = source();
        let imports = source.imports("app\\User").unwrap();
        assert_eq!(imports.get("Col").map(String::as_str), Some("orm\\Column"));
        assert_eq!(source.evaluate("app\\User", "self::LIMIT * 3").unwrap(), Value::Int(30));
        assert_eq!(source.evaluate("app\\User", "Col::class").unwrap(), Value::from("orm\\Column"));
    }
}
