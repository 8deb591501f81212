use super::{AnnotationSource, Environment, SourceKind};
use crate::annotations::{Annotation, Annotations};
use crate::declaration::{Declaration, MemberRef, ParameterRef};
use crate::error::{MetaError, MetaResult};
use crate::scope::Scope;
use crate::value::{Array, ArrayKey, Value};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// An attribute as compiled by the host: fully qualified name and
/// already-evaluated arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledAttribute {
    pub name: String,
    pub arguments: Array,
}

impl CompiledAttribute {
    pub fn new(name: impl Into<String>, arguments: Array) -> Self {
        Self {
            name: name.into().trim_start_matches('\\').to_string(),
            arguments,
        }
    }
}

/// Native attribute tables of the host runtime.
pub trait AttributeTable: Send + Sync {
    /// Attributes of `declaration` in declaration order, `None` when the
    /// declaration does not exist.
    fn attributes(&self, declaration: &Declaration) -> Option<Vec<CompiledAttribute>>;

    /// Lexical scope of a type, when the host knows it.
    fn scope(&self, type_name: &str) -> Option<Scope> {
        let _ = type_name;
        None
    }
}

/// Annotations from the host's attribute tables.
///
/// Computed arguments and `evaluate` need a scope; it comes from the table,
/// else from the declaring source file, else from the type name alone.
pub struct FromAttributes {
    table: Arc<dyn AttributeTable>,
    env: Environment,
}

impl FromAttributes {
    pub fn new(table: Arc<dyn AttributeTable>, env: Environment) -> Self {
        Self { table, env }
    }

    fn scope(&self, type_name: &str) -> MetaResult<Scope> {
        if let Some(scope) = self.table.scope(type_name) {
            return Ok(scope);
        }
        match self.env.trees.tree(type_name) {
            Ok(tree) => Ok(tree.scope().clone()),
            Err(MetaError::SourceUnavailable { .. }) => Ok(Scope::for_type(type_name)),
            Err(err) => Err(err),
        }
    }

    fn annotations(&self, declaration: Declaration) -> MetaResult<Annotations> {
        let attributes = self.table.attributes(&declaration).ok_or_else(|| {
            MetaError::unresolved(declaration.to_string(), format!("no such {}", declaration.kind()))
        })?;

        let key = ArrayKey::Str(self.env.computed_key.clone());
        let mut scope = None;
        let mut annotations = Annotations::new();
        for attribute in attributes {
            let mut arguments = attribute.arguments;
            if arguments.contains_key(&key) {
                if scope.is_none() {
                    scope = Some(self.scope(declaration.owner())?);
                }
                if let Some(scope) = &scope {
                    arguments = self.env.computed(arguments, scope)?;
                }
            }
            annotations.push(Annotation::new(attribute.name, arguments));
        }
        Ok(annotations)
    }
}

impl std::fmt::Debug for FromAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FromAttributes").field("env", &self.env).finish()
    }
}

impl AnnotationSource for FromAttributes {
    fn kind(&self) -> SourceKind {
        SourceKind::Attributes
    }

    fn of_type(&self, type_name: &str) -> MetaResult<Annotations> {
        self.annotations(Declaration::of_type(type_name))
    }

    fn of_constant(&self, constant: &MemberRef) -> MetaResult<Annotations> {
        self.annotations(Declaration::Constant(constant.clone()))
    }

    fn of_property(&self, property: &MemberRef) -> MetaResult<Annotations> {
        self.annotations(Declaration::Property(property.clone()))
    }

    fn of_method(&self, method: &MemberRef) -> MetaResult<Annotations> {
        self.annotations(Declaration::Method(method.clone()))
    }

    fn of_parameter(&self, parameter: &ParameterRef) -> MetaResult<Annotations> {
        self.annotations(Declaration::Parameter(parameter.clone()))
    }

    fn imports(&self, type_name: &str) -> MetaResult<IndexMap<String, String>> {
        Ok(self.scope(type_name)?.imports().clone())
    }

    fn evaluate(&self, type_name: &str, code: &str) -> MetaResult<Value> {
        let scope = self.scope(type_name)?;
        self.env.evaluator().evaluate_code(code, &scope)
    }
}

// ============================================================================
// In-memory table
// ============================================================================

/// Attribute table held in memory.
///
/// Type and method names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticAttributes {
    entries: FxHashMap<Declaration, Vec<CompiledAttribute>>,
    scopes: FxHashMap<String, Scope>,
}

fn normalize(declaration: &Declaration) -> Declaration {
    fn member(m: &MemberRef, fold_name: bool) -> MemberRef {
        MemberRef {
            owner: m.owner.to_ascii_lowercase(),
            name: if fold_name { m.name.to_ascii_lowercase() } else { m.name.clone() },
        }
    }
    match declaration {
        Declaration::Type(name) => Declaration::Type(name.to_ascii_lowercase()),
        Declaration::Constant(m) => Declaration::Constant(member(m, false)),
        Declaration::Property(m) => Declaration::Property(member(m, false)),
        Declaration::Method(m) => Declaration::Method(member(m, true)),
        Declaration::Parameter(p) => Declaration::Parameter(ParameterRef {
            method: member(&p.method, true),
            name: p.name.clone(),
        }),
    }
}

impl StaticAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `declaration` known without attributes.
    pub fn declare(&mut self, declaration: Declaration) -> &mut Self {
        self.entries.entry(normalize(&declaration)).or_default();
        self
    }

    pub fn add(&mut self, declaration: Declaration, name: &str, arguments: Array) -> &mut Self {
        self.entries
            .entry(normalize(&declaration))
            .or_default()
            .push(CompiledAttribute::new(name, arguments));
        self
    }

    pub fn set_scope(&mut self, scope: Scope) -> &mut Self {
        self.scopes.insert(scope.self_name().to_ascii_lowercase(), scope);
        self
    }
}

impl AttributeTable for StaticAttributes {
    fn attributes(&self, declaration: &Declaration) -> Option<Vec<CompiledAttribute>> {
        self.entries.get(&normalize(declaration)).cloned()
    }

    fn scope(&self, type_name: &str) -> Option<Scope> {
        self.scopes
            .get(&type_name.trim_start_matches('\\').to_ascii_lowercase())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryLocator, TreeCache};
    use crate::runtime::StaticRuntime;

    fn source(table: StaticAttributes, locator: MemoryLocator) -> FromAttributes {
        let trees = Arc::new(TreeCache::new(Arc::new(locator)));
        let env = Environment::new(trees, Arc::new(StaticRuntime::new()));
        FromAttributes::new(Arc::new(table), env)
    }

    #[test]
    fn test_reads_table_in_order() {
        let mut table = StaticAttributes::new();
        table
            .add(Declaration::of_type("app\\User"), "orm\\Table", Array::list([Value::from("users")]))
            .add(Declaration::of_type("app\\User"), "\\app\\Cached", Array::new())
            .declare(Declaration::property("app\\User", "name"));

        let source = source(table, MemoryLocator::new());
        let annotations = source.of_type("APP\\user").unwrap();
        let names: Vec<_> = annotations.iter().map(|a| a.type_name.as_str()).collect();
        assert_eq!(names, ["orm\\Table", "app\\Cached"]);

        assert!(source.of_property(&MemberRef::new("app\\User", "name")).unwrap().is_empty());
        assert!(matches!(
            source.of_property(&MemberRef::new("app\\User", "missing")),
            Err(MetaError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_computed_argument_uses_table_scope() {
        let mut arguments = Array::new();
        arguments.insert(ArrayKey::from("eval"), Value::from("Date::class"));

        let mut table = StaticAttributes::new();
        table
            .add(Declaration::method("app\\User", "created"), "app\\Type", arguments)
            .set_scope(Scope::new(Some("app"), "app\\User").with_import("Date", "util\\Date"));

        let source = source(table, MemoryLocator::new());
        let annotations = source.of_method(&MemberRef::new("app\\User", "Created")).unwrap();
        assert_eq!(
            annotations.get("Type").unwrap().arguments,
            Array::list([Value::from("util\\Date")])
        );
    }

    #[test]
    fn test_scope_falls_back_to_source_file() {
        let locator = MemoryLocator::new().with(
            "app\\User",
            "<?php namespace app; use util\\Date; class User { const MAX = 3; }",
        );
        let source = source(StaticAttributes::new(), locator);
        assert_eq!(source.imports("app\\User").unwrap().get("Date").map(String::as_str), Some("util\\Date"));
        assert_eq!(source.evaluate("app\\User", "self::MAX * 2").unwrap(), Value::Int(6));
    }

    #[test]
    fn test_scope_without_source() {
        let source = source(StaticAttributes::new(), MemoryLocator::new());
        assert!(source.imports("app\\Ghost").unwrap().is_empty());
        assert_eq!(source.evaluate("app\\Ghost", "Other::class").unwrap(), Value::from("app\\Other"));
    }
}
