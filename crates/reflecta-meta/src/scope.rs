//! Lexical scope of a type declaration
//!
//! A `Scope` holds what a name inside a declaration can refer to: the
//! enclosing namespace, `use` imports, the type's own name and its parent.
//! Class names resolve through imports first, then the current namespace.

use crate::error::{MetaError, MetaResult};
use indexmap::IndexMap;
use reflecta_parser::{ClassRef, Interner, Name, NameKind, NamespaceBlock, TypeDecl, UseKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    namespace: Option<String>,
    /// Local alias as written → fully qualified class name
    imports: IndexMap<String, String>,
    functions: IndexMap<String, String>,
    constants: IndexMap<String, String>,
    self_name: String,
    parent: Option<String>,
    interfaces: Vec<String>,
}

/// Namespace part of a fully qualified name.
pub fn namespace_of(name: &str) -> Option<&str> {
    name.rfind('\\').map(|idx| &name[..idx])
}

/// Last segment of a fully qualified name.
pub fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

impl Scope {
    pub fn new(namespace: Option<&str>, self_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            self_name: self_name.into(),
            ..Self::default()
        }
    }

    /// Scope of a type with no known source: its namespace, no imports.
    pub fn for_type(name: &str) -> Self {
        let name = name.trim_start_matches('\\');
        Scope::new(namespace_of(name), name)
    }

    pub fn with_import(mut self, alias: impl Into<String>, name: impl Into<String>) -> Self {
        self.imports.insert(alias.into(), name.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Build the scope of `decl`, declared in `block`.
    pub fn from_declaration(block: &NamespaceBlock, decl: &TypeDecl, interner: &Interner) -> Self {
        let namespace = block.name.map(|n| n.as_str(interner).to_string());
        let short = interner.resolve(decl.name.name);
        let self_name = match &namespace {
            Some(ns) => format!("{}\\{}", ns, short),
            None => short.to_string(),
        };

        let mut scope = Scope::new(namespace.as_deref(), self_name);
        for import in &block.uses {
            let alias = import.local_name(interner).to_string();
            let target = import.name.as_str(interner).to_string();
            match import.kind {
                UseKind::Class => scope.imports.insert(alias, target),
                UseKind::Function => scope.functions.insert(alias, target),
                UseKind::Constant => scope.constants.insert(alias, target),
            };
        }

        scope.parent = decl.parent.map(|p| scope.resolve_name(&p, interner));
        scope.interfaces = decl
            .interfaces
            .iter()
            .map(|i| scope.resolve_name(i, interner))
            .collect();
        scope
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Fully qualified name of the declaration (`self`, `static`).
    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Class imports: local alias → fully qualified name, in source order.
    pub fn imports(&self) -> &IndexMap<String, String> {
        &self.imports
    }

    pub fn function_imports(&self) -> &IndexMap<String, String> {
        &self.functions
    }

    pub fn constant_imports(&self) -> &IndexMap<String, String> {
        &self.constants
    }

    /// Parent class, or `UnresolvedReference` when there is none.
    pub fn require_parent(&self) -> MetaResult<&str> {
        self.parent.as_deref().ok_or_else(|| {
            MetaError::unresolved("parent", format!("{} does not have a parent", self.self_name))
        })
    }

    fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Resolve a class name as written in source: `\a\B`, `namespace\B`,
    /// `Alias\B`, `B`. `self`, `static` and `parent` are handled as well.
    pub fn resolve_class(&self, name: &str) -> MetaResult<String> {
        if let Some(absolute) = name.strip_prefix('\\') {
            return Ok(absolute.to_string());
        }
        if name.get(..10).is_some_and(|p| p.eq_ignore_ascii_case("namespace\\")) {
            if let Some(rest) = name.get(10..).filter(|rest| !rest.is_empty()) {
                return Ok(self.qualify(rest));
            }
        }
        if name.eq_ignore_ascii_case("self") || name.eq_ignore_ascii_case("static") {
            return Ok(self.self_name.clone());
        }
        if name.eq_ignore_ascii_case("parent") {
            return self.require_parent().map(str::to_string);
        }
        Ok(self.resolve_relative(name))
    }

    /// First segment through the imports, else the current namespace.
    fn resolve_relative(&self, name: &str) -> String {
        let (first, rest) = match name.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };
        let imported = self
            .imports
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(first))
            .map(|(_, target)| target);

        match (imported, rest) {
            (Some(target), Some(rest)) => format!("{}\\{}", target, rest),
            (Some(target), None) => target.clone(),
            (None, _) => self.qualify(name),
        }
    }

    /// Resolve a parsed class name.
    pub fn resolve_name(&self, name: &Name, interner: &Interner) -> String {
        let text = name.as_str(interner);
        match name.kind {
            NameKind::FullyQualified => text.to_string(),
            NameKind::Relative => self.qualify(text),
            NameKind::Unqualified | NameKind::Qualified => self.resolve_relative(text),
        }
    }

    /// Resolve the class operand of `new` or `::`.
    pub fn resolve_class_ref(&self, class: &ClassRef, interner: &Interner) -> MetaResult<String> {
        match class {
            ClassRef::SelfType(_) | ClassRef::Static(_) => Ok(self.self_name.clone()),
            ClassRef::Parent(_) => self.require_parent().map(str::to_string),
            ClassRef::Named(name) => Ok(self.resolve_name(name, interner)),
        }
    }

    /// Names a bare constant may refer to, in lookup order. Unqualified
    /// names fall back to the global namespace.
    pub fn constant_candidates(&self, name: &Name, interner: &Interner) -> Vec<String> {
        let text = name.as_str(interner);
        match name.kind {
            NameKind::FullyQualified => vec![text.to_string()],
            NameKind::Relative => vec![self.qualify(text)],
            NameKind::Qualified => vec![self.resolve_relative(text)],
            NameKind::Unqualified => {
                if let Some(target) = self.constants.get(text) {
                    return vec![target.clone()];
                }
                let mut candidates = vec![self.qualify(text)];
                if self.namespace.is_some() {
                    candidates.push(text.to_string());
                }
                candidates
            }
        }
    }
}
