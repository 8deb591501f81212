//! Metadata facade
//!
//! The entry point reflection code talks to. Every request first checks
//! the precomputed meta cache; an entry for the declaration there is the
//! whole answer. Otherwise annotations come from the active annotation
//! source, and comments, types and locations from the declaring syntax
//! tree.

use crate::annotations::Annotations;
use crate::cache::{FileSystemLocator, SourceLocator, TreeCache};
use crate::config::MetaOptions;
use crate::declaration::{Declaration, MemberRef, ParameterRef};
use crate::docblock::{self, Tags};
use crate::error::{MetaError, MetaResult};
use crate::meta_cache::{MetaCache, MetaEntry, RawAnnotations};
use crate::runtime::Runtime;
use crate::scope::Scope;
use crate::source::{select_source, AnnotationSource, AttributeTable, Environment};
use crate::tree::SyntaxTree;
use crate::types::{reconcile, Constraint, TypeExpr};
use crate::value::Value;
use indexmap::IndexMap;
use reflecta_parser::{DocComment, Span};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Where a declaration is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub origin: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.origin, self.line, self.column)
    }
}

/// A property known only from documentation or the meta cache.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualProperty {
    pub name: String,
    /// Type in whose documentation the property was found
    pub declared_in: String,
    pub constraint: Option<Constraint>,
    pub readable: bool,
    pub writable: bool,
}

pub struct MetaInformationBuilder {
    runtime: Arc<dyn Runtime>,
    locator: Option<Arc<dyn SourceLocator>>,
    attributes: Option<Arc<dyn AttributeTable>>,
    meta: MetaCache,
    options: MetaOptions,
}

impl MetaInformationBuilder {
    /// Source locator; defaults to a file system locator over the
    /// configured roots.
    pub fn locator(mut self, locator: Arc<dyn SourceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Native attribute tables, when the host has them.
    pub fn attributes(mut self, table: Arc<dyn AttributeTable>) -> Self {
        self.attributes = Some(table);
        self
    }

    pub fn meta_cache(mut self, meta: MetaCache) -> Self {
        self.meta = meta;
        self
    }

    pub fn options(mut self, options: MetaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> MetaResult<MetaInformation> {
        let options = self.options;
        options.validate()?;

        let locator = match self.locator {
            Some(locator) => locator,
            None => Arc::new(
                FileSystemLocator::new(options.sources.roots.clone())
                    .with_extensions(options.sources.extensions.clone()),
            ) as Arc<dyn SourceLocator>,
        };
        let trees = Arc::new(TreeCache::with_capacity(locator, options.cache_capacity));
        let env = Environment::new(trees, self.runtime)
            .with_computed_key(options.computed_key.clone())
            .with_max_depth(options.max_eval_depth);
        let source = select_source(options.mode, self.attributes, env.clone())?;

        Ok(MetaInformation {
            env,
            source,
            meta: self.meta,
        })
    }
}

pub struct MetaInformation {
    env: Environment,
    source: Arc<dyn AnnotationSource>,
    meta: MetaCache,
}

fn missing(declaration: &Declaration) -> MetaError {
    MetaError::unresolved(declaration.to_string(), format!("no such {}", declaration.kind()))
}

fn location(tree: &SyntaxTree, span: &Span) -> SourceLocation {
    SourceLocation {
        origin: tree.origin().to_string(),
        line: span.line,
        column: span.column,
    }
}

fn doc_text(tree: &SyntaxTree, doc: Option<DocComment>) -> Option<String> {
    doc.map(|d| tree.interner().resolve(d.text).to_string())
}

/// Documented type text, resolved.
fn documented(ty: Option<&str>, scope: &Scope) -> MetaResult<Option<TypeExpr>> {
    ty.map(|t| TypeExpr::parse(t, scope)).transpose()
}

/// Reconcile a declared hint with a documented type. A documented type
/// outside the grammar is dropped when a hint is declared.
fn constrain(declared: Option<TypeExpr>, doc: Option<&str>, scope: &Scope) -> MetaResult<Option<Constraint>> {
    match documented(doc, scope) {
        Ok(documented) => Ok(reconcile(declared, documented)),
        Err(err) if declared.is_some() => {
            trace!(error = %err, "documented type ignored");
            Ok(reconcile(declared, None))
        }
        Err(err) => Err(err),
    }
}

struct VirtualLevel {
    virtuals: Vec<VirtualProperty>,
    materialized: Vec<String>,
    parent: Option<String>,
}

impl MetaInformation {
    pub fn builder(runtime: Arc<dyn Runtime>) -> MetaInformationBuilder {
        MetaInformationBuilder {
            runtime,
            locator: None,
            attributes: None,
            meta: MetaCache::new(),
            options: MetaOptions::default(),
        }
    }

    pub fn source(&self) -> &dyn AnnotationSource {
        self.source.as_ref()
    }

    pub fn trees(&self) -> &TreeCache {
        &self.env.trees
    }

    pub fn meta_cache(&self) -> &MetaCache {
        &self.meta
    }

    fn tree(&self, type_name: &str) -> MetaResult<Arc<SyntaxTree>> {
        self.env.trees.tree(type_name)
    }

    fn entry(&self, type_name: &str) -> Option<&MetaEntry> {
        self.meta.get(type_name)
    }

    /// Scope for resolving type names of `type_name`: the meta cache's
    /// imports when recorded, else the declaring file's scope.
    fn scope_of(&self, type_name: &str) -> MetaResult<Scope> {
        let entry = self.entry(type_name);
        if let Some(imports) = entry.and_then(|e| e.imports.as_ref()) {
            let mut scope = Scope::for_type(type_name);
            if let Some(parent) = entry.and_then(|e| e.parent.as_deref()) {
                scope = scope.with_parent(parent.trim_start_matches('\\'));
            }
            for (alias, target) in imports {
                scope = scope.with_import(alias.clone(), target.trim_start_matches('\\'));
            }
            return Ok(scope);
        }
        match self.tree(type_name) {
            Ok(tree) => Ok(tree.scope().clone()),
            Err(MetaError::SourceUnavailable { .. }) => Ok(Scope::for_type(type_name)),
            Err(err) => Err(err),
        }
    }

    /// Type text recorded in the meta cache, as a declared constraint.
    fn meta_type(&self, type_name: &str, ty: Option<&str>) -> MetaResult<Option<Constraint>> {
        match ty {
            Some(ty) => Ok(Some(Constraint::declared(TypeExpr::parse(ty, &self.scope_of(type_name)?)?))),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    fn meta_annotations(&self, declaration: &Declaration) -> Option<(&MetaEntry, &RawAnnotations)> {
        let entry = self.entry(declaration.owner())?;
        let raw = match declaration {
            Declaration::Type(_) => &entry.class.annotations,
            Declaration::Constant(m) => &entry.constants.get(&m.name)?.annotations,
            Declaration::Property(m) => &entry.properties.get(&m.name)?.annotations,
            Declaration::Method(m) => &entry.method(&m.name)?.annotations,
            Declaration::Parameter(p) => &entry.method(&p.method.name)?.param(&p.name)?.annotations,
        };
        Some((entry, raw))
    }

    /// Annotations of any declaration.
    pub fn annotations(&self, declaration: &Declaration) -> MetaResult<Annotations> {
        if let Some((entry, raw)) = self.meta_annotations(declaration) {
            trace!(declaration = %declaration, "annotations from meta cache");
            return Ok(entry.annotations(raw));
        }
        match declaration {
            Declaration::Type(name) => self.source.of_type(name),
            Declaration::Constant(m) => self.source.of_constant(m),
            Declaration::Property(m) => self.source.of_property(m),
            Declaration::Method(m) => self.source.of_method(m),
            Declaration::Parameter(p) => self.source.of_parameter(p),
        }
    }

    pub fn type_annotations(&self, type_name: &str) -> MetaResult<Annotations> {
        self.annotations(&Declaration::of_type(type_name))
    }

    pub fn constant_annotations(&self, type_name: &str, name: &str) -> MetaResult<Annotations> {
        self.annotations(&Declaration::constant(type_name, name))
    }

    pub fn property_annotations(&self, type_name: &str, name: &str) -> MetaResult<Annotations> {
        self.annotations(&Declaration::property(type_name, name))
    }

    pub fn method_annotations(&self, type_name: &str, name: &str) -> MetaResult<Annotations> {
        self.annotations(&Declaration::method(type_name, name))
    }

    pub fn parameter_annotations(&self, type_name: &str, method: &str, parameter: &str) -> MetaResult<Annotations> {
        self.annotations(&Declaration::parameter(type_name, method, parameter))
    }

    // ========================================================================
    // Comments and tags
    // ========================================================================

    fn meta_comment(&self, declaration: &Declaration) -> Option<Option<&str>> {
        let entry = self.entry(declaration.owner())?;
        let comment = match declaration {
            Declaration::Type(_) => &entry.class.comment,
            Declaration::Constant(m) => &entry.constants.get(&m.name)?.comment,
            Declaration::Property(m) => &entry.properties.get(&m.name)?.comment,
            Declaration::Method(m) => &entry.method(&m.name)?.comment,
            Declaration::Parameter(_) => return None,
        };
        Some(comment.as_deref())
    }

    fn tree_comment(&self, declaration: &Declaration) -> MetaResult<Option<String>> {
        let tree = self.tree(declaration.owner())?;
        let doc = match declaration {
            Declaration::Type(_) => tree.type_decl().doc_comment,
            Declaration::Constant(m) => match tree.constant(&m.name) {
                Some(constant) => constant.doc_comment,
                None => tree.case(&m.name).ok_or_else(|| missing(declaration))?.doc_comment,
            },
            Declaration::Property(m) => tree.property(&m.name).ok_or_else(|| missing(declaration))?.doc_comment,
            Declaration::Method(m) => tree.method(&m.name).ok_or_else(|| missing(declaration))?.doc_comment,
            Declaration::Parameter(p) => {
                tree.parameter(&p.method.name, &p.name)
                    .ok_or_else(|| missing(declaration))?
                    .doc_comment
            }
        };
        Ok(doc_text(&tree, doc))
    }

    /// Documentation comment as written, `/**` and `*/` included.
    pub fn raw_comment(&self, declaration: &Declaration) -> MetaResult<Option<String>> {
        if let Some(comment) = self.meta_comment(declaration) {
            return Ok(comment.map(str::to_string));
        }
        self.tree_comment(declaration)
    }

    /// Documentation text without comment markers.
    pub fn comment(&self, declaration: &Declaration) -> MetaResult<Option<String>> {
        Ok(self.raw_comment(declaration)?.map(|c| docblock::text(&c)))
    }

    pub fn type_comment(&self, type_name: &str) -> MetaResult<Option<String>> {
        self.comment(&Declaration::of_type(type_name))
    }

    pub fn constant_comment(&self, type_name: &str, name: &str) -> MetaResult<Option<String>> {
        self.comment(&Declaration::constant(type_name, name))
    }

    pub fn property_comment(&self, type_name: &str, name: &str) -> MetaResult<Option<String>> {
        self.comment(&Declaration::property(type_name, name))
    }

    pub fn method_comment(&self, type_name: &str, name: &str) -> MetaResult<Option<String>> {
        self.comment(&Declaration::method(type_name, name))
    }

    /// `@tag value` lines of a declaration's documentation.
    pub fn tags(&self, declaration: &Declaration) -> MetaResult<Tags> {
        Ok(self
            .raw_comment(declaration)?
            .map(|c| docblock::tags(&c))
            .unwrap_or_default())
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Direct parent class, if any.
    pub fn type_parent(&self, type_name: &str) -> MetaResult<Option<String>> {
        let entry = self.entry(type_name);
        if let Some(parent) = entry.and_then(|e| e.parent.as_deref()) {
            return Ok(Some(parent.trim_start_matches('\\').to_string()));
        }
        match self.tree(type_name) {
            Ok(tree) => Ok(tree.scope().parent().map(str::to_string)),
            Err(MetaError::SourceUnavailable { .. }) if entry.is_some() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn property_constraint(&self, type_name: &str, name: &str) -> MetaResult<Option<Constraint>> {
        if let Some(member) = self.entry(type_name).and_then(|e| e.properties.get(name)) {
            return self.meta_type(type_name, member.ty.as_deref());
        }

        let tree = self.tree(type_name)?;
        let property = tree
            .property(name)
            .ok_or_else(|| missing(&Declaration::property(type_name, name)))?;
        let scope = tree.scope();

        let declared = property
            .type_hint
            .as_ref()
            .map(|hint| TypeExpr::from_hint(hint, scope, tree.interner()))
            .transpose()?;

        let mut doc_type = doc_text(&tree, property.doc_comment).and_then(|c| docblock::var_type(&c));
        if doc_type.is_none() && property.promoted {
            doc_type = tree
                .method("__construct")
                .and_then(|ctor| doc_text(&tree, ctor.doc_comment))
                .and_then(|c| docblock::param_types(&c).shift_remove(name));
        }

        constrain(declared, doc_type.as_deref(), scope)
    }

    pub fn method_return(&self, type_name: &str, method: &str) -> MetaResult<Option<Constraint>> {
        if let Some(meta) = self.entry(type_name).and_then(|e| e.method(method)) {
            return self.meta_type(type_name, meta.returns.as_deref());
        }

        let tree = self.tree(type_name)?;
        let decl = tree
            .method(method)
            .ok_or_else(|| missing(&Declaration::method(type_name, method)))?;
        let scope = tree.scope();

        let declared = decl
            .return_type
            .as_ref()
            .map(|hint| TypeExpr::from_hint(hint, scope, tree.interner()))
            .transpose()?;
        let doc_type = doc_text(&tree, decl.doc_comment).and_then(|c| docblock::return_type(&c));

        constrain(declared, doc_type.as_deref(), scope)
    }

    /// Constraint of every parameter, in declaration order.
    pub fn parameter_constraints(
        &self,
        type_name: &str,
        method: &str,
    ) -> MetaResult<IndexMap<String, Option<Constraint>>> {
        if let Some(meta) = self.entry(type_name).and_then(|e| e.method(method)) {
            return meta
                .params
                .iter()
                .map(|p| Ok((p.name.clone(), self.meta_type(type_name, p.ty.as_deref())?)))
                .collect();
        }

        let tree = self.tree(type_name)?;
        let decl = tree
            .method(method)
            .ok_or_else(|| missing(&Declaration::method(type_name, method)))?;
        let scope = tree.scope();
        let mut doc_types = doc_text(&tree, decl.doc_comment)
            .map(|c| docblock::param_types(&c))
            .unwrap_or_default();

        decl.parameters
            .iter()
            .map(|parameter| {
                let name = tree.interner().resolve(parameter.name.name).to_string();
                let declared = parameter
                    .type_hint
                    .as_ref()
                    .map(|hint| TypeExpr::from_hint(hint, scope, tree.interner()))
                    .transpose()?;
                let doc_type = doc_types.shift_remove(&name);
                let constraint = constrain(declared, doc_type.as_deref(), scope)?;
                Ok((name, constraint))
            })
            .collect()
    }

    // ========================================================================
    // Virtual properties
    // ========================================================================

    fn virtual_level(&self, type_name: &str) -> MetaResult<VirtualLevel> {
        if let Some(entry) = self.entry(type_name) {
            let scope = self.scope_of(type_name)?;
            let virtuals = entry
                .virtual_properties
                .iter()
                .map(|(name, v)| {
                    Ok(VirtualProperty {
                        name: name.clone(),
                        declared_in: type_name.to_string(),
                        constraint: documented(v.ty.as_deref(), &scope)?.map(Constraint::documented),
                        readable: v.readable,
                        writable: v.writable,
                    })
                })
                .collect::<MetaResult<Vec<_>>>()?;

            let mut materialized: Vec<String> = entry.properties.keys().cloned().collect();
            if let Ok(tree) = self.tree(type_name) {
                materialized.extend(
                    tree.type_decl()
                        .properties()
                        .map(|p| tree.interner().resolve(p.name.name).to_string()),
                );
            }
            return Ok(VirtualLevel {
                virtuals,
                materialized,
                parent: self.type_parent(type_name)?,
            });
        }

        let tree = self.tree(type_name)?;
        let scope = tree.scope();
        let tags = doc_text(&tree, tree.type_decl().doc_comment)
            .map(|c| docblock::property_tags(&c))
            .unwrap_or_default();
        let virtuals = tags
            .into_iter()
            .map(|tag| {
                Ok(VirtualProperty {
                    declared_in: tree.name().to_string(),
                    constraint: documented(tag.ty.as_deref(), scope)?.map(Constraint::documented),
                    name: tag.name,
                    readable: tag.readable,
                    writable: tag.writable,
                })
            })
            .collect::<MetaResult<Vec<_>>>()?;

        Ok(VirtualLevel {
            virtuals,
            materialized: tree
                .type_decl()
                .properties()
                .map(|p| tree.interner().resolve(p.name.name).to_string())
                .collect(),
            parent: scope.parent().map(str::to_string),
        })
    }

    /// Virtual properties of a type and its ancestors. The nearest
    /// declaration of a name wins; names declared as real properties
    /// anywhere in the chain are left out. Ancestors without source end
    /// the walk.
    pub fn virtual_properties(&self, type_name: &str) -> MetaResult<IndexMap<String, VirtualProperty>> {
        let mut found: IndexMap<String, VirtualProperty> = IndexMap::new();
        let mut materialized = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut current = Some(type_name.trim_start_matches('\\').to_string());
        let mut first = true;

        while let Some(name) = current.take() {
            if !visited.insert(name.to_ascii_lowercase()) {
                break;
            }
            let level = match self.virtual_level(&name) {
                Ok(level) => level,
                Err(MetaError::SourceUnavailable { .. }) if !first => break,
                Err(err) => return Err(err),
            };
            first = false;

            materialized.extend(level.materialized);
            for property in level.virtuals {
                found.entry(property.name.clone()).or_insert(property);
            }
            current = level.parent;
        }

        found.retain(|name, _| !materialized.contains(name));
        Ok(found)
    }

    pub fn virtual_property(&self, type_name: &str, name: &str) -> MetaResult<Option<VirtualProperty>> {
        Ok(self.virtual_properties(type_name)?.shift_remove(name))
    }

    // ========================================================================
    // Scope, evaluation, locations
    // ========================================================================

    pub fn imports(&self, type_name: &str) -> MetaResult<IndexMap<String, String>> {
        if let Some(imports) = self.entry(type_name).and_then(|e| e.imports.as_ref()) {
            return Ok(imports.clone());
        }
        self.source.imports(type_name)
    }

    /// Evaluate `code` as one expression in the scope of `type_name`.
    pub fn evaluate(&self, type_name: &str, code: &str) -> MetaResult<Value> {
        self.source.evaluate(type_name, code)
    }

    pub fn location(&self, declaration: &Declaration) -> MetaResult<SourceLocation> {
        let tree = self.tree(declaration.owner())?;
        let span = match declaration {
            Declaration::Type(_) => tree.type_decl().span,
            Declaration::Constant(MemberRef { name, .. }) => match tree.constant(name) {
                Some(constant) => constant.span,
                None => tree.case(name).ok_or_else(|| missing(declaration))?.span,
            },
            Declaration::Property(MemberRef { name, .. }) => {
                tree.property(name).ok_or_else(|| missing(declaration))?.span
            }
            Declaration::Method(MemberRef { name, .. }) => tree.method(name).ok_or_else(|| missing(declaration))?.span,
            Declaration::Parameter(ParameterRef { method, name }) => {
                tree.parameter(&method.name, name)
                    .ok_or_else(|| missing(declaration))?
                    .span
            }
        };
        Ok(location(&tree, &span))
    }
}

impl fmt::Debug for MetaInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaInformation")
            .field("source", &self.source.kind())
            .field("env", &self.env)
            .field("meta_entries", &self.meta.len())
            .finish()
    }
}
