//! Parsed declaration source
//!
//! A `SyntaxTree` owns one parsed file together with its interner and the
//! scope of every type the file declares. It is built for one requested
//! type, which `type_decl()` returns.

use crate::error::{MetaError, MetaResult};
use crate::scope::Scope;
use reflecta_parser::{
    ConstantDecl, EnumCase, Interner, MethodDecl, Parameter, Parser, PropertyDecl, SourceFile, TypeDecl,
};

/// Raw source of a declaring file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Human-readable origin (a path, `memory://...`), used in errors and
    /// source locations
    pub origin: String,
    pub bytes: Vec<u8>,
}

impl Source {
    pub fn new(origin: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: origin.into(),
            bytes: bytes.into(),
        }
    }
}

/// Position of a type in the file plus its scope.
#[derive(Debug)]
struct Declared {
    block: usize,
    index: usize,
    scope: Scope,
}

#[derive(Debug)]
pub struct SyntaxTree {
    name: String,
    origin: String,
    file: SourceFile,
    interner: Interner,
    declared: Vec<Declared>,
    target: usize,
}

impl SyntaxTree {
    /// Parse `source` and locate the declaration of `type_name` in it.
    pub fn parse(type_name: &str, source: Source) -> MetaResult<SyntaxTree> {
        let name = type_name.trim_start_matches('\\');
        let Source { origin, bytes } = source;

        let text = String::from_utf8(bytes).map_err(|err| MetaError::ParseFailure {
            origin: origin.clone(),
            line: 0,
            column: 0,
            message: format!("source is not valid UTF-8: {}", err),
        })?;

        let parser = Parser::new(&text).map_err(|errors| MetaError::from_lex_errors(&origin, &errors))?;
        let (file, interner) = parser
            .parse()
            .map_err(|errors| MetaError::from_parse_errors(&origin, &errors))?;

        let mut declared = Vec::new();
        for (b, block) in file.blocks.iter().enumerate() {
            for (index, decl) in block.types.iter().enumerate() {
                declared.push(Declared {
                    block: b,
                    index,
                    scope: Scope::from_declaration(block, decl, &interner),
                });
            }
        }

        let target = declared
            .iter()
            .position(|d| d.scope.self_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MetaError::unavailable(name, format!("{} does not declare it", origin)))?;

        Ok(SyntaxTree {
            name: declared[target].scope.self_name().to_string(),
            origin,
            file,
            interner,
            declared,
            target,
        })
    }

    /// Fully qualified name, spelled as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    fn decl_at(&self, declared: &Declared) -> &TypeDecl {
        &self.file.blocks[declared.block].types[declared.index]
    }

    /// Scope of the requested type.
    pub fn scope(&self) -> &Scope {
        &self.declared[self.target].scope
    }

    /// The requested type's declaration.
    pub fn type_decl(&self) -> &TypeDecl {
        self.decl_at(&self.declared[self.target])
    }

    /// Any type declared in this file, by fully qualified name.
    pub fn declaration(&self, name: &str) -> Option<(&TypeDecl, &Scope)> {
        let name = name.trim_start_matches('\\');
        self.declared
            .iter()
            .find(|d| d.scope.self_name().eq_ignore_ascii_case(name))
            .map(|d| (self.decl_at(d), &d.scope))
    }

    pub fn constant(&self, name: &str) -> Option<&ConstantDecl> {
        find_constant(self.type_decl(), name, &self.interner)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        find_property(self.type_decl(), name, &self.interner)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        find_method(self.type_decl(), name, &self.interner)
    }

    pub fn case(&self, name: &str) -> Option<&EnumCase> {
        find_case(self.type_decl(), name, &self.interner)
    }

    /// Parameter of a method, by name (without `$`).
    pub fn parameter(&self, method: &str, name: &str) -> Option<&Parameter> {
        self.method(method)?
            .parameters
            .iter()
            .find(|p| self.interner.resolve(p.name.name) == name)
    }
}

pub fn find_constant<'a>(decl: &'a TypeDecl, name: &str, interner: &Interner) -> Option<&'a ConstantDecl> {
    decl.constants().find(|c| interner.resolve(c.name.name) == name)
}

pub fn find_property<'a>(decl: &'a TypeDecl, name: &str, interner: &Interner) -> Option<&'a PropertyDecl> {
    decl.properties().find(|p| interner.resolve(p.name.name) == name)
}

/// Method names are case-insensitive.
pub fn find_method<'a>(decl: &'a TypeDecl, name: &str, interner: &Interner) -> Option<&'a MethodDecl> {
    decl.methods()
        .find(|m| interner.resolve(m.name.name).eq_ignore_ascii_case(name))
}

pub fn find_case<'a>(decl: &'a TypeDecl, name: &str, interner: &Interner) -> Option<&'a EnumCase> {
    decl.cases().find(|c| interner.resolve(c.name.name) == name)
}
