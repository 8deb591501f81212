//! Abstract Syntax Tree for declaration source files.
//!
//! The tree keeps what metadata resolution needs:
//! - Namespace blocks with their imports
//! - Type declarations (classes, interfaces, traits, enums) and members
//! - Attributes and documentation comments
//! - Constant expressions (initializers, defaults, attribute arguments)
//!
//! Every AST node includes a `Span` for precise source location tracking.
//! Strings are interned; resolve them with the `Interner` returned by the
//! parser.

use crate::interner::{Interner, Symbol};
use crate::token::Span;

pub mod declaration;
pub mod expression;

pub use declaration::*;
pub use expression::*;

/// Root node: a parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Namespace blocks in source order. Files without a namespace
    /// statement have a single block with `name: None`.
    pub blocks: Vec<NamespaceBlock>,

    /// Span covering the entire file
    pub span: Span,
}

impl SourceFile {
    /// All type declarations with the block that declares them.
    pub fn types(&self) -> impl Iterator<Item = (&NamespaceBlock, &TypeDecl)> {
        self.blocks
            .iter()
            .flat_map(|block| block.types.iter().map(move |decl| (block, decl)))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.types.is_empty())
    }
}

/// Identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: Symbol,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: Symbol, span: Span) -> Self {
        Self { name, span }
    }
}

/// How a name was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// `Value`
    Unqualified,
    /// `util\Date`
    Qualified,
    /// `\lang\Value`
    FullyQualified,
    /// `namespace\Value`
    Relative,
}

/// A class, constant or namespace name.
///
/// `text` never carries the leading `\` of a fully qualified name nor the
/// `namespace\` prefix of a relative one; `kind` records which it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name {
    pub text: Symbol,
    pub kind: NameKind,
    pub span: Span,
}

impl Name {
    pub fn as_str<'a>(&self, interner: &'a Interner) -> &'a str {
        interner.resolve(self.text)
    }

    /// Last `\`-separated segment.
    pub fn last_segment<'a>(&self, interner: &'a Interner) -> &'a str {
        let text = interner.resolve(self.text);
        text.rsplit('\\').next().unwrap_or(text)
    }

    /// The name as written in source.
    pub fn to_source(&self, interner: &Interner) -> String {
        let text = interner.resolve(self.text);
        match self.kind {
            NameKind::FullyQualified => format!("\\{}", text),
            NameKind::Relative => format!("namespace\\{}", text),
            NameKind::Unqualified | NameKind::Qualified => text.to_string(),
        }
    }
}

/// Documentation comment, kept verbatim including `/**` and `*/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocComment {
    pub text: Symbol,
    pub span: Span,
}
