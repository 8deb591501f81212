//! Declaration AST nodes
//!
//! Namespace blocks, imports, type declarations and their members.

use super::*;

/// A `namespace` statement and everything up to the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceBlock {
    /// `None` for the global namespace
    pub name: Option<Name>,
    pub uses: Vec<UseImport>,
    pub types: Vec<TypeDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseKind {
    Class,
    Function,
    Constant,
}

/// One imported name: `use a\b\C as D;` or one entry of a group use.
#[derive(Debug, Clone, PartialEq)]
pub struct UseImport {
    pub kind: UseKind,
    /// Full path, without leading `\`
    pub name: Name,
    pub alias: Option<Identifier>,
    pub span: Span,
}

impl UseImport {
    /// The local name this import introduces.
    pub fn local_name<'a>(&self, interner: &'a Interner) -> &'a str {
        match &self.alias {
            Some(alias) => interner.resolve(alias.name),
            None => self.name.last_segment(interner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Trait,
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// Modifier flags on a type, member or promoted parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub is_public: bool,
    pub is_protected: bool,
    pub is_private: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
}

impl Modifiers {
    /// Members without an explicit visibility are public.
    pub fn visibility(&self) -> Visibility {
        if self.is_private {
            Visibility::Private
        } else if self.is_protected {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Modifiers::default()
    }

    /// Modifier keywords in canonical order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.is_abstract {
            names.push("abstract");
        }
        if self.is_final {
            names.push("final");
        }
        names.push(match self.visibility() {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        });
        if self.is_static {
            names.push("static");
        }
        if self.is_readonly {
            names.push("readonly");
        }
        names
    }
}

/// class, interface, trait or enum declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: Identifier,
    pub modifiers: Modifiers,
    pub doc_comment: Option<DocComment>,
    pub attributes: Vec<Attribute>,
    /// `extends` of a class (interfaces list theirs in `interfaces`)
    pub parent: Option<Name>,
    pub interfaces: Vec<Name>,
    /// `use Trait;` inside the body
    pub traits: Vec<Name>,
    /// Backing type of an enum: `enum Suit: string`
    pub backing: Option<TypeHint>,
    pub members: Vec<Member>,
    pub span: Span,
}

impl TypeDecl {
    pub fn constants(&self) -> impl Iterator<Item = &ConstantDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Constant(c) => Some(c),
            _ => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Property(p) => Some(p),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn cases(&self) -> impl Iterator<Item = &EnumCase> {
        self.members.iter().filter_map(|m| match m {
            Member::Case(c) => Some(c),
            _ => None,
        })
    }
}

/// Type member
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Constant(ConstantDecl),
    Property(PropertyDecl),
    Method(MethodDecl),
    Case(EnumCase),
}

impl Member {
    pub fn span(&self) -> &Span {
        match self {
            Member::Constant(m) => &m.span,
            Member::Property(m) => &m.span,
            Member::Method(m) => &m.span,
            Member::Case(m) => &m.span,
        }
    }
}

/// `const NAME = expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub name: Identifier,
    pub type_hint: Option<TypeHint>,
    pub value: Expression,
    pub modifiers: Modifiers,
    pub doc_comment: Option<DocComment>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// `public ?int $name = expr;` or a promoted constructor parameter
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: Identifier,
    pub type_hint: Option<TypeHint>,
    pub default: Option<Expression>,
    pub modifiers: Modifiers,
    pub doc_comment: Option<DocComment>,
    pub attributes: Vec<Attribute>,
    pub promoted: bool,
    pub span: Span,
}

/// Method signature; the body is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: Identifier,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeHint>,
    pub by_ref: bool,
    pub modifiers: Modifiers,
    pub doc_comment: Option<DocComment>,
    pub attributes: Vec<Attribute>,
    pub has_body: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Identifier,
    pub type_hint: Option<TypeHint>,
    pub default: Option<Expression>,
    pub by_ref: bool,
    pub variadic: bool,
    /// Set for constructor property promotion
    pub promoted: Option<Modifiers>,
    pub doc_comment: Option<DocComment>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// `case Hearts = 'H';`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCase {
    pub name: Identifier,
    pub value: Option<Expression>,
    pub doc_comment: Option<DocComment>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// `#[Name(args)]`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

/// Call argument: positional, named (`using: "values"`) or spread.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Identifier>,
    pub value: Expression,
    pub spread: bool,
    pub span: Span,
}

/// Declared type of a property, parameter, constant or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHint {
    /// `int`, `array`, `static`, `\lang\Value`, ...
    Named(Name),
    /// `?T`
    Nullable(Box<TypeHint>, Span),
    /// `A|B`
    Union(Vec<TypeHint>, Span),
    /// `A&B`
    Intersection(Vec<TypeHint>, Span),
}

impl TypeHint {
    pub fn span(&self) -> &Span {
        match self {
            TypeHint::Named(name) => &name.span,
            TypeHint::Nullable(_, span)
            | TypeHint::Union(_, span)
            | TypeHint::Intersection(_, span) => span,
        }
    }

    /// Render the hint as written (names unresolved).
    pub fn to_source(&self, interner: &Interner) -> String {
        match self {
            TypeHint::Named(name) => name.to_source(interner),
            TypeHint::Nullable(inner, _) => format!("?{}", inner.to_source(interner)),
            TypeHint::Union(parts, _) => join_hints(parts, "|", interner),
            TypeHint::Intersection(parts, _) => join_hints(parts, "&", interner),
        }
    }
}

fn join_hints(parts: &[TypeHint], sep: &str, interner: &Interner) -> String {
    parts
        .iter()
        .map(|p| match p {
            TypeHint::Intersection(..) | TypeHint::Union(..) => {
                format!("({})", p.to_source(interner))
            }
            _ => p.to_source(interner),
        })
        .collect::<Vec<_>>()
        .join(sep)
}
