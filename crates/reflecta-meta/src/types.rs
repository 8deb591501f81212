//! Type constraints
//!
//! Declared types come from type hints in source; documented types from
//! `@var`, `@param` and `@return` tags, which use a richer grammar
//! (`string[]`, `array<string, int>`, `[:T]`, generics). `reconcile` merges
//! both into a [`Constraint`].

use crate::error::{MetaError, MetaResult};
use crate::scope::Scope;
use reflecta_parser::{Interner, TypeHint};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    String,
    Bool,
    True,
    False,
    Null,
    Array,
    Iterable,
    Callable,
    Object,
    Mixed,
    Void,
    Never,
    Resource,
}

impl Primitive {
    /// Primitive for a (case-insensitive) name, including the aliases
    /// documentation commonly uses.
    pub fn from_name(name: &str) -> Option<Primitive> {
        let primitive = match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Primitive::Int,
            "float" | "double" => Primitive::Float,
            "string" => Primitive::String,
            "bool" | "boolean" => Primitive::Bool,
            "true" => Primitive::True,
            "false" => Primitive::False,
            "null" => Primitive::Null,
            "array" => Primitive::Array,
            "iterable" => Primitive::Iterable,
            "callable" | "function" => Primitive::Callable,
            "object" => Primitive::Object,
            "mixed" | "var" => Primitive::Mixed,
            "void" => Primitive::Void,
            "never" => Primitive::Never,
            "resource" => Primitive::Resource,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Bool => "bool",
            Primitive::True => "true",
            Primitive::False => "false",
            Primitive::Null => "null",
            Primitive::Array => "array",
            Primitive::Iterable => "iterable",
            Primitive::Callable => "callable",
            Primitive::Object => "object",
            Primitive::Mixed => "mixed",
            Primitive::Void => "void",
            Primitive::Never => "never",
            Primitive::Resource => "resource",
        }
    }
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Primitive(Primitive),
    /// Class, interface or enum by fully qualified name
    Named(String),
    Nullable(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    Intersection(Vec<TypeExpr>),
    /// `T[]`, `array<T>`, `array<int, T>`, `list<T>`
    ArrayOf(Box<TypeExpr>),
    /// `[:T]`, `array<string, T>`
    MapOf(Box<TypeExpr>),
    /// `iterable<T>`, `Collection<K, V>` and other parameterized types
    Generic(Box<TypeExpr>, Vec<TypeExpr>),
}

/// A type plus whether the runtime enforces it (declared in source) or it
/// only comes from documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub ty: TypeExpr,
    pub present: bool,
}

impl Constraint {
    pub fn declared(ty: TypeExpr) -> Self {
        Self { ty, present: true }
    }

    pub fn documented(ty: TypeExpr) -> Self {
        Self { ty, present: false }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)
    }
}

impl TypeExpr {
    /// Parse documented type text, resolving class names in `scope`.
    pub fn parse(text: &str, scope: &Scope) -> MetaResult<TypeExpr> {
        let mut parser = TypeParser {
            text,
            pos: 0,
            scope,
        };
        let ty = parser.union()?;
        parser.skip_ws();
        if parser.pos < text.len() {
            return Err(parser.error("unexpected input"));
        }
        Ok(ty)
    }

    /// Resolve a type hint as written in source.
    pub fn from_hint(hint: &TypeHint, scope: &Scope, interner: &Interner) -> MetaResult<TypeExpr> {
        match hint {
            TypeHint::Named(name) => {
                let text = name.as_str(interner);
                match Primitive::from_name(text) {
                    Some(primitive) if !text.contains('\\') && is_hint_keyword(text) => {
                        Ok(TypeExpr::Primitive(primitive))
                    }
                    _ => Ok(TypeExpr::Named(scope.resolve_class(&name.to_source(interner))?)),
                }
            }
            TypeHint::Nullable(inner, _) => Ok(TypeExpr::Nullable(Box::new(Self::from_hint(
                inner, scope, interner,
            )?))),
            TypeHint::Union(parts, _) => Ok(TypeExpr::Union(
                parts
                    .iter()
                    .map(|p| Self::from_hint(p, scope, interner))
                    .collect::<MetaResult<_>>()?,
            )),
            TypeHint::Intersection(parts, _) => Ok(TypeExpr::Intersection(
                parts
                    .iter()
                    .map(|p| Self::from_hint(p, scope, interner))
                    .collect::<MetaResult<_>>()?,
            )),
        }
    }

    /// Whether `null` is an accepted value.
    pub fn is_nullable(&self) -> bool {
        match self {
            TypeExpr::Nullable(_) | TypeExpr::Primitive(Primitive::Null | Primitive::Mixed) => true,
            TypeExpr::Union(parts) => parts.iter().any(TypeExpr::is_nullable),
            _ => false,
        }
    }

    /// The type without `null`, and whether there was one.
    fn split_null(&self) -> (TypeExpr, bool) {
        match self {
            TypeExpr::Nullable(inner) => ((**inner).clone(), true),
            TypeExpr::Union(parts) => {
                let rest: Vec<TypeExpr> = parts
                    .iter()
                    .filter(|p| **p != TypeExpr::Primitive(Primitive::Null))
                    .cloned()
                    .collect();
                let had_null = rest.len() != parts.len();
                match rest.len() {
                    1 if had_null => (rest.into_iter().next().unwrap_or_else(|| self.clone()), true),
                    _ if had_null => (TypeExpr::Union(rest), true),
                    _ => (self.clone(), false),
                }
            }
            _ => (self.clone(), false),
        }
    }

    /// Element-typed refinements of `array`.
    fn refines_array(&self) -> bool {
        match self {
            TypeExpr::ArrayOf(_) | TypeExpr::MapOf(_) => true,
            TypeExpr::Generic(base, _) => **base == TypeExpr::Primitive(Primitive::Array),
            _ => false,
        }
    }

    fn refines_iterable(&self) -> bool {
        match self {
            TypeExpr::Generic(base, _) => matches!(
                **base,
                TypeExpr::Primitive(Primitive::Iterable | Primitive::Array)
            ),
            other => other.refines_array(),
        }
    }
}

fn is_hint_keyword(text: &str) -> bool {
    !matches!(
        text.to_ascii_lowercase().as_str(),
        "integer" | "double" | "boolean" | "var" | "function" | "resource"
    )
}

/// Merge a declared and a documented type.
///
/// A declaration wins, except that documentation may narrow `array` and
/// `iterable` (nullable or not) to an element-typed array or map. A type
/// known only from documentation is not present.
pub fn reconcile(declared: Option<TypeExpr>, documented: Option<TypeExpr>) -> Option<Constraint> {
    match (declared, documented) {
        (Some(declared), Some(documented)) => {
            let ty = narrow(&declared, &documented).unwrap_or(declared);
            Some(Constraint::declared(ty))
        }
        (Some(declared), None) => Some(Constraint::declared(declared)),
        (None, Some(documented)) => Some(Constraint::documented(documented)),
        (None, None) => None,
    }
}

fn narrow(declared: &TypeExpr, documented: &TypeExpr) -> Option<TypeExpr> {
    let (base, nullable) = declared.split_null();
    let (refined, _) = documented.split_null();

    let narrows = match base {
        TypeExpr::Primitive(Primitive::Array) => refined.refines_array(),
        TypeExpr::Primitive(Primitive::Iterable) => refined.refines_iterable(),
        _ => false,
    };
    if !narrows {
        return None;
    }
    Some(if nullable {
        TypeExpr::Nullable(Box::new(refined))
    } else {
        refined
    })
}

// ============================================================================
// Documented type grammar
// ============================================================================

struct TypeParser<'a> {
    text: &'a str,
    pos: usize,
    scope: &'a Scope,
}

impl<'a> TypeParser<'a> {
    fn error(&self, reason: &str) -> MetaError {
        MetaError::invalid_expression(self.text, format!("invalid type: {} at offset {}", reason, self.pos))
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> MetaResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", c as char)))
        }
    }

    fn union(&mut self) -> MetaResult<TypeExpr> {
        let first = self.intersection()?;
        if !self.eat(b'|') {
            return Ok(first);
        }
        let mut parts = vec![first];
        loop {
            parts.push(self.intersection()?);
            if !self.eat(b'|') {
                break;
            }
        }
        Ok(TypeExpr::Union(parts))
    }

    fn intersection(&mut self) -> MetaResult<TypeExpr> {
        let first = self.unary()?;
        if !self.eat(b'&') {
            return Ok(first);
        }
        let mut parts = vec![first];
        loop {
            parts.push(self.unary()?);
            if !self.eat(b'&') {
                break;
            }
        }
        Ok(TypeExpr::Intersection(parts))
    }

    fn unary(&mut self) -> MetaResult<TypeExpr> {
        if self.eat(b'?') {
            return Ok(TypeExpr::Nullable(Box::new(self.unary()?)));
        }
        let mut ty = self.primary()?;
        loop {
            self.skip_ws();
            if self.text[self.pos..].starts_with("[]") {
                self.pos += 2;
                ty = TypeExpr::ArrayOf(Box::new(ty));
            } else {
                return Ok(ty);
            }
        }
    }

    fn primary(&mut self) -> MetaResult<TypeExpr> {
        if self.eat(b'(') {
            let ty = self.union()?;
            self.expect(b')')?;
            return Ok(ty);
        }
        if self.eat(b'[') {
            self.expect(b':')?;
            let ty = self.union()?;
            self.expect(b']')?;
            return Ok(TypeExpr::MapOf(Box::new(ty)));
        }

        if self.eat(b'$') {
            let at = self.pos;
            if self.name()?.eq_ignore_ascii_case("this") {
                return Ok(TypeExpr::Named(self.scope.resolve_class("static")?));
            }
            self.pos = at;
            return Err(self.error("expected `$this`"));
        }

        let name = self.name()?;
        if let Some(primitive) = Primitive::from_name(name).filter(|_| !name.contains('\\')) {
            if primitive == Primitive::Callable && self.eat(b'(') {
                self.signature()?;
                return Ok(TypeExpr::Primitive(Primitive::Callable));
            }
            if self.eat(b'<') {
                return self.parameterized(TypeExpr::Primitive(primitive), name);
            }
            return Ok(TypeExpr::Primitive(primitive));
        }

        let named = TypeExpr::Named(self.scope.resolve_class(name)?);
        if self.eat(b'<') {
            return self.parameterized(named, name);
        }
        Ok(named)
    }

    fn name(&mut self) -> MetaResult<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'\\' || c >= 0x80)
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        let text = self.text;
        Ok(&text[start..self.pos])
    }

    /// Arguments after `<`; `array` and `list` become arrays or maps.
    fn parameterized(&mut self, base: TypeExpr, written: &str) -> MetaResult<TypeExpr> {
        let mut arguments = vec![self.union()?];
        while self.eat(b',') {
            arguments.push(self.union()?);
        }
        self.expect(b'>')?;

        let is_list = written.eq_ignore_ascii_case("list");
        let is_array = base == TypeExpr::Primitive(Primitive::Array);
        if is_array || is_list {
            return match arguments.len() {
                1 => Ok(TypeExpr::ArrayOf(Box::new(arguments.remove(0)))),
                2 if !is_list => {
                    let value = arguments.remove(1);
                    match &arguments[0] {
                        TypeExpr::Primitive(Primitive::Int) => Ok(TypeExpr::ArrayOf(Box::new(value))),
                        TypeExpr::Primitive(Primitive::String) => Ok(TypeExpr::MapOf(Box::new(value))),
                        _ => {
                            arguments.push(value);
                            Ok(TypeExpr::Generic(Box::new(base), arguments))
                        }
                    }
                }
                _ => Err(self.error("wrong number of array type arguments")),
            };
        }
        Ok(TypeExpr::Generic(Box::new(base), arguments))
    }

    /// `(T, U): R` after `callable`; only checked, not kept.
    fn signature(&mut self) -> MetaResult<()> {
        if !self.eat(b')') {
            loop {
                self.union()?;
                self.eat(b'.');
                self.eat(b'.');
                self.eat(b'.');
                if !self.eat(b',') {
                    break;
                }
            }
            self.expect(b')')?;
        }
        if self.eat(b':') {
            self.unary()?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn grouped(f: &mut fmt::Formatter<'_>, ty: &TypeExpr) -> fmt::Result {
            match ty {
                TypeExpr::Union(_) | TypeExpr::Intersection(_) | TypeExpr::Nullable(_) => write!(f, "({})", ty),
                _ => write!(f, "{}", ty),
            }
        }
        fn joined(f: &mut fmt::Formatter<'_>, parts: &[TypeExpr], sep: &str) -> fmt::Result {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, "{}", sep)?;
                }
                grouped(f, part)?;
            }
            Ok(())
        }

        match self {
            TypeExpr::Primitive(p) => write!(f, "{}", p.name()),
            TypeExpr::Named(name) => write!(f, "{}", name),
            TypeExpr::Nullable(inner) => {
                write!(f, "?")?;
                grouped(f, inner)
            }
            TypeExpr::Union(parts) => joined(f, parts, "|"),
            TypeExpr::Intersection(parts) => joined(f, parts, "&"),
            TypeExpr::ArrayOf(inner) => {
                grouped(f, inner)?;
                write!(f, "[]")
            }
            TypeExpr::MapOf(inner) => write!(f, "[:{}]", inner),
            TypeExpr::Generic(base, arguments) => {
                write!(f, "{}<", base)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflecta_parser::Parser;

    fn scope() -> Scope {
        Scope::new(Some("app"), "app\\User")
            .with_import("Date", "util\\Date")
            .with_parent("app\\Model")
    }

    fn parse(text: &str) -> TypeExpr {
        TypeExpr::parse(text, &scope()).unwrap()
    }

    #[test]
    fn test_primitives_and_aliases() {
        assert_eq!(parse("int"), TypeExpr::Primitive(Primitive::Int));
        assert_eq!(parse("integer"), TypeExpr::Primitive(Primitive::Int));
        assert_eq!(parse("Boolean"), TypeExpr::Primitive(Primitive::Bool));
        assert_eq!(parse("double"), TypeExpr::Primitive(Primitive::Float));
        assert_eq!(parse("var"), TypeExpr::Primitive(Primitive::Mixed));
        assert_eq!(parse("void"), TypeExpr::Primitive(Primitive::Void));
        assert_eq!(parse("null"), TypeExpr::Primitive(Primitive::Null));
    }

    #[test]
    fn test_names_resolve_in_scope() {
        assert_eq!(parse("Date"), TypeExpr::Named("util\\Date".to_string()));
        assert_eq!(parse("Role"), TypeExpr::Named("app\\Role".to_string()));
        assert_eq!(parse("\\lang\\Value"), TypeExpr::Named("lang\\Value".to_string()));
        assert_eq!(parse("self"), TypeExpr::Named("app\\User".to_string()));
        assert_eq!(parse("parent"), TypeExpr::Named("app\\Model".to_string()));
        assert_eq!(parse("$this"), TypeExpr::Named("app\\User".to_string()));
        assert_eq!(
            parse("?$this"),
            TypeExpr::Nullable(Box::new(TypeExpr::Named("app\\User".to_string())))
        );
        assert!(TypeExpr::parse("$that", &scope()).is_err());
    }

    #[test]
    fn test_arrays_and_maps() {
        let ints = TypeExpr::ArrayOf(Box::new(TypeExpr::Primitive(Primitive::Int)));
        assert_eq!(parse("int[]"), ints);
        assert_eq!(parse("array<int>"), ints);
        assert_eq!(parse("array<int, int>"), ints);
        assert_eq!(parse("list<int>"), ints);

        let map = TypeExpr::MapOf(Box::new(TypeExpr::Named("util\\Date".to_string())));
        assert_eq!(parse("[:Date]"), map);
        assert_eq!(parse("array<string, Date>"), map);

        assert_eq!(parse("int[][]").to_string(), "int[][]");
        assert_eq!(parse("(int|string)[]").to_string(), "(int|string)[]");
    }

    #[test]
    fn test_composites() {
        assert_eq!(parse("?int").to_string(), "?int");
        assert_eq!(parse("int | string|null").to_string(), "int|string|null");
        assert_eq!(parse("Countable&Traversable").to_string(), "app\\Countable&app\\Traversable");
        assert_eq!(parse("iterable<Date>").to_string(), "iterable<util\\Date>");
        assert_eq!(parse("Map<string, ?int>").to_string(), "app\\Map<string, ?int>");
        assert_eq!(parse("callable(int, string): bool"), TypeExpr::Primitive(Primitive::Callable));
        assert_eq!(parse("function(): void"), TypeExpr::Primitive(Primitive::Callable));
    }

    #[test]
    fn test_invalid_types() {
        let scope = scope();
        assert!(TypeExpr::parse("", &scope).is_err());
        assert!(TypeExpr::parse("array<", &scope).is_err());
        assert!(TypeExpr::parse("int string", &scope).is_err());
        assert!(TypeExpr::parse("list<int, string>", &scope).is_err());
    }

    #[test]
    fn test_from_hint() {
        let (file, interner) = Parser::new(
            "<?php namespace app; use util\\Date; class A { public ?Date $d; public int|string|null $u; public array $a; }",
        )
        .unwrap()
        .parse()
        .unwrap();
        let (block, decl) = file.types().next().unwrap();
        let scope = Scope::from_declaration(block, decl, &interner);
        let hints: Vec<String> = decl
            .properties()
            .map(|p| {
                TypeExpr::from_hint(p.type_hint.as_ref().unwrap(), &scope, &interner)
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(hints, ["?util\\Date", "int|string|null", "array"]);
    }

    #[test]
    fn test_reconcile() {
        let array = TypeExpr::Primitive(Primitive::Array);
        let ints = parse("int[]");

        assert_eq!(reconcile(Some(array.clone()), Some(ints.clone())), Some(Constraint::declared(ints.clone())));
        assert_eq!(
            reconcile(Some(parse("?array")), Some(parse("int[]"))),
            Some(Constraint::declared(parse("?int[]")))
        );
        assert_eq!(
            reconcile(Some(parse("array|null")), Some(parse("[:string]|null"))),
            Some(Constraint::declared(parse("?[:string]")))
        );
        assert_eq!(
            reconcile(Some(parse("iterable")), Some(parse("iterable<int>"))),
            Some(Constraint::declared(parse("iterable<int>")))
        );

        // No narrowing beyond arrays
        assert_eq!(
            reconcile(Some(parse("int")), Some(parse("string"))),
            Some(Constraint::declared(parse("int")))
        );
        assert_eq!(
            reconcile(Some(array.clone()), Some(parse("string"))),
            Some(Constraint::declared(array))
        );

        assert_eq!(reconcile(None, Some(ints.clone())), Some(Constraint::documented(ints)));
        assert_eq!(reconcile(None, None), None);
    }
}
