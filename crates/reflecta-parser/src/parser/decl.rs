//! Declaration parsing
//!
//! Namespace blocks, imports, type declarations and member signatures.
//! Function and method bodies are skipped; top-level statements other than
//! declarations are skipped as well.

use super::expr::{parse_arguments, parse_expression, parse_name};
use super::guards::LoopGuard;
use super::recovery;
use super::{ParseError, Parser};
use crate::ast::*;
use crate::interner::Symbol;
use crate::token::{Span, Token};

/// Upper bound on top-level items and members per type.
const MAX_DECLARATIONS: usize = 1_000_000;

fn empty_block(name: Option<Name>, span: Span) -> NamespaceBlock {
    NamespaceBlock {
        name,
        uses: Vec::new(),
        types: Vec::new(),
        span,
    }
}

fn is_empty_block(block: &NamespaceBlock) -> bool {
    block.name.is_none() && block.uses.is_empty() && block.types.is_empty()
}

// ============================================================================
// Source file
// ============================================================================

/// Parse all namespace blocks in the file. Errors are recorded on the
/// parser and parsing resumes at the next declaration.
pub fn parse_source_file(parser: &mut Parser) -> Vec<NamespaceBlock> {
    let mut blocks = Vec::new();
    let mut block = empty_block(None, parser.current_span());
    let mut braced = false;
    let mut guard = LoopGuard::with_limit("source_file", MAX_DECLARATIONS);

    while !parser.at_eof() {
        if let Err(err) = guard.check() {
            parser.record(err);
            break;
        }

        if braced && parser.check(&Token::RightBrace) {
            block.span = block.span.to(&parser.current_span());
            parser.advance();
            let next = empty_block(None, parser.current_span());
            blocks.push(std::mem::replace(&mut block, next));
            braced = false;
            continue;
        }

        if is_namespace_statement(parser) {
            let start = parser.current_span();
            match parse_namespace_header(parser) {
                Ok((name, is_braced)) => {
                    let next = empty_block(name, start);
                    let previous = std::mem::replace(&mut block, next);
                    if !is_empty_block(&previous) {
                        blocks.push(previous);
                    }
                    braced = is_braced;
                }
                Err(err) => {
                    parser.record(err);
                    recovery::sync_to_declaration_boundary(parser);
                }
            }
            continue;
        }

        if let Err(err) = parse_top_level_item(parser, &mut block) {
            parser.record(err);
            recovery::sync_to_declaration_boundary(parser);
        }
    }

    if braced {
        let err = ParseError::unexpected_eof(vec![Token::RightBrace], parser.current_span());
        parser.record(err);
    }
    if !is_empty_block(&block) || blocks.is_empty() {
        block.span = block.span.to(&parser.current_span());
        blocks.push(block);
    }
    blocks
}

/// `namespace` followed by a name or `{`. `namespace\f()` lexes as a
/// qualified name and never reaches here.
fn is_namespace_statement(parser: &Parser) -> bool {
    parser.check(&Token::Namespace)
        && matches!(
            parser.peek(),
            Some(Token::Identifier(_) | Token::QualifiedName(_) | Token::LeftBrace)
        )
}

fn parse_namespace_header(parser: &mut Parser) -> Result<(Option<Name>, bool), ParseError> {
    parser.expect(Token::Namespace)?;
    let name = if parser.check(&Token::LeftBrace) {
        None
    } else {
        Some(parse_name(parser)?)
    };

    if parser.eat(&Token::LeftBrace) {
        Ok((name, true))
    } else {
        parser.expect(Token::Semicolon)?;
        Ok((name, false))
    }
}

fn parse_top_level_item(parser: &mut Parser, block: &mut NamespaceBlock) -> Result<(), ParseError> {
    let doc = parser.doc_comment();
    let attributes = parse_attributes(parser)?;
    let doc = parser.doc_comment().or(doc);

    match parser.current() {
        Token::Use if attributes.is_empty() => parse_use_statement(parser, &mut block.uses),
        Token::Abstract | Token::Final | Token::Readonly | Token::Class | Token::Interface | Token::Trait => {
            let decl = parse_type_declaration(parser, doc, attributes)?;
            block.types.push(decl);
            Ok(())
        }
        Token::Identifier(_) if is_enum_start(parser) => {
            let decl = parse_type_declaration(parser, doc, attributes)?;
            block.types.push(decl);
            Ok(())
        }
        Token::Semicolon => {
            parser.advance();
            Ok(())
        }
        // Functions, declare(), constants, includes and plain statements
        _ => recovery::skip_statement(parser),
    }
}

/// `enum` is not reserved; it starts a declaration only before a name.
fn is_enum_start(parser: &Parser) -> bool {
    parser.check_word("enum") && matches!(parser.peek(), Some(Token::Identifier(_)))
}

// ============================================================================
// Imports
// ============================================================================

fn parse_use_kind(parser: &mut Parser) -> UseKind {
    if parser.eat(&Token::Function) {
        UseKind::Function
    } else if parser.eat(&Token::Const) {
        UseKind::Constant
    } else {
        UseKind::Class
    }
}

/// Import paths are always absolute, however they are written.
fn import_name(parser: &mut Parser) -> Result<Name, ParseError> {
    let name = parse_name(parser)?;
    Ok(Name {
        kind: NameKind::FullyQualified,
        ..name
    })
}

/// `use A\B;`, `use A\B as C, D;`, `use function a\f;`, `use A\{B, C as D};`
fn parse_use_statement(parser: &mut Parser, uses: &mut Vec<UseImport>) -> Result<(), ParseError> {
    parser.expect(Token::Use)?;
    let kind = parse_use_kind(parser);

    let mut guard = LoopGuard::new("use_statement");
    loop {
        guard.check()?;

        let start = parser.current_span();
        let name = import_name(parser)?;

        if parser.eat(&Token::Backslash) {
            parse_group_use(parser, kind, name, uses)?;
        } else {
            let alias = if parser.eat(&Token::As) {
                Some(parser.expect_identifier()?)
            } else {
                None
            };
            uses.push(UseImport {
                kind,
                name,
                alias,
                span: start.to(&parser.previous_span()),
            });
        }

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::Semicolon)?;
    Ok(())
}

fn parse_group_use(
    parser: &mut Parser,
    kind: UseKind,
    prefix: Name,
    uses: &mut Vec<UseImport>,
) -> Result<(), ParseError> {
    parser.expect(Token::LeftBrace)?;
    let prefix_text = parser.resolve(prefix.text).to_string();

    let mut guard = LoopGuard::new("group_use");
    while !parser.check(&Token::RightBrace) {
        guard.check()?;

        let start = parser.current_span();
        let entry_kind = match parser.current() {
            Token::Function | Token::Const => parse_use_kind(parser),
            _ => kind,
        };
        let entry = parse_name(parser)?;
        let full = format!("{}\\{}", prefix_text, parser.resolve(entry.text));
        let name = Name {
            text: parser.intern(&full),
            kind: NameKind::FullyQualified,
            span: prefix.span.to(&entry.span),
        };
        let alias = if parser.eat(&Token::As) {
            Some(parser.expect_identifier()?)
        } else {
            None
        };
        uses.push(UseImport {
            kind: entry_kind,
            name,
            alias,
            span: start.to(&parser.previous_span()),
        });

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightBrace)?;
    Ok(())
}

// ============================================================================
// Attributes and modifiers
// ============================================================================

/// Zero or more `#[A, B(args)]` groups.
pub fn parse_attributes(parser: &mut Parser) -> Result<Vec<Attribute>, ParseError> {
    let mut attributes = Vec::new();
    let mut guard = LoopGuard::new("attributes");

    while parser.eat(&Token::HashBracket) {
        loop {
            guard.check()?;

            let start = parser.current_span();
            let name = parse_name(parser)?;
            let arguments = if parser.check(&Token::LeftParen) {
                parse_arguments(parser)?
            } else {
                Vec::new()
            };
            attributes.push(Attribute {
                name,
                arguments,
                span: start.to(&parser.previous_span()),
            });

            if !parser.eat(&Token::Comma) || parser.check(&Token::RightBracket) {
                break;
            }
        }
        parser.expect(Token::RightBracket)?;
    }

    Ok(attributes)
}

fn parse_modifiers(parser: &mut Parser) -> Modifiers {
    let mut modifiers = Modifiers::default();
    loop {
        match parser.current() {
            Token::Public | Token::Var => modifiers.is_public = true,
            Token::Protected => modifiers.is_protected = true,
            Token::Private => modifiers.is_private = true,
            Token::Static => modifiers.is_static = true,
            Token::Abstract => modifiers.is_abstract = true,
            Token::Final => modifiers.is_final = true,
            Token::Readonly => modifiers.is_readonly = true,
            _ => break,
        }
        parser.advance();
    }
    modifiers
}

// ============================================================================
// Type declarations
// ============================================================================

fn parse_name_list(parser: &mut Parser) -> Result<Vec<Name>, ParseError> {
    let mut names = vec![parse_name(parser)?];
    while parser.eat(&Token::Comma) {
        names.push(parse_name(parser)?);
    }
    Ok(names)
}

fn parse_type_declaration(
    parser: &mut Parser,
    doc_comment: Option<DocComment>,
    attributes: Vec<Attribute>,
) -> Result<TypeDecl, ParseError> {
    let start = parser.current_span();
    let modifiers = parse_modifiers(parser);

    let kind = match parser.current() {
        Token::Class => TypeKind::Class,
        Token::Interface => TypeKind::Interface,
        Token::Trait => TypeKind::Trait,
        Token::Identifier(_) if is_enum_start(parser) => TypeKind::Enum,
        _ => return Err(parser.unexpected_token(&[Token::Class, Token::Interface, Token::Trait])),
    };
    parser.advance();
    let name = parser.expect_identifier()?;

    let backing = if kind == TypeKind::Enum && parser.eat(&Token::Colon) {
        Some(parse_type_hint(parser)?)
    } else {
        None
    };

    let mut parent = None;
    let mut interfaces = Vec::new();
    if parser.eat(&Token::Extends) {
        if kind == TypeKind::Interface {
            interfaces = parse_name_list(parser)?;
        } else {
            parent = Some(parse_name(parser)?);
        }
    }
    if parser.eat(&Token::Implements) {
        interfaces.extend(parse_name_list(parser)?);
    }

    let mut decl = TypeDecl {
        kind,
        name,
        modifiers,
        doc_comment,
        attributes,
        parent,
        interfaces,
        traits: Vec::new(),
        backing,
        members: Vec::new(),
        span: start,
    };

    parser.expect(Token::LeftBrace)?;
    let mut guard = LoopGuard::with_limit("type_body", MAX_DECLARATIONS);
    while !parser.check(&Token::RightBrace) {
        guard.check()?;
        if parser.at_eof() {
            return Err(ParseError::unexpected_eof(vec![Token::RightBrace], parser.current_span()));
        }
        if let Err(err) = parse_member(parser, &mut decl) {
            parser.record(err);
            recovery::sync_to_member_boundary(parser);
        }
    }
    let end = parser.current_span();
    parser.expect(Token::RightBrace)?;

    decl.span = start.to(&end);
    Ok(decl)
}

// ============================================================================
// Members
// ============================================================================

fn parse_member(parser: &mut Parser, decl: &mut TypeDecl) -> Result<(), ParseError> {
    let doc = parser.doc_comment();
    let attributes = parse_attributes(parser)?;
    let doc_comment = parser.doc_comment().or(doc);
    let start = parser.current_span();

    if parser.eat(&Token::Use) {
        let names = parse_name_list(parser)?;
        if parser.check(&Token::LeftBrace) {
            // insteadof / as adaptations
            recovery::skip_block(parser)?;
        } else {
            parser.expect(Token::Semicolon)?;
        }
        decl.traits.extend(names);
        return Ok(());
    }

    if parser.eat(&Token::Case) {
        let name = parser.expect_member_name()?;
        let value = if parser.eat(&Token::Equal) {
            Some(parse_expression(parser)?)
        } else {
            None
        };
        parser.expect(Token::Semicolon)?;
        decl.members.push(Member::Case(EnumCase {
            name,
            value,
            doc_comment,
            attributes,
            span: start.to(&parser.previous_span()),
        }));
        return Ok(());
    }

    let modifiers = parse_modifiers(parser);
    match parser.current() {
        Token::Const => {
            parser.advance();
            parse_constants(parser, decl, modifiers, doc_comment, attributes, start)
        }
        Token::Function => parse_method(parser, decl, modifiers, doc_comment, attributes, start),
        _ => parse_properties(parser, decl, modifiers, doc_comment, attributes, start),
    }
}

/// `const [type] A = 1, B = 2;`
fn parse_constants(
    parser: &mut Parser,
    decl: &mut TypeDecl,
    modifiers: Modifiers,
    doc_comment: Option<DocComment>,
    attributes: Vec<Attribute>,
    start: Span,
) -> Result<(), ParseError> {
    let type_hint = if matches!(parser.peek(), Some(Token::Equal)) {
        None
    } else {
        Some(parse_type_hint(parser)?)
    };

    let mut guard = LoopGuard::new("constants");
    loop {
        guard.check()?;

        let name = parser.expect_member_name()?;
        parser.expect(Token::Equal)?;
        let value = parse_expression(parser)?;
        decl.members.push(Member::Constant(ConstantDecl {
            name,
            type_hint: type_hint.clone(),
            value,
            modifiers,
            doc_comment,
            attributes: attributes.clone(),
            span: start.to(&parser.previous_span()),
        }));

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::Semicolon)?;
    Ok(())
}

/// `[type] $a [= expr], $b;` with optional property hooks in braces.
fn parse_properties(
    parser: &mut Parser,
    decl: &mut TypeDecl,
    modifiers: Modifiers,
    doc_comment: Option<DocComment>,
    attributes: Vec<Attribute>,
    start: Span,
) -> Result<(), ParseError> {
    if modifiers.is_empty() {
        return Err(parser.unexpected_token(&[Token::Function, Token::Const, Token::Public]));
    }
    let type_hint = if parser.check(&Token::Variable(Symbol::dummy())) {
        None
    } else {
        Some(parse_type_hint(parser)?)
    };

    let mut guard = LoopGuard::new("properties");
    loop {
        guard.check()?;

        let name = parser.expect_variable()?;
        let default = if parser.eat(&Token::Equal) {
            Some(parse_expression(parser)?)
        } else {
            None
        };
        decl.members.push(Member::Property(PropertyDecl {
            name,
            type_hint: type_hint.clone(),
            default,
            modifiers,
            doc_comment,
            attributes: attributes.clone(),
            promoted: false,
            span: start.to(&parser.previous_span()),
        }));

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    if parser.check(&Token::LeftBrace) {
        recovery::skip_block(parser)
    } else {
        parser.expect(Token::Semicolon)?;
        Ok(())
    }
}

fn parse_method(
    parser: &mut Parser,
    decl: &mut TypeDecl,
    modifiers: Modifiers,
    doc_comment: Option<DocComment>,
    attributes: Vec<Attribute>,
    start: Span,
) -> Result<(), ParseError> {
    parser.expect(Token::Function)?;
    let by_ref = parser.eat(&Token::Amp);
    let name = parser.expect_member_name()?;
    let parameters = parse_parameters(parser)?;
    let return_type = if parser.eat(&Token::Colon) {
        Some(parse_type_hint(parser)?)
    } else {
        None
    };
    let signature_end = parser.previous_span();

    let has_body = if parser.check(&Token::LeftBrace) {
        recovery::skip_block(parser)?;
        true
    } else {
        parser.expect(Token::Semicolon)?;
        false
    };

    // Promoted constructor parameters are properties as well
    let promoted: Vec<Member> = parameters
        .iter()
        .filter_map(|param| {
            param.promoted.map(|modifiers| {
                Member::Property(PropertyDecl {
                    name: param.name,
                    type_hint: param.type_hint.clone(),
                    default: None,
                    modifiers,
                    doc_comment: param.doc_comment,
                    attributes: param.attributes.clone(),
                    promoted: true,
                    span: param.span,
                })
            })
        })
        .collect();

    decl.members.push(Member::Method(MethodDecl {
        name,
        parameters,
        return_type,
        by_ref,
        modifiers,
        doc_comment,
        attributes,
        has_body,
        span: start.to(&signature_end),
    }));
    decl.members.extend(promoted);
    Ok(())
}

fn parse_parameters(parser: &mut Parser) -> Result<Vec<Parameter>, ParseError> {
    parser.expect(Token::LeftParen)?;

    let mut parameters = Vec::new();
    let mut guard = LoopGuard::new("parameters");
    while !parser.check(&Token::RightParen) {
        guard.check()?;

        let doc = parser.doc_comment();
        let attributes = parse_attributes(parser)?;
        let doc_comment = parser.doc_comment().or(doc);
        let start = parser.current_span();

        let modifiers = parse_modifiers(parser);
        let promoted = if modifiers.is_empty() { None } else { Some(modifiers) };

        let type_hint = if parser.check_any(&[
            Token::Variable(Symbol::dummy()),
            Token::Amp,
            Token::DotDotDot,
        ]) {
            None
        } else {
            Some(parse_type_hint(parser)?)
        };
        let by_ref = parser.eat(&Token::Amp);
        let variadic = parser.eat(&Token::DotDotDot);
        let name = parser.expect_variable()?;
        let default = if parser.eat(&Token::Equal) {
            Some(parse_expression(parser)?)
        } else {
            None
        };

        parameters.push(Parameter {
            name,
            type_hint,
            default,
            by_ref,
            variadic,
            promoted,
            doc_comment,
            attributes,
            span: start.to(&parser.previous_span()),
        });

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightParen)?;
    Ok(parameters)
}

// ============================================================================
// Type hints
// ============================================================================

/// `T`, `?T`, `A|B|null`, `A&B`, `(A&B)|null`
pub fn parse_type_hint(parser: &mut Parser) -> Result<TypeHint, ParseError> {
    let start = parser.current_span();

    if parser.eat(&Token::Question) {
        let inner = parse_type_atom(parser)?;
        return Ok(TypeHint::Nullable(Box::new(inner), start.to(&parser.previous_span())));
    }

    let first = parse_type_atom(parser)?;

    if parser.check(&Token::Pipe) {
        let mut parts = vec![first];
        while parser.eat(&Token::Pipe) {
            parts.push(parse_type_atom(parser)?);
        }
        return Ok(TypeHint::Union(parts, start.to(&parser.previous_span())));
    }

    if is_intersection_amp(parser) {
        let mut parts = vec![first];
        while is_intersection_amp(parser) {
            parser.advance();
            parts.push(parse_type_atom(parser)?);
        }
        return Ok(TypeHint::Intersection(parts, start.to(&parser.previous_span())));
    }

    Ok(first)
}

/// `&` continues an intersection unless it marks a by-reference parameter.
fn is_intersection_amp(parser: &Parser) -> bool {
    parser.check(&Token::Amp)
        && !matches!(
            parser.peek(),
            Some(Token::Variable(_) | Token::DotDotDot | Token::Amp)
        )
}

fn parse_type_atom(parser: &mut Parser) -> Result<TypeHint, ParseError> {
    if parser.eat(&Token::LeftParen) {
        let inner = parse_type_hint(parser)?;
        parser.expect(Token::RightParen)?;
        return Ok(inner);
    }

    let span = parser.current_span();
    let keyword = match parser.current() {
        Token::Static => Some("static"),
        Token::Null => Some("null"),
        Token::False => Some("false"),
        Token::True => Some("true"),
        _ => None,
    };
    if let Some(text) = keyword {
        parser.advance();
        return Ok(TypeHint::Named(Name {
            text: parser.intern(text),
            kind: NameKind::Unqualified,
            span,
        }));
    }

    Ok(TypeHint::Named(parse_name(parser)?))
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::interner::Interner;
    use crate::parser::Parser;

    fn parse(source: &str) -> (SourceFile, Interner) {
        Parser::new(source).unwrap().parse().unwrap()
    }

    #[test]
    fn test_global_block_without_namespace() {
        let (file, _) = parse("<?php class A {}");
        assert_eq!(file.blocks.len(), 1);
        assert!(file.blocks[0].name.is_none());
        assert_eq!(file.blocks[0].types.len(), 1);
    }

    #[test]
    fn test_braced_namespaces() {
        let (file, interner) = parse("<?php namespace a { class A {} } namespace b { class B {} }");
        let names: Vec<_> = file
            .blocks
            .iter()
            .map(|b| b.name.map(|n| interner.resolve(n.text).to_string()))
            .collect();
        assert_eq!(names, vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[test]
    fn test_group_use() {
        let (file, interner) = parse("<?php namespace app; use lang\\{Value, Type as T};");
        let uses = &file.blocks[0].uses;
        assert_eq!(uses.len(), 2);
        assert_eq!(interner.resolve(uses[0].name.text), "lang\\Value");
        assert_eq!(uses[1].local_name(&interner), "T");
    }

    #[test]
    fn test_promoted_parameter_becomes_property() {
        let (file, interner) = parse("<?php class P { public function __construct(private int $x = 1) {} }");
        let decl = &file.blocks[0].types[0];
        let property = decl.properties().next().unwrap();
        assert!(property.promoted);
        assert_eq!(interner.resolve(property.name.name), "x");
        assert!(property.modifiers.is_private);
    }

    #[test]
    fn test_by_ref_parameter_is_not_intersection() {
        let (file, _) = parse("<?php class P { function f(Foo &$x) {} }");
        let method = file.blocks[0].types[0].methods().next().unwrap();
        assert!(method.parameters[0].by_ref);
        assert!(matches!(method.parameters[0].type_hint, Some(TypeHint::Named(_))));
    }

    #[test]
    fn test_member_error_is_recorded_and_parsing_continues() {
        let errors = Parser::new("<?php class A { const = ; public $ok; }")
            .unwrap()
            .parse()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
