//! Expression parsing
//!
//! Precedence climbing over the constant-expression grammar. Constructs that
//! need a running program (variables, calls, closures, assignments) are
//! rejected with `ParseErrorKind::Unsupported`.

use super::guards::{nested, LoopGuard};
use super::precedence::{binary_operator, get_precedence, is_right_associative, Precedence};
use super::{ParseError, Parser};
use crate::ast::*;
use crate::token::Token;

/// Parse a full expression.
pub fn parse_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    parse_expression_bp(parser, Precedence::KeywordOr)
}

/// Parse an expression whose infix operators bind at least as tight as `min`.
pub fn parse_expression_bp(parser: &mut Parser, min: Precedence) -> Result<Expression, ParseError> {
    nested(parser, "expression", |parser| parse_binary(parser, min))
}

fn parse_binary(parser: &mut Parser, min: Precedence) -> Result<Expression, ParseError> {
    let mut left = parse_unary(parser)?;
    let mut guard = LoopGuard::new("binary_expression");
    // Shortness of the last ternary built in this loop
    let mut chained: Option<bool> = None;

    loop {
        guard.check()?;

        let token = parser.current().clone();
        let precedence = get_precedence(&token);
        if precedence == Precedence::None || precedence < min {
            break;
        }

        if matches!(token, Token::Question) {
            let start = parser.current_span();
            let ternary = parse_ternary(parser, left)?;
            let short = matches!(&ternary, Expression::Ternary(t) if t.then_branch.is_none());
            // Only `a ?: b ?: c` may chain without parentheses
            if chained.is_some_and(|previous| !(previous && short)) {
                return Err(ParseError::invalid_syntax(
                    "unparenthesized nested ternary expressions are not allowed",
                    start,
                )
                .with_suggestion("Use explicit parentheses around the nested ternary"));
            }
            chained = Some(short);
            left = ternary;
            continue;
        }

        let Some(operator) = binary_operator(&token) else {
            break;
        };
        parser.advance();

        let next_min = if is_right_associative(&token) {
            precedence
        } else {
            precedence.tighter()
        };
        let right = parse_expression_bp(parser, next_min)?;
        let span = left.span().to(right.span());
        left = Expression::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }

    Ok(left)
}

/// `condition ? then : else` and `condition ?: else`
fn parse_ternary(parser: &mut Parser, condition: Expression) -> Result<Expression, ParseError> {
    parser.expect(Token::Question)?;

    let then_branch = if parser.eat(&Token::Colon) {
        None
    } else {
        let then = parse_expression(parser)?;
        parser.expect(Token::Colon)?;
        Some(Box::new(then))
    };
    let else_branch = parse_expression_bp(parser, Precedence::Conditional.tighter())?;
    let span = condition.span().to(else_branch.span());

    Ok(Expression::Ternary(TernaryExpression {
        condition: Box::new(condition),
        then_branch,
        else_branch: Box::new(else_branch),
        span,
    }))
}

fn parse_unary(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let operator = match parser.current() {
        Token::Plus => UnaryOperator::Plus,
        Token::Minus => UnaryOperator::Minus,
        Token::Bang => UnaryOperator::Not,
        Token::Tilde => UnaryOperator::BitwiseNot,
        Token::At => {
            // Error suppression has no effect on constant expressions
            parser.advance();
            return parse_expression_bp(parser, Precedence::Unary);
        }
        Token::PlusPlus | Token::MinusMinus => {
            return Err(ParseError::unsupported("An increment", start));
        }
        _ => return parse_postfix(parser),
    };
    parser.advance();

    let min = if operator == UnaryOperator::Not {
        Precedence::Not
    } else {
        Precedence::Unary
    };
    let operand = parse_expression_bp(parser, min)?;
    let span = start.to(operand.span());

    Ok(Expression::Unary(UnaryExpression {
        operator,
        operand: Box::new(operand),
        span,
    }))
}

fn parse_postfix(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut expr = parse_primary(parser)?;
    let mut guard = LoopGuard::new("postfix_expression");

    loop {
        guard.check()?;

        match parser.current() {
            Token::Arrow | Token::NullsafeArrow => {
                let nullsafe = matches!(parser.advance(), Token::NullsafeArrow);
                let property = parser.expect_member_name()?;
                if parser.check(&Token::LeftParen) {
                    return Err(ParseError::unsupported("A method call", parser.current_span()));
                }
                let span = expr.span().to(&property.span);
                expr = Expression::PropertyAccess(PropertyAccessExpression {
                    object: Box::new(expr),
                    property,
                    nullsafe,
                    span,
                });
            }
            Token::LeftBracket => {
                parser.advance();
                let index = parse_expression(parser)?;
                let end = parser.current_span();
                parser.expect(Token::RightBracket)?;
                let span = expr.span().to(&end);
                expr = Expression::Index(IndexExpression {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                });
            }
            Token::LeftParen => {
                return Err(ParseError::unsupported("A function call", parser.current_span()));
            }
            Token::DoubleColon => {
                return Err(ParseError::unsupported(
                    "A dynamic class reference",
                    parser.current_span(),
                ));
            }
            _ => break,
        }
    }

    Ok(expr)
}

fn literal(parser: &mut Parser, value: LiteralValue) -> Expression {
    let span = parser.current_span();
    parser.advance();
    Expression::Literal(Literal { value, span })
}

fn parse_primary(parser: &mut Parser) -> Result<Expression, ParseError> {
    let span = parser.current_span();

    match parser.current().clone() {
        Token::IntLiteral(n) => Ok(literal(parser, LiteralValue::Int(n))),
        Token::FloatLiteral(n) => Ok(literal(parser, LiteralValue::Float(n))),
        Token::StringLiteral(s) => Ok(literal(parser, LiteralValue::String(s))),
        Token::True => Ok(literal(parser, LiteralValue::Bool(true))),
        Token::False => Ok(literal(parser, LiteralValue::Bool(false))),
        Token::Null => Ok(literal(parser, LiteralValue::Null)),

        Token::LeftBracket => {
            parser.advance();
            parse_array_elements(parser, span, Token::RightBracket)
        }

        Token::Identifier(_)
            if parser.check_word("array") && matches!(parser.peek(), Some(Token::LeftParen)) =>
        {
            parser.advance();
            parser.advance();
            parse_array_elements(parser, span, Token::RightParen)
        }

        Token::New => parse_new(parser),

        Token::LeftParen => {
            parser.advance();
            let inner = parse_expression(parser)?;
            parser.expect(Token::RightParen)?;
            Ok(inner)
        }

        Token::Static => {
            parser.advance();
            parse_scope_member(parser, ClassRef::Static(span))
        }

        Token::Identifier(_) | Token::QualifiedName(_) => {
            let name = parse_name(parser)?;
            if parser.check(&Token::DoubleColon) {
                let class = class_ref(parser, name);
                parse_scope_member(parser, class)
            } else if parser.check(&Token::LeftParen) {
                Err(ParseError::unsupported("A function call", parser.current_span()))
            } else {
                Ok(Expression::ConstAccess(ConstAccessExpression { name, span }))
            }
        }

        Token::Variable(_) | Token::Dollar => Err(ParseError::unsupported("A variable", span)
            .with_suggestion("Reference a class constant or static property instead")),

        Token::Function | Token::Fn => Err(ParseError::unsupported("A closure", span)),

        Token::Clone => Err(ParseError::unsupported("clone", span)),

        _ => Err(parser.unexpected_token(&[])),
    }
}

/// Elements after the opening `[` or `array(`, up to and including `close`.
fn parse_array_elements(
    parser: &mut Parser,
    start: crate::token::Span,
    close: Token,
) -> Result<Expression, ParseError> {
    let mut elements = Vec::new();
    let mut guard = LoopGuard::new("array_elements");

    while !parser.check(&close) {
        guard.check()?;

        let element_start = parser.current_span();
        if parser.eat(&Token::DotDotDot) {
            let value = parse_expression(parser)?;
            let span = element_start.to(value.span());
            elements.push(ArrayElement {
                key: None,
                value,
                spread: true,
                span,
            });
        } else {
            let first = parse_expression(parser)?;
            let (key, value) = if parser.eat(&Token::DoubleArrow) {
                (Some(first), parse_expression(parser)?)
            } else {
                (None, first)
            };
            let span = element_start.to(value.span());
            elements.push(ArrayElement {
                key,
                value,
                spread: false,
                span,
            });
        }

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    let end = parser.current_span();
    parser.expect(close)?;

    Ok(Expression::Array(ArrayExpression {
        elements,
        span: start.to(&end),
    }))
}

/// `new Name(args)`; the argument list is optional.
fn parse_new(parser: &mut Parser) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::New)?;

    let class = match parser.current() {
        Token::Static => {
            let span = parser.current_span();
            parser.advance();
            ClassRef::Static(span)
        }
        Token::Identifier(_) | Token::QualifiedName(_) => {
            let name = parse_name(parser)?;
            class_ref(parser, name)
        }
        Token::Class => {
            return Err(ParseError::unsupported("An anonymous class", parser.current_span()));
        }
        _ => {
            return Err(ParseError::unsupported("A dynamic class name", parser.current_span()));
        }
    };

    let arguments = if parser.check(&Token::LeftParen) {
        parse_arguments(parser)?
    } else {
        Vec::new()
    };

    Ok(Expression::New(NewExpression {
        class,
        arguments,
        span: start.to(&parser.previous_span()),
    }))
}

/// Member after `::`; the class operand has already been parsed.
fn parse_scope_member(parser: &mut Parser, class: ClassRef) -> Result<Expression, ParseError> {
    let start = *class.span();
    parser.expect(Token::DoubleColon)?;

    let member = match parser.current().clone() {
        Token::Class => {
            parser.advance();
            ScopeMember::Class
        }
        Token::Variable(sym) => {
            let span = parser.current_span();
            parser.advance();
            ScopeMember::StaticProperty(Identifier::new(sym, span))
        }
        Token::Dollar | Token::LeftBrace => {
            return Err(ParseError::unsupported("A dynamic member name", parser.current_span()));
        }
        _ => ScopeMember::Constant(parser.expect_member_name()?),
    };

    if parser.check(&Token::LeftParen) {
        return Err(ParseError::unsupported("A static method call", parser.current_span()));
    }

    Ok(Expression::ScopeResolution(ScopeResolutionExpression {
        class,
        member,
        span: start.to(&parser.previous_span()),
    }))
}

/// `self` and `parent` are spelled as names but mean the enclosing scope.
fn class_ref(parser: &Parser, name: Name) -> ClassRef {
    if name.kind == NameKind::Unqualified {
        let text = parser.resolve(name.text);
        if text.eq_ignore_ascii_case("self") {
            return ClassRef::SelfType(name.span);
        }
        if text.eq_ignore_ascii_case("parent") {
            return ClassRef::Parent(name.span);
        }
    }
    ClassRef::Named(name)
}

/// Parse an identifier or qualified name.
pub fn parse_name(parser: &mut Parser) -> Result<Name, ParseError> {
    let span = parser.current_span();
    match parser.current().clone() {
        Token::Identifier(text) => {
            parser.advance();
            Ok(Name {
                text,
                kind: NameKind::Unqualified,
                span,
            })
        }
        Token::QualifiedName(sym) => {
            parser.advance();
            let raw = parser.resolve(sym).to_string();
            let relative = raw
                .get(..10)
                .filter(|p| p.eq_ignore_ascii_case("namespace\\"))
                .and_then(|_| raw.get(10..))
                .filter(|rest| !rest.is_empty());
            let (text, kind) = if let Some(rest) = raw.strip_prefix('\\') {
                (rest.to_string(), NameKind::FullyQualified)
            } else if let Some(rest) = relative {
                (rest.to_string(), NameKind::Relative)
            } else {
                (raw.clone(), NameKind::Qualified)
            };
            Ok(Name {
                text: parser.intern(&text),
                kind,
                span,
            })
        }
        _ => Err(parser.unexpected_token(&[Token::Identifier(crate::interner::Symbol::dummy())])),
    }
}

/// `(arg, name: arg, ...arg)`
pub fn parse_arguments(parser: &mut Parser) -> Result<Vec<Argument>, ParseError> {
    parser.expect(Token::LeftParen)?;

    let mut arguments = Vec::new();
    let mut guard = LoopGuard::new("arguments");

    while !parser.check(&Token::RightParen) {
        guard.check()?;

        let start = parser.current_span();
        if parser.eat(&Token::DotDotDot) {
            if parser.check(&Token::RightParen) {
                return Err(ParseError::unsupported("A first-class callable", start));
            }
            let value = parse_expression(parser)?;
            let span = start.to(value.span());
            arguments.push(Argument {
                name: None,
                value,
                spread: true,
                span,
            });
        } else {
            let named = (matches!(parser.current(), Token::Identifier(_)) || parser.current().is_keyword())
                && matches!(parser.peek(), Some(Token::Colon));
            let name = if named {
                let name = parser.expect_member_name()?;
                parser.expect(Token::Colon)?;
                Some(name)
            } else {
                None
            };
            let value = parse_expression(parser)?;
            let span = start.to(value.span());
            arguments.push(Argument {
                name,
                value,
                spread: false,
                span,
            });
        }

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightParen)?;
    Ok(arguments)
}
