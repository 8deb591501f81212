//! Skipping and error recovery
//!
//! Function bodies, top-level statements and anything the declaration parser
//! does not model are skipped by balancing brackets. After an error the
//! parser synchronizes to the next member or declaration boundary so one
//! malformed member does not hide errors in the rest of the file.

use super::guards::LoopGuard;
use super::{ParseError, Parser};
use crate::token::Token;

/// Upper bound for token-skipping loops; each iteration consumes a token.
const MAX_SKIPPED_TOKENS: usize = 10_000_000;

/// Skip a `{ ... }` block, including nested blocks. The current token must
/// be the opening brace.
pub fn skip_block(parser: &mut Parser) -> Result<(), ParseError> {
    parser.expect(Token::LeftBrace)?;

    let mut depth = 1usize;
    let mut guard = LoopGuard::with_limit("skip_block", MAX_SKIPPED_TOKENS);
    while depth > 0 {
        guard.check()?;
        match parser.current() {
            Token::Eof => return Err(ParseError::unexpected_eof(vec![Token::RightBrace], parser.current_span())),
            Token::LeftBrace => depth += 1,
            Token::RightBrace => depth -= 1,
            _ => {}
        }
        parser.advance();
    }
    Ok(())
}

/// Skip one statement: up to and including a `;` at bracket depth zero, or
/// through the first balanced `{ ... }` block at depth zero.
pub fn skip_statement(parser: &mut Parser) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut guard = LoopGuard::with_limit("skip_statement", MAX_SKIPPED_TOKENS);
    loop {
        guard.check()?;
        match parser.current() {
            Token::Eof => return Ok(()),
            Token::Semicolon if depth == 0 => {
                parser.advance();
                return Ok(());
            }
            Token::LeftBrace if depth == 0 => return skip_block(parser),
            Token::LeftParen | Token::LeftBracket | Token::LeftBrace | Token::HashBracket => depth += 1,
            Token::RightParen | Token::RightBracket | Token::RightBrace => {
                if depth == 0 {
                    // Unbalanced closer belongs to an enclosing construct
                    return Ok(());
                }
                depth -= 1;
            }
            _ => {}
        }
        parser.advance();
    }
}

/// Skip tokens until something that can start a top-level declaration.
pub fn sync_to_declaration_boundary(parser: &mut Parser) {
    let start = parser.position();
    while !parser.at_eof() {
        let at_boundary = matches!(
            parser.current(),
            Token::Class
                | Token::Interface
                | Token::Trait
                | Token::Abstract
                | Token::Final
                | Token::HashBracket
                | Token::Namespace
                | Token::Use
                | Token::Function
        );
        if at_boundary && parser.position() > start {
            return;
        }
        let token = parser.advance();
        if matches!(token, Token::Semicolon | Token::RightBrace) {
            return;
        }
    }
}

/// Skip tokens until something that can start a type member, or the
/// closing brace of the type body.
pub fn sync_to_member_boundary(parser: &mut Parser) {
    let start = parser.position();
    while !parser.at_eof() {
        let current = parser.current();
        if matches!(current, Token::RightBrace) {
            return;
        }
        let at_boundary = current.is_modifier()
            || matches!(
                current,
                Token::Function | Token::Const | Token::Case | Token::Var | Token::HashBracket | Token::Use
            );
        if at_boundary && parser.position() > start {
            return;
        }
        if matches!(parser.advance(), Token::Semicolon) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_block_nested() {
        let mut parser = Parser::new("{ if (a) { b(); } } const").unwrap();
        skip_block(&mut parser).unwrap();
        assert!(parser.check(&Token::Const));
    }

    #[test]
    fn test_skip_block_unterminated() {
        let mut parser = Parser::new("{ { }").unwrap();
        assert!(skip_block(&mut parser).is_err());
    }

    #[test]
    fn test_skip_statement_semicolon() {
        let mut parser = Parser::new("declare(strict_types=1); class").unwrap();
        skip_statement(&mut parser).unwrap();
        assert!(parser.check(&Token::Class));
    }

    #[test]
    fn test_skip_statement_block() {
        let mut parser = Parser::new("function f($a) { return [$a]; } class").unwrap();
        skip_statement(&mut parser).unwrap();
        assert!(parser.check(&Token::Class));
    }

    #[test]
    fn test_sync_to_member_boundary_stops_at_modifier() {
        let mut parser = Parser::new("= = public $a;").unwrap();
        sync_to_member_boundary(&mut parser);
        assert!(parser.check(&Token::Public));
    }

    #[test]
    fn test_sync_to_member_boundary_keeps_closing_brace() {
        let mut parser = Parser::new("oops }").unwrap();
        sync_to_member_boundary(&mut parser);
        assert!(parser.check(&Token::RightBrace));
    }
}
