//! Operator precedence table for expression parsing.
//!
//! Binding strength follows the host language, loosest first:
//! `or`, `xor`, `and`, `? :`, `??`, `||`, `&&`, `|`, `^`, `&`, equality,
//! relational, `.`, shifts, `+ -`, `* / %`, `!`, unary `+ - ~`, `**`.

use crate::ast::BinaryOperator;
use crate::token::Token;

/// Operator precedence level (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    KeywordOr = 1,       // or
    KeywordXor = 2,      // xor
    KeywordAnd = 3,      // and
    Conditional = 4,     // ? :
    NullCoalescing = 5,  // ??
    LogicalOr = 6,       // ||
    LogicalAnd = 7,      // &&
    BitwiseOr = 8,       // |
    BitwiseXor = 9,      // ^
    BitwiseAnd = 10,     // &
    Equality = 11,       // == != === !== <> <=>
    Relational = 12,     // < <= > >=
    Concat = 13,         // .
    Shift = 14,          // << >>
    Additive = 15,       // + -
    Multiplicative = 16, // * / %
    Not = 17,            // !
    Unary = 18,          // + - ~
    Exponentiation = 19, // **
}

impl Precedence {
    /// The next tighter level (used for left-associative right operands).
    pub fn tighter(self) -> Precedence {
        match self {
            Precedence::None => Precedence::KeywordOr,
            Precedence::KeywordOr => Precedence::KeywordXor,
            Precedence::KeywordXor => Precedence::KeywordAnd,
            Precedence::KeywordAnd => Precedence::Conditional,
            Precedence::Conditional => Precedence::NullCoalescing,
            Precedence::NullCoalescing => Precedence::LogicalOr,
            Precedence::LogicalOr => Precedence::LogicalAnd,
            Precedence::LogicalAnd => Precedence::BitwiseOr,
            Precedence::BitwiseOr => Precedence::BitwiseXor,
            Precedence::BitwiseXor => Precedence::BitwiseAnd,
            Precedence::BitwiseAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Concat,
            Precedence::Concat => Precedence::Shift,
            Precedence::Shift => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Not,
            Precedence::Not => Precedence::Unary,
            Precedence::Unary | Precedence::Exponentiation => Precedence::Exponentiation,
        }
    }
}

/// Get the precedence of an infix operator token.
pub fn get_precedence(token: &Token) -> Precedence {
    match token {
        Token::Or => Precedence::KeywordOr,
        Token::Xor => Precedence::KeywordXor,
        Token::And => Precedence::KeywordAnd,
        Token::Question => Precedence::Conditional,
        Token::QuestionQuestion => Precedence::NullCoalescing,
        Token::PipePipe => Precedence::LogicalOr,
        Token::AmpAmp => Precedence::LogicalAnd,
        Token::Pipe => Precedence::BitwiseOr,
        Token::Caret => Precedence::BitwiseXor,
        Token::Amp => Precedence::BitwiseAnd,

        Token::EqualEqual
        | Token::BangEqual
        | Token::LessGreater
        | Token::EqualEqualEqual
        | Token::BangEqualEqual
        | Token::Spaceship => Precedence::Equality,

        Token::Less | Token::LessEqual | Token::Greater | Token::GreaterEqual => {
            Precedence::Relational
        }

        Token::Dot => Precedence::Concat,
        Token::LessLess | Token::GreaterGreater => Precedence::Shift,
        Token::Plus | Token::Minus => Precedence::Additive,
        Token::Star | Token::Slash | Token::Percent => Precedence::Multiplicative,

        // Exponentiation (right-associative)
        Token::StarStar => Precedence::Exponentiation,

        _ => Precedence::None,
    }
}

/// Check if an operator is right-associative.
pub fn is_right_associative(token: &Token) -> bool {
    matches!(token, Token::StarStar | Token::QuestionQuestion)
}

/// Map an infix token to its binary operator (`?` is handled separately).
pub fn binary_operator(token: &Token) -> Option<BinaryOperator> {
    let op = match token {
        Token::Plus => BinaryOperator::Add,
        Token::Minus => BinaryOperator::Subtract,
        Token::Star => BinaryOperator::Multiply,
        Token::Slash => BinaryOperator::Divide,
        Token::Percent => BinaryOperator::Modulo,
        Token::StarStar => BinaryOperator::Exponent,
        Token::Dot => BinaryOperator::Concat,
        Token::Amp => BinaryOperator::BitwiseAnd,
        Token::Pipe => BinaryOperator::BitwiseOr,
        Token::Caret => BinaryOperator::BitwiseXor,
        Token::LessLess => BinaryOperator::LeftShift,
        Token::GreaterGreater => BinaryOperator::RightShift,
        Token::EqualEqual => BinaryOperator::Equal,
        Token::BangEqual | Token::LessGreater => BinaryOperator::NotEqual,
        Token::EqualEqualEqual => BinaryOperator::Identical,
        Token::BangEqualEqual => BinaryOperator::NotIdentical,
        Token::Less => BinaryOperator::LessThan,
        Token::LessEqual => BinaryOperator::LessEqual,
        Token::Greater => BinaryOperator::GreaterThan,
        Token::GreaterEqual => BinaryOperator::GreaterEqual,
        Token::Spaceship => BinaryOperator::Spaceship,
        Token::AmpAmp | Token::And => BinaryOperator::LogicalAnd,
        Token::PipePipe | Token::Or => BinaryOperator::LogicalOr,
        Token::Xor => BinaryOperator::LogicalXor,
        Token::QuestionQuestion => BinaryOperator::Coalesce,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponent_binds_tighter_than_unary() {
        assert!(Precedence::Exponentiation > Precedence::Unary);
        assert!(get_precedence(&Token::StarStar) > get_precedence(&Token::Star));
    }

    #[test]
    fn test_concat_is_looser_than_shift_and_additive() {
        assert!(get_precedence(&Token::Dot) < get_precedence(&Token::LessLess));
        assert!(get_precedence(&Token::Dot) < get_precedence(&Token::Plus));
    }

    #[test]
    fn test_keyword_logical_operators_are_loosest() {
        assert!(get_precedence(&Token::Or) < get_precedence(&Token::Question));
        assert!(get_precedence(&Token::And) < get_precedence(&Token::PipePipe));
    }

    #[test]
    fn test_tighter_is_monotonic() {
        let mut level = Precedence::None;
        while level != Precedence::Exponentiation {
            let next = level.tighter();
            assert!(next > level);
            level = next;
        }
    }
}
