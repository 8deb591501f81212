//! Token definitions for declaration source files.
//!
//! Keywords are matched case-insensitively by the lexer. Names that are only
//! contextually special (`self`, `parent`, `enum`, `array`, `mixed`, ...)
//! stay plain identifiers and are recognised by the parser.

use crate::interner::Symbol;
use std::fmt;

/// A token in a source file.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Abstract,
    And,
    As,
    Case,
    Class,
    Clone,
    Const,
    Declare,
    Extends,
    Final,
    Fn,
    Function,
    Implements,
    Instanceof,
    Insteadof,
    Interface,
    Namespace,
    New,
    Or,
    Private,
    Protected,
    Public,
    Readonly,
    Static,
    Trait,
    Use,
    Var,
    Xor,

    // Literals
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(Symbol),
    True,
    False,
    Null,

    // Names
    Identifier(Symbol),
    /// `a\b\C`, `\C` or `namespace\C`, stored verbatim
    QualifiedName(Symbol),
    /// `$name`, stored without the sigil
    Variable(Symbol),

    /// `/** ... */`, stored verbatim
    DocComment(Symbol),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    Dot,
    Bang,
    Tilde,
    Amp,
    Pipe,
    Caret,
    LessLess,
    GreaterGreater,
    AmpAmp,
    PipePipe,
    QuestionQuestion,
    EqualEqual,
    BangEqual,
    LessGreater,
    EqualEqualEqual,
    BangEqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Spaceship,

    // Assignment
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    StarStarEqual,
    DotEqual,
    AmpEqual,
    PipeEqual,
    CaretEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    QuestionQuestionEqual,
    PlusPlus,
    MinusMinus,

    // Punctuation
    Arrow,
    NullsafeArrow,
    DoubleArrow,
    DoubleColon,
    Question,
    Colon,
    Semicolon,
    Comma,
    DotDotDot,
    At,
    Dollar,
    /// Only seen in group imports: `use a\{B, C};`
    Backslash,
    HashBracket,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    // Special
    Eof,
}

/// Source location information for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

impl Token {
    /// Keyword text for tokens that may double as member names
    /// (`function list()`, `const NEW = 1`, `Foo::CLASS_NAME`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::Abstract => "abstract",
            Token::And => "and",
            Token::As => "as",
            Token::Case => "case",
            Token::Class => "class",
            Token::Clone => "clone",
            Token::Const => "const",
            Token::Declare => "declare",
            Token::Extends => "extends",
            Token::Final => "final",
            Token::Fn => "fn",
            Token::Function => "function",
            Token::Implements => "implements",
            Token::Instanceof => "instanceof",
            Token::Insteadof => "insteadof",
            Token::Interface => "interface",
            Token::Namespace => "namespace",
            Token::New => "new",
            Token::Or => "or",
            Token::Private => "private",
            Token::Protected => "protected",
            Token::Public => "public",
            Token::Readonly => "readonly",
            Token::Static => "static",
            Token::Trait => "trait",
            Token::Use => "use",
            Token::Var => "var",
            Token::Xor => "xor",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            _ => return None,
        };
        Some(text)
    }

    pub fn is_keyword(&self) -> bool {
        self.keyword_text().is_some()
    }

    /// Returns true if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::IntLiteral(_)
                | Token::FloatLiteral(_)
                | Token::StringLiteral(_)
                | Token::True
                | Token::False
                | Token::Null
        )
    }

    /// Returns true for member modifiers.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Token::Public
                | Token::Protected
                | Token::Private
                | Token::Static
                | Token::Abstract
                | Token::Final
                | Token::Readonly
                | Token::Var
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.keyword_text() {
            return f.write_str(text);
        }
        match self {
            Token::IntLiteral(n) => write!(f, "{}", n),
            Token::FloatLiteral(n) => write!(f, "{}", n),
            Token::StringLiteral(_) => write!(f, "string literal"),
            Token::Identifier(_) => write!(f, "identifier"),
            Token::QualifiedName(_) => write!(f, "qualified name"),
            Token::Variable(_) => write!(f, "variable"),
            Token::DocComment(_) => write!(f, "doc comment"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::StarStar => write!(f, "**"),
            Token::Dot => write!(f, "."),
            Token::Bang => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::Amp => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::LessLess => write!(f, "<<"),
            Token::GreaterGreater => write!(f, ">>"),
            Token::AmpAmp => write!(f, "&&"),
            Token::PipePipe => write!(f, "||"),
            Token::QuestionQuestion => write!(f, "??"),
            Token::EqualEqual => write!(f, "=="),
            Token::BangEqual => write!(f, "!="),
            Token::LessGreater => write!(f, "<>"),
            Token::EqualEqualEqual => write!(f, "==="),
            Token::BangEqualEqual => write!(f, "!=="),
            Token::Less => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),
            Token::Spaceship => write!(f, "<=>"),
            Token::Equal => write!(f, "="),
            Token::PlusEqual => write!(f, "+="),
            Token::MinusEqual => write!(f, "-="),
            Token::StarEqual => write!(f, "*="),
            Token::SlashEqual => write!(f, "/="),
            Token::PercentEqual => write!(f, "%="),
            Token::StarStarEqual => write!(f, "**="),
            Token::DotEqual => write!(f, ".="),
            Token::AmpEqual => write!(f, "&="),
            Token::PipeEqual => write!(f, "|="),
            Token::CaretEqual => write!(f, "^="),
            Token::LessLessEqual => write!(f, "<<="),
            Token::GreaterGreaterEqual => write!(f, ">>="),
            Token::QuestionQuestionEqual => write!(f, "??="),
            Token::PlusPlus => write!(f, "++"),
            Token::MinusMinus => write!(f, "--"),
            Token::Arrow => write!(f, "->"),
            Token::NullsafeArrow => write!(f, "?->"),
            Token::DoubleArrow => write!(f, "=>"),
            Token::DoubleColon => write!(f, "::"),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::DotDotDot => write!(f, "..."),
            Token::At => write!(f, "@"),
            Token::Dollar => write!(f, "$"),
            Token::Backslash => write!(f, "\\"),
            Token::HashBracket => write!(f, "#["),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Eof => write!(f, "end of file"),
            _ => write!(f, "{:?}", self),
        }
    }
}
