//! Expression AST nodes
//!
//! The constant-expression grammar: literals, arrays, object construction,
//! class constant / static property / `::class` access, bare constants,
//! property and index access, unary, binary and ternary operators, and raw
//! code fragments that are parsed on demand.

use super::*;

/// Expression (produces a value)
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// null, true, 42, 1.5, "text"
    Literal(Literal),

    /// [1, 2], ['a' => 1], array(1, 2)
    Array(ArrayExpression),

    /// new Fixture(1, name: 'x')
    New(NewExpression),

    /// self::class, Type::CONSTANT, Type::$property
    ScopeResolution(ScopeResolutionExpression),

    /// PHP_INT_MAX, \E_ALL
    ConstAccess(ConstAccessExpression),

    /// expr->name, expr?->name
    PropertyAccess(PropertyAccessExpression),

    /// expr[key]
    Index(IndexExpression),

    /// -x, !x
    Unary(UnaryExpression),

    /// x + y, a ?? b
    Binary(BinaryExpression),

    /// c ? a : b, a ?: b
    Ternary(TernaryExpression),

    /// Source text holding exactly one expression, parsed when evaluated
    RawCode(RawCodeExpression),
}

impl Expression {
    /// Get the span of this expression
    pub fn span(&self) -> &Span {
        match self {
            Expression::Literal(e) => &e.span,
            Expression::Array(e) => &e.span,
            Expression::New(e) => &e.span,
            Expression::ScopeResolution(e) => &e.span,
            Expression::ConstAccess(e) => &e.span,
            Expression::PropertyAccess(e) => &e.span,
            Expression::Index(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Ternary(e) => &e.span,
            Expression::RawCode(e) => &e.span,
        }
    }

    /// Check if this expression is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal(_))
    }
}

// ============================================================================
// Literals
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Symbol),
}

// ============================================================================
// Arrays
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression {
    pub elements: Vec<ArrayElement>,
    pub span: Span,
}

/// `value`, `key => value` or `...value`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayElement {
    pub key: Option<Expression>,
    pub value: Expression,
    pub spread: bool,
    pub span: Span,
}

// ============================================================================
// Class references
// ============================================================================

/// Class operand of `new` and `::`.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassRef {
    Named(Name),
    SelfType(Span),
    Parent(Span),
    Static(Span),
}

impl ClassRef {
    pub fn span(&self) -> &Span {
        match self {
            ClassRef::Named(name) => &name.span,
            ClassRef::SelfType(span) | ClassRef::Parent(span) | ClassRef::Static(span) => span,
        }
    }
}

/// New expression: new Point(1, 2)
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    pub class: ClassRef,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeResolutionExpression {
    pub class: ClassRef,
    pub member: ScopeMember,
    pub span: Span,
}

/// Right-hand side of `::`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScopeMember {
    /// `::class`
    Class,
    /// `::NAME` (class constant or enum case)
    Constant(Identifier),
    /// `::$name`
    StaticProperty(Identifier),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstAccessExpression {
    pub name: Name,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessExpression {
    pub object: Box<Expression>,
    pub property: Identifier,
    pub nullsafe: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    pub object: Box<Expression>,
    pub index: Box<Expression>,
    pub span: Span,
}

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,       // +x
    Minus,      // -x
    Not,        // !x
    BitwiseNot, // ~x
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
    Modulo,   // %
    Exponent, // **
    Concat,   // .

    // Bitwise
    BitwiseAnd, // &
    BitwiseOr,  // |
    BitwiseXor, // ^
    LeftShift,  // <<
    RightShift, // >>

    // Comparison
    Equal,        // ==
    NotEqual,     // != <>
    Identical,    // ===
    NotIdentical, // !==
    LessThan,     // <
    LessEqual,    // <=
    GreaterThan,  // >
    GreaterEqual, // >=
    Spaceship,    // <=>

    // Logical (short-circuit except xor)
    LogicalAnd, // && and
    LogicalOr,  // || or
    LogicalXor, // xor
    Coalesce,   // ??
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Exponent => "**",
            BinaryOperator::Concat => ".",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Identical => "===",
            BinaryOperator::NotIdentical => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Spaceship => "<=>",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::LogicalXor => "xor",
            BinaryOperator::Coalesce => "??",
        }
    }
}

/// `condition ? then : else`; `then_branch` is `None` for `condition ?: else`.
#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpression {
    pub condition: Box<Expression>,
    pub then_branch: Option<Box<Expression>>,
    pub else_branch: Box<Expression>,
    pub span: Span,
}

/// Code held as text and parsed when evaluated. Built for computed
/// annotation arguments, never by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCodeExpression {
    pub code: String,
    pub span: Span,
}

impl RawCodeExpression {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            span: Span::default(),
        }
    }
}
