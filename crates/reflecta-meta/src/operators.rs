//! Operator semantics
//!
//! Arithmetic, bitwise, string and comparison operators with the host
//! language's behavior: int overflow promotes to float, `/` stays int only
//! when exact, loose comparison follows the PHP 8 comparison table.

use crate::error::{MetaError, MetaResult};
use crate::value::{numeric_string, Array, InstanceKind, Number, Value};
use reflecta_parser::{BinaryOperator, UnaryOperator};
use std::cmp::Ordering;
use std::sync::Arc;

/// Apply an operator whose operands are both already evaluated.
///
/// Short-circuit operators (`&&`, `||`, `??`) are handled by the evaluator
/// and only reach here with both sides known.
pub fn binary(op: BinaryOperator, left: &Value, right: &Value) -> MetaResult<Value> {
    let symbol = op.symbol();
    match op {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => arithmetic(left, right, symbol, i64::checked_sub, |a, b| a - b),
        BinaryOperator::Multiply => arithmetic(left, right, symbol, i64::checked_mul, |a, b| a * b),
        BinaryOperator::Divide => divide(left, right),
        BinaryOperator::Modulo => modulo(left, right),
        BinaryOperator::Exponent => power(left, right),
        BinaryOperator::Concat => Ok(Value::String(left.to_php_string()? + &right.to_php_string()?)),

        BinaryOperator::BitwiseAnd => bitwise(left, right, symbol, |a, b| a & b),
        BinaryOperator::BitwiseOr => bitwise(left, right, symbol, |a, b| a | b),
        BinaryOperator::BitwiseXor => bitwise(left, right, symbol, |a, b| a ^ b),
        BinaryOperator::LeftShift => shift(left, right, true),
        BinaryOperator::RightShift => shift(left, right, false),

        BinaryOperator::Equal => Ok(Value::Bool(loose_equals(left, right))),
        BinaryOperator::NotEqual => Ok(Value::Bool(!loose_equals(left, right))),
        BinaryOperator::Identical => Ok(Value::Bool(identical(left, right))),
        BinaryOperator::NotIdentical => Ok(Value::Bool(!identical(left, right))),
        BinaryOperator::LessThan => Ok(Value::Bool(compare(left, right) == Ordering::Less)),
        BinaryOperator::LessEqual => Ok(Value::Bool(compare(left, right) != Ordering::Greater)),
        BinaryOperator::GreaterThan => Ok(Value::Bool(compare(right, left) == Ordering::Less)),
        BinaryOperator::GreaterEqual => Ok(Value::Bool(compare(right, left) != Ordering::Greater)),
        BinaryOperator::Spaceship => Ok(Value::Int(compare(left, right) as i64)),

        BinaryOperator::LogicalAnd => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOperator::LogicalOr => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinaryOperator::LogicalXor => Ok(Value::Bool(left.is_truthy() != right.is_truthy())),
        BinaryOperator::Coalesce => Ok(if left.is_null() { right.clone() } else { left.clone() }),
    }
}

pub fn unary(op: UnaryOperator, operand: &Value) -> MetaResult<Value> {
    match op {
        UnaryOperator::Plus => binary(BinaryOperator::Multiply, operand, &Value::Int(1)),
        UnaryOperator::Minus => binary(BinaryOperator::Multiply, operand, &Value::Int(-1)),
        UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOperator::BitwiseNot => match operand {
            Value::Int(n) => Ok(Value::Int(!n)),
            Value::Float(_) => Ok(Value::Int(!operand.to_int("~")?)),
            Value::String(s) => Ok(Value::String(bytes_to_string(s.bytes().map(|b| !b).collect()))),
            other => Err(MetaError::evaluation(format!(
                "Cannot perform bitwise not on {}",
                other.type_name()
            ))),
        },
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

fn add(left: &Value, right: &Value) -> MetaResult<Value> {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => Ok(Value::Array(a.union(b))),
        (Value::Array(_), _) | (_, Value::Array(_)) => Err(MetaError::evaluation(format!(
            "Unsupported operand types: {} + {}",
            left.type_name(),
            right.type_name()
        ))),
        _ => arithmetic(left, right, "+", i64::checked_add, |a, b| a + b),
    }
}

fn arithmetic(
    left: &Value,
    right: &Value,
    symbol: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> MetaResult<Value> {
    let a = left.to_number(symbol)?;
    let b = right.to_number(symbol)?;
    let result = match (a, b) {
        (Number::Int(x), Number::Int(y)) => match int_op(x, y) {
            Some(n) => Number::Int(n),
            None => Number::Float(float_op(x as f64, y as f64)),
        },
        _ => Number::Float(float_op(a.as_f64(), b.as_f64())),
    };
    Ok(result.into_value())
}

fn divide(left: &Value, right: &Value) -> MetaResult<Value> {
    let a = left.to_number("/")?;
    let b = right.to_number("/")?;
    if b.as_f64() == 0.0 {
        return Err(MetaError::evaluation("Division by zero"));
    }
    let result = match (a, b) {
        (Number::Int(x), Number::Int(y)) if x.checked_rem(y) == Some(0) => match x.checked_div(y) {
            Some(n) => Number::Int(n),
            None => Number::Float(x as f64 / y as f64),
        },
        _ => Number::Float(a.as_f64() / b.as_f64()),
    };
    Ok(result.into_value())
}

fn modulo(left: &Value, right: &Value) -> MetaResult<Value> {
    let a = left.to_int("%")?;
    let b = right.to_int("%")?;
    if b == 0 {
        return Err(MetaError::evaluation("Modulo by zero"));
    }
    Ok(Value::Int(a.wrapping_rem(b)))
}

fn power(left: &Value, right: &Value) -> MetaResult<Value> {
    let a = left.to_number("**")?;
    let b = right.to_number("**")?;
    let result = match (a, b) {
        (Number::Int(base), Number::Int(exp)) if exp >= 0 => match int_pow(base, exp) {
            Some(n) => Number::Int(n),
            None => Number::Float((base as f64).powf(exp as f64)),
        },
        _ => Number::Float(a.as_f64().powf(b.as_f64())),
    };
    Ok(result.into_value())
}

fn int_pow(base: i64, exp: i64) -> Option<i64> {
    let exp = u32::try_from(exp).ok()?;
    base.checked_pow(exp)
}

// ============================================================================
// Bitwise
// ============================================================================

/// Lossy: see `Value::String`.
fn bytes_to_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

fn bitwise(left: &Value, right: &Value, symbol: &str, op: fn(i64, i64) -> i64) -> MetaResult<Value> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        let (a, b) = (a.as_bytes(), b.as_bytes());
        let bytes: Vec<u8> = if symbol == "|" {
            let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
            long.iter()
                .enumerate()
                .map(|(i, &x)| short.get(i).map_or(x, |&y| x | y))
                .collect()
        } else {
            a.iter()
                .zip(b.iter())
                .map(|(&x, &y)| op(x as i64, y as i64) as u8)
                .collect()
        };
        return Ok(Value::String(bytes_to_string(bytes)));
    }

    if matches!(left, Value::Array(_)) || matches!(right, Value::Array(_)) {
        return Err(MetaError::evaluation(format!(
            "Unsupported operand types: {} {} {}",
            left.type_name(),
            symbol,
            right.type_name()
        )));
    }
    Ok(Value::Int(op(left.to_int(symbol)?, right.to_int(symbol)?)))
}

fn shift(left: &Value, right: &Value, is_left: bool) -> MetaResult<Value> {
    let symbol = if is_left { "<<" } else { ">>" };
    let value = left.to_int(symbol)?;
    let amount = right.to_int(symbol)?;
    if amount < 0 {
        return Err(MetaError::evaluation("Bit shift by negative number"));
    }

    let result = if is_left {
        if amount >= 64 {
            0
        } else {
            ((value as u64) << amount) as i64
        }
    } else if amount >= 64 {
        if value < 0 {
            -1
        } else {
            0
        }
    } else {
        value >> amount
    };
    Ok(Value::Int(result))
}

// ============================================================================
// Comparison
// ============================================================================

/// `===`: same type and value; objects by identity, enum cases by class
/// and case name.
pub fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && identical(va, vb))
        }
        (Value::Object(a), Value::Object(b)) => {
            Arc::ptr_eq(a, b)
                || match (&a.kind, &b.kind) {
                    (InstanceKind::EnumCase { name: x }, InstanceKind::EnumCase { name: y }) => {
                        a.class.eq_ignore_ascii_case(&b.class) && x == y
                    }
                    _ => false,
                }
        }
        _ => false,
    }
}

/// `==`
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    compare(left, right) == Ordering::Equal
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    // NaN compares as greater in both directions
    a.partial_cmp(&b).unwrap_or(Ordering::Greater)
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        _ => compare_f64(a.as_f64(), b.as_f64()),
    }
}

fn number_of(value: &Value) -> Option<Number> {
    match value {
        Value::Int(n) => Some(Number::Int(*n)),
        Value::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

/// Three-way loose comparison. Uncomparable pairs (arrays with different
/// keys, objects of different classes) report `Greater` in both
/// directions, so neither `<` nor `>` holds and `==` is false.
pub fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, Value::String(s)) => {
            if s.is_empty() {
                Ordering::Equal
            } else {
                Ordering::Less
            }
        }
        (Value::String(s), Value::Null) => {
            if s.is_empty() {
                Ordering::Equal
            } else {
                Ordering::Greater
            }
        }
        (Value::Bool(_) | Value::Null, _) | (_, Value::Bool(_) | Value::Null) => {
            left.is_truthy().cmp(&right.is_truthy())
        }

        (Value::String(a), Value::String(b)) => match (numeric_string(a), numeric_string(b)) {
            (Some(x), Some(y)) => compare_numbers(x, y),
            _ => a.as_bytes().cmp(b.as_bytes()),
        },

        (Value::Int(_) | Value::Float(_), Value::String(s)) => {
            let number = number_of(left).unwrap_or(Number::Int(0));
            match numeric_string(s) {
                Some(other) => compare_numbers(number, other),
                None => number_text(number).as_bytes().cmp(s.as_bytes()),
            }
        }
        (Value::String(s), Value::Int(_) | Value::Float(_)) => {
            let number = number_of(right).unwrap_or(Number::Int(0));
            match numeric_string(s) {
                Some(other) => compare_numbers(other, number),
                None => s.as_bytes().cmp(number_text(number).as_bytes()),
            }
        }

        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => match (number_of(left), number_of(right)) {
            (Some(a), Some(b)) => compare_numbers(a, b),
            _ => Ordering::Greater,
        },

        (Value::Array(a), Value::Array(b)) => compare_arrays(a, b),
        (Value::Array(_), _) => Ordering::Greater,
        (_, Value::Array(_)) => Ordering::Less,

        (Value::Object(a), Value::Object(b)) => {
            if Arc::ptr_eq(a, b) {
                return Ordering::Equal;
            }
            match (&a.kind, &b.kind) {
                (InstanceKind::Object, InstanceKind::Object) if a.class.eq_ignore_ascii_case(&b.class) => {
                    compare_arrays(&a.properties, &b.properties)
                }
                (InstanceKind::EnumCase { .. }, InstanceKind::EnumCase { .. }) if identical(left, right) => {
                    Ordering::Equal
                }
                _ => Ordering::Greater,
            }
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => Ordering::Greater,
    }
}

fn number_text(number: Number) -> String {
    match number {
        Number::Int(n) => n.to_string(),
        Number::Float(f) => crate::value::format_float(f),
    }
}

/// Smaller arrays are less; equal sizes compare value by value in the
/// left array's key order.
fn compare_arrays(a: &Array, b: &Array) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        other => return other,
    }
    for (key, value) in a.iter() {
        let Some(other) = b.get(key) else {
            return Ordering::Greater;
        };
        match compare(value, other) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}
