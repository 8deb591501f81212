//! Runtime values produced by expression evaluation
//!
//! Values follow the host language's data model: scalars, ordered arrays
//! with normalized int/string keys, and objects (constructed instances and
//! enum cases) shared by reference.

use crate::error::{MetaError, MetaResult};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Always UTF-8. Bytes that are not, from `\x` escapes or bytewise
    /// operators, are replaced with U+FFFD, so binary strings do not
    /// round-trip.
    String(String),
    Array(Array),
    Object(Arc<Instance>),
}

/// Array key after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

/// Ordered map from keys to values.
///
/// `next_index` is the key an append uses: one past the largest int key
/// ever inserted, never reset by overwrites.
#[derive(Debug, Clone, Default)]
pub struct Array {
    entries: IndexMap<ArrayKey, Value>,
    next_index: i64,
}

/// A constructed object or an enum case.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Fully qualified class name
    pub class: String,
    pub kind: InstanceKind,
    pub properties: Array,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceKind {
    Object,
    EnumCase { name: String },
}

/// Numeric operand after conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Number::Int(n) => Value::Int(n),
            Number::Float(f) => Value::Float(f),
        }
    }
}

// ============================================================================
// Keys
// ============================================================================

impl ArrayKey {
    /// Normalize a value used as an array key.
    pub fn from_value(value: &Value) -> MetaResult<ArrayKey> {
        match value {
            Value::Null => Ok(ArrayKey::Str(String::new())),
            Value::Bool(b) => Ok(ArrayKey::Int(*b as i64)),
            Value::Int(n) => Ok(ArrayKey::Int(*n)),
            Value::Float(f) => {
                if f.fract() != 0.0 {
                    warn!(key = *f, "Implicit conversion from float to int loses precision");
                }
                Ok(ArrayKey::Int(float_to_int(*f)))
            }
            Value::String(s) => Ok(ArrayKey::from(s.as_str())),
            other => Err(MetaError::evaluation(format!(
                "Illegal offset type: {}",
                other.type_name()
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(n) => Value::Int(*n),
            ArrayKey::Str(s) => Value::String(s.clone()),
        }
    }
}

/// Decimal integer strings without leading zeros become int keys.
fn canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse().ok()
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        match canonical_int(s) {
            Some(n) => ArrayKey::Int(n),
            None => ArrayKey::Str(s.to_string()),
        }
    }
}

impl From<String> for ArrayKey {
    fn from(s: String) -> Self {
        match canonical_int(&s) {
            Some(n) => ArrayKey::Int(n),
            None => ArrayKey::Str(s),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(n: i64) -> Self {
        ArrayKey::Int(n)
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(n) => write!(f, "{}", n),
            ArrayKey::Str(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// Arrays
// ============================================================================

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sequence keyed 0..n.
    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        let mut array = Array::new();
        for value in values {
            array.push(value);
        }
        array
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append under the next free int key.
    pub fn push(&mut self, value: Value) {
        let key = self.next_index;
        self.insert(ArrayKey::Int(key), value);
    }

    /// Insert or overwrite. An overwritten key keeps its position.
    pub fn insert(&mut self, key: ArrayKey, value: Value) {
        if let ArrayKey::Int(n) = key {
            if n >= self.next_index {
                self.next_index = n.saturating_add(1);
            }
        }
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Lookup by string, normalizing numeric strings.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries.get(&ArrayKey::from(key))
    }

    pub fn get_index(&self, index: i64) -> Option<&Value> {
        self.entries.get(&ArrayKey::Int(index))
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Keys are exactly 0..n in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(i, key)| *key == ArrayKey::Int(i as i64))
    }

    /// `a + b`: keys of `a` win, keys only in `b` are appended.
    pub fn union(&self, other: &Array) -> Array {
        let mut result = self.clone();
        for (key, value) in other.iter() {
            if !result.contains_key(key) {
                result.insert(key.clone(), value.clone());
            }
        }
        result
    }

    /// `[...$other]`: int keys are renumbered, string keys overwrite.
    pub fn extend_spread(&mut self, other: &Array) {
        for (key, value) in other.iter() {
            match key {
                ArrayKey::Int(_) => self.push(value.clone()),
                ArrayKey::Str(_) => self.insert(key.clone(), value.clone()),
            }
        }
    }
}

/// Equality respects insertion order.
impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl FromIterator<(ArrayKey, Value)> for Array {
    fn from_iter<I: IntoIterator<Item = (ArrayKey, Value)>>(iter: I) -> Self {
        let mut array = Array::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

// ============================================================================
// Objects
// ============================================================================

impl Instance {
    pub fn new(class: impl Into<String>, properties: Array) -> Self {
        Self {
            class: class.into(),
            kind: InstanceKind::Object,
            properties,
        }
    }

    /// An enum case; backed cases carry `value`.
    pub fn enum_case(class: impl Into<String>, name: impl Into<String>, backing: Option<Value>) -> Self {
        let name = name.into();
        let mut properties = Array::new();
        properties.insert(ArrayKey::from("name"), Value::String(name.clone()));
        if let Some(value) = backing {
            properties.insert(ArrayKey::from("value"), value);
        }
        Self {
            class: class.into(),
            kind: InstanceKind::EnumCase { name },
            properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get_str(name)
    }

    pub fn is_enum_case(&self) -> bool {
        matches!(self.kind, InstanceKind::EnumCase { .. })
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Float to int the way the host does it: truncation, with values that do
/// not fit (and NaN, infinities) becoming zero.
pub(crate) fn float_to_int(f: f64) -> i64 {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        f.trunc() as i64
    } else {
        0
    }
}

/// Float to string with 14 significant digits, the host's default
/// precision: `0.1 + 0.2` is `"0.3"`, `1e25` is `"1.0E+25"`.
pub fn format_float(f: f64) -> String {
    const PRECISION: i32 = 14;

    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF".to_string() } else { "-INF".to_string() };
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }

    let sign = if f < 0.0 { "-" } else { "" };
    let formatted = format!("{:.*e}", (PRECISION - 1) as usize, f.abs());
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    if exponent < -4 || exponent >= PRECISION {
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { "0" } else { rest };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}{}.{}E{}{}", sign, first, rest, exp_sign, exponent.abs());
    }

    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{}0.{}{}", sign, zeros, digits);
    }

    let int_len = (exponent + 1) as usize;
    if digits.len() <= int_len {
        format!("{}{}{}", sign, digits, "0".repeat(int_len - digits.len()))
    } else {
        format!("{}{}.{}", sign, &digits[..int_len], &digits[int_len..])
    }
}

/// Numeric prefix of a string: `(number, bytes consumed)`.
///
/// Leading whitespace is allowed; trailing whitespace is consumed.
fn numeric_prefix(s: &str) -> Option<(Number, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c') {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut is_float = false;
    let mut has_digits = i > int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if has_digits || j > frac_start {
            has_digits = true;
            is_float = true;
            i = j;
        }
    }
    if !has_digits {
        return None;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            is_float = true;
            i = j;
        }
    }

    let text = &s[start..i];
    let number = if is_float {
        Number::Float(text.parse().ok()?)
    } else {
        match text.parse::<i64>() {
            Ok(n) => Number::Int(n),
            Err(_) => Number::Float(text.parse().ok()?),
        }
    };

    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c') {
        i += 1;
    }
    Some((number, i))
}

/// The number a fully numeric string holds (`" 12"`, `"1e3"`, `"-0.5 "`).
pub fn numeric_string(s: &str) -> Option<Number> {
    match numeric_prefix(s) {
        Some((number, consumed)) if consumed == s.len() => Some(number),
        _ => None,
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type name as the host reports it.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(instance) => &instance.class,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s == "0"),
            Value::Array(a) => !a.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// String conversion used by `.` and string contexts.
    pub fn to_php_string(&self) -> MetaResult<String> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(true) => Ok("1".to_string()),
            Value::Bool(false) => Ok(String::new()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(f) => Ok(format_float(*f)),
            Value::String(s) => Ok(s.clone()),
            Value::Array(_) => {
                warn!("Array to string conversion");
                Ok("Array".to_string())
            }
            Value::Object(instance) => Err(MetaError::evaluation(format!(
                "Object of class {} could not be converted to string",
                instance.class
            ))),
        }
    }

    /// Numeric conversion for arithmetic. `op` names the operator in errors.
    pub fn to_number(&self, op: &str) -> MetaResult<Number> {
        match self {
            Value::Null => Ok(Number::Int(0)),
            Value::Bool(b) => Ok(Number::Int(*b as i64)),
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Float(f) => Ok(Number::Float(*f)),
            Value::String(s) => match numeric_prefix(s) {
                Some((number, consumed)) if consumed == s.len() => Ok(number),
                Some((number, _)) => {
                    warn!(value = %s, "A non-numeric value encountered");
                    Ok(number)
                }
                None => Err(MetaError::evaluation(format!(
                    "Unsupported operand types: string {} number (\"{}\" is not numeric)",
                    op, s
                ))),
            },
            Value::Array(_) | Value::Object(_) => Err(MetaError::evaluation(format!(
                "Unsupported operand types: {} {} number",
                self.type_name(),
                op
            ))),
        }
    }

    /// Integer conversion for `%`, shifts and bitwise operators.
    pub fn to_int(&self, op: &str) -> MetaResult<i64> {
        match self.to_number(op)? {
            Number::Int(n) => Ok(n),
            Number::Float(f) => {
                if f.fract() != 0.0 {
                    warn!(value = f, "Implicit conversion from float to int loses precision");
                }
                Ok(float_to_int(f))
            }
        }
    }

    /// Convert to JSON. Lists become arrays, other arrays objects; objects
    /// serialize their class and properties, non-finite floats become null.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(a) => array_to_json(a),
            Value::Object(instance) => {
                let mut map = serde_json::Map::new();
                map.insert("class".to_string(), Json::String(instance.class.clone()));
                if let InstanceKind::EnumCase { name } = &instance.kind {
                    map.insert("case".to_string(), Json::String(name.clone()));
                }
                map.insert("properties".to_string(), array_to_json(&instance.properties));
                Json::Object(map)
            }
        }
    }
}

fn array_to_json(array: &Array) -> serde_json::Value {
    if array.is_list() {
        serde_json::Value::Array(array.values().map(Value::to_json).collect())
    } else {
        serde_json::Value::Object(
            array
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect(),
        )
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(Array::list(items.into_iter().map(Value::from))),
            Json::Object(map) => Value::Array(
                map.into_iter()
                    .map(|(k, v)| (ArrayKey::from(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(Arc::new(instance))
    }
}

/// Export-style rendering: `null`, `true`, `1.5`, `'text'`, `[0 => 1]`,
/// `Class::Case`, `Class {x => 1}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => {
                let text = format_float(*x);
                if x.is_finite() && !text.contains(['.', 'E']) {
                    write!(f, "{}.0", text)
                } else {
                    write!(f, "{}", text)
                }
            }
            Value::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, (key, value)) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match key {
                        ArrayKey::Int(n) => write!(f, "{} => {}", n, value)?,
                        ArrayKey::Str(s) => write!(f, "'{}' => {}", s, value)?,
                    }
                }
                write!(f, "]")
            }
            Value::Object(instance) => match &instance.kind {
                InstanceKind::EnumCase { name } => write!(f, "{}::{}", instance.class, name),
                InstanceKind::Object => {
                    write!(f, "{} {{", instance.class)?;
                    for (i, (key, value)) in instance.properties.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{} => {}", key, value)?;
                    }
                    write!(f, "}}")
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_string_keys_are_normalized() {
        assert_eq!(ArrayKey::from("12"), ArrayKey::Int(12));
        assert_eq!(ArrayKey::from("-3"), ArrayKey::Int(-3));
        assert_eq!(ArrayKey::from("012"), ArrayKey::Str("012".to_string()));
        assert_eq!(ArrayKey::from("1.5"), ArrayKey::Str("1.5".to_string()));
        assert_eq!(ArrayKey::from("-0"), ArrayKey::Str("-0".to_string()));
        assert_eq!(
            ArrayKey::from_value(&Value::Null).unwrap(),
            ArrayKey::Str(String::new())
        );
        assert_eq!(ArrayKey::from_value(&Value::Bool(true)).unwrap(), ArrayKey::Int(1));
        assert_eq!(ArrayKey::from_value(&Value::Float(2.7)).unwrap(), ArrayKey::Int(2));
        assert!(ArrayKey::from_value(&Value::Array(Array::new())).is_err());
    }

    #[test]
    fn test_push_continues_after_largest_int_key() {
        let mut array = Array::new();
        array.insert(ArrayKey::Int(5), Value::Int(1));
        array.push(Value::Int(2));
        assert_eq!(array.get_index(6), Some(&Value::Int(2)));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut array = Array::new();
        array.insert(ArrayKey::from("a"), Value::Int(1));
        array.insert(ArrayKey::from("b"), Value::Int(2));
        array.insert(ArrayKey::from("a"), Value::Int(3));
        let keys: Vec<_> = array.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(array.get_str("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_union_keeps_left_keys() {
        let left = Array::list([Value::Int(1), Value::Int(2)]);
        let right = Array::list([Value::Int(9), Value::Int(9), Value::Int(3)]);
        let union = left.union(&right);
        assert_eq!(union, Array::list([Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::string("0").is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0.0").is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Array(Array::new()).is_truthy());
        assert!(Value::Array(Array::list([Value::Null])).is_truthy());
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(0.1 + 0.2), "0.3");
        assert_eq!(format_float(1e25), "1.0E+25");
        assert_eq!(format_float(0.00001), "1.0E-5");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(-1.25e-7), "-1.25E-7");
        assert_eq!(format_float(100000.0), "100000");
        assert_eq!(format_float(f64::INFINITY), "INF");
        assert_eq!(format_float(f64::NAN), "NAN");
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(numeric_string("42"), Some(Number::Int(42)));
        assert_eq!(numeric_string(" 1e3 "), Some(Number::Float(1000.0)));
        assert_eq!(numeric_string(".5"), Some(Number::Float(0.5)));
        assert_eq!(numeric_string("12abc"), None);
        assert_eq!(numeric_string("abc"), None);
        assert_eq!(numeric_string("0x1A"), None);
    }

    #[test]
    fn test_to_number_accepts_leading_numeric() {
        assert_eq!(Value::string("12abc").to_number("+").unwrap(), Number::Int(12));
        assert!(Value::string("abc").to_number("+").is_err());
        assert!(Value::Array(Array::new()).to_number("+").is_err());
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"list": [1, 2.5, "x"], "flag": true, "none": null});
        let value = Value::from(json.clone());
        let array = value.as_array().unwrap();
        assert!(array.get_str("list").unwrap().as_array().unwrap().is_list());
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_display() {
        let array: Array = [
            (ArrayKey::from("a"), Value::Int(1)),
            (ArrayKey::Int(0), Value::Float(2.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(Value::Array(array).to_string(), "['a' => 1, 0 => 2.0]");
        assert_eq!(
            Value::from(Instance::enum_case("app\\Suit", "Hearts", None)).to_string(),
            "app\\Suit::Hearts"
        );
    }
}
