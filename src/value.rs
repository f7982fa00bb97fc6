//! The runtime value domain and its compile-time type descriptors.

use std::collections::BTreeMap;
use std::fmt;

use crate::color::Color;

/// The largest integer that can be represented exactly as an `f64` (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// A compile-time type descriptor for an expression node.
///
/// `Type::Array` carries an optional fixed length; `None` means "array of
/// unspecified length". `Type::Value` is the top type: it accepts anything.
/// `Type::Error` is an internal sentinel produced when a subexpression failed
/// to type — it is never a valid declared type of a constructed node, but it
/// lets callers thread a "something already went wrong here" marker through
/// code that otherwise expects a `Type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Null,
    Boolean,
    Number,
    String,
    Color,
    Object,
    Value,
    Array(Box<Type>, Option<usize>),
    Error,
}

impl Type {
    pub fn array(item: Type) -> Type {
        Type::Array(Box::new(item), None)
    }

    pub fn array_of_length(item: Type, len: usize) -> Type {
        Type::Array(Box::new(item), Some(len))
    }

    /// The dynamic type of a runtime value.
    pub fn of(value: &Value) -> Type {
        match value {
            Value::Null => Type::Null,
            Value::Boolean(_) => Type::Boolean,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::Color(_) => Type::Color,
            Value::Object(_) => Type::Object,
            Value::Array(items) => Type::array_of_length(Type::Value, items.len()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Null => write!(f, "null"),
            Type::Boolean => write!(f, "boolean"),
            Type::Number => write!(f, "number"),
            Type::String => write!(f, "string"),
            Type::Color => write!(f, "color"),
            Type::Object => write!(f, "object"),
            Type::Value => write!(f, "value"),
            Type::Error => write!(f, "error"),
            Type::Array(item, Some(n)) => write!(f, "array<{item}, {n}>"),
            Type::Array(item, None) => write!(f, "array<{item}>"),
        }
    }
}

/// Decide whether a subexpression producing `actual` satisfies a slot
/// expecting `expected`. Returns `Ok(())` on success, or the actual type
/// (for error-message construction) on mismatch.
pub fn check_subtype(expected: &Type, actual: &Type) -> Result<(), ()> {
    match (expected, actual) {
        (Type::Value, _) => Ok(()),
        (e, a) if e == a => Ok(()),
        (Type::Array(exp_item, exp_len), Type::Array(act_item, act_len)) => {
            if **exp_item != Type::Value && exp_item != act_item {
                return Err(());
            }
            match (exp_len, act_len) {
                (None, _) => Ok(()),
                (Some(_), None) => Ok(()),
                (Some(n), Some(m)) if n == m => Ok(()),
                _ => Err(()),
            }
        }
        _ => Err(()),
    }
}

/// A tagged-union runtime value. Mirrors the concrete (non-top, non-error)
/// subset of [`Type`].
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Color(Color),
    Object(BTreeMap<String, Value>),
    Array(Vec<Value>),
}

impl Value {
    pub fn type_of(&self) -> Type {
        Type::of(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Whether this number is an exact integer within the safe range.
    pub fn as_safe_integer(&self) -> Option<i64> {
        let n = self.as_number()?;
        if !n.is_finite() || n.fract() != 0.0 {
            return None;
        }
        if n.abs() > MAX_SAFE_INTEGER as f64 {
            return None;
        }
        Some(n as i64)
    }

    /// Constructs a [`Value`] from a parsed `serde_json::Value`, used by
    /// `literal` and by implicit scalar literals. Arrays and objects convert
    /// element-wise; `serde_json::Number` always becomes `Value::Number`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Color(c) => write!(f, "{c}"),
            Value::Object(_) => write!(f, "[object]"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_subtype_is_top() {
        assert_eq!(check_subtype(&Type::Value, &Type::Number), Ok(()));
        assert_eq!(check_subtype(&Type::Value, &Type::Color), Ok(()));
    }

    #[test]
    fn identical_kinds_match() {
        assert_eq!(check_subtype(&Type::String, &Type::String), Ok(()));
        assert_eq!(check_subtype(&Type::String, &Type::Number), Err(()));
    }

    #[test]
    fn array_length_rules() {
        let fixed2 = Type::array_of_length(Type::Number, 2);
        let unspecified = Type::array(Type::Number);
        assert_eq!(check_subtype(&unspecified, &fixed2), Ok(()));
        assert_eq!(check_subtype(&fixed2, &unspecified), Ok(()));
        let fixed3 = Type::array_of_length(Type::Number, 3);
        assert_eq!(check_subtype(&fixed2, &fixed3), Err(()));
    }

    #[test]
    fn safe_integer_bounds() {
        assert_eq!(Value::Number(5.0).as_safe_integer(), Some(5));
        assert_eq!(Value::Number(5.5).as_safe_integer(), None);
        assert_eq!(
            Value::Number(MAX_SAFE_INTEGER as f64 + 2.0).as_safe_integer(),
            None
        );
    }

    #[test]
    fn dynamic_type_of_array_carries_length() {
        let v = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(Type::of(&v), Type::array_of_length(Type::Value, 2));
    }
}
