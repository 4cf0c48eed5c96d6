use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scalar values
// ---------------------------------------------------------------------------

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// The tag of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(f) if f.is_nan() => ValueKind::Null,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
        }
    }

    /// `Null` and float NaN are both "missing".
    pub fn is_missing(&self) -> bool {
        self.kind() == ValueKind::Null
    }

    /// Text form used when a column pair falls back to textual comparison.
    ///
    /// Floats keep their fractional part (`15.0`), so a float never matches
    /// the text of an integer with the same magnitude. Exponents carry a sign
    /// and at least two digits (`1e+16`, `1.5e-05`).
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_nan() => "nan".to_string(),
            Value::Float(f) if f.is_infinite() => {
                if *f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
            }
            Value::Float(f) => float_text(*f),
            Value::Str(s) => s.clone(),
        }
    }
}

/// Shortest round-trip form; scientific outside `1e-4 <= |f| < 1e16`.
fn float_text(f: f64) -> String {
    let text = format!("{f:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Column kinds
// ---------------------------------------------------------------------------

/// The declared type of a whole column, derived from its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Only missing values.
    Empty,
    Bool,
    Int,
    Float,
    /// Text, or more than one scalar kind.
    Object,
}

impl ColumnKind {
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut kind = ColumnKind::Empty;
        for value in values {
            let next = match value.kind() {
                ValueKind::Null => continue,
                ValueKind::Bool => ColumnKind::Bool,
                ValueKind::Int => ColumnKind::Int,
                ValueKind::Float => ColumnKind::Float,
                ValueKind::Str => return ColumnKind::Object,
            };
            kind = match kind {
                ColumnKind::Empty => next,
                k if k == next => k,
                _ => return ColumnKind::Object,
            };
        }
        kind
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Value of the unique-key column. Integer keys sort before text keys; rows
/// with no key value share the `Missing` key, which sorts last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
    Missing,
}

impl Key {
    /// Key for a cell value. Integral floats key like the matching integer,
    /// so `90.0` and `90` name the same row.
    pub fn from_value(value: &Value) -> Key {
        match value {
            Value::Int(i) => Key::Int(*i),
            Value::Str(s) => Key::Text(s.clone()),
            Value::Float(f) if f.is_nan() => Key::Missing,
            Value::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
                Key::Int(*f as i64)
            }
            Value::Float(_) | Value::Bool(_) => Key::Text(value.to_text()),
            Value::Null => Key::Missing,
        }
    }

    /// Parse a key typed by a user: integers stay integers, anything else is text.
    pub fn parse(raw: &str) -> Key {
        let trimmed = raw.trim();
        trimmed
            .parse::<i64>()
            .map(Key::Int)
            .unwrap_or_else(|_| Key::Text(trimmed.to_string()))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(i) => Value::Int(*i),
            Key::Text(s) => Value::Str(s.clone()),
            Key::Missing => Value::Null,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Text(s) => f.write_str(s),
            Key::Missing => Ok(()),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_keeps_float_fraction() {
        assert_eq!(Value::Float(15.0).to_text(), "15.0");
        assert_eq!(Value::Int(15).to_text(), "15");
        assert_eq!(Value::Float(7.8542000000000005).to_text(), "7.8542000000000005");
        assert_eq!(Value::Bool(true).to_text(), "True");
        assert_eq!(Value::from("young").to_text(), "young");
    }

    #[test]
    fn text_form_exponents_are_signed_and_padded() {
        assert_eq!(Value::Float(1e16).to_text(), "1e+16");
        assert_eq!(Value::Float(1.5e16).to_text(), "1.5e+16");
        assert_eq!(Value::Float(1e-5).to_text(), "1e-05");
        assert_eq!(Value::Float(-2.5e-7).to_text(), "-2.5e-07");
        assert_eq!(Value::Float(1e100).to_text(), "1e+100");
        assert_eq!(Value::Float(0.0001).to_text(), "0.0001");
        assert_eq!(Value::Float(1e15).to_text(), "1000000000000000.0");
    }

    #[test]
    fn nan_is_missing() {
        assert!(Value::Float(f64::NAN).is_missing());
        assert!(Value::Null.is_missing());
        assert!(!Value::Float(0.0).is_missing());
    }

    #[test]
    fn column_kind_inference() {
        let ints = [Value::Int(1), Value::Null, Value::Int(3)];
        assert_eq!(ColumnKind::infer(&ints), ColumnKind::Int);

        let floats = [Value::Float(1.5), Value::Float(f64::NAN)];
        assert_eq!(ColumnKind::infer(&floats), ColumnKind::Float);

        let mixed = [Value::Float(30.0), Value::from("young")];
        assert_eq!(ColumnKind::infer(&mixed), ColumnKind::Object);

        let int_and_float = [Value::Int(1), Value::Float(2.0)];
        assert_eq!(ColumnKind::infer(&int_and_float), ColumnKind::Object);

        assert_eq!(ColumnKind::infer(&[Value::Null]), ColumnKind::Empty);
    }

    #[test]
    fn key_ordering_ints_before_text() {
        let mut keys = vec![Key::from("b"), Key::Int(10), Key::from("a"), Key::Int(2)];
        keys.sort();
        assert_eq!(keys, vec![Key::Int(2), Key::Int(10), Key::from("a"), Key::from("b")]);
    }

    #[test]
    fn key_from_value() {
        assert_eq!(Key::from_value(&Value::Int(90)), Key::Int(90));
        assert_eq!(Key::from_value(&Value::Float(90.0)), Key::Int(90));
        assert_eq!(Key::from_value(&Value::Float(-3.0)), Key::Int(-3));
        assert_eq!(Key::from_value(&Value::Float(2.5)), Key::from("2.5"));
        assert_eq!(Key::from_value(&Value::Float(1e300)), Key::from("1e+300"));
        assert_eq!(Key::from_value(&Value::Null), Key::Missing);
        assert_eq!(Key::from_value(&Value::Float(f64::NAN)), Key::Missing);
    }

    #[test]
    fn missing_key_sorts_last_and_prints_empty() {
        let mut keys = vec![Key::Missing, Key::from("a"), Key::Int(1)];
        keys.sort();
        assert_eq!(keys, vec![Key::Int(1), Key::from("a"), Key::Missing]);
        assert_eq!(Key::Missing.to_string(), "");
        assert_eq!(Key::Missing.to_value(), Value::Null);
    }

    #[test]
    fn key_parse() {
        assert_eq!(Key::parse(" 41 "), Key::Int(41));
        assert_eq!(Key::parse("A-7"), Key::from("A-7"));
    }
}
