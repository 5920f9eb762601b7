//! Runtime value types for feature data
//!
//! `Value` carries a single feature value at serving time, `ValueType` is the
//! catalog-level type declared on a field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog value type of a declared field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bytes,
    Bool,
    UnixTimestamp,
    /// List of values of the inner type
    List(Box<ValueType>),
    /// Type could not be determined
    Unknown,
}

impl ValueType {
    /// Representative value of this type, used to build synthetic inputs
    /// when inferring a transformation's output schema.
    pub fn sample_value(&self) -> Value {
        match self {
            ValueType::Int32 | ValueType::Int64 => Value::Int(1),
            ValueType::Float32 | ValueType::Float64 => Value::Float(1.0),
            ValueType::String => Value::String("hello world".to_string()),
            ValueType::Bytes => Value::Bytes(b"hello world".to_vec()),
            ValueType::Bool => Value::Bool(true),
            ValueType::UnixTimestamp => Value::Timestamp(Utc::now()),
            ValueType::List(inner) => Value::List(vec![inner.sample_value()]),
            ValueType::Unknown => Value::Null,
        }
    }

    /// Whether a value inferred as `other` satisfies a field declared as `self`
    ///
    /// Widths are not distinguished (`Int32` accepts `Int64`) and `Unknown`
    /// matches anything.
    pub fn accepts(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Unknown, _) | (_, ValueType::Unknown) => true,
            (ValueType::Int32 | ValueType::Int64, ValueType::Int32 | ValueType::Int64) => true,
            (ValueType::Float32 | ValueType::Float64, ValueType::Float32 | ValueType::Float64) => {
                true
            }
            (ValueType::List(a), ValueType::List(b)) => a.accepts(b),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int32 => write!(f, "Int32"),
            ValueType::Int64 => write!(f, "Int64"),
            ValueType::Float32 => write!(f, "Float32"),
            ValueType::Float64 => write!(f, "Float64"),
            ValueType::String => write!(f, "String"),
            ValueType::Bytes => write!(f, "Bytes"),
            ValueType::Bool => write!(f, "Bool"),
            ValueType::UnixTimestamp => write!(f, "UnixTimestamp"),
            ValueType::List(inner) => write!(f, "Array({})", inner),
            ValueType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Runtime feature value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
}

impl Value {
    /// Basic type inference for a single value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Unknown,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int64,
            Value::Float(_) => ValueType::Float64,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Timestamp(_) => ValueType::UnixTimestamp,
            Value::List(items) => {
                let inner = items
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::value_type)
                    .unwrap_or(ValueType::Unknown);
                ValueType::List(Box::new(inner))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}
