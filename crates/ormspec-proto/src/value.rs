//! Runtime value types for query parameters and predicate operands.

use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A runtime value read from a query-parameter field or an entity row.
///
/// Note: Arrays are typed (e.g., BoolArray, Int32Array) to avoid recursive
/// type issues with rkyv serialization.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
    /// UUID as 16 bytes.
    Uuid([u8; 16]),
    /// Array of booleans.
    BoolArray(Vec<bool>),
    /// Array of 32-bit integers.
    Int32Array(Vec<i32>),
    /// Array of 64-bit integers.
    Int64Array(Vec<i64>),
    /// Array of 32-bit floats.
    Float32Array(Vec<f32>),
    /// Array of 64-bit floats.
    Float64Array(Vec<f64>),
    /// Array of strings.
    StringArray(Vec<String>),
    /// Array of UUIDs.
    UuidArray(Vec<[u8; 16]>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value carries nothing to filter on.
    ///
    /// Null, zero-length strings and bytes, and arrays without elements are
    /// empty. Every other scalar is non-empty, including `0` and `false`.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::BoolArray(v) => v.is_empty(),
            Value::Int32Array(v) => v.is_empty(),
            Value::Int64Array(v) => v.is_empty(),
            Value::Float32Array(v) => v.is_empty(),
            Value::Float64Array(v) => v.is_empty(),
            Value::StringArray(v) => v.is_empty(),
            Value::UuidArray(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Check if this value is an array type.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Value::BoolArray(_)
                | Value::Int32Array(_)
                | Value::Int64Array(_)
                | Value::Float32Array(_)
                | Value::Float64Array(_)
                | Value::StringArray(_)
                | Value::UuidArray(_)
        )
    }

    /// Check if this value is textual.
    pub fn is_text(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this value has a total or partial ordering usable by range
    /// comparisons.
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            Value::Int32(_)
                | Value::Int64(_)
                | Value::Float32(_)
                | Value::Float64(_)
                | Value::String(_)
                | Value::Bytes(_)
                | Value::Timestamp(_)
                | Value::Uuid(_)
        )
    }

    /// Split an array value into its scalar elements.
    ///
    /// Returns `None` for scalars.
    pub fn elements(&self) -> Option<Vec<Value>> {
        let elements = match self {
            Value::BoolArray(v) => v.iter().copied().map(Value::Bool).collect(),
            Value::Int32Array(v) => v.iter().copied().map(Value::Int32).collect(),
            Value::Int64Array(v) => v.iter().copied().map(Value::Int64).collect(),
            Value::Float32Array(v) => v.iter().copied().map(Value::Float32).collect(),
            Value::Float64Array(v) => v.iter().copied().map(Value::Float64).collect(),
            Value::StringArray(v) => v.iter().cloned().map(Value::String).collect(),
            Value::UuidArray(v) => v.iter().copied().map(Value::Uuid).collect(),
            _ => return None,
        };
        Some(elements)
    }

    /// Short name of the value kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::BoolArray(_) => "bool[]",
            Value::Int32Array(_) => "int32[]",
            Value::Int64Array(_) => "int64[]",
            Value::Float32Array(_) => "float32[]",
            Value::Float64Array(_) => "float64[]",
            Value::StringArray(_) => "string[]",
            Value::UuidArray(_) => "uuid[]",
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            Value::Int32(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            Value::Float32(f) => Some(*f as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float32(x) => write!(f, "{}", x),
            Value::Float64(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(t) => write!(f, "ts({})", t),
            Value::Uuid(u) => {
                for byte in u {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            _ => {
                let elements = self.elements().unwrap_or_default();
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<[u8; 16]> for Value {
    fn from(v: [u8; 16]) -> Self {
        Value::Uuid(v)
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Value::BoolArray(v)
    }
}

impl From<Vec<i32>> for Value {
    fn from(v: Vec<i32>) -> Self {
        Value::Int32Array(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Int64Array(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Float64Array(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringArray(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::StringArray(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<[u8; 16]>> for Value {
    fn from(v: Vec<[u8; 16]>) -> Self {
        Value::UuidArray(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int32(42).as_i32(), Some(42));
        assert_eq!(Value::Int32(42).as_i64(), Some(42)); // Widening conversion
        assert_eq!(Value::Float32(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
    }

    #[test]
    fn test_emptiness_per_kind() {
        assert!(Value::Null.is_empty());
        assert!(Value::String(String::new()).is_empty());
        assert!(Value::Bytes(vec![]).is_empty());
        assert!(Value::Int32Array(vec![]).is_empty());
        assert!(Value::StringArray(vec![]).is_empty());

        // Zero and false are real filter values
        assert!(!Value::Int32(0).is_empty());
        assert!(!Value::Bool(false).is_empty());
        assert!(!Value::String(" ".into()).is_empty());
        assert!(!Value::Int32Array(vec![0]).is_empty());
    }

    #[test]
    fn test_ordering_capability() {
        assert!(Value::Int32(1).is_ordered());
        assert!(Value::Float64(1.0).is_ordered());
        assert!(Value::String("a".into()).is_ordered());
        assert!(Value::Timestamp(0).is_ordered());

        assert!(!Value::Bool(true).is_ordered());
        assert!(!Value::Null.is_ordered());
        assert!(!Value::Int32Array(vec![1]).is_ordered());
    }

    #[test]
    fn test_array_elements() {
        let v: Value = vec![1i32, 2, 3].into();
        assert!(v.is_array());
        assert_eq!(
            v.elements(),
            Some(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)])
        );

        let v: Value = vec!["a", "b"].into();
        assert_eq!(
            v.elements(),
            Some(vec![Value::String("a".into()), Value::String("b".into())])
        );

        assert_eq!(Value::Int32(1).elements(), None);
    }

    #[test]
    fn test_value_conversions() {
        let v: Value = true.into();
        assert_eq!(v, Value::Bool(true));

        let v: Value = "hello".into();
        assert_eq!(v, Value::String("hello".into()));

        let v: Value = None::<i32>.into();
        assert_eq!(v, Value::Null);

        let v: Value = Some(42i32).into();
        assert_eq!(v, Value::Int32(42));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Int32(1).kind_name(), "int32");
        assert_eq!(Value::StringArray(vec![]).kind_name(), "string[]");
        assert_eq!(Value::Null.kind_name(), "null");
    }
}
