//! Core type definitions for the catalog.

use ormspec_proto::Value;
use serde::{Deserialize, Serialize};

/// Scalar data types an entity attribute can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
}

/// Field types - flat representation without recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
    /// An array of scalar values.
    ArrayScalar(ScalarType),
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Float32 | ScalarType::Float64
        )
    }

    /// Check if a non-null scalar value can be stored in this type.
    ///
    /// Integers widen and floats widen, mirroring the comparisons the engine
    /// performs.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ScalarType::Bool, Value::Bool(_))
                | (ScalarType::Int32, Value::Int32(_))
                | (ScalarType::Int64, Value::Int32(_) | Value::Int64(_))
                | (ScalarType::Float32, Value::Float32(_))
                | (ScalarType::Float64, Value::Float32(_) | Value::Float64(_))
                | (ScalarType::String, Value::String(_))
                | (ScalarType::Bytes, Value::Bytes(_))
                | (ScalarType::Timestamp, Value::Timestamp(_))
                | (ScalarType::Uuid, Value::Uuid(_))
        )
    }
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create an optional scalar field type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        FieldType::OptionalScalar(scalar)
    }

    /// Create an array of scalars field type.
    pub fn array_scalar(scalar: ScalarType) -> Self {
        FieldType::ArrayScalar(scalar)
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldType::OptionalScalar(_))
    }

    /// Check if this type is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, FieldType::ArrayScalar(_))
    }

    /// Get the inner scalar type.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            FieldType::Scalar(s) | FieldType::OptionalScalar(s) | FieldType::ArrayScalar(s) => *s,
        }
    }

    /// Check if a value can be stored in a field of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Scalar(s) => s.accepts(value),
            FieldType::OptionalScalar(s) => value.is_null() || s.accepts(value),
            FieldType::ArrayScalar(s) => match value.elements() {
                Some(elements) => elements.iter().all(|e| s.accepts(e)),
                None => false,
            },
        }
    }
}
