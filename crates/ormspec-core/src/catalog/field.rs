//! Field definitions for entities.

use super::types::{FieldType, ScalarType};
use serde::{Deserialize, Serialize};

/// A field definition within an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Whether the field must be present on every row.
    pub required: bool,
}

impl FieldDef {
    /// Create a new required field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    /// Create an optional field (required = false).
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }

    /// Create an optional scalar field.
    pub fn optional_scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::optional(name, FieldType::OptionalScalar(scalar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::new("id", FieldType::scalar(ScalarType::String));
        assert_eq!(field.name, "id");
        assert!(field.required);

        let field = FieldDef::optional_scalar("nothing", ScalarType::String);
        assert!(!field.required);
        assert!(field.field_type.is_nullable());
    }
}
