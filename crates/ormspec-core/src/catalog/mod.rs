//! Entity catalog for ormspec.
//!
//! The catalog describes entities, their fields and the relations between
//! them. Join discovery reads relation cardinality and fetch mode through the
//! [`EntityMetadata`] trait.

mod entity;
mod field;
mod relation;
mod schema;
mod types;

pub use entity::EntityDef;
pub use field::FieldDef;
pub use relation::{Cardinality, FetchMode, RelationDef};
pub use schema::{EntityMetadata, Schema};
pub use types::{FieldType, ScalarType};
