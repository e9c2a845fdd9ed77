//! ormspec expression IR.
//!
//! This crate defines the values and predicate expressions exchanged between
//! the predicate assembler and a host query engine.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types for parameters and row attributes
//! - [`expr`] - Conditions, predicate nodes, the composite conjunction and
//!   the query root joins are registered on
//! - [`page`] - Page requests and paged results
//! - [`error`] - Protocol error types
//!
//! # Serialization
//!
//! Expression types derive both `rkyv` and `serde` traits. A [`Conjunction`]
//! can be shipped to a remote executor as bytes:
//!
//! ```ignore
//! use ormspec_proto::{AttrPath, Condition, Conjunction};
//!
//! let mut conj = Conjunction::unrestricted();
//! conj.push(Condition::gt(AttrPath::root("number"), 1000));
//! let bytes = conj.to_bytes()?;
//! let decoded = Conjunction::from_bytes(&bytes)?;
//! ```

pub mod error;
pub mod expr;
pub mod page;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use expr::{
    AttrPath, Condition, Conjunction, JoinKind, JoinNode, Predicate, QueryContext, QueryRoot,
    ResultKind, Target,
};
pub use page::{Page, PageRequest};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_json_roundtrip() {
        let value = Value::StringArray(vec!["a".into(), "b".into()]);
        let json = serde_json::to_string(&value).unwrap();
        let decoded: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_root_json_shape() {
        let mut root = QueryRoot::new("Student");
        root.fetch("class", JoinKind::Left);

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["entity"], "Student");
        assert_eq!(json["joins"][0]["path"], "class");
        assert_eq!(json["joins"][0]["fetch"], true);
    }
}
