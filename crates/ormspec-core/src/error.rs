//! Core error types.
//!
//! Every error aborts the predicate build it was raised in. There is no
//! partial result and nothing is retried.

use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ormspec_proto::Error),

    /// An operator has no registered strategy.
    #[error("no strategy registered for query operator: {operator}")]
    UnsupportedOperator {
        /// Name of the offending operator.
        operator: String,
    },

    /// A field value does not have the shape an operator requires.
    #[error("operator {operator} on field '{field}' requires {expected}, got {actual}")]
    TypeMismatch {
        /// Query-parameter field name.
        field: String,
        /// Operator that rejected the value.
        operator: String,
        /// Required value shape.
        expected: &'static str,
        /// Kind of the value received.
        actual: &'static str,
    },

    /// A query-parameter field could not be read.
    #[error("cannot read query parameter field '{field}': {reason}")]
    FieldAccess {
        /// Field name.
        field: String,
        /// Why the field could not be read.
        reason: String,
    },

    /// Eager relation discovery came back to an entity already on the path.
    #[error("eager relation cycle at '{path}': entity '{entity}' is already joined on this path")]
    JoinCycle {
        /// Join path that closes the cycle.
        path: String,
        /// Entity reached twice.
        entity: String,
    },

    /// Eager relation discovery went deeper than allowed.
    #[error("join path '{path}' exceeds maximum join depth {max_depth}")]
    JoinDepthExceeded {
        /// Join path that is too deep.
        path: String,
        /// Configured maximum depth.
        max_depth: usize,
    },

    /// Malformed join declaration.
    #[error("invalid join path '{0}'")]
    InvalidJoin(String),

    /// Entity type not found in the catalog.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// Attribute or relation not defined on an entity.
    #[error("unknown attribute '{attribute}' on entity '{entity}'")]
    UnknownAttribute {
        /// Entity name.
        entity: String,
        /// Attribute name.
        attribute: String,
    },

    /// Query the engine refuses to execute.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
