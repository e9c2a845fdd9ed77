//! Protocol error types.

use thiserror::Error;

/// Errors raised by the expression IR.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Invalid page request.
    #[error("invalid page request: {0}")]
    InvalidPage(String),
}
