//! In-memory host engine.
//!
//! A small executor that evaluates specifications over rows held in memory.
//! It plays the part of the host query engine: it owns the query root, calls
//! the specification with the kind of result it is producing, resolves the
//! registered joins through the schema's relations and filters rows with the
//! returned conjunction.

mod filter;
mod repository;
mod store;

pub use filter::{FilterEvaluator, JoinedRow};
pub use repository::{Record, Repository};
pub use store::{EntityRow, MemoryStore};
