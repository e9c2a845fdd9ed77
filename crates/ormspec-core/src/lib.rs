//! ormspec core - declarative predicate assembly.
//!
//! This crate turns query-parameter objects into conjunctions of predicate
//! nodes for a host query engine:
//!
//! - [`param`] - query-parameter objects and their field descriptors
//! - [`operator`] - operators, strategies and the operator registry
//! - [`join`] - join path resolution, declared or discovered from metadata
//! - [`assembler`] - the predicate assembler
//! - [`specification`] / [`executor`] - the deferred callback handed to a
//!   host engine and the host contract
//! - [`catalog`] - entity and relation metadata
//! - [`engine`] - an in-memory host engine

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod join;
pub mod operator;
pub mod param;
pub mod specification;

pub use assembler::{PredicateAssembler, SharedMetadata};
pub use catalog::{
    Cardinality, EntityDef, EntityMetadata, FetchMode, FieldDef, FieldType, RelationDef,
    ScalarType, Schema,
};
pub use config::AssemblerConfig;
pub use engine::{EntityRow, FilterEvaluator, JoinedRow, MemoryStore, Record, Repository};
pub use error::{Error, Result};
pub use executor::{SpecificationExecutor, SpecificationExecutorExt};
pub use join::{JoinMap, JoinResolver};
pub use operator::{
    Bound, CustomOperator, Equals, Like, LikeMode, Membership, Operator, OperatorKind,
    OperatorRegistry, OperatorStrategy,
};
pub use param::{FieldDescriptor, JoinDeclaration, ParamField, ParamSchema, QueryParam, QueryParams, Reflected};
pub use specification::{ParamSpecification, Specification};

/// Re-export protocol types.
pub use ormspec_proto as proto;
