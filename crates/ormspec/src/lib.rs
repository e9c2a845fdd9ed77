//! ormspec - declarative query predicates.
//!
//! Describe once which entity attributes the fields of a query-parameter
//! record filter on, then turn any populated instance into a conjunction of
//! predicate nodes for a host query engine. Empty fields are skipped, fields
//! on related entities are evaluated against registered joins.
//!
//! # Example
//!
//! ```ignore
//! use ormspec::prelude::*;
//!
//! #[derive(serde::Serialize)]
//! struct DataQuery {
//!     name: Option<String>,
//!     number: Option<i32>,
//! }
//!
//! let schema = ParamSchema::new()
//!     .field(FieldDescriptor::new("name").operator(Like::contains()))
//!     .field(FieldDescriptor::new("number").operator(Operator::greater_than("number")));
//!
//! let query = DataQuery { name: Some("er".into()), number: None };
//! let rows = repository.find_by_spec(Some(&schema.bind(&query)))?;
//! ```

pub use ormspec_core::{
    assembler, catalog, config, engine, executor, join, operator, param, specification,
};
pub use ormspec_core::{
    AssemblerConfig, Error, PredicateAssembler, Result, Specification, SpecificationExecutor,
    SpecificationExecutorExt,
};
pub use ormspec_proto as proto;

/// Commonly used types.
pub mod prelude {
    pub use ormspec_core::catalog::{
        Cardinality, EntityDef, EntityMetadata, FetchMode, FieldDef, FieldType, RelationDef,
        ScalarType, Schema,
    };
    pub use ormspec_core::engine::{EntityRow, MemoryStore, Record, Repository};
    pub use ormspec_core::operator::{
        Bound, CustomOperator, Equals, Like, LikeMode, Membership, Operator, OperatorKind,
        OperatorRegistry, OperatorStrategy,
    };
    pub use ormspec_core::param::{
        FieldDescriptor, JoinDeclaration, ParamField, ParamSchema, QueryParam, QueryParams,
    };
    pub use ormspec_core::{
        AssemblerConfig, Error, PredicateAssembler, Specification, SpecificationExecutor,
        SpecificationExecutorExt,
    };
    pub use ormspec_proto::{
        AttrPath, Condition, Conjunction, JoinKind, Page, PageRequest, Predicate, QueryContext,
        QueryRoot, ResultKind, Target, Value,
    };
}
