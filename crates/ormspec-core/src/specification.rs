//! Deferred predicate callbacks.
//!
//! A host engine does not receive a predicate up front. It receives a
//! [`Specification`] and calls it once it has built the query root for the
//! query it is about to run, passing what kind of result it will produce.

use ormspec_proto::{Conjunction, QueryContext, QueryRoot};

use crate::assembler::PredicateAssembler;
use crate::error::Error;
use crate::param::QueryParam;

/// Predicate-building callback invoked by a host engine.
pub trait Specification {
    /// Build the conjunction for a query, registering any joins on `root`.
    fn to_predicate(&self, root: &mut QueryRoot, query: &QueryContext) -> Result<Conjunction, Error>;
}

impl<F> Specification for F
where
    F: Fn(&mut QueryRoot, &QueryContext) -> Result<Conjunction, Error>,
{
    fn to_predicate(&self, root: &mut QueryRoot, query: &QueryContext) -> Result<Conjunction, Error> {
        self(root, query)
    }
}

/// A query-parameter object assembled on demand.
#[derive(Debug)]
pub struct ParamSpecification<'a, P> {
    assembler: &'a PredicateAssembler,
    param: P,
}

impl<'a, P: QueryParam> ParamSpecification<'a, P> {
    /// Wrap `param` for `assembler`.
    pub fn new(assembler: &'a PredicateAssembler, param: P) -> Self {
        Self { assembler, param }
    }

    /// The wrapped parameter object.
    pub fn param(&self) -> &P {
        &self.param
    }
}

impl<P: QueryParam> Specification for ParamSpecification<'_, P> {
    fn to_predicate(&self, root: &mut QueryRoot, query: &QueryContext) -> Result<Conjunction, Error> {
        self.assembler.assemble(&self.param, root, query)
    }
}
