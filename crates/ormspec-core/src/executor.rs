//! Specification executors.
//!
//! [`SpecificationExecutor`] is the contract a host engine fulfils.
//! [`SpecificationExecutorExt`] adds query-parameter entry points on top of
//! any executor.

use ormspec_proto::{Page, PageRequest};

use crate::assembler::PredicateAssembler;
use crate::error::Error;
use crate::param::QueryParam;
use crate::specification::Specification;

/// Host engine running specifications over entities of type `T`.
///
/// `None` means no restriction.
pub trait SpecificationExecutor<T> {
    /// Every entity matching the specification.
    fn find_all(&self, spec: Option<&dyn Specification>) -> Result<Vec<T>, Error>;

    /// One page of entities matching the specification.
    fn find_page(&self, spec: Option<&dyn Specification>, request: PageRequest) -> Result<Page<T>, Error>;

    /// Number of entities matching the specification.
    fn count(&self, spec: Option<&dyn Specification>) -> Result<u64, Error>;
}

/// Query-parameter entry points for any [`SpecificationExecutor`].
pub trait SpecificationExecutorExt<T>: SpecificationExecutor<T> {
    /// Find every entity matching `param`. `None` returns every entity.
    fn find_by_spec<P: QueryParam>(&self, param: Option<&P>) -> Result<Vec<T>, Error> {
        self.find_by_spec_with(PredicateAssembler::standard(), param)
    }

    /// Find one page of entities matching `param`.
    fn find_page_by_spec<P: QueryParam>(
        &self,
        param: Option<&P>,
        request: PageRequest,
    ) -> Result<Page<T>, Error> {
        self.find_page_by_spec_with(PredicateAssembler::standard(), param, request)
    }

    /// Count entities matching `param`.
    fn count_by_spec<P: QueryParam>(&self, param: Option<&P>) -> Result<u64, Error> {
        self.count_by_spec_with(PredicateAssembler::standard(), param)
    }

    /// [`find_by_spec`](Self::find_by_spec) with a specific assembler.
    fn find_by_spec_with<P: QueryParam>(
        &self,
        assembler: &PredicateAssembler,
        param: Option<&P>,
    ) -> Result<Vec<T>, Error> {
        match param {
            Some(param) => self.find_all(Some(&assembler.specification(param))),
            None => self.find_all(None),
        }
    }

    /// [`find_page_by_spec`](Self::find_page_by_spec) with a specific assembler.
    fn find_page_by_spec_with<P: QueryParam>(
        &self,
        assembler: &PredicateAssembler,
        param: Option<&P>,
        request: PageRequest,
    ) -> Result<Page<T>, Error> {
        match param {
            Some(param) => self.find_page(Some(&assembler.specification(param)), request),
            None => self.find_page(None, request),
        }
    }

    /// [`count_by_spec`](Self::count_by_spec) with a specific assembler.
    fn count_by_spec_with<P: QueryParam>(
        &self,
        assembler: &PredicateAssembler,
        param: Option<&P>,
    ) -> Result<u64, Error> {
        match param {
            Some(param) => self.count(Some(&assembler.specification(param))),
            None => self.count(None),
        }
    }
}

impl<T, E: SpecificationExecutor<T> + ?Sized> SpecificationExecutorExt<T> for E {}
