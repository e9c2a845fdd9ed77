//! Predicate assembly.
//!
//! The assembler walks a query-parameter object and produces the conjunction
//! of one predicate node per operator of every populated field:
//!
//! 1. enumerate fields in declared order
//! 2. skip ignored fields and empty values
//! 3. resolve the evaluation target (a registered join path or the root)
//! 4. build one node per operator through the registry
//! 5. AND every node together
//!
//! Any error aborts the build; nothing partial is returned.

use std::sync::{Arc, OnceLock};

use ormspec_proto::{Conjunction, QueryContext, QueryRoot, Target};
use tracing::{debug, trace};

use crate::catalog::EntityMetadata;
use crate::config::AssemblerConfig;
use crate::error::Error;
use crate::join::{JoinMap, JoinResolver};
use crate::operator::{Equals, Operator, OperatorRegistry};
use crate::param::{FieldDescriptor, QueryParam};
use crate::specification::ParamSpecification;

/// Shared entity metadata handle.
pub type SharedMetadata = Arc<dyn EntityMetadata + Send + Sync>;

/// Builds conjunctions from query-parameter objects.
///
/// Stateless per call; one assembler can serve any number of threads.
#[derive(Clone)]
pub struct PredicateAssembler {
    registry: Arc<OperatorRegistry>,
    metadata: Option<SharedMetadata>,
    config: AssemblerConfig,
}

impl PredicateAssembler {
    /// Create an assembler with the standard operators and default config.
    pub fn new() -> Self {
        Self::with_registry(OperatorRegistry::standard())
    }

    /// Create an assembler using `registry`.
    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self::with_shared_registry(Arc::new(registry))
    }

    /// Create an assembler sharing `registry` with other assemblers.
    pub fn with_shared_registry(registry: Arc<OperatorRegistry>) -> Self {
        Self {
            registry,
            metadata: None,
            config: AssemblerConfig::default(),
        }
    }

    /// The process-wide assembler with standard operators and default config.
    pub fn standard() -> &'static PredicateAssembler {
        static STANDARD: OnceLock<PredicateAssembler> = OnceLock::new();
        STANDARD.get_or_init(PredicateAssembler::new)
    }

    /// Discover eager joins from entity metadata.
    pub fn metadata(mut self, metadata: SharedMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration.
    pub fn get_config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Get the operator registry.
    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Assemble the conjunction for `param`.
    ///
    /// Joins are registered on `root` as a side effect. `param` is only read.
    pub fn assemble<P: QueryParam + ?Sized>(
        &self,
        param: &P,
        root: &mut QueryRoot,
        query: &QueryContext,
    ) -> Result<Conjunction, Error> {
        let fields = param.fields()?;
        debug!(
            entity = %root.entity,
            fields = fields.len(),
            count = query.is_count(),
            "assembling predicate"
        );

        let mut resolver = JoinResolver::new(&self.config);
        if let Some(metadata) = self.metadata.as_deref() {
            resolver = resolver.with_metadata(metadata);
        }
        let joins = resolver.resolve(&param.joins(), root, query)?;

        let implicit = [Operator::Equals(Equals {
            field: None,
            ignore_case: self.config.ignore_case_default,
        })];

        let mut conjunction = Conjunction::unrestricted();
        for field in &fields {
            let descriptor = &field.descriptor;
            if descriptor.ignored {
                trace!(field = %descriptor.name, "skipping ignored field");
                continue;
            }
            if field.value.is_empty() {
                trace!(field = %descriptor.name, "skipping empty field");
                continue;
            }

            let target = resolve_target(&joins, descriptor);
            let operators: &[Operator] = if descriptor.operators.is_empty() {
                &implicit
            } else {
                &descriptor.operators
            };

            for operator in operators {
                let strategy = self.registry.resolve(&operator.kind())?;
                let node = strategy.build(&target, descriptor, &field.value, operator)?;
                trace!(field = %descriptor.name, operator = %operator.kind(), "built predicate node");
                conjunction.push(node);
            }
        }

        debug!(entity = %root.entity, nodes = conjunction.len(), "predicate assembled");
        Ok(conjunction)
    }

    /// Wrap `param` in a specification evaluated by this assembler.
    pub fn specification<P: QueryParam>(&self, param: P) -> ParamSpecification<'_, P> {
        ParamSpecification::new(self, param)
    }
}

impl Default for PredicateAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PredicateAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateAssembler")
            .field("registry", &self.registry)
            .field("metadata", &self.metadata.is_some())
            .field("config", &self.config)
            .finish()
    }
}

/// The field's join target, or the root when it names no registered path.
fn resolve_target(joins: &JoinMap, descriptor: &FieldDescriptor) -> Target {
    match descriptor.join_path.as_deref() {
        None | Some("") => Target::Root,
        Some(key) => match joins.get(key) {
            Some(target) => target.clone(),
            None => {
                debug!(
                    field = %descriptor.name,
                    join_path = key,
                    "join path not registered, evaluating against root"
                );
                Target::Root
            }
        },
    }
}
