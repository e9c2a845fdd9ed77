//! Specification execution over a [`MemoryStore`].

use std::sync::Arc;

use ormspec_proto::{Conjunction, JoinKind, Page, PageRequest, QueryContext, QueryRoot, Value};
use tracing::debug;

use super::filter::{FilterEvaluator, JoinedRow};
use super::store::{EntityRow, MemoryStore};
use crate::catalog::{EntityMetadata, RelationDef};
use crate::error::Error;
use crate::executor::SpecificationExecutor;
use crate::specification::Specification;

/// A matched root row with the rows materialized by its fetch joins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Root entity row.
    pub row: EntityRow,
    /// Fetched related rows keyed by join path. Unmatched left joins are absent.
    pub fetched: Vec<(String, EntityRow)>,
}

impl Record {
    /// Get a root field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.row.get(field)
    }

    /// Get the related row fetched under `path`.
    pub fn related(&self, path: &str) -> Option<&EntityRow> {
        self.fetched.iter().find(|(p, _)| p == path).map(|(_, r)| r)
    }
}

/// One resolved join of a query.
#[derive(Debug)]
struct JoinStep {
    path: String,
    parent: Option<String>,
    kind: JoinKind,
    fetch: bool,
    relation: RelationDef,
}

/// Runs specifications against the rows of one entity type.
#[derive(Debug, Clone)]
pub struct Repository {
    store: Arc<MemoryStore>,
    entity: String,
}

impl Repository {
    /// Create a repository for `entity`.
    pub fn new(store: Arc<MemoryStore>, entity: impl Into<String>) -> Result<Self, Error> {
        let entity = entity.into();
        if store.schema().entity(&entity).is_none() {
            return Err(Error::UnknownEntity(entity));
        }
        Ok(Self { store, entity })
    }

    /// Root entity type.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Evaluate a specification and return the matching records.
    fn select(
        &self,
        spec: Option<&dyn Specification>,
        query: QueryContext,
    ) -> Result<Vec<Record>, Error> {
        let mut root = QueryRoot::new(self.entity.as_str());
        let conjunction = match spec {
            Some(spec) => spec.to_predicate(&mut root, &query)?,
            None => Conjunction::unrestricted(),
        };
        let steps = self.plan(&root, &query)?;
        debug!(
            entity = %self.entity,
            joins = steps.len(),
            count = query.is_count(),
            predicate = %conjunction,
            "executing specification"
        );

        let tables = self.store.read();
        let mut records = Vec::new();

        'rows: for row in tables.rows(&self.entity) {
            let mut joined = JoinedRow::new(row.clone());

            for step in &steps {
                let parent = match &step.parent {
                    None => Some(&joined.root),
                    Some(path) => joined.related(path).flatten(),
                };
                let key = parent
                    .and_then(|p| p.get(&step.relation.from_field))
                    .filter(|v| !v.is_null());
                let related = key.and_then(|key| {
                    tables
                        .rows(&step.relation.to_entity)
                        .iter()
                        .find(|r| {
                            r.get(&step.relation.to_field)
                                .is_some_and(|v| FilterEvaluator::values_equal(v, key))
                        })
                        .cloned()
                });

                if related.is_none() && step.kind == JoinKind::Inner {
                    continue 'rows;
                }
                joined.joined.push((step.path.clone(), related));
            }

            if FilterEvaluator::evaluate(&conjunction, &joined)? {
                records.push(into_record(joined, &steps));
            }
        }

        debug!(entity = %self.entity, matched = records.len(), "specification executed");
        Ok(records)
    }

    /// Resolve the joins registered on `root` to relations.
    fn plan(&self, root: &QueryRoot, query: &QueryContext) -> Result<Vec<JoinStep>, Error> {
        if query.is_count() && root.has_fetch_joins() {
            return Err(Error::InvalidQuery(
                "count queries cannot fetch related rows".to_string(),
            ));
        }

        let schema = self.store.schema();
        let mut steps: Vec<JoinStep> = Vec::with_capacity(root.joins.len());

        for join in &root.joins {
            if join.kind == JoinKind::Right {
                return Err(Error::InvalidQuery(format!(
                    "right join on '{}' is not supported",
                    join.path
                )));
            }

            let source = match join.parent_path() {
                None => root.entity.clone(),
                Some(parent) => steps
                    .iter()
                    .find(|s| s.path == parent)
                    .map(|s| s.relation.to_entity.clone())
                    .ok_or_else(|| {
                        Error::InvalidQuery(format!(
                            "join '{}' references missing parent '{}'",
                            join.path, parent
                        ))
                    })?,
            };

            let relation = schema
                .relation(&source, join.relation_name())
                .ok_or_else(|| Error::UnknownAttribute {
                    entity: source.clone(),
                    attribute: join.relation_name().to_string(),
                })?;
            if !relation.cardinality.is_to_one() {
                return Err(Error::InvalidQuery(format!(
                    "join '{}' is a to-many relation",
                    join.path
                )));
            }

            steps.push(JoinStep {
                path: join.path.clone(),
                parent: join.parent_path().map(str::to_string),
                kind: join.kind,
                fetch: join.fetch,
                relation: relation.clone(),
            });
        }

        Ok(steps)
    }
}

fn into_record(joined: JoinedRow, steps: &[JoinStep]) -> Record {
    let fetched = joined
        .joined
        .into_iter()
        .zip(steps)
        .filter(|(_, step)| step.fetch)
        .filter_map(|((path, row), _)| row.map(|row| (path, row)))
        .collect();
    Record {
        row: joined.root,
        fetched,
    }
}

impl SpecificationExecutor<Record> for Repository {
    fn find_all(&self, spec: Option<&dyn Specification>) -> Result<Vec<Record>, Error> {
        self.select(spec, QueryContext::entities())
    }

    fn find_page(
        &self,
        spec: Option<&dyn Specification>,
        request: PageRequest,
    ) -> Result<Page<Record>, Error> {
        let total = self.count(spec)?;
        let content = self
            .select(spec, QueryContext::entities())?
            .into_iter()
            .skip(request.offset())
            .take(request.size as usize)
            .collect();
        Ok(Page::new(content, total, request))
    }

    fn count(&self, spec: Option<&dyn Specification>) -> Result<u64, Error> {
        Ok(self.select(spec, QueryContext::count())?.len() as u64)
    }
}
