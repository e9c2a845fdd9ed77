//! Thread-safe in-memory tables.

use std::collections::HashMap;

use ormspec_proto::Value;
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::trace;

use crate::catalog::{EntityMetadata, Schema};
use crate::error::Error;

/// One entity row: field values in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRow {
    /// Field name and value pairs.
    pub fields: Vec<(String, Value)>,
}

impl EntityRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing a previous value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing a previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Rows of every entity type of a schema.
#[derive(Debug)]
pub struct MemoryStore {
    schema: Schema,
    tables: RwLock<HashMap<String, Vec<EntityRow>>>,
}

impl MemoryStore {
    /// Create an empty store for `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// The schema rows are validated against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Insert a row after checking it against the entity definition.
    pub fn insert(&self, entity: &str, row: EntityRow) -> Result<(), Error> {
        let def = self
            .schema
            .entity(entity)
            .ok_or_else(|| Error::UnknownEntity(entity.to_string()))?;

        for (name, value) in &row.fields {
            let field = def.get_field(name).ok_or_else(|| Error::UnknownAttribute {
                entity: entity.to_string(),
                attribute: name.clone(),
            })?;
            if !value.is_null() && !field.field_type.accepts(value) {
                return Err(Error::InvalidData(format!(
                    "field '{}.{}' does not accept {}",
                    entity,
                    name,
                    value.kind_name()
                )));
            }
        }

        for field in def.required_fields() {
            if row.get(&field.name).map_or(true, Value::is_null) {
                return Err(Error::InvalidData(format!(
                    "required field '{}.{}' is missing",
                    entity, field.name
                )));
            }
        }

        trace!(entity, fields = row.fields.len(), "inserting row");
        self.tables
            .write()
            .entry(entity.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    /// Insert several rows of one entity type.
    pub fn insert_all(
        &self,
        entity: &str,
        rows: impl IntoIterator<Item = EntityRow>,
    ) -> Result<(), Error> {
        for row in rows {
            self.insert(entity, row)?;
        }
        Ok(())
    }

    /// Number of rows stored for an entity.
    pub fn len(&self, entity: &str) -> usize {
        self.tables.read().get(entity).map_or(0, Vec::len)
    }

    /// Check if no rows are stored at all.
    pub fn is_empty(&self) -> bool {
        self.tables.read().values().all(Vec::is_empty)
    }

    /// Read access to every table, consistent for the guard's lifetime.
    pub(crate) fn read(&self) -> Tables<'_> {
        Tables {
            guard: self.tables.read(),
        }
    }
}

/// A consistent read view of the store.
pub(crate) struct Tables<'a> {
    guard: RwLockReadGuard<'a, HashMap<String, Vec<EntityRow>>>,
}

impl Tables<'_> {
    /// Rows of an entity, in insertion order.
    pub(crate) fn rows(&self, entity: &str) -> &[EntityRow] {
        self.guard.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }
}
