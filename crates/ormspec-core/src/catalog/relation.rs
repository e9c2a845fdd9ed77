//! Relation definitions between entities.

use serde::{Deserialize, Serialize};

/// Cardinality of a relation, seen from its source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Many source rows reference one target row (foreign key on source).
    ManyToOne,
    /// One source row references one target row (unique foreign key).
    OneToOne,
    /// One source row is referenced by many target rows.
    OneToMany,
    /// Many-to-many relation through an edge entity.
    ManyToMany,
}

impl Cardinality {
    /// Check if the relation resolves to at most one target row.
    pub fn is_to_one(&self) -> bool {
        matches!(self, Cardinality::ManyToOne | Cardinality::OneToOne)
    }

    /// Fetch mode used when none is declared: to-one relations are eager,
    /// to-many relations are lazy.
    pub fn default_fetch(&self) -> FetchMode {
        if self.is_to_one() {
            FetchMode::Eager
        } else {
            FetchMode::Lazy
        }
    }
}

/// When related rows are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchMode {
    /// Loaded together with the owning row.
    Eager,
    /// Loaded on demand.
    Lazy,
}

/// A relation definition, exposed as an attribute of its source entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Attribute name on the source entity (unique per source entity).
    pub name: String,
    /// Source entity name.
    pub from_entity: String,
    /// Target entity name.
    pub to_entity: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Field on the source entity (foreign key for to-one relations).
    pub from_field: String,
    /// Field on the target entity (usually identity).
    pub to_field: String,
    /// Fetch mode.
    pub fetch: FetchMode,
}

impl RelationDef {
    /// Create a relation with the default fetch mode of its cardinality.
    pub fn new(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            to_entity: to_entity.into(),
            cardinality,
            from_field: from_field.into(),
            to_field: to_field.into(),
            fetch: cardinality.default_fetch(),
        }
    }

    /// Create a many-to-one relation.
    pub fn many_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
            Cardinality::ManyToOne,
        )
    }

    /// Create a one-to-one relation.
    pub fn one_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
            Cardinality::OneToOne,
        )
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            from_entity,
            from_field,
            to_entity,
            to_field,
            Cardinality::OneToMany,
        )
    }

    /// Set the fetch mode.
    pub fn with_fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = fetch;
        self
    }

    /// Mark the relation as lazily fetched.
    pub fn lazy(self) -> Self {
        self.with_fetch(FetchMode::Lazy)
    }

    /// Mark the relation as eagerly fetched.
    pub fn eager(self) -> Self {
        self.with_fetch(FetchMode::Eager)
    }

    /// Check if this relation is joined automatically during discovery.
    pub fn is_eager_to_one(&self) -> bool {
        self.fetch == FetchMode::Eager && self.cardinality.is_to_one()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_many_to_one_defaults_eager() {
        let rel = RelationDef::many_to_one("class", "Student", "class_name", "SClass", "name");

        assert_eq!(rel.cardinality, Cardinality::ManyToOne);
        assert_eq!(rel.fetch, FetchMode::Eager);
        assert!(rel.is_eager_to_one());
    }

    #[test]
    fn test_one_to_many_defaults_lazy() {
        let rel = RelationDef::one_to_many("students", "SClass", "name", "Student", "class_name");

        assert_eq!(rel.fetch, FetchMode::Lazy);
        assert!(!rel.is_eager_to_one());

        // Eager to-many relations are still not discovered
        assert!(!rel.eager().is_eager_to_one());
    }

    #[test]
    fn test_lazy_to_one() {
        let rel = RelationDef::one_to_one("teacher", "SClass", "teacher_name", "Teacher", "name")
            .lazy();

        assert_eq!(rel.fetch, FetchMode::Lazy);
        assert!(!rel.is_eager_to_one());
    }
}
