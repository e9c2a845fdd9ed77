//! Schema - the set of entities and relations known to a query root.

use super::{EntityDef, RelationDef};
use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Per-entity relationship metadata consumed by join discovery.
///
/// Implemented by [`Schema`]; hosts with their own mapping layer can
/// implement it directly.
pub trait EntityMetadata {
    /// Get an entity by name.
    fn entity(&self, name: &str) -> Option<&EntityDef>;

    /// Get all relations declared on an entity, in declaration order.
    fn relations_from(&self, entity: &str) -> Vec<&RelationDef>;

    /// Get the relation exposed as `attribute` on `entity`.
    fn relation(&self, entity: &str, attribute: &str) -> Option<&RelationDef> {
        self.relations_from(entity)
            .into_iter()
            .find(|r| r.name == attribute)
    }
}

/// A versioned snapshot of entity and relation definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema version.
    pub version: u64,
    /// Entity definitions in declaration order.
    pub entities: Vec<EntityDef>,
    /// Relation definitions in declaration order.
    pub relations: Vec<RelationDef>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entities: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Add an entity to the schema. An entity with the same name is replaced.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.retain(|e| e.name != entity.name);
        self.entities.push(entity);
        self
    }

    /// Add a relation to the schema. A relation with the same source entity
    /// and name is replaced.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations
            .retain(|r| !(r.from_entity == relation.from_entity && r.name == relation.name));
        self.relations.push(relation);
        self
    }

    /// Get all relations pointing at an entity.
    pub fn relations_to(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.to_entity == entity)
            .collect()
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    /// Check that every relation connects known entities and fields.
    pub fn validate(&self) -> Result<(), Error> {
        for relation in &self.relations {
            let from = self
                .entity(&relation.from_entity)
                .ok_or_else(|| Error::UnknownEntity(relation.from_entity.clone()))?;
            let to = self
                .entity(&relation.to_entity)
                .ok_or_else(|| Error::UnknownEntity(relation.to_entity.clone()))?;

            if from.get_field(&relation.from_field).is_none() {
                return Err(Error::UnknownAttribute {
                    entity: from.name.clone(),
                    attribute: relation.from_field.clone(),
                });
            }
            if to.get_field(&relation.to_field).is_none() {
                return Err(Error::UnknownAttribute {
                    entity: to.name.clone(),
                    attribute: relation.to_field.clone(),
                });
            }
            if from.get_field(&relation.name).is_some() {
                return Err(Error::InvalidData(format!(
                    "relation '{}' shadows a field of entity '{}'",
                    relation.name, from.name
                )));
            }
        }
        Ok(())
    }

    /// Parse a schema from its JSON description.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidData(e.to_string()))
    }

    /// Render the schema as JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidData(e.to_string()))
    }
}

impl EntityMetadata for Schema {
    fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    fn relations_from(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.from_entity == entity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, FieldType, ScalarType};

    fn school_schema() -> Schema {
        let string = || FieldType::scalar(ScalarType::String);

        let teacher = EntityDef::new("Teacher", "name").with_field(FieldDef::new("name", string()));
        let class = EntityDef::new("SClass", "name")
            .with_field(FieldDef::new("name", string()))
            .with_field(FieldDef::new("teacher_name", string()));
        let student = EntityDef::new("Student", "name")
            .with_field(FieldDef::new("name", string()))
            .with_field(FieldDef::new("class_name", string()));

        Schema::new(1)
            .with_entity(teacher)
            .with_entity(class)
            .with_entity(student)
            .with_relation(RelationDef::many_to_one(
                "class", "Student", "class_name", "SClass", "name",
            ))
            .with_relation(RelationDef::one_to_one(
                "teacher", "SClass", "teacher_name", "Teacher", "name",
            ))
    }

    #[test]
    fn test_schema_builder() {
        let schema = school_schema();

        assert_eq!(schema.version, 1);
        assert_eq!(schema.entity_names(), vec!["Teacher", "SClass", "Student"]);
        assert_eq!(schema.relations.len(), 2);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_relation_lookup() {
        let schema = school_schema();

        let rel = schema.relation("Student", "class").unwrap();
        assert_eq!(rel.to_entity, "SClass");
        assert!(schema.relation("Student", "teacher").is_none());
        assert_eq!(schema.relations_to("Teacher").len(), 1);
    }

    #[test]
    fn test_replacing_definitions() {
        let schema = school_schema()
            .with_relation(RelationDef::many_to_one(
                "class", "Student", "class_name", "SClass", "name",
            ).lazy());

        assert_eq!(schema.relations_from("Student").len(), 1);
        assert!(!schema.relation("Student", "class").unwrap().is_eager_to_one());
    }

    #[test]
    fn test_validate_rejects_unknown_entity() {
        let schema = school_schema().with_relation(RelationDef::many_to_one(
            "school", "SClass", "name", "School", "id",
        ));

        assert!(matches!(schema.validate(), Err(Error::UnknownEntity(name)) if name == "School"));
    }

    #[test]
    fn test_validate_rejects_unknown_field() {
        let schema = school_schema().with_relation(RelationDef::many_to_one(
            "mentor", "Student", "mentor_name", "Teacher", "name",
        ));

        assert!(matches!(
            schema.validate(),
            Err(Error::UnknownAttribute { attribute, .. }) if attribute == "mentor_name"
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let schema = school_schema();
        let json = schema.to_json().unwrap();
        let decoded = Schema::from_json(&json).unwrap();
        assert_eq!(schema, decoded);
    }
}
