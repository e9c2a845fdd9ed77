//! Join path resolution.
//!
//! Before any field is turned into a predicate, the resolver registers joins
//! on the query root and records them in a [`JoinMap`] keyed by join path.
//! Joins come from two places:
//!
//! - the parameter object's [`JoinDeclaration`]s,
//! - eager to-one relations discovered from [`EntityMetadata`], descending
//!   into related entities.
//!
//! Declarations are applied first; the first entry for a key wins. A dotted
//! declaration also makes each parent path addressable. Count queries receive
//! plain joins, entity queries receive fetch joins.

use ormspec_proto::{JoinKind, QueryContext, QueryRoot, Target};
use tracing::{debug, trace};

use crate::catalog::EntityMetadata;
use crate::config::AssemblerConfig;
use crate::error::Error;
use crate::param::JoinDeclaration;

/// Join path key to target, in registration order.
///
/// Rebuilt for every predicate build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinMap {
    entries: Vec<(String, Target)>,
}

impl JoinMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless the key is already present.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert(&mut self, key: impl Into<String>, target: Target) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.entries.push((key, target));
        true
    }

    /// Get the target for a key.
    pub fn get(&self, key: &str) -> Option<&Target> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registers joins on a query root for one predicate build.
pub struct JoinResolver<'a> {
    config: &'a AssemblerConfig,
    metadata: Option<&'a dyn EntityMetadata>,
}

impl<'a> JoinResolver<'a> {
    /// Create a resolver for declared joins only.
    pub fn new(config: &'a AssemblerConfig) -> Self {
        Self {
            config,
            metadata: None,
        }
    }

    /// Also discover eager relations from entity metadata.
    pub fn with_metadata(mut self, metadata: &'a dyn EntityMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Register every join on `root` and return the join map.
    pub fn resolve(
        &self,
        declarations: &[JoinDeclaration],
        root: &mut QueryRoot,
        query: &QueryContext,
    ) -> Result<JoinMap, Error> {
        let mut joins = JoinMap::new();

        for declaration in declarations {
            let path = declaration.attribute.as_str();
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return Err(Error::InvalidJoin(path.to_string()));
            }
            if joins.contains(path) {
                continue;
            }
            let target = register(root, path, declaration.kind, query);
            trace!(path, kind = %declaration.kind, "declared join");
            for (end, _) in path.match_indices('.') {
                let parent = &path[..end];
                joins.insert(parent, Target::Join(parent.to_string()));
            }
            joins.insert(path, target);
        }

        if let Some(metadata) = self.metadata.filter(|_| self.config.discover_eager_joins) {
            let entity = root.entity.clone();
            if metadata.entity(&entity).is_none() {
                return Err(Error::UnknownEntity(entity));
            }
            let mut branch = vec![entity.clone()];
            self.discover(metadata, &entity, None, &mut branch, root, query, &mut joins)?;
        }

        Ok(joins)
    }

    /// Walk eager to-one relations of `entity`, depth first.
    ///
    /// `branch` holds the entity types between the root and `entity`.
    #[allow(clippy::too_many_arguments)]
    fn discover(
        &self,
        metadata: &dyn EntityMetadata,
        entity: &str,
        prefix: Option<&str>,
        branch: &mut Vec<String>,
        root: &mut QueryRoot,
        query: &QueryContext,
        joins: &mut JoinMap,
    ) -> Result<(), Error> {
        for relation in metadata.relations_from(entity) {
            if !relation.is_eager_to_one() {
                continue;
            }

            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, relation.name),
                None => relation.name.clone(),
            };

            if branch.iter().any(|e| e == &relation.to_entity) {
                return Err(Error::JoinCycle {
                    path,
                    entity: relation.to_entity.clone(),
                });
            }
            if let Some(max_depth) = self.config.max_join_depth {
                if branch.len() > max_depth {
                    return Err(Error::JoinDepthExceeded { path, max_depth });
                }
            }
            if metadata.entity(&relation.to_entity).is_none() {
                return Err(Error::UnknownEntity(relation.to_entity.clone()));
            }

            if !joins.contains(&path) {
                let target = register(root, &path, JoinKind::Left, query);
                debug!(path = %path, entity = %relation.to_entity, "discovered eager join");
                joins.insert(path.clone(), target);
            }

            branch.push(relation.to_entity.clone());
            self.discover(metadata, &relation.to_entity, Some(path.as_str()), branch, root, query, joins)?;
            branch.pop();
        }
        Ok(())
    }
}

/// Plain join for count queries, fetch join otherwise.
fn register(root: &mut QueryRoot, path: &str, kind: JoinKind, query: &QueryContext) -> Target {
    if query.is_count() {
        root.join(path, kind)
    } else {
        root.fetch(path, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, FieldType, RelationDef, ScalarType, Schema};
    use pretty_assertions::assert_eq;

    fn entity(name: &str, fields: &[&str]) -> EntityDef {
        fields.iter().fold(EntityDef::new(name, "name"), |e, f| {
            e.with_field(FieldDef::new(*f, FieldType::scalar(ScalarType::String)))
        })
    }

    fn school() -> Schema {
        Schema::new(1)
            .with_entity(entity("Teacher", &["name"]))
            .with_entity(entity("SClass", &["name", "teacher_name"]))
            .with_entity(entity("Student", &["name", "class_name"]))
            .with_relation(RelationDef::many_to_one(
                "sClass", "Student", "class_name", "SClass", "name",
            ))
            .with_relation(RelationDef::one_to_one(
                "teacher", "SClass", "teacher_name", "Teacher", "name",
            ))
    }

    #[test]
    fn test_declared_joins_fetch_for_entities() {
        let config = AssemblerConfig::default();
        let mut root = QueryRoot::new("Student");
        let joins = JoinResolver::new(&config)
            .resolve(
                &[JoinDeclaration::new("sClass.teacher")],
                &mut root,
                &QueryContext::entities(),
            )
            .unwrap();

        assert_eq!(joins.keys().collect::<Vec<_>>(), vec!["sClass", "sClass.teacher"]);
        assert_eq!(joins.get("sClass"), Some(&Target::Join("sClass".into())));
        assert_eq!(joins.get("sClass.teacher"), Some(&Target::Join("sClass.teacher".into())));
        assert_eq!(root.joins.len(), 2);
        assert!(root.joins.iter().all(|j| j.fetch));
    }

    #[test]
    fn test_declared_joins_plain_for_count() {
        let config = AssemblerConfig::default();
        let mut root = QueryRoot::new("Student");
        JoinResolver::new(&config)
            .resolve(&[JoinDeclaration::inner("sClass")], &mut root, &QueryContext::count())
            .unwrap();

        assert!(!root.has_fetch_joins());
        assert_eq!(root.joins[0].kind, JoinKind::Inner);
    }

    #[test]
    fn test_first_declaration_wins() {
        let config = AssemblerConfig::default();
        let mut root = QueryRoot::new("Student");
        let joins = JoinResolver::new(&config)
            .resolve(
                &[JoinDeclaration::inner("sClass"), JoinDeclaration::new("sClass")],
                &mut root,
                &QueryContext::entities(),
            )
            .unwrap();

        assert_eq!(joins.len(), 1);
        assert_eq!(root.get_join("sClass").unwrap().kind, JoinKind::Inner);
    }

    #[test]
    fn test_malformed_declaration() {
        let config = AssemblerConfig::default();
        let mut root = QueryRoot::new("Student");
        let result = JoinResolver::new(&config).resolve(
            &[JoinDeclaration::new("sClass..teacher")],
            &mut root,
            &QueryContext::entities(),
        );

        assert!(matches!(result, Err(Error::InvalidJoin(_))));
    }

    #[test]
    fn test_discovers_eager_relations_recursively() {
        let config = AssemblerConfig::default();
        let schema = school();
        let mut root = QueryRoot::new("Student");
        let joins = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities())
            .unwrap();

        assert_eq!(joins.keys().collect::<Vec<_>>(), vec!["sClass", "sClass.teacher"]);
        assert!(root.joins.iter().all(|j| j.fetch && j.kind == JoinKind::Left));
    }

    #[test]
    fn test_discovery_skips_lazy_and_to_many() {
        let config = AssemblerConfig::default();
        let schema = school()
            .with_relation(
                RelationDef::one_to_one("teacher", "SClass", "teacher_name", "Teacher", "name").lazy(),
            )
            .with_relation(RelationDef::one_to_many(
                "students", "SClass", "name", "Student", "class_name",
            ));
        let mut root = QueryRoot::new("Student");
        let joins = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities())
            .unwrap();

        assert_eq!(joins.keys().collect::<Vec<_>>(), vec!["sClass"]);
    }

    #[test]
    fn test_discovery_disabled_by_config() {
        let config = AssemblerConfig::default().discover_eager_joins(false);
        let schema = school();
        let mut root = QueryRoot::new("Student");
        let joins = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities())
            .unwrap();

        assert!(joins.is_empty());
        assert!(root.joins.is_empty());
    }

    #[test]
    fn test_declaration_kind_beats_discovery() {
        let config = AssemblerConfig::default();
        let schema = school();
        let mut root = QueryRoot::new("Student");
        JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[JoinDeclaration::inner("sClass")], &mut root, &QueryContext::entities())
            .unwrap();

        assert_eq!(root.get_join("sClass").unwrap().kind, JoinKind::Inner);
        assert_eq!(root.get_join("sClass.teacher").unwrap().kind, JoinKind::Left);
    }

    #[test]
    fn test_eager_cycle_is_an_error() {
        let config = AssemblerConfig::default();
        let schema = school().with_relation(RelationDef::many_to_one(
            "monitor", "Teacher", "name", "Student", "name",
        ));
        let mut root = QueryRoot::new("Student");
        let result = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities());

        assert!(matches!(
            result,
            Err(Error::JoinCycle { ref path, ref entity })
                if path == "sClass.teacher.monitor" && entity == "Student"
        ));
    }

    #[test]
    fn test_shared_target_on_sibling_branches_is_not_a_cycle() {
        let config = AssemblerConfig::default();
        let schema = school().with_relation(RelationDef::many_to_one(
            "mentor", "Student", "name", "Teacher", "name",
        ));
        let mut root = QueryRoot::new("Student");
        let joins = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities())
            .unwrap();

        assert_eq!(
            joins.keys().collect::<Vec<_>>(),
            vec!["sClass", "sClass.teacher", "mentor"]
        );
    }

    #[test]
    fn test_depth_limit() {
        let config = AssemblerConfig::default().max_join_depth(1);
        let schema = school();
        let mut root = QueryRoot::new("Student");
        let result = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities());

        assert!(matches!(
            result,
            Err(Error::JoinDepthExceeded { ref path, max_depth: 1 }) if path == "sClass.teacher"
        ));
    }

    #[test]
    fn test_long_acyclic_chain_resolves_without_limit() {
        let config = AssemblerConfig::default();
        let schema = (0..6).fold(
            (0..=6).fold(Schema::new(1), |s, i| {
                s.with_entity(entity(&format!("E{}", i), &["name", "next_name"]))
            }),
            |s, i| {
                s.with_relation(RelationDef::many_to_one(
                    "next",
                    &format!("E{}", i),
                    "next_name",
                    &format!("E{}", i + 1),
                    "name",
                ))
            },
        );
        let mut root = QueryRoot::new("E0");
        let joins = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities())
            .unwrap();

        let expected: Vec<String> = (1..=6).map(|n| vec!["next"; n].join(".")).collect();
        assert_eq!(joins.keys().collect::<Vec<_>>(), expected);
        assert_eq!(root.joins.len(), 6);
    }

    #[test]
    fn test_declared_parent_path_is_addressable() {
        let config = AssemblerConfig::default();
        let mut root = QueryRoot::new("Student");
        let joins = JoinResolver::new(&config)
            .resolve(
                &[JoinDeclaration::inner("sClass.teacher"), JoinDeclaration::new("sClass")],
                &mut root,
                &QueryContext::entities(),
            )
            .unwrap();

        assert_eq!(joins.len(), 2);
        assert_eq!(joins.get("sClass"), Some(&Target::Join("sClass".into())));
        assert_eq!(root.get_join("sClass").unwrap().kind, JoinKind::Inner);
    }

    #[test]
    fn test_unknown_root_entity() {
        let config = AssemblerConfig::default();
        let schema = school();
        let mut root = QueryRoot::new("School");
        let result = JoinResolver::new(&config)
            .with_metadata(&schema)
            .resolve(&[], &mut root, &QueryContext::entities());

        assert!(matches!(result, Err(Error::UnknownEntity(name)) if name == "School"));
    }
}
