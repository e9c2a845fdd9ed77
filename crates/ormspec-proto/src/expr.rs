//! Predicate expression IR handed to a host query engine.
//!
//! A specification is evaluated against a [`QueryRoot`]: joins are registered
//! on the root as a side effect, and the returned [`Conjunction`] references
//! either root attributes or attributes of a registered join path.
//!
//! Note: Like the rest of the protocol types this IR is flat. A [`Predicate`]
//! is a single [`Condition`] or one AND-level of conditions, and the
//! composite [`Conjunction`] ANDs predicates together. There is no OR and no
//! nesting beyond that.

use std::fmt;

use crate::error::Error;
use crate::value::Value;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// How a join path is attached to its parent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub enum JoinKind {
    /// Only rows with a related entity are kept.
    Inner,
    /// Rows without a related entity are kept with null attributes.
    #[default]
    Left,
    /// Related entities without an owner are kept.
    Right,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
            JoinKind::Right => write!(f, "right"),
        }
    }
}

/// A join registered on a query root.
///
/// The `path` field uses dot-notation for nested relations:
/// - "class" - join the class of the root entity
/// - "class.teacher" - join the teacher of that class
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct JoinNode {
    /// Dot-separated relation path from the root entity.
    pub path: String,
    /// Join kind.
    pub kind: JoinKind,
    /// Whether the related rows are materialized alongside the root.
    pub fetch: bool,
}

impl JoinNode {
    /// Get the relation name (last segment of the path).
    pub fn relation_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Get the parent path (all segments except the last).
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Check if this is a top-level join (no dots in path).
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('.')
    }

    /// Get the depth of this join (number of dots + 1).
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }
}

/// The node a condition is evaluated against: the root or a join path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The root entity of the query.
    Root,
    /// A join path registered on the query root.
    Join(String),
}

impl Target {
    /// Reference an attribute of this target.
    pub fn attr(&self, field: impl Into<String>) -> AttrPath {
        match self {
            Target::Root => AttrPath::root(field),
            Target::Join(path) => AttrPath::joined(path.clone(), field),
        }
    }

    /// Get the join path, if any.
    pub fn join_path(&self) -> Option<&str> {
        match self {
            Target::Root => None,
            Target::Join(path) => Some(path),
        }
    }
}

/// An attribute reference inside a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct AttrPath {
    /// Join path the attribute belongs to (`None` for the root).
    pub join: Option<String>,
    /// Attribute name on the target entity.
    pub field: String,
}

impl AttrPath {
    /// Reference an attribute of the root entity.
    pub fn root(field: impl Into<String>) -> Self {
        Self {
            join: None,
            field: field.into(),
        }
    }

    /// Reference an attribute of a joined entity.
    pub fn joined(join: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            join: Some(join.into()),
            field: field.into(),
        }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.join {
            Some(join) => write!(f, "{}.{}", join, self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

/// A single (non-compound) boolean condition.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum Condition {
    /// Attribute equals value.
    Eq { path: AttrPath, value: Value },
    /// Upper-cased attribute equals the (already upper-cased) value.
    EqIgnoreCase { path: AttrPath, value: String },
    /// Attribute less than value.
    Lt { path: AttrPath, value: Value },
    /// Attribute less than or equal to value.
    Le { path: AttrPath, value: Value },
    /// Attribute greater than value.
    Gt { path: AttrPath, value: Value },
    /// Attribute greater than or equal to value.
    Ge { path: AttrPath, value: Value },
    /// Attribute is one of the listed values.
    In { path: AttrPath, values: Vec<Value> },
    /// Attribute matches a LIKE pattern.
    Like { path: AttrPath, pattern: String },
}

impl Condition {
    /// Create an equality condition.
    pub fn eq(path: AttrPath, value: impl Into<Value>) -> Self {
        Condition::Eq {
            path,
            value: value.into(),
        }
    }

    /// Create a case-insensitive equality condition.
    pub fn eq_ignore_case(path: AttrPath, value: &str) -> Self {
        Condition::EqIgnoreCase {
            path,
            value: value.to_uppercase(),
        }
    }

    /// Create a less-than condition.
    pub fn lt(path: AttrPath, value: impl Into<Value>) -> Self {
        Condition::Lt {
            path,
            value: value.into(),
        }
    }

    /// Create a less-than-or-equal condition.
    pub fn le(path: AttrPath, value: impl Into<Value>) -> Self {
        Condition::Le {
            path,
            value: value.into(),
        }
    }

    /// Create a greater-than condition.
    pub fn gt(path: AttrPath, value: impl Into<Value>) -> Self {
        Condition::Gt {
            path,
            value: value.into(),
        }
    }

    /// Create a greater-than-or-equal condition.
    pub fn ge(path: AttrPath, value: impl Into<Value>) -> Self {
        Condition::Ge {
            path,
            value: value.into(),
        }
    }

    /// Create a membership condition.
    pub fn in_values(path: AttrPath, values: Vec<Value>) -> Self {
        Condition::In { path, values }
    }

    /// Create a LIKE condition.
    pub fn like(path: AttrPath, pattern: impl Into<String>) -> Self {
        Condition::Like {
            path,
            pattern: pattern.into(),
        }
    }

    /// The attribute this condition tests.
    pub fn path(&self) -> &AttrPath {
        match self {
            Condition::Eq { path, .. }
            | Condition::EqIgnoreCase { path, .. }
            | Condition::Lt { path, .. }
            | Condition::Le { path, .. }
            | Condition::Gt { path, .. }
            | Condition::Ge { path, .. }
            | Condition::In { path, .. }
            | Condition::Like { path, .. } => path,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Eq { path, value } => write!(f, "{} = {}", path, value),
            Condition::EqIgnoreCase { path, value } => write!(f, "upper({}) = '{}'", path, value),
            Condition::Lt { path, value } => write!(f, "{} < {}", path, value),
            Condition::Le { path, value } => write!(f, "{} <= {}", path, value),
            Condition::Gt { path, value } => write!(f, "{} > {}", path, value),
            Condition::Ge { path, value } => write!(f, "{} >= {}", path, value),
            Condition::In { path, values } => {
                write!(f, "{} in (", path)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, ")")
            }
            Condition::Like { path, pattern } => write!(f, "{} like '{}'", path, pattern),
        }
    }
}

/// One predicate node produced for one operator of one field.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum Predicate {
    /// A single condition.
    Condition(Condition),
    /// All conditions must be true (flat list, single level).
    And(Vec<Condition>),
}

impl Predicate {
    /// Create an AND node. A single condition collapses to itself.
    pub fn and(mut conditions: Vec<Condition>) -> Self {
        if conditions.len() == 1 {
            if let Some(condition) = conditions.pop() {
                return Predicate::Condition(condition);
            }
        }
        Predicate::And(conditions)
    }

    /// Iterate the leaf conditions of this node.
    pub fn conditions(&self) -> std::slice::Iter<'_, Condition> {
        match self {
            Predicate::Condition(condition) => std::slice::from_ref(condition).iter(),
            Predicate::And(conditions) => conditions.iter(),
        }
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Condition(condition)
    }
}

/// The composite predicate: every node must hold.
///
/// An empty conjunction places no restriction on the query.
#[derive(Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct Conjunction {
    /// Predicate nodes, in the order they were produced.
    pub predicates: Vec<Predicate>,
}

impl Conjunction {
    /// A conjunction that matches every row.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Create a conjunction from predicate nodes.
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Append a predicate node.
    pub fn push(&mut self, predicate: impl Into<Predicate>) {
        self.predicates.push(predicate.into());
    }

    /// Check if this conjunction restricts nothing.
    pub fn is_unrestricted(&self) -> bool {
        self.predicates.iter().all(|p| p.conditions().len() == 0)
    }

    /// Number of predicate nodes.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Check if there are no predicate nodes.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Iterate every leaf condition across all nodes.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.predicates.iter().flat_map(|p| p.conditions())
    }

    /// Serialize the conjunction to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a conjunction from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for condition in self.conditions() {
            if !first {
                write!(f, " and ")?;
            }
            first = false;
            write!(f, "{}", condition)?;
        }
        if first {
            write!(f, "true")?;
        }
        Ok(())
    }
}

/// What the host engine is going to return for this query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum ResultKind {
    /// Entity rows.
    #[default]
    Entities,
    /// A bare row count (e.g. the total of a paged query).
    Count,
}

/// Query-level information passed to a specification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryContext {
    /// Declared result of the query.
    pub result: ResultKind,
}

impl QueryContext {
    /// Context for a query returning entity rows.
    pub fn entities() -> Self {
        Self {
            result: ResultKind::Entities,
        }
    }

    /// Context for a counting query.
    pub fn count() -> Self {
        Self {
            result: ResultKind::Count,
        }
    }

    /// Check if the query only counts rows.
    pub fn is_count(&self) -> bool {
        self.result == ResultKind::Count
    }
}

/// The root of a query: its entity and the joins registered on it.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct QueryRoot {
    /// Root entity type.
    pub entity: String,
    /// Joins in registration order. Parents always precede children.
    pub joins: Vec<JoinNode>,
}

impl QueryRoot {
    /// Create a root without joins.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            joins: vec![],
        }
    }

    /// Register a plain join and return its target.
    ///
    /// Missing parent segments of a dotted path are joined with the same kind.
    /// A path that is already joined is returned unchanged.
    pub fn join(&mut self, path: &str, kind: JoinKind) -> Target {
        self.register(path, kind, false)
    }

    /// Register a fetch join and return its target.
    pub fn fetch(&mut self, path: &str, kind: JoinKind) -> Target {
        self.register(path, kind, true)
    }

    fn register(&mut self, path: &str, kind: JoinKind, fetch: bool) -> Target {
        let mut prefix = String::with_capacity(path.len());
        for segment in path.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            if self.get_join(&prefix).is_none() {
                self.joins.push(JoinNode {
                    path: prefix.clone(),
                    kind,
                    fetch,
                });
            }
        }
        Target::Join(path.to_string())
    }

    /// Get a registered join by path.
    pub fn get_join(&self, path: &str) -> Option<&JoinNode> {
        self.joins.iter().find(|j| j.path == path)
    }

    /// Check if any registered join is a fetch join.
    pub fn has_fetch_joins(&self) -> bool {
        self.joins.iter().any(|j| j.fetch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_join_node_helpers() {
        let join = JoinNode {
            path: "class.teacher".into(),
            kind: JoinKind::Left,
            fetch: true,
        };
        assert_eq!(join.relation_name(), "teacher");
        assert_eq!(join.parent_path(), Some("class"));
        assert_eq!(join.depth(), 2);
        assert!(!join.is_top_level());
    }

    #[test]
    fn test_root_registers_parent_segments() {
        let mut root = QueryRoot::new("Student");
        let target = root.fetch("class.teacher", JoinKind::Inner);

        assert_eq!(target, Target::Join("class.teacher".into()));
        let paths: Vec<_> = root.joins.iter().map(|j| j.path.as_str()).collect();
        assert_eq!(paths, vec!["class", "class.teacher"]);
        assert!(root.has_fetch_joins());
    }

    #[test]
    fn test_root_join_is_idempotent() {
        let mut root = QueryRoot::new("Student");
        root.join("class", JoinKind::Left);
        root.join("class", JoinKind::Inner);

        assert_eq!(root.joins.len(), 1);
        assert_eq!(root.joins[0].kind, JoinKind::Left);
        assert!(!root.has_fetch_joins());
    }

    #[test]
    fn test_target_attr() {
        assert_eq!(Target::Root.attr("name"), AttrPath::root("name"));
        assert_eq!(
            Target::Join("class".into()).attr("name"),
            AttrPath::joined("class", "name")
        );
        assert_eq!(AttrPath::joined("class", "name").to_string(), "class.name");
    }

    #[test]
    fn test_single_condition_and_collapses() {
        let node = Predicate::and(vec![Condition::like(AttrPath::root("name"), "a%")]);
        assert!(matches!(node, Predicate::Condition(_)));

        let node = Predicate::and(vec![
            Condition::like(AttrPath::root("name"), "a%"),
            Condition::like(AttrPath::root("name"), "b%"),
        ]);
        assert_eq!(node.conditions().len(), 2);
    }

    #[test]
    fn test_conjunction_display() {
        let mut conj = Conjunction::unrestricted();
        assert!(conj.is_unrestricted());
        assert_eq!(conj.to_string(), "true");

        conj.push(Condition::ge(AttrPath::root("number"), 30));
        conj.push(Condition::eq_ignore_case(AttrPath::joined("class", "name"), "a"));
        assert!(!conj.is_unrestricted());
        assert_eq!(
            conj.to_string(),
            "number >= 30 and upper(class.name) = 'A'"
        );
    }

    #[test]
    fn test_conjunction_bytes_roundtrip() {
        let conj = Conjunction::new(vec![
            Condition::eq(AttrPath::root("id"), "2").into(),
            Predicate::and(vec![
                Condition::like(AttrPath::root("name"), "%a%"),
                Condition::like(AttrPath::root("name"), "%b%"),
            ]),
            Condition::in_values(AttrPath::joined("class", "grade"), vec![1.into(), 2.into()]).into(),
        ]);

        let bytes = conj.to_bytes().unwrap();
        let decoded = Conjunction::from_bytes(&bytes).unwrap();
        assert_eq!(conj, decoded);
    }

    #[test]
    fn test_query_context() {
        assert!(QueryContext::count().is_count());
        assert!(!QueryContext::entities().is_count());
        assert_eq!(QueryContext::default(), QueryContext::entities());
    }
}
