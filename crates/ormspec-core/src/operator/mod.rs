//! Query operators and the strategies that turn them into predicate nodes.
//!
//! An [`Operator`] is the declarative annotation attached to a query-parameter
//! field. At build time the assembler looks the operator's [`OperatorKind`] up
//! in an [`OperatorRegistry`] and asks the resulting [`OperatorStrategy`] to
//! build one [`Predicate`] against the field's evaluation target.

mod equals;
mod like;
mod membership;
mod range;
mod registry;

use std::collections::BTreeMap;
use std::fmt;

use ormspec_proto::{Predicate, Target, Value};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::param::FieldDescriptor;

pub use equals::EqualsStrategy;
pub use like::LikeStrategy;
pub use membership::InStrategy;
pub use range::{GreaterThanStrategy, LessThanStrategy};
pub use registry::OperatorRegistry;

/// Builds one predicate node for one operator of one field.
///
/// Strategies are pure: the same inputs always produce the same node.
pub trait OperatorStrategy: Send + Sync {
    /// Build the predicate node for `value` evaluated against `target`.
    fn build(
        &self,
        target: &Target,
        field: &FieldDescriptor,
        value: &Value,
        operator: &Operator,
    ) -> Result<Predicate, Error>;
}

/// Registry key of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    /// Equality.
    Equals,
    /// Pattern match.
    Like,
    /// Upper bound.
    LessThan,
    /// Lower bound.
    GreaterThan,
    /// Membership in a collection.
    In,
    /// User-defined operator, keyed by name.
    Custom(String),
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorKind::Equals => write!(f, "Eq"),
            OperatorKind::Like => write!(f, "Like"),
            OperatorKind::LessThan => write!(f, "Less"),
            OperatorKind::GreaterThan => write!(f, "Greater"),
            OperatorKind::In => write!(f, "In"),
            OperatorKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// An operator annotation with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operator {
    /// `target == value`.
    Equals(Equals),
    /// `target LIKE pattern(value)`.
    Like(Like),
    /// `target < value` or `target <= value`.
    LessThan(Bound),
    /// `target > value` or `target >= value`.
    GreaterThan(Bound),
    /// `target IN (value...)`.
    In(Membership),
    /// Operator handled by a strategy registered under its name.
    Custom(CustomOperator),
}

impl Operator {
    /// Registry key of this operator.
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Equals(_) => OperatorKind::Equals,
            Operator::Like(_) => OperatorKind::Like,
            Operator::LessThan(_) => OperatorKind::LessThan,
            Operator::GreaterThan(_) => OperatorKind::GreaterThan,
            Operator::In(_) => OperatorKind::In,
            Operator::Custom(custom) => OperatorKind::Custom(custom.name.clone()),
        }
    }

    /// Create a less-than-or-equal operator on `field`.
    pub fn less_than(field: impl Into<String>) -> Self {
        Operator::LessThan(Bound::new(field))
    }

    /// Create a greater-than-or-equal operator on `field`.
    pub fn greater_than(field: impl Into<String>) -> Self {
        Operator::GreaterThan(Bound::new(field))
    }
}

impl From<Equals> for Operator {
    fn from(op: Equals) -> Self {
        Operator::Equals(op)
    }
}

impl From<Like> for Operator {
    fn from(op: Like) -> Self {
        Operator::Like(op)
    }
}

impl From<Membership> for Operator {
    fn from(op: Membership) -> Self {
        Operator::In(op)
    }
}

impl From<CustomOperator> for Operator {
    fn from(op: CustomOperator) -> Self {
        Operator::Custom(op)
    }
}

/// Parameters of the equality operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equals {
    /// Target attribute (defaults to the field's own name).
    pub field: Option<String>,
    /// Compare upper-cased text on both sides.
    pub ignore_case: bool,
}

impl Equals {
    /// Equality on the field's own name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare against another attribute.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Compare text case-insensitively.
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

/// Where wildcards go around a pattern-match value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeMode {
    /// `value%`
    #[default]
    Start,
    /// `%value`
    End,
    /// `%value%`
    Contains,
}

impl LikeMode {
    /// Build the LIKE pattern for one token.
    pub fn pattern(&self, token: &str) -> String {
        match self {
            LikeMode::Start => format!("{}%", token),
            LikeMode::End => format!("%{}", token),
            LikeMode::Contains => format!("%{}%", token),
        }
    }
}

/// Parameters of the pattern-match operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Like {
    /// Wildcard placement.
    pub mode: LikeMode,
    /// Target attribute (defaults to the field's own name).
    pub field: Option<String>,
    /// Split the value on this separator and require every token to match.
    pub separator: Option<String>,
}

impl Like {
    /// Match values starting with the parameter.
    pub fn starts_with() -> Self {
        Self::with_mode(LikeMode::Start)
    }

    /// Match values ending with the parameter.
    pub fn ends_with() -> Self {
        Self::with_mode(LikeMode::End)
    }

    /// Match values containing the parameter.
    pub fn contains() -> Self {
        Self::with_mode(LikeMode::Contains)
    }

    /// Match with the given wildcard placement.
    pub fn with_mode(mode: LikeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Match against another attribute.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Split the value into AND-matched tokens.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }
}

/// Parameters of the range operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    /// Target attribute. Required: a bound field rarely shares its name
    /// with the attribute it limits.
    pub field: String,
    /// Include the boundary value.
    #[serde(default = "inclusive_default")]
    pub inclusive: bool,
}

fn inclusive_default() -> bool {
    true
}

impl Bound {
    /// Inclusive bound on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            inclusive: true,
        }
    }

    /// Exclude the boundary value.
    pub fn exclusive(mut self) -> Self {
        self.inclusive = false;
        self
    }
}

/// Parameters of the membership operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Membership {
    /// Target attribute (defaults to the field's own name).
    pub field: Option<String>,
}

impl Membership {
    /// Membership on the field's own name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Test membership of another attribute.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// A user-defined operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomOperator {
    /// Registry name of the operator.
    pub name: String,
    /// Target attribute (defaults to the field's own name).
    #[serde(default)]
    pub field: Option<String>,
    /// Free-form arguments for the strategy.
    #[serde(default)]
    pub args: BTreeMap<String, Value>,
}

impl CustomOperator {
    /// Create a custom operator.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            args: BTreeMap::new(),
        }
    }

    /// Apply to another attribute.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add an argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Resolve the target attribute name: a non-empty override, else the
/// field's own name.
pub fn target_field<'a>(field_override: Option<&'a str>, field: &'a FieldDescriptor) -> &'a str {
    match field_override {
        Some(name) if !name.is_empty() => name,
        _ => &field.name,
    }
}

/// Error for a strategy handed an operator it does not implement.
pub(crate) fn mismatched(strategy: &str, operator: &Operator) -> Error {
    Error::UnsupportedOperator {
        operator: format!("{} (dispatched to {})", operator.kind(), strategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_kinds() {
        assert_eq!(Operator::from(Equals::new()).kind(), OperatorKind::Equals);
        assert_eq!(Operator::from(Like::contains()).kind(), OperatorKind::Like);
        assert_eq!(Operator::less_than("n").kind(), OperatorKind::LessThan);
        assert_eq!(Operator::greater_than("n").kind(), OperatorKind::GreaterThan);
        assert_eq!(Operator::from(Membership::new()).kind(), OperatorKind::In);
        assert_eq!(
            Operator::from(CustomOperator::new("Near")).kind(),
            OperatorKind::Custom("Near".into())
        );
    }

    #[test]
    fn test_like_patterns() {
        assert_eq!(LikeMode::Start.pattern("er"), "er%");
        assert_eq!(LikeMode::End.pattern("er"), "%er");
        assert_eq!(LikeMode::Contains.pattern("er"), "%er%");
        assert_eq!(Like::default().mode, LikeMode::Start);
    }

    #[test]
    fn test_bound_defaults_inclusive() {
        assert!(Bound::new("number").inclusive);
        assert!(!Bound::new("number").exclusive().inclusive);
    }

    #[test]
    fn test_target_field_resolution() {
        let field = FieldDescriptor::new("className");
        assert_eq!(target_field(None, &field), "className");
        assert_eq!(target_field(Some(""), &field), "className");
        assert_eq!(target_field(Some("name"), &field), "name");
    }

    #[test]
    fn test_operator_json_form() {
        let op: Operator = serde_json::from_str(r#"{"op":"greater_than","field":"number"}"#).unwrap();
        assert_eq!(op, Operator::greater_than("number"));

        let op: Operator =
            serde_json::from_str(r#"{"op":"like","mode":"contains","separator":" "}"#).unwrap();
        assert_eq!(op, Operator::from(Like::contains().separator(" ")));

        let op: Operator = serde_json::from_str(r#"{"op":"equals"}"#).unwrap();
        assert_eq!(op, Operator::from(Equals::new()));
    }
}
