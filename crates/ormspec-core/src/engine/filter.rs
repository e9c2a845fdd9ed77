//! Conjunction evaluation over in-memory rows.

use std::cmp::Ordering;

use ormspec_proto::{AttrPath, Condition, Conjunction, Value};

use super::store::EntityRow;
use crate::error::Error;

/// A root row together with the rows reached through its joins.
///
/// A join path maps to `None` when a left join found no related row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinedRow {
    /// Root entity row.
    pub root: EntityRow,
    /// Joined rows keyed by join path, parents before children.
    pub joined: Vec<(String, Option<EntityRow>)>,
}

impl JoinedRow {
    /// Create a joined row without joins.
    pub fn new(root: EntityRow) -> Self {
        Self {
            root,
            joined: Vec::new(),
        }
    }

    /// Get the row joined under `path`.
    ///
    /// Returns `None` if the path is not joined and `Some(None)` if it is
    /// joined without a related row.
    pub fn related(&self, path: &str) -> Option<Option<&EntityRow>> {
        self.joined
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, row)| row.as_ref())
    }

    /// Resolve an attribute reference.
    pub fn attribute(&self, path: &AttrPath) -> Result<Option<&Value>, Error> {
        match &path.join {
            None => Ok(self.root.get(&path.field)),
            Some(join) => match self.related(join) {
                Some(row) => Ok(row.and_then(|r| r.get(&path.field))),
                None => Err(Error::InvalidQuery(format!(
                    "condition on '{}' references a path that is not joined",
                    path
                ))),
            },
        }
    }
}

/// Evaluates conjunctions against joined rows.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Evaluate every condition of a conjunction.
    ///
    /// An unrestricted conjunction matches every row.
    pub fn evaluate(conjunction: &Conjunction, row: &JoinedRow) -> Result<bool, Error> {
        for condition in conjunction.conditions() {
            if !Self::evaluate_condition(condition, row)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Evaluate a single condition.
    pub fn evaluate_condition(condition: &Condition, row: &JoinedRow) -> Result<bool, Error> {
        let Some(field_value) = row.attribute(condition.path())?.filter(|v| !v.is_null()) else {
            // Missing and NULL attributes never match
            return Ok(false);
        };

        let matched = match condition {
            Condition::Eq { value, .. } => Self::values_equal(field_value, value),
            Condition::EqIgnoreCase { value, .. } => match field_value {
                Value::String(s) => s.to_uppercase() == *value,
                _ => false,
            },
            Condition::Lt { value, .. } => Self::ordering(field_value, value, Ordering::is_lt),
            Condition::Le { value, .. } => Self::ordering(field_value, value, Ordering::is_le),
            Condition::Gt { value, .. } => Self::ordering(field_value, value, Ordering::is_gt),
            Condition::Ge { value, .. } => Self::ordering(field_value, value, Ordering::is_ge),
            Condition::In { values, .. } => values.iter().any(|v| Self::values_equal(field_value, v)),
            Condition::Like { pattern, .. } => match field_value {
                Value::String(s) => Self::like_match(s, pattern),
                _ => false,
            },
        };
        Ok(matched)
    }

    fn ordering(a: &Value, b: &Value, test: fn(Ordering) -> bool) -> bool {
        Self::compare_values(a, b).map(test).unwrap_or(false)
    }

    /// Check if two values are equal, widening numeric kinds.
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Int32(a), Value::Int64(b)) => i64::from(*a) == *b,
            (Value::Int64(a), Value::Int32(b)) => *a == i64::from(*b),
            (Value::Float32(a), Value::Float64(b)) => f64::from(*a) == *b,
            (Value::Float64(a), Value::Float32(b)) => *a == f64::from(*b),
            (Value::Null, _) | (_, Value::Null) => false,
            (a, b) => a == b,
        }
    }

    /// Compare two values, returning their ordering if comparable.
    pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int64(b)) => Some(i64::from(*a).cmp(b)),
            (Value::Int64(a), Value::Int32(b)) => Some(a.cmp(&i64::from(*b))),
            (Value::Float32(a), Value::Float32(b)) => a.partial_cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
            (Value::Float32(a), Value::Float64(b)) => f64::from(*a).partial_cmp(b),
            (Value::Float64(a), Value::Float32(b)) => a.partial_cmp(&f64::from(*b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Match a string against a SQL LIKE pattern.
    ///
    /// `%` matches any run of characters, `_` exactly one, and `\` makes the
    /// next pattern character literal.
    pub fn like_match(value: &str, pattern: &str) -> bool {
        let value: Vec<char> = value.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        Self::like_match_from(&value, &pattern)
    }

    fn like_match_from(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => {
                if rest.is_empty() {
                    return true;
                }
                (0..=value.len()).any(|skip| Self::like_match_from(&value[skip..], rest))
            }
            Some(('_', rest)) => !value.is_empty() && Self::like_match_from(&value[1..], rest),
            Some(('\\', rest)) => match (rest.split_first(), value.split_first()) {
                (Some((p, rest)), Some((c, tail))) if p == c => Self::like_match_from(tail, rest),
                _ => false,
            },
            Some((p, rest)) => match value.split_first() {
                Some((c, tail)) if c == p => Self::like_match_from(tail, rest),
                _ => false,
            },
        }
    }
}
