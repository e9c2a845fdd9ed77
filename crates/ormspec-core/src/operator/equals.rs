//! Equality strategy.

use ormspec_proto::{Condition, Predicate, Target, Value};

use super::{mismatched, target_field, Operator, OperatorStrategy};
use crate::error::Error;
use crate::param::FieldDescriptor;

/// Builds `target.field == value`.
///
/// With `ignore_case` set and a textual value, both sides are compared
/// upper-cased. Non-textual values fall back to plain equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualsStrategy;

impl OperatorStrategy for EqualsStrategy {
    fn build(
        &self,
        target: &Target,
        field: &FieldDescriptor,
        value: &Value,
        operator: &Operator,
    ) -> Result<Predicate, Error> {
        let Operator::Equals(op) = operator else {
            return Err(mismatched("EqualsStrategy", operator));
        };

        let path = target.attr(target_field(op.field.as_deref(), field));
        let condition = match value {
            Value::String(text) if op.ignore_case => Condition::eq_ignore_case(path, text),
            _ => Condition::eq(path, value.clone()),
        };
        Ok(condition.into())
    }
}
