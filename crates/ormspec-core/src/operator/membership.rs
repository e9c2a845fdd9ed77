//! Membership strategy.

use ormspec_proto::{Condition, Predicate, Target, Value};

use super::{mismatched, target_field, Operator, OperatorStrategy};
use crate::error::Error;
use crate::param::FieldDescriptor;

/// Builds `target.field IN (v1, v2, ...)` from an array value.
#[derive(Debug, Clone, Copy, Default)]
pub struct InStrategy;

impl OperatorStrategy for InStrategy {
    fn build(
        &self,
        target: &Target,
        field: &FieldDescriptor,
        value: &Value,
        operator: &Operator,
    ) -> Result<Predicate, Error> {
        let Operator::In(op) = operator else {
            return Err(mismatched("InStrategy", operator));
        };

        let Some(values) = value.elements() else {
            return Err(Error::TypeMismatch {
                field: field.name.clone(),
                operator: operator.kind().to_string(),
                expected: "a collection",
                actual: value.kind_name(),
            });
        };

        let path = target.attr(target_field(op.field.as_deref(), field));
        Ok(Condition::in_values(path, values).into())
    }
}
