//! Range strategies.

use ormspec_proto::{AttrPath, Condition, Predicate, Target, Value};

use super::{mismatched, Bound, Operator, OperatorStrategy};
use crate::error::Error;
use crate::param::FieldDescriptor;

/// Builds `target.field <= value` (or `<` when exclusive).
#[derive(Debug, Clone, Copy, Default)]
pub struct LessThanStrategy;

/// Builds `target.field >= value` (or `>` when exclusive).
#[derive(Debug, Clone, Copy, Default)]
pub struct GreaterThanStrategy;

impl OperatorStrategy for LessThanStrategy {
    fn build(
        &self,
        target: &Target,
        field: &FieldDescriptor,
        value: &Value,
        operator: &Operator,
    ) -> Result<Predicate, Error> {
        let Operator::LessThan(bound) = operator else {
            return Err(mismatched("LessThanStrategy", operator));
        };
        let path = bounded_path(target, field, value, operator, bound)?;
        let condition = if bound.inclusive {
            Condition::le(path, value.clone())
        } else {
            Condition::lt(path, value.clone())
        };
        Ok(condition.into())
    }
}

impl OperatorStrategy for GreaterThanStrategy {
    fn build(
        &self,
        target: &Target,
        field: &FieldDescriptor,
        value: &Value,
        operator: &Operator,
    ) -> Result<Predicate, Error> {
        let Operator::GreaterThan(bound) = operator else {
            return Err(mismatched("GreaterThanStrategy", operator));
        };
        let path = bounded_path(target, field, value, operator, bound)?;
        let condition = if bound.inclusive {
            Condition::ge(path, value.clone())
        } else {
            Condition::gt(path, value.clone())
        };
        Ok(condition.into())
    }
}

/// Check the value is comparable and resolve the bounded attribute.
fn bounded_path(
    target: &Target,
    field: &FieldDescriptor,
    value: &Value,
    operator: &Operator,
    bound: &Bound,
) -> Result<AttrPath, Error> {
    if !value.is_ordered() {
        return Err(Error::TypeMismatch {
            field: field.name.clone(),
            operator: operator.kind().to_string(),
            expected: "an ordered value",
            actual: value.kind_name(),
        });
    }
    if bound.field.is_empty() {
        return Err(Error::FieldAccess {
            field: field.name.clone(),
            reason: format!("{} requires a target field", operator.kind()),
        });
    }
    Ok(target.attr(bound.field.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Equals;
    use pretty_assertions::assert_eq;

    fn field() -> FieldDescriptor {
        FieldDescriptor::new("numberMin")
    }

    #[test]
    fn test_greater_than_inclusive_by_default() {
        let node = GreaterThanStrategy
            .build(&Target::Root, &field(), &30.into(), &Operator::greater_than("number"))
            .unwrap();

        assert_eq!(node, Condition::ge(AttrPath::root("number"), 30).into());
    }

    #[test]
    fn test_less_than_exclusive() {
        let op = Operator::LessThan(Bound::new("number").exclusive());
        let node = LessThanStrategy
            .build(&Target::Root, &field(), &1000i64.into(), &op)
            .unwrap();

        assert_eq!(node, Condition::lt(AttrPath::root("number"), 1000i64).into());
    }

    #[test]
    fn test_range_on_text_and_timestamp() {
        let node = LessThanStrategy
            .build(&Target::Root, &field(), &"m".into(), &Operator::less_than("name"))
            .unwrap();
        assert_eq!(node, Condition::le(AttrPath::root("name"), "m").into());

        let node = GreaterThanStrategy
            .build(
                &Target::Join("sClass".into()),
                &field(),
                &Value::Timestamp(1_700_000_000_000_000),
                &Operator::greater_than("opened_at"),
            )
            .unwrap();
        assert_eq!(
            node,
            Condition::ge(AttrPath::joined("sClass", "opened_at"), Value::Timestamp(1_700_000_000_000_000)).into()
        );
    }

    #[test]
    fn test_range_rejects_unordered_values() {
        let result = GreaterThanStrategy.build(
            &Target::Root,
            &field(),
            &true.into(),
            &Operator::greater_than("number"),
        );
        assert!(matches!(result, Err(Error::TypeMismatch { actual: "bool", .. })));

        let result = LessThanStrategy.build(
            &Target::Root,
            &field(),
            &vec![1, 2].into(),
            &Operator::less_than("number"),
        );
        assert!(matches!(result, Err(Error::TypeMismatch { actual: "int32[]", .. })));
    }

    #[test]
    fn test_range_requires_field() {
        let result = LessThanStrategy.build(&Target::Root, &field(), &1.into(), &Operator::less_than(""));
        assert!(matches!(result, Err(Error::FieldAccess { .. })));
    }

    #[test]
    fn test_range_rejects_other_operator() {
        let result = LessThanStrategy.build(
            &Target::Root,
            &field(),
            &1.into(),
            &Operator::greater_than("number"),
        );
        assert!(matches!(result, Err(Error::UnsupportedOperator { .. })));

        let result = GreaterThanStrategy.build(&Target::Root, &field(), &1.into(), &Equals::new().into());
        assert!(matches!(result, Err(Error::UnsupportedOperator { .. })));
    }
}
