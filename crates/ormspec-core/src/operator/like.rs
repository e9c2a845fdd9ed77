//! Pattern-match strategy.

use ormspec_proto::{Condition, Predicate, Target, Value};

use super::{mismatched, target_field, Operator, OperatorStrategy};
use crate::error::Error;
use crate::param::FieldDescriptor;

/// Builds `target.field LIKE pattern`.
///
/// When the operator carries a separator that occurs in the value, the value
/// is split and every non-empty token must match. Empty tokens (leading,
/// trailing or doubled separators) are dropped. A value made only of
/// separators matches as a whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikeStrategy;

impl OperatorStrategy for LikeStrategy {
    fn build(
        &self,
        target: &Target,
        field: &FieldDescriptor,
        value: &Value,
        operator: &Operator,
    ) -> Result<Predicate, Error> {
        let Operator::Like(op) = operator else {
            return Err(mismatched("LikeStrategy", operator));
        };

        let Some(text) = value.as_str() else {
            return Err(Error::TypeMismatch {
                field: field.name.clone(),
                operator: operator.kind().to_string(),
                expected: "text",
                actual: value.kind_name(),
            });
        };

        let attr = target_field(op.field.as_deref(), field);
        let separator = op.separator.as_deref().filter(|s| !s.is_empty());

        let conditions: Vec<Condition> = match separator {
            Some(sep) => text
                .split(sep)
                .filter(|token| !token.is_empty())
                .map(|token| Condition::like(target.attr(attr), op.mode.pattern(token)))
                .collect(),
            None => Vec::new(),
        };

        if conditions.is_empty() {
            return Ok(Condition::like(target.attr(attr), op.mode.pattern(text)).into());
        }
        Ok(Predicate::and(conditions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Equals, Like};
    use ormspec_proto::AttrPath;
    use pretty_assertions::assert_eq;

    fn build(op: Like, value: &str) -> Result<Predicate, Error> {
        LikeStrategy.build(
            &Target::Root,
            &FieldDescriptor::new("name"),
            &value.into(),
            &op.into(),
        )
    }

    #[test]
    fn test_like_default_is_prefix() {
        let node = build(Like::default(), "di").unwrap();
        assert_eq!(node, Condition::like(AttrPath::root("name"), "di%").into());
    }

    #[test]
    fn test_like_modes() {
        assert_eq!(
            build(Like::ends_with(), "ge").unwrap(),
            Condition::like(AttrPath::root("name"), "%ge").into()
        );
        assert_eq!(
            build(Like::contains(), "er").unwrap(),
            Condition::like(AttrPath::root("name"), "%er%").into()
        );
    }

    #[test]
    fn test_like_separator_splits_tokens() {
        let node = build(Like::contains().separator(" "), "di ge").unwrap();

        assert_eq!(
            node,
            Predicate::And(vec![
                Condition::like(AttrPath::root("name"), "%di%"),
                Condition::like(AttrPath::root("name"), "%ge%"),
            ])
        );
    }

    #[test]
    fn test_like_separator_skips_empty_tokens() {
        let node = build(Like::contains().separator(","), ",er,,ge,").unwrap();
        assert_eq!(node.conditions().len(), 2);

        // A single remaining token collapses to one condition
        let node = build(Like::contains().separator(","), "er,").unwrap();
        assert_eq!(node, Condition::like(AttrPath::root("name"), "%er%").into());
    }

    #[test]
    fn test_like_value_of_only_separators_matches_whole() {
        let node = build(Like::contains().separator(","), ",,").unwrap();
        assert_eq!(node, Condition::like(AttrPath::root("name"), "%,,%").into());
    }

    #[test]
    fn test_like_separator_absent_from_value() {
        let node = build(Like::contains().separator(" "), "er").unwrap();
        assert_eq!(node, Condition::like(AttrPath::root("name"), "%er%").into());
    }

    #[test]
    fn test_like_on_join_with_override() {
        let node = LikeStrategy
            .build(
                &Target::Join("sClass.teacher".into()),
                &FieldDescriptor::new("teacherName"),
                &"wang".into(),
                &Like::contains().field("name").into(),
            )
            .unwrap();

        assert_eq!(
            node,
            Condition::like(AttrPath::joined("sClass.teacher", "name"), "%wang%").into()
        );
    }

    #[test]
    fn test_like_rejects_non_text() {
        let result = LikeStrategy.build(
            &Target::Root,
            &FieldDescriptor::new("number"),
            &30.into(),
            &Like::contains().into(),
        );

        assert!(matches!(
            result,
            Err(Error::TypeMismatch { expected: "text", actual: "int32", .. })
        ));
    }

    #[test]
    fn test_like_rejects_other_operator() {
        let result = LikeStrategy.build(
            &Target::Root,
            &FieldDescriptor::new("name"),
            &"a".into(),
            &Equals::new().into(),
        );
        assert!(matches!(result, Err(Error::UnsupportedOperator { .. })));
    }
}
