//! Operator registry.

use std::collections::BTreeMap;
use std::fmt;

use super::{
    EqualsStrategy, GreaterThanStrategy, InStrategy, LessThanStrategy, LikeStrategy, OperatorKind,
    OperatorStrategy,
};
use crate::error::Error;

/// Maps operator kinds to the strategies that build them.
///
/// A registry is assembled once, then shared read-only by every assembler
/// that uses it.
pub struct OperatorRegistry {
    strategies: BTreeMap<OperatorKind, Box<dyn OperatorStrategy>>,
}

impl OperatorRegistry {
    /// A registry without any strategy.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// A registry with the five built-in strategies.
    pub fn standard() -> Self {
        Self::empty()
            .register(OperatorKind::Equals, EqualsStrategy)
            .register(OperatorKind::Like, LikeStrategy)
            .register(OperatorKind::LessThan, LessThanStrategy)
            .register(OperatorKind::GreaterThan, GreaterThanStrategy)
            .register(OperatorKind::In, InStrategy)
    }

    /// Register a strategy, replacing any previous one for `kind`.
    pub fn register(mut self, kind: OperatorKind, strategy: impl OperatorStrategy + 'static) -> Self {
        self.strategies.insert(kind, Box::new(strategy));
        self
    }

    /// Remove the strategy for `kind`.
    pub fn without(mut self, kind: &OperatorKind) -> Self {
        self.strategies.remove(kind);
        self
    }

    /// Look up the strategy for `kind`.
    pub fn resolve(&self, kind: &OperatorKind) -> Result<&dyn OperatorStrategy, Error> {
        self.strategies
            .get(kind)
            .map(|s| s.as_ref())
            .ok_or_else(|| Error::UnsupportedOperator {
                operator: kind.to_string(),
            })
    }

    /// Check if a strategy is registered for `kind`.
    pub fn contains(&self, kind: &OperatorKind) -> bool {
        self.strategies.contains_key(kind)
    }

    /// Registered operator kinds, in key order.
    pub fn kinds(&self) -> impl Iterator<Item = &OperatorKind> {
        self.strategies.keys()
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if no strategy is registered.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.strategies.keys()).finish()
    }
}
