//! Assembler configuration.

/// Configuration for predicate assembly.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Maximum number of relation hops discovered from the root entity.
    ///
    /// `None` walks every eager chain to its end; cycles are still rejected.
    pub max_join_depth: Option<usize>,

    /// Discover eager to-one relations when entity metadata is available.
    pub discover_eager_joins: bool,

    /// Compare text case-insensitively for fields without an explicit operator.
    pub ignore_case_default: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_join_depth: None,
            discover_eager_joins: true,
            ignore_case_default: false,
        }
    }
}

impl AssemblerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound eager relation discovery to `depth` hops.
    pub fn max_join_depth(mut self, depth: usize) -> Self {
        self.max_join_depth = Some(depth);
        self
    }

    /// Set whether eager relations are discovered from metadata.
    pub fn discover_eager_joins(mut self, discover: bool) -> Self {
        self.discover_eager_joins = discover;
        self
    }

    /// Set the case sensitivity of implicit equality.
    pub fn ignore_case_default(mut self, ignore_case: bool) -> Self {
        self.ignore_case_default = ignore_case;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssemblerConfig::default();
        assert_eq!(config.max_join_depth, None);
        assert!(config.discover_eager_joins);
        assert!(!config.ignore_case_default);
    }

    #[test]
    fn test_builder_setters() {
        let config = AssemblerConfig::new()
            .max_join_depth(2)
            .discover_eager_joins(false)
            .ignore_case_default(true);

        assert_eq!(config.max_join_depth, Some(2));
        assert!(!config.discover_eager_joins);
        assert!(config.ignore_case_default);
    }
}
