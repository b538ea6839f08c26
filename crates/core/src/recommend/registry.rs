//! Strategy registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::recommend::{RecommendError, RecommendStrategy};

/// Registry resolving recommendation strategies by name.
///
/// Unknown keys are a configuration error, not a silent no-op. Tests
/// inject fake strategies by registering them under the well-known keys.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn RecommendStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under the given key, replacing any previous
    /// registration.
    pub fn register(&mut self, key: impl Into<String>, strategy: Arc<dyn RecommendStrategy>) {
        self.strategies.insert(key.into(), strategy);
    }

    /// Resolve a strategy by key.
    pub fn get(&self, key: &str) -> Result<Arc<dyn RecommendStrategy>, RecommendError> {
        self.strategies
            .get(key)
            .cloned()
            .ok_or_else(|| RecommendError::UnknownStrategy(key.to_string()))
    }

    /// Registered keys, sorted for stable output.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.strategies.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::recommend::Recommendation;
    use crate::ticket::Ticket;

    struct FixedStrategy;

    #[async_trait]
    impl RecommendStrategy for FixedStrategy {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn recommend(
            &self,
            _ticket: &Ticket,
            _top_n: usize,
        ) -> Result<Vec<Recommendation>, RecommendError> {
            Ok(vec![Recommendation {
                agent_id: "a-1".to_string(),
                score: 1.0,
            }])
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = StrategyRegistry::new();
        registry.register("fixed", Arc::new(FixedStrategy));

        let strategy = registry.get("fixed").unwrap();
        assert_eq!(strategy.name(), "fixed");
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let registry = StrategyRegistry::new();
        let result = registry.get("missing");
        assert!(matches!(result, Err(RecommendError::UnknownStrategy(k)) if k == "missing"));
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut registry = StrategyRegistry::new();
        registry.register("zeta", Arc::new(FixedStrategy));
        registry.register("alpha", Arc::new(FixedStrategy));

        assert_eq!(registry.keys(), vec!["alpha", "zeta"]);
    }
}
