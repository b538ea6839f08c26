//! Dispatch engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the dispatch engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Minimum completed-ticket samples in a ticket's domain before the
    /// affinity strategy is trusted. Below this, dispatch falls back to
    /// workload balancing.
    #[serde(default = "default_min_history")]
    pub min_history_for_affinity: usize,

    /// Recommendation list size used when callers pass `top_n = 0`.
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
}

fn default_min_history() -> usize {
    10
}

fn default_max_recommendations() -> usize {
    5
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_history_for_affinity: default_min_history(),
            max_recommendations: default_max_recommendations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.min_history_for_affinity, 10);
        assert_eq!(config.max_recommendations, 5);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: DispatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.min_history_for_affinity, 10);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            min_history_for_affinity = 25
            max_recommendations = 3
        "#;
        let config: DispatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.min_history_for_affinity, 25);
        assert_eq!(config.max_recommendations, 3);
    }
}
