//! Traits and shared types for recommendation strategies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{DirectoryError, WorkloadError};
use crate::ticket::{Ticket, TicketError};

/// Errors that can occur while computing recommendations.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The strategy's historical sample is too thin to produce a
    /// trustworthy ranking. Callers fall back rather than guessing.
    #[error("insufficient history: {samples} samples, {required} required")]
    InsufficientHistory { samples: usize, required: usize },

    /// No strategy registered under the requested key. A configuration
    /// error, never a silent no-op.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Agent directory error.
    #[error("agent directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Workload computation error.
    #[error("workload error: {0}")]
    Workload(#[from] WorkloadError),

    /// Ticket store error.
    #[error("ticket store error: {0}")]
    Store(#[from] TicketError),
}

/// An ephemeral (agent, score) pair. Never persisted, always recomputed.
///
/// Scores are consistent within one strategy (higher = better fit) but
/// not comparable across strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// The recommended agent.
    pub agent_id: String,
    /// Fit score, higher = better.
    pub score: f32,
}

/// Trait for agent recommendation strategies.
#[async_trait]
pub trait RecommendStrategy: Send + Sync {
    /// Name of this strategy for logging and registry lookup.
    fn name(&self) -> &str;

    /// Rank candidate agents for the ticket, most-preferred first.
    ///
    /// An empty ranking means no eligible agent - a normal outcome, not
    /// an error.
    async fn recommend(
        &self,
        ticket: &Ticket,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, RecommendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecommendError::InsufficientHistory {
            samples: 3,
            required: 10,
        };
        assert_eq!(err.to_string(), "insufficient history: 3 samples, 10 required");

        let err = RecommendError::UnknownStrategy("magic".to_string());
        assert_eq!(err.to_string(), "unknown strategy: magic");
    }

    #[test]
    fn test_recommendation_serialization() {
        let rec = Recommendation {
            agent_id: "a-1".to_string(),
            score: 0.75,
        };
        let json = serde_json::to_string(&rec).unwrap();
        let parsed: Recommendation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rec);
    }
}
