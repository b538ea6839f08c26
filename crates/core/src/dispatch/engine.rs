//! Dispatch engine implementation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agent::{AgentDirectory, DirectoryError, WorkloadIndex};
use crate::metrics;
use crate::observer::ObserverSet;
use crate::recommend::{
    AffinityStrategy, LeastBusyStrategy, RecommendError, RecommendStrategy, Recommendation,
    StrategyRegistry, AFFINITY_STRATEGY, LEAST_BUSY_STRATEGY,
};
use crate::rules::{Principal, StatusRuleEngine};
use crate::ticket::{Ticket, TicketError, TicketStatus, TicketStore, AI_DISPATCHED_TAG};

use super::config::DispatchConfig;

/// Errors surfaced by single-ticket dispatch operations.
///
/// "No eligible agent" is NOT among them: an empty ranking or a false
/// return is the normal way to report it, and callers branch on it
/// differently than on a missing ticket.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Ticket id did not resolve.
    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    /// The rule engine rejected the assignment transition.
    #[error("policy violation in domain {domain}: {from} -> {to} not permitted")]
    PolicyViolation {
        domain: String,
        from: TicketStatus,
        to: TicketStatus,
    },

    /// Ticket store error.
    #[error("ticket store error: {0}")]
    Store(#[from] TicketError),

    /// Agent directory error.
    #[error("agent directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Strategy error.
    #[error("recommendation error: {0}")]
    Strategy(#[from] RecommendError),
}

/// Orchestrates strategy selection for single-ticket dispatch.
///
/// Policy: the affinity matcher is consulted first and trusted when its
/// historical sample is large enough; the least-busy strategy is the
/// universal fallback that always produces an answer when at least one
/// agent exists. This ordering is a deliberate product decision and must
/// be preserved.
pub struct DispatchEngine {
    config: DispatchConfig,
    store: Arc<dyn TicketStore>,
    agents: Arc<dyn AgentDirectory>,
    affinity: Arc<AffinityStrategy>,
    registry: StrategyRegistry,
    rules: Arc<StatusRuleEngine>,
    observers: ObserverSet,
}

impl DispatchEngine {
    /// Create an engine with the built-in strategy pair registered under
    /// their well-known keys.
    pub fn new(
        config: DispatchConfig,
        store: Arc<dyn TicketStore>,
        agents: Arc<dyn AgentDirectory>,
    ) -> Self {
        let affinity = Arc::new(AffinityStrategy::new(
            Arc::clone(&store),
            config.min_history_for_affinity,
        ));

        let workload = WorkloadIndex::new(Arc::clone(&store), Arc::clone(&agents));
        let least_busy = Arc::new(LeastBusyStrategy::new(Arc::clone(&agents), workload));

        let mut registry = StrategyRegistry::new();
        registry.register(
            AFFINITY_STRATEGY,
            Arc::clone(&affinity) as Arc<dyn RecommendStrategy>,
        );
        registry.register(LEAST_BUSY_STRATEGY, least_busy);

        Self {
            config,
            store,
            agents,
            affinity,
            registry,
            rules: Arc::new(StatusRuleEngine::default()),
            observers: ObserverSet::new(),
        }
    }

    /// Replace the strategy registry (tests inject fakes here).
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use the given rule engine instead of the default rule set.
    pub fn with_rules(mut self, rules: Arc<StatusRuleEngine>) -> Self {
        self.rules = rules;
        self
    }

    /// Attach assignment observers.
    pub fn with_observers(mut self, observers: ObserverSet) -> Self {
        self.observers = observers;
        self
    }

    /// Ranked agent recommendations for a ticket id.
    ///
    /// `top_n = 0` uses the configured default list size. An empty list
    /// means no eligible agent exists.
    pub async fn recommend_agents(
        &self,
        ticket_id: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, DispatchError> {
        let ticket = self
            .store
            .get(ticket_id)?
            .ok_or_else(|| DispatchError::TicketNotFound(ticket_id.to_string()))?;

        self.recommend_for(&ticket, top_n).await
    }

    /// Ranked agent recommendations for an already-resolved ticket.
    pub async fn recommend_for(
        &self,
        ticket: &Ticket,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, DispatchError> {
        let top_n = if top_n == 0 {
            self.config.max_recommendations
        } else {
            top_n
        };

        let affinity = self.registry.get(AFFINITY_STRATEGY)?;
        match affinity.recommend(ticket, top_n).await {
            Ok(recs) if !recs.is_empty() => {
                metrics::RECOMMENDATIONS_SERVED
                    .with_label_values(&[AFFINITY_STRATEGY])
                    .inc();
                Ok(recs)
            }
            Ok(_) => self.fallback(ticket, top_n).await,
            Err(RecommendError::InsufficientHistory { samples, required }) => {
                debug!(
                    "Affinity not trustworthy for ticket {} ({}/{} samples), falling back",
                    ticket.id, samples, required
                );
                self.fallback(ticket, top_n).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fallback(
        &self,
        ticket: &Ticket,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, DispatchError> {
        let least_busy = self.registry.get(LEAST_BUSY_STRATEGY)?;
        let recs = least_busy.recommend(ticket, top_n).await?;
        metrics::RECOMMENDATIONS_SERVED
            .with_label_values(&[LEAST_BUSY_STRATEGY])
            .inc();
        Ok(recs)
    }

    /// Assign the top recommendation to the ticket.
    ///
    /// Returns `Ok(false)` when no eligible agent exists - a normal
    /// outcome, never an error. The transition to `Assigned` is
    /// validated against the pre-mutation status before anything is
    /// changed.
    pub async fn auto_dispatch(&self, ticket_id: &str) -> Result<bool, DispatchError> {
        let ticket = self
            .store
            .get(ticket_id)?
            .ok_or_else(|| DispatchError::TicketNotFound(ticket_id.to_string()))?;

        let recommendations = self.recommend_for(&ticket, 1).await?;
        let Some(top) = recommendations.first() else {
            metrics::DISPATCH_OUTCOMES.with_label_values(&["no_agent"]).inc();
            debug!("No eligible agent for ticket {}", ticket.id);
            return Ok(false);
        };

        let Some(agent) = self.agents.get(&top.agent_id)? else {
            // Directory drifted between ranking and application.
            warn!(
                "Recommended agent {} vanished from directory, ticket {} stays unassigned",
                top.agent_id, ticket.id
            );
            metrics::DISPATCH_OUTCOMES.with_label_values(&["no_agent"]).inc();
            return Ok(false);
        };

        if !self.rules.can_transition(
            &ticket.domain,
            ticket.status,
            TicketStatus::Assigned,
            ticket.review_status,
            &Principal::system(),
        ) {
            metrics::TRANSITIONS_DENIED.inc();
            return Err(DispatchError::PolicyViolation {
                domain: ticket.domain.clone(),
                from: ticket.status,
                to: TicketStatus::Assigned,
            });
        }

        let mut updated = ticket.clone();
        updated.responsible_agent_id = Some(agent.id.clone());
        updated.status = TicketStatus::Assigned;
        updated.assigned_at = Some(Utc::now());
        updated.add_tag(AI_DISPATCHED_TAG);

        let persisted = self.store.update(&updated)?;

        self.observers.notify_assigned(&persisted, &agent).await;

        metrics::DISPATCH_OUTCOMES.with_label_values(&["dispatched"]).inc();
        info!(
            "Auto-dispatched ticket {} to agent {} (score {:.2})",
            persisted.id, agent.id, top.score
        );

        Ok(true)
    }

    /// Refresh the affinity strategy's statistics from ticket history.
    ///
    /// Idempotent and safe under concurrent callers; see
    /// [`AffinityStrategy::retrain`].
    pub async fn retrain(&self) -> Result<(), DispatchError> {
        let start = Instant::now();
        self.affinity.retrain().await?;
        metrics::RETRAIN_RUNS.inc();
        metrics::RETRAIN_DURATION.observe(start.elapsed().as_secs_f64());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::testing::{fixtures, MockAgentDirectory, MockTicketStore};

    fn engine_with(
        store: Arc<MockTicketStore>,
        agents: Arc<MockAgentDirectory>,
    ) -> DispatchEngine {
        DispatchEngine::new(
            DispatchConfig::default(),
            store,
            agents,
        )
    }

    #[tokio::test]
    async fn test_recommend_agents_unknown_ticket() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());

        let engine = engine_with(store, agents);
        let result = engine.recommend_agents("missing", 1).await;
        assert!(matches!(result, Err(DispatchError::TicketNotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_no_agents_is_empty_not_error() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());
        let ticket = fixtures::ticket("lonely");
        store.insert(ticket.clone());

        let engine = engine_with(store, agents);
        let recs = engine.recommend_agents(&ticket.id, 3).await.unwrap();
        assert!(recs.is_empty());

        let dispatched = engine.auto_dispatch(&ticket.id).await.unwrap();
        assert!(!dispatched);
    }

    #[tokio::test]
    async fn test_auto_dispatch_rejects_terminal_ticket() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());
        agents.add(fixtures::agent("a-1", "Dana"));

        let mut ticket = fixtures::ticket("already done");
        ticket.status = TicketStatus::Completed;
        store.insert(ticket.clone());

        let engine = engine_with(store, agents);
        let result = engine.auto_dispatch(&ticket.id).await;
        assert!(matches!(
            result,
            Err(DispatchError::PolicyViolation {
                from: TicketStatus::Completed,
                to: TicketStatus::Assigned,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fake_strategy_injection_via_registry() {
        struct AlwaysBob;

        #[async_trait]
        impl RecommendStrategy for AlwaysBob {
            fn name(&self) -> &str {
                "always-bob"
            }

            async fn recommend(
                &self,
                _ticket: &Ticket,
                _top_n: usize,
            ) -> Result<Vec<Recommendation>, RecommendError> {
                Ok(vec![Recommendation {
                    agent_id: "bob".to_string(),
                    score: 0.9,
                }])
            }
        }

        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());
        agents.add(fixtures::agent("bob", "Bob"));

        let ticket = fixtures::ticket("rigged");
        store.insert(ticket.clone());

        let mut registry = StrategyRegistry::new();
        registry.register(AFFINITY_STRATEGY, Arc::new(AlwaysBob));
        registry.register(LEAST_BUSY_STRATEGY, Arc::new(AlwaysBob));

        let engine = engine_with(store.clone(), agents).with_registry(registry);

        let recs = engine.recommend_agents(&ticket.id, 1).await.unwrap();
        assert_eq!(recs[0].agent_id, "bob");

        assert!(engine.auto_dispatch(&ticket.id).await.unwrap());
        let updated = store.get(&ticket.id).unwrap().unwrap();
        assert_eq!(updated.responsible_agent_id.as_deref(), Some("bob"));
        assert_eq!(updated.status, TicketStatus::Assigned);
    }
}
