//! Least-busy fallback strategy.
//!
//! Ranks agents ascending by current effort-point workload. Always
//! produces a ranking when at least one agent exists, which makes it the
//! universal fallback when affinity data is too thin.

use async_trait::async_trait;
use std::sync::Arc;

use crate::agent::{AgentDirectory, WorkloadIndex};
use crate::recommend::{RecommendError, RecommendStrategy, Recommendation};
use crate::ticket::Ticket;

/// Registry key for the least-busy strategy.
pub const LEAST_BUSY_STRATEGY: &str = "least-busy";

/// Workload-balancing strategy.
///
/// Ties are broken by directory insertion order (the sort is stable), so
/// repeated calls over the same state return the same sequence. Agents
/// at or over `max_capacity_points` are still ranked: capacity is a soft
/// signal for scoring and statistics, never a hard block at this layer.
pub struct LeastBusyStrategy {
    agents: Arc<dyn AgentDirectory>,
    workload: WorkloadIndex,
}

impl LeastBusyStrategy {
    /// Create a new least-busy strategy.
    pub fn new(agents: Arc<dyn AgentDirectory>, workload: WorkloadIndex) -> Self {
        Self { agents, workload }
    }
}

#[async_trait]
impl RecommendStrategy for LeastBusyStrategy {
    fn name(&self) -> &str {
        LEAST_BUSY_STRATEGY
    }

    async fn recommend(
        &self,
        _ticket: &Ticket,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let agents = self.agents.list()?;

        let mut ranked = Vec::with_capacity(agents.len());
        for agent in agents {
            let workload = self.workload.current_workload(&agent.id)?;
            ranked.push((agent.id, workload.effort_points));
        }

        // Stable sort: equal workloads keep directory insertion order.
        ranked.sort_by_key(|(_, effort)| *effort);

        Ok(ranked
            .into_iter()
            .take(top_n)
            .map(|(agent_id, effort)| Recommendation {
                agent_id,
                score: 1.0 / (1.0 + effort as f32),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockAgentDirectory, MockTicketStore};
    use crate::ticket::TicketStatus;

    fn strategy_with(
        store: Arc<MockTicketStore>,
        agents: Arc<MockAgentDirectory>,
    ) -> LeastBusyStrategy {
        let workload = WorkloadIndex::new(store, Arc::clone(&agents) as Arc<dyn AgentDirectory>);
        LeastBusyStrategy::new(agents, workload)
    }

    fn assign(store: &MockTicketStore, agent_id: &str, effort: u32) {
        let mut ticket = fixtures::ticket("busy work");
        ticket.responsible_agent_id = Some(agent_id.to_string());
        ticket.status = TicketStatus::Assigned;
        ticket.effort_points = effort;
        store.insert(ticket);
    }

    #[tokio::test]
    async fn test_ranks_idle_agent_first() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());
        agents.add(fixtures::agent("busy", "Busy"));
        agents.add(fixtures::agent("idle", "Idle"));
        assign(&store, "busy", 21);

        let strategy = strategy_with(store, agents);
        let recs = strategy
            .recommend(&fixtures::ticket("new work"), 2)
            .await
            .unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].agent_id, "idle");
        assert_eq!(recs[1].agent_id, "busy");
        assert!(recs[0].score > recs[1].score);
    }

    #[tokio::test]
    async fn test_tie_break_is_directory_insertion_order() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());
        agents.add(fixtures::agent("third", "C"));
        agents.add(fixtures::agent("first", "A"));
        agents.add(fixtures::agent("second", "B"));

        let strategy = strategy_with(store, agents);

        // Identical (zero) workloads: repeated calls must preserve the
        // directory order.
        for _ in 0..3 {
            let recs = strategy
                .recommend(&fixtures::ticket("tie"), 3)
                .await
                .unwrap();
            let ids: Vec<&str> = recs.iter().map(|r| r.agent_id.as_str()).collect();
            assert_eq!(ids, vec!["third", "first", "second"]);
        }
    }

    #[tokio::test]
    async fn test_over_capacity_agents_are_still_ranked() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());
        agents.add(fixtures::capped_agent("maxed", 10));
        assign(&store, "maxed", 15);

        let strategy = strategy_with(store, agents);
        let recs = strategy
            .recommend(&fixtures::ticket("overflow"), 1)
            .await
            .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].agent_id, "maxed");
    }

    #[test]
    fn test_empty_directory_yields_empty_ranking() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());

        let strategy = strategy_with(store, agents);
        let recs = tokio_test::block_on(strategy.recommend(&fixtures::ticket("nobody"), 1))
            .unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_top_n_truncates() {
        let store = Arc::new(MockTicketStore::new());
        let agents = Arc::new(MockAgentDirectory::new());
        for i in 0..5 {
            agents.add(fixtures::agent(&format!("a-{}", i), "X"));
        }

        let strategy = strategy_with(store, agents);
        let recs = strategy
            .recommend(&fixtures::ticket("few"), 2)
            .await
            .unwrap();
        assert_eq!(recs.len(), 2);
    }
}
