//! Historical-affinity matching strategy.
//!
//! Scores agents by the correlation between a ticket's tags and the tags
//! of tickets each agent completed in the past. Refuses to guess when the
//! historical sample for the ticket's domain is below the configured
//! minimum - callers fall back to workload balancing instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::recommend::{RecommendError, RecommendStrategy, Recommendation};
use crate::ticket::{Ticket, TicketFilter, TicketStatus, TicketStore, AI_DISPATCHED_TAG};

/// Registry key for the affinity strategy.
pub const AFFINITY_STRATEGY: &str = "affinity";

/// Page size used while scanning ticket history during retraining.
const RETRAIN_PAGE_SIZE: i64 = 500;

/// Per-agent completion statistics.
#[derive(Debug, Clone, Default)]
struct AgentStats {
    /// Completed tickets attributed to the agent.
    total: u32,
    /// Completed tickets per work tag.
    by_tag: HashMap<String, u32>,
}

/// Per-domain slice of the trained model.
#[derive(Debug, Default)]
struct DomainStats {
    /// Completed, agent-attributed tickets seen in this domain.
    samples: usize,
    agents: HashMap<String, AgentStats>,
}

/// The trained affinity model. Rebuilt wholesale by `retrain`.
#[derive(Debug, Default)]
struct AffinityModel {
    domains: HashMap<String, DomainStats>,
    trained_at: Option<DateTime<Utc>>,
}

/// Historical-affinity strategy.
///
/// The model is the only long-lived mutable state in the dispatch core.
/// Reads go through an `RwLock`; retraining serializes on a dedicated
/// mutex and swaps the finished model in, so concurrent retrain calls
/// cannot interleave writes.
pub struct AffinityStrategy {
    store: Arc<dyn TicketStore>,
    min_history: usize,
    model: RwLock<AffinityModel>,
    retrain_lock: Mutex<()>,
}

impl AffinityStrategy {
    /// Create an untrained strategy. Until `retrain` runs, every
    /// recommendation reports insufficient history.
    pub fn new(store: Arc<dyn TicketStore>, min_history: usize) -> Self {
        Self {
            store,
            min_history,
            model: RwLock::new(AffinityModel::default()),
            retrain_lock: Mutex::new(()),
        }
    }

    /// Rebuild the model from completed ticket history.
    ///
    /// Idempotent and safe under concurrency: latecomers wait on the
    /// retrain mutex and then rebuild against the latest history
    /// (last-writer-wins).
    pub async fn retrain(&self) -> Result<(), RecommendError> {
        let _guard = self.retrain_lock.lock().await;

        let mut model = AffinityModel::default();
        let mut offset = 0i64;

        loop {
            let filter = TicketFilter::new()
                .with_status(TicketStatus::Completed)
                .with_limit(RETRAIN_PAGE_SIZE)
                .with_offset(offset);
            let page = self.store.list(&filter)?;
            let page_len = page.len();

            for ticket in page {
                let Some(ref agent_id) = ticket.responsible_agent_id else {
                    continue;
                };

                let domain = model.domains.entry(ticket.domain.clone()).or_default();
                domain.samples += 1;

                let stats = domain.agents.entry(agent_id.clone()).or_default();
                stats.total += 1;
                for tag in work_tags(&ticket) {
                    *stats.by_tag.entry(tag.clone()).or_default() += 1;
                }
            }

            if (page_len as i64) < RETRAIN_PAGE_SIZE {
                break;
            }
            offset += RETRAIN_PAGE_SIZE;
        }

        model.trained_at = Some(Utc::now());
        let domain_count = model.domains.len();
        let sample_count: usize = model.domains.values().map(|d| d.samples).sum();

        *self.model.write().await = model;

        info!(
            "Affinity model retrained: {} samples across {} domains",
            sample_count, domain_count
        );

        Ok(())
    }

    /// When the model was last trained, if ever.
    pub async fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.model.read().await.trained_at
    }

    /// Mean per-tag affinity of one agent for the ticket's work tags.
    fn score(ticket_tags: &[&String], stats: &AgentStats) -> f32 {
        if stats.total == 0 || ticket_tags.is_empty() {
            return 0.0;
        }

        let mut acc = 0.0;
        for tag in ticket_tags {
            acc += *stats.by_tag.get(*tag).unwrap_or(&0) as f32 / stats.total as f32;
        }
        acc / ticket_tags.len() as f32
    }
}

/// Work-describing tags of a ticket; provenance tags are not attributes.
fn work_tags(ticket: &Ticket) -> impl Iterator<Item = &String> {
    ticket.tags.iter().filter(|t| t.as_str() != AI_DISPATCHED_TAG)
}

#[async_trait]
impl RecommendStrategy for AffinityStrategy {
    fn name(&self) -> &str {
        AFFINITY_STRATEGY
    }

    async fn recommend(
        &self,
        ticket: &Ticket,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let model = self.model.read().await;

        let domain = model.domains.get(&ticket.domain);
        let samples = domain.map(|d| d.samples).unwrap_or(0);
        if samples < self.min_history {
            debug!(
                "Affinity has {} samples for domain {} (need {}), reporting insufficient history",
                samples, ticket.domain, self.min_history
            );
            return Err(RecommendError::InsufficientHistory {
                samples,
                required: self.min_history,
            });
        }

        let Some(domain) = domain else {
            return Ok(Vec::new());
        };

        let tags: Vec<&String> = work_tags(ticket).collect();

        let mut ranked: Vec<Recommendation> = domain
            .agents
            .iter()
            .filter_map(|(agent_id, stats)| {
                let score = Self::score(&tags, stats);
                (score > 0.0).then(|| Recommendation {
                    agent_id: agent_id.clone(),
                    score,
                })
            })
            .collect();

        // HashMap iteration order is arbitrary; sort by score, then by
        // agent id so equal scores stay deterministic.
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });
        ranked.truncate(top_n);

        Ok(ranked)
    }
}
