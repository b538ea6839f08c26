//! Batch assignment orchestrator.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentDirectory, DirectoryError};
use crate::dispatch::{DispatchEngine, DispatchError};
use crate::metrics;
use crate::observer::ObserverSet;
use crate::project::ProjectDirectory;
use crate::rules::{Principal, StatusRuleEngine};
use crate::ticket::{Ticket, TicketError, TicketStatus, TicketStore, AI_DISPATCHED_TAG};

use super::types::{AssignmentOutcome, BatchAssignRequest, BatchAssignmentResult};

/// Per-item failure inside a batch run. Never escapes `assign`: every
/// variant funnels into a failed outcome entry.
#[derive(Debug, Error)]
enum ItemError {
    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error("policy violation in domain {domain}: {from} -> {to} not permitted")]
    PolicyViolation {
        domain: String,
        from: TicketStatus,
        to: TicketStatus,
    },

    #[error("ticket store error: {0}")]
    Store(#[from] TicketError),

    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Applies assignments to a list of tickets, trusting the recommender or
/// honoring manual overrides per request, and reports partial success.
///
/// Each `assign` call owns its result exclusively - concurrent calls
/// over overlapping tickets race at the storage layer (last write wins)
/// but never share an accumulator.
pub struct BatchAssigner {
    store: Arc<dyn TicketStore>,
    agents: Arc<dyn AgentDirectory>,
    projects: Arc<dyn ProjectDirectory>,
    engine: Arc<DispatchEngine>,
    rules: Arc<StatusRuleEngine>,
    observers: ObserverSet,
}

impl BatchAssigner {
    /// Create a new batch assigner.
    pub fn new(
        store: Arc<dyn TicketStore>,
        agents: Arc<dyn AgentDirectory>,
        projects: Arc<dyn ProjectDirectory>,
        engine: Arc<DispatchEngine>,
    ) -> Self {
        Self {
            store,
            agents,
            projects,
            engine,
            rules: Arc::new(StatusRuleEngine::default()),
            observers: ObserverSet::new(),
        }
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

    /// Assign every ticket in the request, in input order.
    ///
    /// Individual failures are recorded and the batch continues; the
    /// result always contains one outcome per input id.
    pub async fn assign(&self, request: &BatchAssignRequest) -> BatchAssignmentResult {
        let start = Instant::now();
        let mut result = BatchAssignmentResult::default();

        for ticket_id in &request.ticket_ids {
            match self.assign_one(ticket_id, request).await {
                Ok(outcome) => {
                    metrics::BATCH_ITEMS.with_label_values(&["success"]).inc();
                    result.record_success(outcome);
                }
                Err(e) => {
                    metrics::BATCH_ITEMS.with_label_values(&["failure"]).inc();
                    debug!("Batch item {} failed: {}", ticket_id, e);
                    result.record_failure(ticket_id, e.to_string());
                }
            }
        }

        metrics::BATCH_DURATION.observe(start.elapsed().as_secs_f64());
        info!(
            "Batch assignment finished: {} ok, {} failed of {}",
            result.success_count,
            result.failure_count,
            request.ticket_ids.len()
        );

        result
    }

    async fn assign_one(
        &self,
        ticket_id: &str,
        request: &BatchAssignRequest,
    ) -> Result<AssignmentOutcome, ItemError> {
        let ticket = self
            .store
            .get(ticket_id)?
            .ok_or_else(|| ItemError::TicketNotFound(ticket_id.to_string()))?;

        let (agent_id, project_id) = if request.use_recommendations {
            let agent_id = self
                .engine
                .recommend_for(&ticket, 1)
                .await?
                .first()
                .map(|r| r.agent_id.clone());

            let project_id = if ticket.project_id.is_none() {
                self.resolve_project(&ticket)?
            } else {
                None
            };

            (agent_id, project_id)
        } else {
            (
                request.forced_agent_id.clone(),
                request.forced_project_id.clone(),
            )
        };

        let mut updated = ticket.clone();
        let mut resolved_agent: Option<Agent> = None;

        if let Some(ref agent_id) = agent_id {
            if let Some(agent) = self.agents.get(agent_id)? {
                // Validate against the status the ticket had before any
                // in-memory mutation.
                if !self.rules.can_transition(
                    &ticket.domain,
                    ticket.status,
                    TicketStatus::Assigned,
                    ticket.review_status,
                    &Principal::system(),
                ) {
                    metrics::TRANSITIONS_DENIED.inc();
                    return Err(ItemError::PolicyViolation {
                        domain: ticket.domain.clone(),
                        from: ticket.status,
                        to: TicketStatus::Assigned,
                    });
                }

                updated.responsible_agent_id = Some(agent.id.clone());
                updated.status = TicketStatus::Assigned;
                updated.assigned_at = Some(Utc::now());
                if request.use_recommendations {
                    updated.add_tag(AI_DISPATCHED_TAG);
                }
                resolved_agent = Some(agent);
            } else {
                warn!(
                    "Agent {} not found, ticket {} keeps its assignment state",
                    agent_id, ticket.id
                );
            }
        }

        // A resolved project is applied whether or not an agent was.
        if let Some(project_id) = project_id {
            updated.project_id = Some(project_id);
        }

        let persisted = self.store.update(&updated)?;

        match resolved_agent {
            Some(ref agent) => self.observers.notify_assigned(&persisted, agent).await,
            None => self.observers.notify_updated(&persisted).await,
        }

        // Display names are resolved after persistence so the outcome
        // reflects what actually landed.
        let project_name = match persisted.project_id {
            Some(ref project_id) => self.projects.get(project_id)?.map(|p| p.name),
            None => None,
        };

        Ok(AssignmentOutcome {
            ticket_id: persisted.id,
            agent_name: resolved_agent.map(|a| a.name),
            project_name,
            success: true,
            error: None,
        })
    }

    /// Resolve a project for a project-less ticket: the cached
    /// recommended name matched exactly against active projects first,
    /// then the customer-based lookup.
    fn resolve_project(&self, ticket: &Ticket) -> Result<Option<String>, ItemError> {
        if let Some(ref name) = ticket.recommended_project_name {
            let active = self.projects.active_projects()?;
            if let Some(project) = active.into_iter().find(|p| p.name == *name) {
                return Ok(Some(project.id));
            }
        }

        Ok(self
            .projects
            .recommended_for_customer(&ticket.customer_id)?
            .map(|p| p.id))
    }
}
