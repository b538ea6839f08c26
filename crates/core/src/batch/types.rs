//! Batch assignment request and result types.

use serde::{Deserialize, Serialize};

/// Request to assign a list of tickets in one pass.
#[derive(Debug, Clone)]
pub struct BatchAssignRequest {
    /// Tickets to assign, processed in this order.
    pub ticket_ids: Vec<String>,
    /// When true, the dispatch engine picks the agent (and a project is
    /// resolved for project-less tickets); when false, the forced ids
    /// below are applied verbatim.
    pub use_recommendations: bool,
    /// Agent to force-assign when not using recommendations.
    pub forced_agent_id: Option<String>,
    /// Project to force-assign when not using recommendations.
    pub forced_project_id: Option<String>,
}

impl BatchAssignRequest {
    /// Request that lets the dispatch engine pick agents and projects.
    pub fn recommended(ticket_ids: Vec<String>) -> Self {
        Self {
            ticket_ids,
            use_recommendations: true,
            forced_agent_id: None,
            forced_project_id: None,
        }
    }

    /// Request that applies the given agent/project verbatim.
    pub fn forced(
        ticket_ids: Vec<String>,
        agent_id: Option<String>,
        project_id: Option<String>,
    ) -> Self {
        Self {
            ticket_ids,
            use_recommendations: false,
            forced_agent_id: agent_id,
            forced_project_id: project_id,
        }
    }
}

/// Outcome of one ticket within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    /// The input ticket id.
    pub ticket_id: String,
    /// Display name of the agent that ended up responsible, if any.
    pub agent_name: Option<String>,
    /// Display name of the project that ended up attached, if any.
    pub project_name: Option<String>,
    /// Whether this ticket was processed successfully.
    pub success: bool,
    /// Error message for failed outcomes.
    pub error: Option<String>,
}

/// Aggregated report of a batch assignment run.
///
/// Every input ticket id produces exactly one outcome entry, in input
/// order; `success_count + failure_count` always equals the input size.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchAssignmentResult {
    /// Tickets processed successfully.
    pub success_count: usize,
    /// Tickets that failed.
    pub failure_count: usize,
    /// Per-ticket outcomes in input order.
    pub assignments: Vec<AssignmentOutcome>,
    /// Error messages of the failed outcomes, in input order.
    pub errors: Vec<String>,
}

impl BatchAssignmentResult {
    pub(crate) fn record_success(&mut self, outcome: AssignmentOutcome) {
        self.success_count += 1;
        self.assignments.push(outcome);
    }

    pub(crate) fn record_failure(&mut self, ticket_id: &str, error: String) {
        self.failure_count += 1;
        self.errors.push(error.clone());
        self.assignments.push(AssignmentOutcome {
            ticket_id: ticket_id.to_string(),
            agent_name: None,
            project_name: None,
            success: false,
            error: Some(error),
        });
    }
}
