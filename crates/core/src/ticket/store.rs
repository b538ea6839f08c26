//! Ticket storage trait and types.

use std::fmt;

use crate::ticket::{Ticket, TicketStatus};

/// Error type for ticket operations.
#[derive(Debug)]
pub enum TicketError {
    /// Ticket not found.
    NotFound(String),
    /// Cannot perform operation due to current state.
    InvalidState {
        ticket_id: String,
        current_state: String,
        operation: String,
    },
    /// Database error.
    Database(String),
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::NotFound(id) => write!(f, "Ticket not found: {}", id),
            TicketError::InvalidState {
                ticket_id,
                current_state,
                operation,
            } => write!(
                f,
                "Cannot {} ticket {}: current state is {}",
                operation, ticket_id, current_state
            ),
            TicketError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for TicketError {}

/// Request to create a new ticket.
///
/// Tickets always start out in `Pending` status; assignment and further
/// transitions are driven by the dispatch engine and batch orchestrator.
#[derive(Debug, Clone)]
pub struct CreateTicketRequest {
    /// Short free-text description of the work.
    pub title: String,
    /// Customer the ticket was raised for.
    pub customer_id: String,
    /// Domain identifier selecting the transition rule set.
    pub domain: String,
    /// Estimated effort in points.
    pub effort_points: u32,
    /// Priority score (higher = more urgent).
    pub priority_score: f32,
    /// Initial tag set.
    pub tags: Vec<String>,
    /// Project name suggested at intake, if any.
    pub recommended_project_name: Option<String>,
    /// Whether the ticket requires quality review before completion.
    pub requires_review: bool,
}

/// Filter for querying tickets.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// Filter by status.
    pub status: Option<TicketStatus>,
    /// Filter by domain.
    pub domain: Option<String>,
    /// Only tickets without a responsible agent.
    pub unassigned_only: bool,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl TicketFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            domain: None,
            unassigned_only: false,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by status.
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Only return tickets without a responsible agent.
    pub fn unassigned(mut self) -> Self {
        self.unassigned_only = true;
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Create a new ticket in `Pending` status.
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// Get all tickets currently assigned to the given agent.
    fn get_by_responsible(&self, agent_id: &str) -> Result<Vec<Ticket>, TicketError>;

    /// List tickets matching the filter.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter.
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Persist an updated ticket.
    ///
    /// Implementations enforce two invariants: a ticket in a status that
    /// requires an agent must carry a responsible agent id, and the
    /// domain of an existing ticket never changes.
    fn update(&self, ticket: &Ticket) -> Result<Ticket, TicketError>;
}
