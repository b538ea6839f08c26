//! Core ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance tag appended to tickets assigned from engine recommendations.
pub const AI_DISPATCHED_TAG: &str = "AI-Dispatched";

/// Lifecycle status of a ticket.
///
/// State machine flow:
/// ```text
/// Pending -> Assigned -> InProgress -> Completed
///     |          |           |
///     +----------+-----------+--> Rejected / Failed
/// ```
///
/// Domains that require quality review additionally gate the
/// `InProgress -> Completed` edge on an approved review (see the
/// `rules` module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Ticket created, waiting to be assigned.
    Pending,
    /// An agent has been made responsible for the ticket.
    Assigned,
    /// The responsible agent is actively working the ticket.
    InProgress,
    /// Work finished successfully (terminal).
    Completed,
    /// Work could not be finished (terminal).
    Failed,
    /// Ticket was rejected before or during work (terminal).
    Rejected,
}

impl TicketStatus {
    /// All statuses, in lifecycle order. Used to enumerate candidate
    /// transition targets.
    pub const ALL: [TicketStatus; 6] = [
        TicketStatus::Pending,
        TicketStatus::Assigned,
        TicketStatus::InProgress,
        TicketStatus::Completed,
        TicketStatus::Failed,
        TicketStatus::Rejected,
    ];

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Completed | TicketStatus::Failed | TicketStatus::Rejected
        )
    }

    /// Returns true if the ticket still counts toward an agent's workload.
    pub fn is_open(&self) -> bool {
        matches!(self, TicketStatus::Assigned | TicketStatus::InProgress)
    }

    /// Returns true if a ticket in this status must have a responsible agent.
    pub fn requires_agent(&self) -> bool {
        matches!(self, TicketStatus::Assigned | TicketStatus::InProgress)
    }

    /// Returns the status as a string (for filtering and storage).
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Assigned => "assigned",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Completed => "completed",
            TicketStatus::Failed => "failed",
            TicketStatus::Rejected => "rejected",
        }
    }

    /// Parse a status from its string form.
    pub fn parse(s: &str) -> Option<TicketStatus> {
        match s {
            "pending" => Some(TicketStatus::Pending),
            "assigned" => Some(TicketStatus::Assigned),
            "in_progress" => Some(TicketStatus::InProgress),
            "completed" => Some(TicketStatus::Completed),
            "failed" => Some(TicketStatus::Failed),
            "rejected" => Some(TicketStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality-review state of a ticket.
///
/// Review is a sub-lifecycle alongside the main status: domains that
/// require review refuse to complete a ticket while the review is still
/// pending or was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// No review required for this ticket.
    NotRequested,
    /// Review required but not yet performed.
    Pending,
    /// Review performed and approved.
    Approved,
    /// Review performed and rejected.
    Rejected,
}

impl ReviewStatus {
    /// Returns the review status as a string (for storage).
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::NotRequested => "not_requested",
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Parse a review status from its string form.
    pub fn parse(s: &str) -> Option<ReviewStatus> {
        match s {
            "not_requested" => Some(ReviewStatus::NotRequested),
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

/// A ticket representing a unit of work to be routed to an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Unique identifier (UUID).
    pub id: String,

    /// Short free-text description of the work.
    pub title: String,

    /// Current lifecycle status.
    pub status: TicketStatus,

    /// Quality-review state (gates completion in review domains).
    pub review_status: ReviewStatus,

    /// Agent currently responsible, if any. Must be set whenever the
    /// status is `Assigned` or `InProgress`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_agent_id: Option<String>,

    /// Project the ticket belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Customer the ticket was raised for.
    pub customer_id: String,

    /// Estimated effort in points.
    pub effort_points: u32,

    /// Priority score (higher = more urgent).
    pub priority_score: f32,

    /// Mutable tag set, used among other things to record assignment
    /// provenance (see [`AI_DISPATCHED_TAG`]).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Cached project name suggested at intake, matched by exact name
    /// against active projects during batch assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_project_name: Option<String>,

    /// Domain identifier selecting the status-transition rule set.
    /// Immutable after creation.
    pub domain: String,

    /// When the ticket was created.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,

    /// When the ticket was last assigned to an agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Returns true if the tag is present.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag if not already present. Idempotent.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.has_tag(tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Age of the ticket in whole hours.
    pub fn age_hours(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.created_at).num_hours()
    }
}
