//! Point-in-time agent workload computation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{AgentDirectory, DirectoryError};
use crate::ticket::{TicketError, TicketStore};

/// Errors that can occur while computing workloads.
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// The scan was cancelled before completing. Partial results are
    /// discarded; the caller re-requests.
    #[error("workload scan cancelled")]
    Cancelled,

    /// Ticket store error.
    #[error("ticket store error: {0}")]
    Store(#[from] TicketError),

    /// Agent directory error.
    #[error("agent directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Cooperative cancellation flag for long enumerations.
///
/// Cheaply cloneable; `cancel()` from any holder makes every in-flight
/// scan abort at its next per-agent checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a new, non-cancelled flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Derived workload of a single agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentWorkload {
    /// The agent this workload belongs to.
    pub agent_id: String,
    /// Number of open tickets (Assigned or InProgress).
    pub ticket_count: usize,
    /// Summed effort points of those tickets.
    pub effort_points: u32,
}

impl AgentWorkload {
    /// An empty workload for the given agent.
    pub fn empty(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ticket_count: 0,
            effort_points: 0,
        }
    }
}

/// Computes point-in-time workloads from the ticket store.
///
/// Deliberately uncached: workload changes as assignments land, and
/// staleness would bias subsequent recommendations. Side-effect free and
/// safe to call concurrently.
#[derive(Clone)]
pub struct WorkloadIndex {
    store: Arc<dyn TicketStore>,
    agents: Arc<dyn AgentDirectory>,
}

impl WorkloadIndex {
    /// Create a new workload index over the given store and directory.
    pub fn new(store: Arc<dyn TicketStore>, agents: Arc<dyn AgentDirectory>) -> Self {
        Self { store, agents }
    }

    /// Current workload of a single agent.
    ///
    /// An agent with no tickets yields zeros, not an error.
    pub fn current_workload(&self, agent_id: &str) -> Result<AgentWorkload, WorkloadError> {
        let tickets = self.store.get_by_responsible(agent_id)?;

        let mut workload = AgentWorkload::empty(agent_id);
        for ticket in tickets {
            if ticket.status.is_open() {
                workload.ticket_count += 1;
                workload.effort_points += ticket.effort_points;
            }
        }

        Ok(workload)
    }

    /// Workloads of every agent in the directory, in directory order.
    ///
    /// Checks the cancel flag between agents so a caller-initiated
    /// timeout aborts promptly.
    pub fn snapshot_all(&self, cancel: &CancelFlag) -> Result<Vec<AgentWorkload>, WorkloadError> {
        let agents = self.agents.list()?;

        let mut workloads = Vec::with_capacity(agents.len());
        for agent in agents {
            if cancel.is_cancelled() {
                return Err(WorkloadError::Cancelled);
            }
            workloads.push(self.current_workload(&agent.id)?);
        }

        Ok(workloads)
    }
}
