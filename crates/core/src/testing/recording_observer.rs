//! Recording observer for testing observer fan-out.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::agent::Agent;
use crate::observer::AssignmentObserver;
use crate::ticket::Ticket;

/// Observer that records every callback for assertions and can be armed
/// to fail its next invocation.
pub struct RecordingObserver {
    name: String,
    assigned: Mutex<Vec<(String, String)>>,
    updated: Mutex<Vec<String>>,
    fail_next: AtomicBool,
}

impl RecordingObserver {
    /// Create a named recording observer.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            assigned: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Arm the observer to fail its next callback.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Recorded (ticket id, agent id) assignment callbacks.
    pub async fn assigned_calls(&self) -> Vec<(String, String)> {
        self.assigned.lock().await.clone()
    }

    /// Recorded ticket ids of update callbacks.
    pub async fn updated_calls(&self) -> Vec<String> {
        self.updated.lock().await.clone()
    }

    fn should_fail(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }
}

#[async_trait]
impl AssignmentObserver for RecordingObserver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_assigned(&self, ticket: &Ticket, agent: &Agent) -> anyhow::Result<()> {
        if self.should_fail() {
            anyhow::bail!("injected observer failure");
        }
        self.assigned
            .lock()
            .await
            .push((ticket.id.clone(), agent.id.clone()));
        Ok(())
    }

    async fn on_updated(&self, ticket: &Ticket) -> anyhow::Result<()> {
        if self.should_fail() {
            anyhow::bail!("injected observer failure");
        }
        self.updated.lock().await.push(ticket.id.clone());
        Ok(())
    }
}
