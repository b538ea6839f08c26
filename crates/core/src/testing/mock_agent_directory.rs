//! In-memory mock agent directory for testing.

use std::sync::Mutex;

use crate::agent::{Agent, AgentDirectory, DirectoryError};

/// Mock implementation of the [`AgentDirectory`] trait.
///
/// Preserves insertion order in `list`, which the least-busy strategy
/// relies on for deterministic tie-breaking.
#[derive(Default)]
pub struct MockAgentDirectory {
    agents: Mutex<Vec<Agent>>,
    next_error: Mutex<Option<DirectoryError>>,
}

impl MockAgentDirectory {
    /// Create an empty mock directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent, replacing any existing agent with the same id.
    pub fn add(&self, agent: Agent) {
        let mut agents = self.agents.lock().unwrap();
        if let Some(existing) = agents.iter_mut().find(|a| a.id == agent.id) {
            *existing = agent;
        } else {
            agents.push(agent);
        }
    }

    /// Remove an agent by id.
    pub fn remove(&self, id: &str) {
        self.agents.lock().unwrap().retain(|a| a.id != id);
    }

    /// Fail the next directory call with the given error.
    pub fn set_next_error(&self, error: DirectoryError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    fn take_error(&self) -> Option<DirectoryError> {
        self.next_error.lock().unwrap().take()
    }
}

impl AgentDirectory for MockAgentDirectory {
    fn get(&self, id: &str) -> Result<Option<Agent>, DirectoryError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Agent>, DirectoryError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        Ok(self.agents.lock().unwrap().clone())
    }
}
