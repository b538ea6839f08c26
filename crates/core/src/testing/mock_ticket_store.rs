//! In-memory mock ticket store for testing.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;

use crate::ticket::{
    CreateTicketRequest, ReviewStatus, Ticket, TicketError, TicketFilter, TicketStatus,
    TicketStore,
};

/// Mock implementation of the [`TicketStore`] trait.
///
/// Keeps tickets in insertion order and provides controllable failure
/// injection:
/// - `set_next_error` fails the next store call with the given error
/// - `fail_update_for` makes updates of specific tickets fail
///
/// Updated ticket ids are recorded for assertions.
#[derive(Default)]
pub struct MockTicketStore {
    tickets: Mutex<Vec<Ticket>>,
    next_error: Mutex<Option<TicketError>>,
    failing_updates: Mutex<HashSet<String>>,
    updated_ids: Mutex<Vec<String>>,
}

impl MockTicketStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ticket directly, bypassing the create path.
    pub fn insert(&self, ticket: Ticket) {
        self.tickets.lock().unwrap().push(ticket);
    }

    /// Fail the next store call with the given error.
    pub fn set_next_error(&self, error: TicketError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    /// Make every update of the given ticket fail.
    pub fn fail_update_for(&self, ticket_id: &str) {
        self.failing_updates
            .lock()
            .unwrap()
            .insert(ticket_id.to_string());
    }

    /// Ids of tickets that were updated, in update order.
    pub fn updated_ids(&self) -> Vec<String> {
        self.updated_ids.lock().unwrap().clone()
    }

    fn take_error(&self) -> Option<TicketError> {
        self.next_error.lock().unwrap().take()
    }

    fn matches(ticket: &Ticket, filter: &TicketFilter) -> bool {
        if let Some(status) = filter.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(ref domain) = filter.domain {
            if ticket.domain != *domain {
                return false;
            }
        }
        if filter.unassigned_only && ticket.responsible_agent_id.is_some() {
            return false;
        }
        true
    }
}

impl TicketStore for MockTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        let now = Utc::now();
        let ticket = Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title,
            status: TicketStatus::Pending,
            review_status: if request.requires_review {
                ReviewStatus::Pending
            } else {
                ReviewStatus::NotRequested
            },
            responsible_agent_id: None,
            project_id: None,
            customer_id: request.customer_id,
            effort_points: request.effort_points,
            priority_score: request.priority_score,
            tags: request.tags,
            recommended_project_name: request.recommended_project_name,
            domain: request.domain,
            created_at: now,
            updated_at: now,
            assigned_at: None,
        };

        self.tickets.lock().unwrap().push(ticket.clone());
        Ok(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    fn get_by_responsible(&self, agent_id: &str) -> Result<Vec<Ticket>, TicketError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.responsible_agent_id.as_deref() == Some(agent_id))
            .cloned()
            .collect())
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| Self::matches(t, filter))
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| Self::matches(t, filter))
            .count() as i64)
    }

    fn update(&self, ticket: &Ticket) -> Result<Ticket, TicketError> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }

        if self.failing_updates.lock().unwrap().contains(&ticket.id) {
            return Err(TicketError::Database("injected update failure".to_string()));
        }

        let mut tickets = self.tickets.lock().unwrap();
        let Some(existing) = tickets.iter_mut().find(|t| t.id == ticket.id) else {
            return Err(TicketError::NotFound(ticket.id.clone()));
        };

        let mut updated = ticket.clone();
        updated.updated_at = Utc::now();
        *existing = updated.clone();

        self.updated_ids.lock().unwrap().push(ticket.id.clone());
        Ok(updated)
    }
}
