//! Builders for common test entities.

use chrono::Utc;

use crate::agent::{Agent, AgentLevel};
use crate::project::Project;
use crate::ticket::{ReviewStatus, Ticket, TicketStatus};

/// A pending support-domain ticket with the given title.
pub fn ticket(title: &str) -> Ticket {
    ticket_in("support", title)
}

/// A pending ticket in the given domain.
pub fn ticket_in(domain: &str, title: &str) -> Ticket {
    let now = Utc::now();
    Ticket {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        status: TicketStatus::Pending,
        review_status: ReviewStatus::NotRequested,
        responsible_agent_id: None,
        project_id: None,
        customer_id: "acme".to_string(),
        effort_points: 3,
        priority_score: 10.0,
        tags: Vec::new(),
        recommended_project_name: None,
        domain: domain.to_string(),
        created_at: now,
        updated_at: now,
        assigned_at: None,
    }
}

/// An uncapped regular agent.
pub fn agent(id: &str, name: &str) -> Agent {
    Agent {
        id: id.to_string(),
        name: name.to_string(),
        team: "support".to_string(),
        level: AgentLevel::Regular,
        languages: vec!["en".to_string()],
        max_capacity_points: None,
    }
}

/// An agent with a capacity limit in effort points.
pub fn capped_agent(id: &str, capacity: u32) -> Agent {
    Agent {
        max_capacity_points: Some(capacity),
        ..agent(id, id)
    }
}

/// An active project for the given customer.
pub fn project(id: &str, name: &str, customer_id: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        customer_id: customer_id.to_string(),
        active: true,
    }
}
