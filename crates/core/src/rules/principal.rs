//! Acting principal and roles.

use serde::{Deserialize, Serialize};

/// Role of an acting principal, checked against per-edge restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A regular ticket-working agent.
    Agent,
    /// May assign, reassign and reject tickets.
    Dispatcher,
    /// May pass review-gated edges.
    Reviewer,
    /// Administrative role.
    Admin,
}

/// The identity on whose behalf a status transition is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier.
    pub user_id: String,
    /// Roles granted to the user.
    pub roles: Vec<Role>,
}

impl Principal {
    /// Create a new principal.
    pub fn new(user_id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    /// The identity the dispatch engine and batch orchestrator act under.
    pub fn system() -> Self {
        Self::new("system", vec![Role::Dispatcher])
    }

    /// Returns true if the principal holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true if the principal holds any of the given roles.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_principal_is_dispatcher() {
        let principal = Principal::system();
        assert_eq!(principal.user_id, "system");
        assert!(principal.has_role(Role::Dispatcher));
        assert!(!principal.has_role(Role::Admin));
    }

    #[test]
    fn test_has_any_role() {
        let principal = Principal::new("rev-1", vec![Role::Agent, Role::Reviewer]);
        assert!(principal.has_any_role(&[Role::Reviewer, Role::Admin]));
        assert!(!principal.has_any_role(&[Role::Dispatcher, Role::Admin]));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Reviewer).unwrap();
        assert_eq!(json, r#""reviewer""#);
    }
}
