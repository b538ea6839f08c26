//! Status transition rule engine.
//!
//! A pure predicate/query service: it never mutates tickets. Callers on
//! the write path re-validate immediately before persisting, passing the
//! pre-mutation status explicitly - there is no change-tracking side
//! channel to get the direction wrong.

use std::collections::HashMap;

use crate::rules::{DomainRuleSet, Principal};
use crate::ticket::{ReviewStatus, Ticket, TicketStatus};

/// Finite-state rule engine parameterized by ticket domain.
pub struct StatusRuleEngine {
    domains: HashMap<String, DomainRuleSet>,
    default_rules: DomainRuleSet,
}

impl Default for StatusRuleEngine {
    fn default() -> Self {
        Self::new(DomainRuleSet::standard())
    }
}

impl StatusRuleEngine {
    /// Create an engine with the given default rule set.
    pub fn new(default_rules: DomainRuleSet) -> Self {
        Self {
            domains: HashMap::new(),
            default_rules,
        }
    }

    /// Register a rule set for a specific domain.
    pub fn with_domain(mut self, domain: impl Into<String>, rules: DomainRuleSet) -> Self {
        self.domains.insert(domain.into(), rules);
        self
    }

    fn ruleset_for(&self, domain: &str) -> &DomainRuleSet {
        self.domains.get(domain).unwrap_or(&self.default_rules)
    }

    /// Whether the transition `current -> target` is permitted.
    ///
    /// `current` must be the status the ticket had BEFORE any in-memory
    /// mutation - never the intended value. Legality depends on the edge
    /// existing in the domain graph, the principal satisfying the edge's
    /// role restriction, and any review gate being satisfied.
    pub fn can_transition(
        &self,
        domain: &str,
        current: TicketStatus,
        target: TicketStatus,
        review_status: ReviewStatus,
        principal: &Principal,
    ) -> bool {
        // Staying in place is always a legal no-op.
        if current == target {
            return true;
        }

        if current.is_terminal() {
            return false;
        }

        let Some(rule) = self.ruleset_for(domain).find(current, target) else {
            return false;
        };

        if let Some(ref roles) = rule.allowed_roles {
            if !principal.has_any_role(roles) {
                return false;
            }
        }

        if rule.requires_review_approval && review_status != ReviewStatus::Approved {
            return false;
        }

        true
    }

    /// Convenience wrapper taking the current status from the ticket.
    ///
    /// Only safe on a ticket that has not been mutated in memory yet;
    /// write paths that build the updated value first must call
    /// [`can_transition`](Self::can_transition) with the saved original
    /// status instead.
    pub fn can_transition_ticket(
        &self,
        ticket: &Ticket,
        target: TicketStatus,
        principal: &Principal,
    ) -> bool {
        self.can_transition(
            &ticket.domain,
            ticket.status,
            target,
            ticket.review_status,
            principal,
        )
    }

    /// Convenience wrapper over [`valid_next_states`](Self::valid_next_states)
    /// taking domain, status and review state from the ticket.
    pub fn valid_next_states_for(
        &self,
        ticket: &Ticket,
        principal: &Principal,
    ) -> Vec<TicketStatus> {
        self.valid_next_states(
            &ticket.domain,
            ticket.status,
            ticket.review_status,
            principal,
        )
    }

    /// All statuses the ticket may legally move to, current status
    /// always included.
    pub fn valid_next_states(
        &self,
        domain: &str,
        current: TicketStatus,
        review_status: ReviewStatus,
        principal: &Principal,
    ) -> Vec<TicketStatus> {
        let mut states = vec![current];
        for target in TicketStatus::ALL {
            if target != current
                && self.can_transition(domain, current, target, review_status, principal)
            {
                states.push(target);
            }
        }
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Role;

    fn dispatcher() -> Principal {
        Principal::new("disp-1", vec![Role::Dispatcher])
    }

    fn agent() -> Principal {
        Principal::new("agent-1", vec![Role::Agent])
    }

    fn reviewer() -> Principal {
        Principal::new("rev-1", vec![Role::Reviewer])
    }

    #[test]
    fn test_no_direct_edge_pending_to_completed() {
        let engine = StatusRuleEngine::default();
        assert!(!engine.can_transition(
            "support",
            TicketStatus::Pending,
            TicketStatus::Completed,
            ReviewStatus::NotRequested,
            &dispatcher(),
        ));
    }

    #[test]
    fn test_pending_to_assigned_requires_dispatcher() {
        let engine = StatusRuleEngine::default();

        assert!(engine.can_transition(
            "support",
            TicketStatus::Pending,
            TicketStatus::Assigned,
            ReviewStatus::NotRequested,
            &dispatcher(),
        ));

        assert!(!engine.can_transition(
            "support",
            TicketStatus::Pending,
            TicketStatus::Assigned,
            ReviewStatus::NotRequested,
            &agent(),
        ));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        let engine = StatusRuleEngine::default();
        for terminal in [
            TicketStatus::Completed,
            TicketStatus::Failed,
            TicketStatus::Rejected,
        ] {
            for target in TicketStatus::ALL {
                if target != terminal {
                    assert!(!engine.can_transition(
                        "support",
                        terminal,
                        target,
                        ReviewStatus::NotRequested,
                        &dispatcher(),
                    ));
                }
            }
        }
    }

    #[test]
    fn test_same_status_is_always_permitted() {
        let engine = StatusRuleEngine::default();
        assert!(engine.can_transition(
            "support",
            TicketStatus::Completed,
            TicketStatus::Completed,
            ReviewStatus::NotRequested,
            &agent(),
        ));
    }

    #[test]
    fn test_review_gate_blocks_completion_until_approved() {
        let engine =
            StatusRuleEngine::default().with_domain("engineering", DomainRuleSet::with_review());

        assert!(!engine.can_transition(
            "engineering",
            TicketStatus::InProgress,
            TicketStatus::Completed,
            ReviewStatus::Pending,
            &reviewer(),
        ));

        assert!(engine.can_transition(
            "engineering",
            TicketStatus::InProgress,
            TicketStatus::Completed,
            ReviewStatus::Approved,
            &reviewer(),
        ));

        // Approved review is not enough without the reviewer role.
        assert!(!engine.can_transition(
            "engineering",
            TicketStatus::InProgress,
            TicketStatus::Completed,
            ReviewStatus::Approved,
            &agent(),
        ));
    }

    #[test]
    fn test_unknown_domain_falls_back_to_default_rules() {
        let engine = StatusRuleEngine::default();
        assert!(engine.can_transition(
            "never-configured",
            TicketStatus::Assigned,
            TicketStatus::InProgress,
            ReviewStatus::NotRequested,
            &agent(),
        ));
    }

    #[test]
    fn test_valid_next_states_includes_current() {
        let engine = StatusRuleEngine::default();

        let states = engine.valid_next_states(
            "support",
            TicketStatus::Completed,
            ReviewStatus::NotRequested,
            &dispatcher(),
        );
        assert_eq!(states, vec![TicketStatus::Completed]);

        let states = engine.valid_next_states(
            "support",
            TicketStatus::Pending,
            ReviewStatus::NotRequested,
            &dispatcher(),
        );
        assert!(states.contains(&TicketStatus::Pending));
        assert!(states.contains(&TicketStatus::Assigned));
        assert!(states.contains(&TicketStatus::Rejected));
        assert!(!states.contains(&TicketStatus::Completed));
    }

    #[test]
    fn test_valid_next_states_respects_roles() {
        let engine = StatusRuleEngine::default();

        let states = engine.valid_next_states(
            "support",
            TicketStatus::Pending,
            ReviewStatus::NotRequested,
            &agent(),
        );
        // An agent cannot assign or reject, so only the current status remains.
        assert_eq!(states, vec![TicketStatus::Pending]);
    }

    #[test]
    fn test_ticket_convenience_wrappers() {
        let engine = StatusRuleEngine::default();
        let ticket = crate::testing::fixtures::ticket("fresh");

        assert!(engine.can_transition_ticket(&ticket, TicketStatus::Assigned, &dispatcher()));
        assert!(!engine.can_transition_ticket(&ticket, TicketStatus::Completed, &dispatcher()));

        let states = engine.valid_next_states_for(&ticket, &dispatcher());
        assert!(states.contains(&TicketStatus::Pending));
        assert!(states.contains(&TicketStatus::Assigned));
    }

    #[test]
    fn test_check_uses_original_status_not_mutated_value() {
        // Regression guard for the classic ordering bug: validating after
        // mutating the in-memory ticket would compare target against target
        // and wave everything through.
        let engine = StatusRuleEngine::default();

        let original = TicketStatus::Pending;
        let intended = TicketStatus::Completed;

        // Simulate a write path that mutated the ticket first: the check
        // degenerates to a same-status no-op and would wrongly pass.
        let mut ticket = crate::testing::fixtures::ticket("mutated before check");
        ticket.status = intended;
        assert!(engine.can_transition(
            "support",
            ticket.status,
            intended,
            ReviewStatus::NotRequested,
            &dispatcher(),
        ));

        // Checking with the saved original correctly rejects.
        assert!(!engine.can_transition(
            "support",
            original,
            intended,
            ReviewStatus::NotRequested,
            &dispatcher(),
        ));
    }
}
