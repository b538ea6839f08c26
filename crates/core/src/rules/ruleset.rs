//! Per-domain transition rule sets.

use crate::rules::Role;
use crate::ticket::TicketStatus;

/// A single permitted edge in a domain's status graph.
#[derive(Debug, Clone)]
pub struct TransitionRule {
    /// Source status.
    pub from: TicketStatus,
    /// Target status.
    pub to: TicketStatus,
    /// Roles allowed to take this edge. `None` means any principal.
    pub allowed_roles: Option<Vec<Role>>,
    /// When true, the edge requires the ticket's review to be approved.
    pub requires_review_approval: bool,
}

impl TransitionRule {
    /// Create an unrestricted edge.
    pub fn edge(from: TicketStatus, to: TicketStatus) -> Self {
        Self {
            from,
            to,
            allowed_roles: None,
            requires_review_approval: false,
        }
    }

    /// Restrict the edge to the given roles.
    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.allowed_roles = Some(roles.to_vec());
        self
    }

    /// Gate the edge on an approved review.
    pub fn review_gated(mut self) -> Self {
        self.requires_review_approval = true;
        self
    }
}

/// The transition graph of one domain.
///
/// Policy content (which roles may take which edge) is data supplied to
/// the rule engine, not decided by it; the two built-in sets below are
/// defaults that deployments override per domain.
#[derive(Debug, Clone, Default)]
pub struct DomainRuleSet {
    rules: Vec<TransitionRule>,
}

impl DomainRuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    pub fn rule(mut self, rule: TransitionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Find the edge between two statuses, if one exists.
    pub fn find(&self, from: TicketStatus, to: TicketStatus) -> Option<&TransitionRule> {
        self.rules.iter().find(|r| r.from == from && r.to == to)
    }

    /// All rules in the set.
    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    /// Standard lifecycle without review gating.
    pub fn standard() -> Self {
        use TicketStatus::*;

        Self::new()
            .rule(TransitionRule::edge(Pending, Assigned).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(TransitionRule::edge(Pending, Rejected).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(TransitionRule::edge(Assigned, InProgress))
            .rule(TransitionRule::edge(Assigned, Pending).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(TransitionRule::edge(Assigned, Rejected).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(TransitionRule::edge(InProgress, Completed))
            .rule(TransitionRule::edge(InProgress, Failed))
            .rule(
                TransitionRule::edge(InProgress, Rejected).roles(&[Role::Dispatcher, Role::Admin]),
            )
    }

    /// Standard lifecycle with review-gated completion: only reviewers
    /// (or admins) may complete, and only once the review is approved.
    pub fn with_review() -> Self {
        use TicketStatus::*;

        Self::new()
            .rule(TransitionRule::edge(Pending, Assigned).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(TransitionRule::edge(Pending, Rejected).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(TransitionRule::edge(Assigned, InProgress))
            .rule(TransitionRule::edge(Assigned, Pending).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(TransitionRule::edge(Assigned, Rejected).roles(&[Role::Dispatcher, Role::Admin]))
            .rule(
                TransitionRule::edge(InProgress, Completed)
                    .roles(&[Role::Reviewer, Role::Admin])
                    .review_gated(),
            )
            .rule(TransitionRule::edge(InProgress, Failed))
            .rule(
                TransitionRule::edge(InProgress, Rejected).roles(&[Role::Dispatcher, Role::Admin]),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_edge() {
        let rules = DomainRuleSet::standard();
        assert!(rules
            .find(TicketStatus::Pending, TicketStatus::Assigned)
            .is_some());
        assert!(rules
            .find(TicketStatus::Pending, TicketStatus::Completed)
            .is_none());
    }

    #[test]
    fn test_standard_has_no_review_gates() {
        let rules = DomainRuleSet::standard();
        assert!(rules.rules().iter().all(|r| !r.requires_review_approval));
    }

    #[test]
    fn test_with_review_gates_completion() {
        let rules = DomainRuleSet::with_review();
        let edge = rules
            .find(TicketStatus::InProgress, TicketStatus::Completed)
            .unwrap();
        assert!(edge.requires_review_approval);
        assert_eq!(
            edge.allowed_roles.as_deref(),
            Some(&[Role::Reviewer, Role::Admin][..])
        );
    }
}
