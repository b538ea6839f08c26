//! Status transition rules: roles, per-domain graphs and the rule engine.

mod engine;
mod principal;
mod ruleset;

pub use engine::StatusRuleEngine;
pub use principal::{Principal, Role};
pub use ruleset::{DomainRuleSet, TransitionRule};
