//! Agent data types.

use serde::{Deserialize, Serialize};

/// Seniority level of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentLevel {
    Junior,
    Regular,
    Senior,
}

impl AgentLevel {
    /// Returns the level as a string (for storage).
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentLevel::Junior => "junior",
            AgentLevel::Regular => "regular",
            AgentLevel::Senior => "senior",
        }
    }

    /// Parse a level from its string form.
    pub fn parse(s: &str) -> Option<AgentLevel> {
        match s {
            "junior" => Some(AgentLevel::Junior),
            "regular" => Some(AgentLevel::Regular),
            "senior" => Some(AgentLevel::Senior),
            _ => None,
        }
    }
}

/// A human worker eligible to be assigned tickets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Team the agent belongs to.
    pub team: String,

    /// Seniority level.
    pub level: AgentLevel,

    /// Language/region tags. Consumed by recommendation strategies only,
    /// never enforced by the core.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,

    /// Soft capacity limit in effort points. `None` means uncapped.
    /// Capacity is a scoring/statistics signal, never a hard block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_capacity_points: Option<u32>,
}
