//! Configuration tree.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backlog::BacklogConfig;
use crate::dispatch::DispatchConfig;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),
}

/// Top-level configuration for the dispatch core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dispatch engine knobs.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Backlog reporting knobs.
    #[serde(default)]
    pub backlog: BacklogConfig,
}
