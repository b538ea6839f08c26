//! Agent domain: directory and derived workload.

mod directory;
mod types;
mod workload;

pub use directory::{AgentDirectory, DirectoryError, SqliteAgentDirectory};
pub use types::{Agent, AgentLevel};
pub use workload::{AgentWorkload, CancelFlag, WorkloadError, WorkloadIndex};
