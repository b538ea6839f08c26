//! Recommendation strategies.
//!
//! A family of interchangeable scoring strategies resolved through a
//! [`StrategyRegistry`]:
//!
//! - [`AffinityStrategy`] ranks by historical correlation between ticket
//!   tags and agents' past completed work, and reports insufficient
//!   history instead of guessing.
//! - [`LeastBusyStrategy`] ranks ascending by current effort-point
//!   workload and always produces an answer.
//!
//! The dispatch engine prefers affinity when trustworthy and falls back
//! to least-busy otherwise; that ordering is policy, not incident.

mod affinity;
mod least_busy;
mod registry;
mod traits;

pub use affinity::{AffinityStrategy, AFFINITY_STRATEGY};
pub use least_busy::{LeastBusyStrategy, LEAST_BUSY_STRATEGY};
pub use registry::StrategyRegistry;
pub use traits::{RecommendError, RecommendStrategy, Recommendation};
