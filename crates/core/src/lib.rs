pub mod agent;
pub mod backlog;
pub mod batch;
pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod observer;
pub mod project;
pub mod recommend;
pub mod rules;
pub mod testing;
pub mod ticket;

pub use agent::{
    Agent, AgentDirectory, AgentLevel, AgentWorkload, CancelFlag, DirectoryError,
    SqliteAgentDirectory, WorkloadError, WorkloadIndex,
};
pub use backlog::{
    BacklogAggregator, BacklogConfig, BacklogError, BacklogStatistics, BacklogSummary,
};
pub use batch::{AssignmentOutcome, BatchAssignRequest, BatchAssigner, BatchAssignmentResult};
pub use config::{load_config, load_config_from_str, Config, ConfigError};
pub use dispatch::{DispatchConfig, DispatchEngine, DispatchError};
pub use observer::{
    AssignmentObserver, ChannelNotificationSink, Notification, NotificationSink,
    NotifyAssigneeObserver, ObserverSet, Severity,
};
pub use project::{Project, ProjectDirectory, SqliteProjectDirectory};
pub use recommend::{
    AffinityStrategy, LeastBusyStrategy, RecommendError, RecommendStrategy, Recommendation,
    StrategyRegistry, AFFINITY_STRATEGY, LEAST_BUSY_STRATEGY,
};
pub use rules::{DomainRuleSet, Principal, Role, StatusRuleEngine, TransitionRule};
pub use ticket::{
    CreateTicketRequest, ReviewStatus, SqliteTicketStore, Ticket, TicketError, TicketFilter,
    TicketStatus, TicketStore, AI_DISPATCHED_TAG,
};
