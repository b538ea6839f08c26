//! Dispatch backlog reporting.
//!
//! Read-only join of unassigned tickets, agent workloads and active
//! projects into summary statistics. Never mutates any entity. Each
//! collection is read once per call; the staleness window between the
//! ticket and agent reads is accepted (see DESIGN.md).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::agent::{
    AgentDirectory, AgentWorkload, CancelFlag, DirectoryError, WorkloadError, WorkloadIndex,
};
use crate::dispatch::{DispatchEngine, DispatchError};
use crate::metrics;
use crate::project::{Project, ProjectDirectory};
use crate::ticket::{Ticket, TicketError, TicketFilter, TicketStatus, TicketStore};

/// Page size used while scanning the unassigned backlog.
const SCAN_PAGE_SIZE: i64 = 200;

/// Configuration for backlog reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogConfig {
    /// Default page size when callers pass `page_size = 0`.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Priority score at or above which a ticket counts as high priority.
    #[serde(default = "default_high_priority_threshold")]
    pub high_priority_threshold: f32,

    /// Hours in backlog after which a ticket counts as aged.
    #[serde(default = "default_aged_after_hours")]
    pub aged_after_hours: i64,
}

fn default_page_size() -> usize {
    50
}

fn default_high_priority_threshold() -> f32 {
    50.0
}

fn default_aged_after_hours() -> i64 {
    24
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            high_priority_threshold: default_high_priority_threshold(),
            aged_after_hours: default_aged_after_hours(),
        }
    }
}

/// Errors that can occur while building a backlog summary.
#[derive(Debug, Error)]
pub enum BacklogError {
    /// The aggregation was cancelled; partial results are discarded.
    #[error("backlog aggregation cancelled")]
    Cancelled,

    /// Ticket store error.
    #[error("ticket store error: {0}")]
    Store(#[from] TicketError),

    /// Directory error.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Workload computation error.
    #[error("workload error: {0}")]
    Workload(#[from] WorkloadError),

    /// Dispatch engine error while probing recommendation coverage.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Summary statistics over the dispatch backlog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacklogStatistics {
    /// Unassigned tickets in total.
    pub total_unassigned: usize,
    /// Unassigned tickets carrying a project or a cached project
    /// recommendation.
    pub with_project_recommendation: usize,
    /// Unassigned tickets for which the engine produces at least one
    /// agent recommendation.
    pub with_agent_recommendation: usize,
    /// Agents below their capacity (uncapped agents always count).
    pub available_agents: usize,
    /// Agents at or over 100% of their capacity.
    pub overloaded_agents: usize,
    /// Mean backlog age in hours.
    pub average_age_hours: f64,
    /// Tickets at or above the high-priority threshold.
    pub high_priority: usize,
    /// Tickets in backlog longer than the aged threshold.
    pub aged: usize,
}

/// One page of backlog plus context and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogSummary {
    /// The requested page of unassigned tickets.
    pub tickets: Vec<Ticket>,
    /// Workload of every agent, in directory order.
    pub agents: Vec<AgentWorkload>,
    /// All active projects.
    pub projects: Vec<Project>,
    /// Statistics over the full backlog (not just the page).
    pub statistics: BacklogStatistics,
}

/// Read-only backlog aggregator.
pub struct BacklogAggregator {
    config: BacklogConfig,
    store: Arc<dyn TicketStore>,
    agents: Arc<dyn AgentDirectory>,
    projects: Arc<dyn ProjectDirectory>,
    engine: Arc<DispatchEngine>,
    workload: WorkloadIndex,
}

impl BacklogAggregator {
    /// Create a new aggregator.
    pub fn new(
        config: BacklogConfig,
        store: Arc<dyn TicketStore>,
        agents: Arc<dyn AgentDirectory>,
        projects: Arc<dyn ProjectDirectory>,
        engine: Arc<DispatchEngine>,
    ) -> Self {
        let workload = WorkloadIndex::new(Arc::clone(&store), Arc::clone(&agents));
        Self {
            config,
            store,
            agents,
            projects,
            engine,
            workload,
        }
    }

    /// Build a backlog summary.
    ///
    /// `page` is zero-based; `page_size = 0` uses the configured default.
    /// The cancel flag is checked between per-ticket and per-agent units
    /// of work; on cancellation the partial result is discarded.
    pub async fn build_summary(
        &self,
        page: usize,
        page_size: usize,
        cancel: &CancelFlag,
    ) -> Result<BacklogSummary, BacklogError> {
        let page_size = if page_size == 0 {
            self.config.page_size
        } else {
            page_size
        };

        let backlog = self.scan_backlog(cancel)?;
        let workloads = self.workload.snapshot_all(cancel)?;
        let agents = self.agents.list()?;
        let projects = self.projects.active_projects()?;

        let mut statistics = BacklogStatistics {
            total_unassigned: backlog.len(),
            ..Default::default()
        };

        let now = Utc::now();
        let mut total_age_hours = 0.0;
        for ticket in &backlog {
            if cancel.is_cancelled() {
                return Err(BacklogError::Cancelled);
            }

            if ticket.project_id.is_some() || ticket.recommended_project_name.is_some() {
                statistics.with_project_recommendation += 1;
            }
            if ticket.priority_score >= self.config.high_priority_threshold {
                statistics.high_priority += 1;
            }
            if ticket.age_hours(now) >= self.config.aged_after_hours {
                statistics.aged += 1;
            }
            total_age_hours += now.signed_duration_since(ticket.created_at).num_seconds() as f64
                / 3600.0;

            if !self.engine.recommend_for(ticket, 1).await?.is_empty() {
                statistics.with_agent_recommendation += 1;
            }
        }
        if !backlog.is_empty() {
            statistics.average_age_hours = total_age_hours / backlog.len() as f64;
        }

        let capacities: HashMap<&str, Option<u32>> = agents
            .iter()
            .map(|a| (a.id.as_str(), a.max_capacity_points))
            .collect();

        for workload in &workloads {
            match capacities.get(workload.agent_id.as_str()).copied().flatten() {
                Some(cap) if workload.effort_points >= cap => statistics.overloaded_agents += 1,
                _ => statistics.available_agents += 1,
            }
        }

        let tickets: Vec<Ticket> = backlog
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .collect();

        metrics::BACKLOG_SUMMARIES.inc();
        debug!(
            "Backlog summary built: {} unassigned, {} agents, {} projects",
            statistics.total_unassigned,
            workloads.len(),
            projects.len()
        );

        Ok(BacklogSummary {
            tickets,
            agents: workloads,
            projects,
            statistics,
        })
    }

    /// Collect every unassigned pending ticket, one store read per page.
    fn scan_backlog(&self, cancel: &CancelFlag) -> Result<Vec<Ticket>, BacklogError> {
        let mut backlog = Vec::new();
        let mut offset = 0i64;

        loop {
            if cancel.is_cancelled() {
                return Err(BacklogError::Cancelled);
            }

            let filter = TicketFilter::new()
                .with_status(TicketStatus::Pending)
                .unassigned()
                .with_limit(SCAN_PAGE_SIZE)
                .with_offset(offset);
            let page = self.store.list(&filter)?;
            let page_len = page.len();
            backlog.extend(page);

            if (page_len as i64) < SCAN_PAGE_SIZE {
                break;
            }
            offset += SCAN_PAGE_SIZE;
        }

        Ok(backlog)
    }
}
