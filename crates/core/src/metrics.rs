//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Dispatch engine (recommendations, outcomes, retraining)
//! - Batch assignment (per-item results, duration)
//! - Rule engine (denied transitions)
//! - Backlog reporting

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Dispatch Engine Metrics
// =============================================================================

/// Recommendation lists served, by strategy that produced them.
pub static RECOMMENDATIONS_SERVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "triago_recommendations_served_total",
            "Total recommendation lists served",
        ),
        &["strategy"], // "affinity", "least-busy"
    )
    .unwrap()
});

/// Auto-dispatch outcomes.
pub static DISPATCH_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triago_dispatch_outcomes_total", "Total auto-dispatch outcomes"),
        &["result"], // "dispatched", "no_agent"
    )
    .unwrap()
});

/// Affinity model retraining runs.
pub static RETRAIN_RUNS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "triago_retrain_runs_total",
        "Total affinity model retraining runs",
    )
    .unwrap()
});

/// Retraining duration in seconds.
pub static RETRAIN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "triago_retrain_duration_seconds",
            "Duration of affinity model retraining",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
    )
    .unwrap()
});

// =============================================================================
// Batch Assignment Metrics
// =============================================================================

/// Batch items processed, by result.
pub static BATCH_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triago_batch_items_total", "Total batch assignment items"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Batch run duration in seconds.
pub static BATCH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "triago_batch_duration_seconds",
            "Duration of batch assignment runs",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
    )
    .unwrap()
});

// =============================================================================
// Rule Engine & Backlog Metrics
// =============================================================================

/// Status transitions denied by the rule engine on a write path.
pub static TRANSITIONS_DENIED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "triago_transitions_denied_total",
        "Total status transitions denied by policy",
    )
    .unwrap()
});

/// Backlog summaries built.
pub static BACKLOG_SUMMARIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "triago_backlog_summaries_total",
        "Total backlog summaries built",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RECOMMENDATIONS_SERVED.clone()),
        Box::new(DISPATCH_OUTCOMES.clone()),
        Box::new(RETRAIN_RUNS.clone()),
        Box::new(RETRAIN_DURATION.clone()),
        Box::new(BATCH_ITEMS.clone()),
        Box::new(BATCH_DURATION.clone()),
        Box::new(TRANSITIONS_DENIED.clone()),
        Box::new(BACKLOG_SUMMARIES.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }
}
