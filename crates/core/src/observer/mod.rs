//! Assignment observers and notification sinks.
//!
//! Observers are invoked best-effort after a mutation lands: each
//! observer's failure is caught and logged individually, so one broken
//! listener can neither abort the mutation nor starve the others.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::agent::Agent;
use crate::ticket::Ticket;

/// Listener for ticket mutations produced by the dispatch paths.
#[async_trait]
pub trait AssignmentObserver: Send + Sync {
    /// Name of this observer for logging.
    fn name(&self) -> &str;

    /// A ticket was assigned to an agent.
    async fn on_assigned(&self, ticket: &Ticket, agent: &Agent) -> anyhow::Result<()>;

    /// A ticket was updated without an agent being resolved.
    async fn on_updated(&self, ticket: &Ticket) -> anyhow::Result<()>;
}

/// A set of observers notified in parallel with per-observer error
/// isolation.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn AssignmentObserver>>,
}

impl ObserverSet {
    /// Create an empty observer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn with_observer(mut self, observer: Arc<dyn AssignmentObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns true if no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Notify all observers of an assignment. Failures are logged per
    /// observer and never propagated.
    pub async fn notify_assigned(&self, ticket: &Ticket, agent: &Agent) {
        let results = join_all(
            self.observers
                .iter()
                .map(|o| async move { (o.name().to_string(), o.on_assigned(ticket, agent).await) }),
        )
        .await;

        for (name, result) in results {
            if let Err(e) = result {
                warn!("Observer {} failed on assignment of {}: {}", name, ticket.id, e);
            }
        }
    }

    /// Notify all observers of a plain update. Failures are logged per
    /// observer and never propagated.
    pub async fn notify_updated(&self, ticket: &Ticket) {
        let results = join_all(
            self.observers
                .iter()
                .map(|o| async move { (o.name().to_string(), o.on_updated(ticket).await) }),
        )
        .await;

        for (name, result) in results {
            if let Err(e) = result {
                warn!("Observer {} failed on update of {}: {}", name, ticket.id, e);
            }
        }
    }
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A queued notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub user_id: String,
    pub message: String,
    pub link: Option<String>,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

/// Fire-and-forget delivery of user notifications. Delivery itself is an
/// external concern; the core only hands messages over.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: &str, message: &str, link: Option<&str>, severity: Severity);
}

/// Notification sink backed by an async channel.
///
/// Cheaply cloneable and shareable across tasks. If the channel is full
/// or closed the notification is dropped with a log line - the caller is
/// never blocked or failed.
#[derive(Clone)]
pub struct ChannelNotificationSink {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotificationSink {
    /// Create a sink from a channel sender.
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl NotificationSink for ChannelNotificationSink {
    async fn notify(&self, user_id: &str, message: &str, link: Option<&str>, severity: Severity) {
        let notification = Notification {
            user_id: user_id.to_string(),
            message: message.to_string(),
            link: link.map(|l| l.to_string()),
            severity,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.tx.send(notification).await {
            tracing::error!("Failed to queue notification: {}", e);
        }
    }
}

/// Observer adapter that notifies the assigned agent through a sink.
pub struct NotifyAssigneeObserver {
    sink: Arc<dyn NotificationSink>,
}

impl NotifyAssigneeObserver {
    /// Create an observer that notifies assignees via the given sink.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl AssignmentObserver for NotifyAssigneeObserver {
    fn name(&self) -> &str {
        "notify-assignee"
    }

    async fn on_assigned(&self, ticket: &Ticket, agent: &Agent) -> anyhow::Result<()> {
        self.sink
            .notify(
                &agent.id,
                &format!("Ticket assigned: {}", ticket.title),
                Some(&format!("/tickets/{}", ticket.id)),
                Severity::Info,
            )
            .await;
        Ok(())
    }

    async fn on_updated(&self, _ticket: &Ticket) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, RecordingObserver};

    #[tokio::test]
    async fn test_all_observers_are_notified() {
        let first = Arc::new(RecordingObserver::new("first"));
        let second = Arc::new(RecordingObserver::new("second"));

        let set = ObserverSet::new()
            .with_observer(Arc::clone(&first) as Arc<dyn AssignmentObserver>)
            .with_observer(Arc::clone(&second) as Arc<dyn AssignmentObserver>);

        let ticket = fixtures::ticket("observed");
        let agent = fixtures::agent("a-1", "Dana");
        set.notify_assigned(&ticket, &agent).await;

        assert_eq!(first.assigned_calls().await.len(), 1);
        assert_eq!(second.assigned_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_observer_does_not_starve_others() {
        let failing = Arc::new(RecordingObserver::new("failing"));
        failing.fail_next();
        let healthy = Arc::new(RecordingObserver::new("healthy"));

        let set = ObserverSet::new()
            .with_observer(Arc::clone(&failing) as Arc<dyn AssignmentObserver>)
            .with_observer(Arc::clone(&healthy) as Arc<dyn AssignmentObserver>);

        let ticket = fixtures::ticket("observed");
        let agent = fixtures::agent("a-1", "Dana");

        // Must not panic or propagate the failure.
        set.notify_assigned(&ticket, &agent).await;
        assert_eq!(healthy.assigned_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_notify_updated() {
        let observer = Arc::new(RecordingObserver::new("watcher"));
        let set =
            ObserverSet::new().with_observer(Arc::clone(&observer) as Arc<dyn AssignmentObserver>);

        let ticket = fixtures::ticket("updated");
        set.notify_updated(&ticket).await;

        assert_eq!(observer.updated_calls().await, vec![ticket.id]);
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_notification() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChannelNotificationSink::new(tx);

        sink.notify("a-1", "hello", Some("/tickets/t-1"), Severity::Info)
            .await;

        let notification = rx.recv().await.expect("notification queued");
        assert_eq!(notification.user_id, "a-1");
        assert_eq!(notification.message, "hello");
        assert_eq!(notification.link.as_deref(), Some("/tickets/t-1"));
    }

    #[tokio::test]
    async fn test_channel_sink_survives_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        let sink = ChannelNotificationSink::new(tx);
        drop(rx);

        // Logs and drops, must not panic.
        sink.notify("a-1", "void", None, Severity::Warning).await;
    }

    #[tokio::test]
    async fn test_notify_assignee_observer() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = Arc::new(ChannelNotificationSink::new(tx));
        let observer = NotifyAssigneeObserver::new(sink);

        let ticket = fixtures::ticket("needs eyes");
        let agent = fixtures::agent("a-9", "Kim");
        observer.on_assigned(&ticket, &agent).await.unwrap();

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.user_id, "a-9");
        assert!(notification.message.contains("needs eyes"));
    }
}
