//! # Notifications
//!
//! Fire-and-forget delivery of ledger events plus the stored notification log.
//!
//! ## Delivery Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Notification Flow                                    │
//! │                                                                         │
//! │  AttendanceLedger / LeaveLedger / StaffGate / BusinessRegistry          │
//! │         │                                                               │
//! │         │ Notifier::to_owner / to_staff  never awaits, never fails      │
//! │         ▼                                                               │
//! │  ┌──────────────────┐   try_send    ┌───────────────────────────────┐  │
//! │  │   ChannelSink    │──────────────►│  bounded mpsc (capacity 256)  │  │
//! │  └──────────────────┘               └───────────────┬───────────────┘  │
//! │         │ Full / Closed                             │                  │
//! │         ▼                                           ▼                  │
//! │  warn!() and drop                 ┌───────────────────────────────┐    │
//! │                                   │   NotificationDispatcher      │    │
//! │                                   │   (spawned tokio task)        │    │
//! │                                   │                               │    │
//! │                                   │   INSERT INTO notifications   │    │
//! │                                   │   store errors: error!()      │    │
//! │                                   └───────────────────────────────┘    │
//! │                                                                         │
//! │  DispatcherHandle::shutdown() drains what is queued, then stops.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use hisaab_core::{
    CoreError, NotificationEvent, NotificationKind, StoredNotification, OWNER_RECIPIENT,
};
use hisaab_db::{Database, NotificationRepository};

use crate::clock::Clock;
use crate::error::AttendanceResult;

// =============================================================================
// Sink
// =============================================================================

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Receiver of notification events.
///
/// Implementations must not block; the ledgers call this inline.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError>;
}

/// A sink plus the recipient id used for owner-facing events.
///
/// Every send is fire-and-forget: failures are logged and dropped.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    owner_recipient: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, owner_recipient: impl Into<String>) -> Self {
        Notifier {
            sink,
            owner_recipient: owner_recipient.into(),
        }
    }

    /// A notifier that discards everything.
    pub fn disabled() -> Self {
        Notifier::new(Arc::new(NoOpSink), OWNER_RECIPIENT)
    }

    pub fn owner_recipient(&self) -> &str {
        &self.owner_recipient
    }

    pub(crate) fn to_owner(
        &self,
        business_id: &str,
        kind: NotificationKind,
        title: &str,
        message: String,
        data: serde_json::Value,
    ) {
        self.send(NotificationEvent {
            business_id: business_id.to_string(),
            recipient_id: self.owner_recipient.clone(),
            kind,
            title: title.to_string(),
            message,
            data,
        });
    }

    pub(crate) fn to_staff(
        &self,
        business_id: &str,
        staff_id: &str,
        kind: NotificationKind,
        title: &str,
        message: String,
        data: serde_json::Value,
    ) {
        self.send(NotificationEvent {
            business_id: business_id.to_string(),
            recipient_id: staff_id.to_string(),
            kind,
            title: title.to_string(),
            message,
            data,
        });
    }

    fn send(&self, event: NotificationEvent) {
        let kind = event.kind;
        let business_id = event.business_id.clone();

        if let Err(e) = self.sink.notify(event) {
            warn!(
                kind = kind.as_str(),
                business_id = %business_id,
                error = %e,
                "Notification dropped"
            );
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn notify(&self, _event: NotificationEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Keeps events in memory, for tests and previews.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
        Ok(())
    }
}

/// Front end of the dispatcher queue.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<NotificationEvent>,
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Background task writing queued events to the notification log.
pub struct NotificationDispatcher {
    notifications: NotificationRepository,
    clock: Arc<dyn Clock>,
    rx: mpsc::Receiver<NotificationEvent>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl DispatcherHandle {
    /// Asks the dispatcher to drain its queue and stop.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Notification dispatcher already stopped");
        }
    }
}

impl NotificationDispatcher {
    /// Creates the dispatcher, the sink feeding it, and its handle.
    pub fn new(
        db: &Database,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> (Self, ChannelSink, DispatcherHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let dispatcher = NotificationDispatcher {
            notifications: db.notifications(),
            clock,
            rx,
            shutdown_rx,
        };

        (dispatcher, ChannelSink { tx }, DispatcherHandle { shutdown_tx })
    }

    /// Runs until shutdown or until every sink is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Notification dispatcher starting");

        loop {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => self.store(event).await,
                    None => break,
                },

                _ = self.shutdown_rx.recv() => {
                    while let Ok(event) = self.rx.try_recv() {
                        self.store(event).await;
                    }
                    break;
                }
            }
        }

        info!("Notification dispatcher stopped");
    }

    async fn store(&self, event: NotificationEvent) {
        let notification = StoredNotification {
            id: format!("notif_{}", Uuid::new_v4()),
            business_id: event.business_id,
            recipient_id: event.recipient_id,
            kind: event.kind,
            title: event.title,
            message: event.message,
            data: event.data,
            is_read: false,
            created_at: self.clock.now(),
        };

        if let Err(e) = self.notifications.insert(&notification).await {
            error!(?e, kind = notification.kind.as_str(), "Failed to store notification");
        }
    }
}

// =============================================================================
// Notification Log
// =============================================================================

/// Read side of stored notifications.
#[derive(Debug, Clone)]
pub struct NotificationLog {
    notifications: NotificationRepository,
}

impl NotificationLog {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new(db: &Database) -> Self {
        NotificationLog {
            notifications: db.notifications(),
        }
    }

    /// Newest first; all recipients when `recipient_id` is `None`.
    pub async fn list_for(
        &self,
        business_id: &str,
        recipient_id: Option<&str>,
    ) -> AttendanceResult<Vec<StoredNotification>> {
        Ok(self
            .notifications
            .list_for(business_id, recipient_id, Self::DEFAULT_LIMIT)
            .await?)
    }

    pub async fn mark_read(&self, id: &str) -> AttendanceResult<()> {
        if !self.notifications.mark_read(id).await? {
            return Err(CoreError::not_found("Notification", id).into());
        }
        Ok(())
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(&self, business_id: &str, recipient_id: &str) -> AttendanceResult<u64> {
        Ok(self
            .notifications
            .mark_all_read(business_id, recipient_id)
            .await?)
    }

    pub async fn unread_count(&self, business_id: &str, recipient_id: &str) -> AttendanceResult<u32> {
        Ok(self
            .notifications
            .unread_count(business_id, recipient_id)
            .await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::test_support::{business, database};
    use chrono::{TimeZone, Utc};

    fn event(business_id: &str, kind: NotificationKind) -> NotificationEvent {
        NotificationEvent {
            business_id: business_id.to_string(),
            recipient_id: "owner".to_string(),
            kind,
            title: "Staff Check-in".to_string(),
            message: "Ayesha checked in".to_string(),
            data: serde_json::json!({ "staffId": "staff-a" }),
        }
    }

    #[tokio::test]
    async fn test_dispatcher_stores_queued_events_on_shutdown() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap(),
        ));

        let (dispatcher, sink, handle) = NotificationDispatcher::new(&db, clock, 8);
        sink.notify(event(&biz.id, NotificationKind::StaffCheckin)).unwrap();
        sink.notify(event(&biz.id, NotificationKind::StaffCheckout)).unwrap();

        let task = tokio::spawn(dispatcher.run());
        handle.shutdown().await;
        task.await.unwrap();

        let log = NotificationLog::new(&db);
        let stored = log.list_for(&biz.id, Some("owner")).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|n| n.id.starts_with("notif_")));
        assert_eq!(log.unread_count(&biz.id, "owner").await.unwrap(), 2);

        log.mark_read(&stored[0].id).await.unwrap();
        assert_eq!(log.unread_count(&biz.id, "owner").await.unwrap(), 1);
        assert_eq!(log.mark_all_read(&biz.id, "owner").await.unwrap(), 1);

        let err = log.mark_read("notif_missing").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_full_queue_is_reported_not_blocking() {
        let db = database().await;
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let (_dispatcher, sink, _handle) = NotificationDispatcher::new(&db, clock, 1);

        sink.notify(event("biz_1", NotificationKind::StaffCheckin)).unwrap();
        let err = sink
            .notify(event("biz_1", NotificationKind::StaffCheckin))
            .unwrap_err();
        assert!(matches!(err, NotifyError::QueueFull));
    }

    #[tokio::test]
    async fn test_closed_queue_is_reported() {
        let db = database().await;
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let (dispatcher, sink, _handle) = NotificationDispatcher::new(&db, clock, 4);
        drop(dispatcher);

        let err = sink
            .notify(event("biz_1", NotificationKind::LeaveRequest))
            .unwrap_err();
        assert!(matches!(err, NotifyError::QueueClosed));
    }
}
