//! # Attendance Context
//!
//! Builds every component once and shares the pieces they have in common:
//! one [`Database`], one [`Clock`], one [`Notifier`].
//!
//! ## Startup
//! ```text
//! AttendanceConfig ──validate──► Database::new ──► NotificationDispatcher
//!                                    │                    │ tokio::spawn
//!                                    ▼                    ▼
//!              registry · shifts · attendance · leave · staff · reports
//! ```
//!
//! With notifications disabled no dispatcher runs and events go nowhere.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hisaab_db::Database;

use crate::clock::{Clock, SystemClock};
use crate::config::AttendanceConfig;
use crate::error::AttendanceResult;
use crate::leave::LeaveLedger;
use crate::ledger::AttendanceLedger;
use crate::notify::{
    DispatcherHandle, NoOpSink, NotificationDispatcher, NotificationLog, NotificationSink, Notifier,
};
use crate::registry::BusinessRegistry;
use crate::reports::Reporting;
use crate::shifts::{ShiftCatalog, ShiftDefaults};
use crate::staff::StaffGate;

struct Dispatcher {
    handle: DispatcherHandle,
    task: JoinHandle<()>,
}

pub struct AttendanceContext {
    pub config: AttendanceConfig,
    pub db: Database,
    pub registry: BusinessRegistry,
    pub shifts: ShiftCatalog,
    pub attendance: AttendanceLedger,
    pub leave: LeaveLedger,
    pub staff: StaffGate,
    pub reports: Reporting,
    pub notifications: NotificationLog,
    dispatcher: Option<Dispatcher>,
}

impl AttendanceContext {
    /// Opens the configured database and starts the dispatcher.
    ///
    /// Must be called from inside a tokio runtime.
    pub async fn from_config(config: AttendanceConfig) -> AttendanceResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database_path().display(), "Database ready");

        Self::start(db, Arc::new(SystemClock), config)
    }

    /// Wires components over an existing database, spawning the dispatcher
    /// when notifications are enabled.
    pub fn start(db: Database, clock: Arc<dyn Clock>, config: AttendanceConfig) -> AttendanceResult<Self> {
        if !config.notifications.enabled {
            info!("Notifications disabled");
            return Self::with_sink(db, clock, Arc::new(NoOpSink), config);
        }

        let (dispatcher, sink, handle) = NotificationDispatcher::new(
            &db,
            clock.clone(),
            config.notifications.channel_capacity,
        );
        let task = tokio::spawn(dispatcher.run());

        let mut context = Self::with_sink(db, clock, Arc::new(sink), config)?;
        context.dispatcher = Some(Dispatcher { handle, task });
        Ok(context)
    }

    /// Wires components delivering notifications to `sink`.
    pub fn with_sink(
        db: Database,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
        config: AttendanceConfig,
    ) -> AttendanceResult<Self> {
        let notifier = Notifier::new(sink, config.notifications.owner_recipient.clone());
        let defaults = ShiftDefaults::from_config(&config)?;

        let registry = BusinessRegistry::new(&db, clock.clone(), notifier.clone());
        let shifts = ShiftCatalog::new(&db, clock.clone(), defaults);
        let attendance = AttendanceLedger::new(
            &db,
            registry.clone(),
            shifts.clone(),
            clock.clone(),
            notifier.clone(),
            config.utc_offset(),
        );
        let leave = LeaveLedger::new(&db, registry.clone(), clock.clone(), notifier.clone());
        let staff = StaffGate::new(&db, registry.clone(), clock, notifier);
        let reports = Reporting::new(&db, registry.clone());
        let notifications = NotificationLog::new(&db);

        debug!(offset = %config.utc_offset(), "Attendance components wired");

        Ok(AttendanceContext {
            config,
            db,
            registry,
            shifts,
            attendance,
            leave,
            staff,
            reports,
            notifications,
            dispatcher: None,
        })
    }

    /// Drains queued notifications, then closes the database.
    pub async fn shutdown(self) {
        if let Some(dispatcher) = self.dispatcher {
            dispatcher.handle.shutdown().await;
            if let Err(e) = dispatcher.task.await {
                warn!(?e, "Notification dispatcher ended abnormally");
            }
        }

        self.db.close().await;
        info!("Attendance context shut down");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{database, fixed_clock};
    use hisaab_core::{NewBusiness, NotificationKind, WorkLocation};

    fn new_business(name: &str) -> NewBusiness {
        NewBusiness {
            name: name.to_string(),
            business_type: "restaurant".to_string(),
            join_code: None,
        }
    }

    #[tokio::test]
    async fn test_dispatcher_drains_queue_into_log() {
        let db = database().await;
        let context = AttendanceContext::start(db, fixed_clock(), AttendanceConfig::default()).unwrap();

        let biz = context.registry.create(new_business("Chai Corner")).await.unwrap();
        context
            .attendance
            .check_in(&biz.id, "staff-a", WorkLocation::Onsite, None)
            .await
            .unwrap();

        if let Some(dispatcher) = context.dispatcher.as_ref() {
            dispatcher.handle.shutdown().await;
        }
        let AttendanceContext {
            notifications,
            dispatcher,
            ..
        } = context;
        if let Some(dispatcher) = dispatcher {
            dispatcher.task.await.unwrap();
        }

        let stored = notifications.list_for(&biz.id, Some("owner")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, NotificationKind::StaffCheckin);
        assert_eq!(notifications.unread_count(&biz.id, "owner").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disabled_notifications_store_nothing() {
        let db = database().await;
        let mut config = AttendanceConfig::default();
        config.notifications.enabled = false;
        let context = AttendanceContext::start(db, fixed_clock(), config).unwrap();
        assert!(context.dispatcher.is_none());

        let biz = context.registry.create(new_business("Chai Corner")).await.unwrap();
        context.registry.upgrade_to_premium(&biz.id).await.unwrap();

        let stored = context.notifications.list_for(&biz.id, None).await.unwrap();
        assert!(stored.is_empty());
    }
}
