//! # Repository Module
//!
//! One repository per table. Each holds a pool handle and owns the SQL for
//! its table; business rules live in hisaab-core and the services crate.
//!
//! ```text
//! Database ──┬── businesses()      → BusinessRepository
//!            ├── staff_requests()  → StaffRequestRepository
//!            ├── settings()        → SettingsRepository
//!            ├── shifts()          → ShiftRepository
//!            ├── attendance()      → AttendanceRepository
//!            ├── leave()           → LeaveRepository
//!            └── notifications()   → NotificationRepository
//! ```
//!
//! ## State Transitions in SQL
//! Leave and join-request transitions are conditional updates
//! (`... WHERE id = ? AND status = 'pending'`). The repository reports
//! whether a row moved; callers turn `false` into `AlreadyResolved`.

pub mod attendance;
pub mod business;
pub mod leave;
pub mod notification;
pub mod settings;
pub mod shift;
pub mod staff;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use hisaab_core::{Business, PlanTier};

    use crate::{Database, DbConfig};

    pub async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn insert_business(db: &Database, id: &str, join_code: &str) -> Business {
        let now = Utc::now();
        let business = Business {
            id: id.to_string(),
            name: format!("Business {}", id),
            business_type: "retail".to_string(),
            plan: PlanTier::Free,
            join_code: join_code.to_string(),
            created_at: now,
            updated_at: now,
        };
        db.businesses().insert(&business).await.unwrap();
        business
    }
}
