//! # hisaab-db: Database Layer for Hisaab Attendance
//!
//! This crate provides database access for the attendance subsystem.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hisaab Data Flow                                 │
//! │                                                                         │
//! │  AttendanceLedger::check_in(...)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     hisaab-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ BusinessRepository │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│ AttendanceRepo...  │  │ 001_init   │  │   │
//! │  │   │               │    │ LeaveRepository    │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   UNIQUE (business_id, staff_id, date) on attendance_records    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hisaab_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/hisaab.db")).await?;
//!
//! let business = db.businesses().get_by_join_code("ab12cd34").await?;
//! let today = db.attendance().get_for_day(&biz_id, "staff-a", date).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::attendance::AttendanceRepository;
pub use repository::business::BusinessRepository;
pub use repository::leave::LeaveRepository;
pub use repository::notification::NotificationRepository;
pub use repository::settings::SettingsRepository;
pub use repository::shift::ShiftRepository;
pub use repository::staff::StaffRequestRepository;
