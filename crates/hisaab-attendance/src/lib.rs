//! # hisaab-attendance: Attendance, Leave and Plan-Gating Services
//!
//! Injectable components on top of [`hisaab_db`]: daily check-in/check-out,
//! leave approval, staff join approval gated by the subscription plan, and
//! monthly reports.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        AttendanceContext                                │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌────────────────┐  ┌────────────────────────┐  │
//! │  │ BusinessRegistry │  │  ShiftCatalog  │  │   AttendanceLedger     │  │
//! │  │                  │  │                │  │                        │  │
//! │  │ join-codes, plan │  │ shifts and     │  │ one record per staff   │  │
//! │  │ upgrade          │  │ thresholds     │  │ per local day          │  │
//! │  └──────────────────┘  └────────────────┘  └────────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌────────────────┐  ┌────────────────────────┐  │
//! │  │   LeaveLedger    │  │   StaffGate    │  │      Reporting         │  │
//! │  │                  │  │                │  │                        │  │
//! │  │ pending →        │  │ FREE 3 staff   │  │ monthly stats, premium │  │
//! │  │ approved/rejected│  │ PREMIUM 30     │  │ leaderboard and trends │  │
//! │  └──────────────────┘  └────────────────┘  └────────────────────────┘  │
//! │                                                                         │
//! │  Every component: Arc<dyn Clock> for time, Notifier for events.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Service error type and stable error codes
//! - [`clock`] - Injectable time source
//! - [`notify`] - Notification sinks, dispatcher and stored log
//! - [`registry`] - Businesses and join-codes
//! - [`shifts`] - Shift definitions and per-business settings
//! - [`ledger`] - Check-in / check-out
//! - [`leave`] - Leave requests
//! - [`staff`] - Staff join requests and the headcount gate
//! - [`reports`] - Monthly reports
//! - [`context`] - Wiring
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hisaab_attendance::{AttendanceConfig, AttendanceContext};
//! use hisaab_core::WorkLocation;
//!
//! hisaab_attendance::init_tracing();
//! let context = AttendanceContext::from_config(AttendanceConfig::load_or_default(None)).await?;
//!
//! let record = context
//!     .attendance
//!     .check_in(&business_id, "staff-a", WorkLocation::Onsite, None)
//!     .await?;
//! println!("late: {}", record.is_late);
//!
//! context.shutdown().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod leave;
pub mod ledger;
pub mod notify;
pub mod registry;
pub mod reports;
pub mod shifts;
pub mod staff;

// =============================================================================
// Re-exports
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AttendanceConfig;
pub use context::AttendanceContext;
pub use error::{AttendanceError, AttendanceResult, ErrorCode, ErrorPayload};
pub use leave::LeaveLedger;
pub use ledger::AttendanceLedger;
pub use notify::{NotificationLog, NotificationSink, Notifier, NotifyError};
pub use registry::BusinessRegistry;
pub use reports::Reporting;
pub use shifts::{ShiftCatalog, ShiftDefaults};
pub use staff::StaffGate;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,hisaab=debug,sqlx=warn";

/// Installs a `fmt` subscriber honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

// =============================================================================
// Test Support
// =============================================================================
