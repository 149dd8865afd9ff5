//! # hisaab-core: Pure Domain Logic for Attendance & Plan Gating
//!
//! This crate holds the rules of the attendance subsystem as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hisaab Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser UI (out of scope)                    │   │
//! │  │    Check-in Widget ──► Leave Form ──► Analytics Dashboard       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 hisaab-attendance (services)                    │   │
//! │  │    AttendanceLedger, LeaveLedger, StaffGate, Reporting          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hisaab-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   plan    │  │   shift   │  │ analytics │  │   │
//! │  │   │ Business  │  │PlanLimits │  │ classify  │  │StaffStats │  │   │
//! │  │   │ Attendance│  │ headcount │  │ duration  │  │  Report   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    hisaab-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Business, AttendanceRecord, LeaveRequest, Shift, ...)
//! - [`plan`] - Plan tier → capability limits, headcount check
//! - [`shift`] - Lateness / overtime classification against a shift
//! - [`analytics`] - Per-staff and per-business attendance statistics
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use hisaab_core::plan::{check_headcount, PlanTier};
//!
//! let check = check_headcount(PlanTier::Free, 3);
//! assert!(!check.allowed);
//! assert_eq!(check.max_allowed, 3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod error;
pub mod plan;
pub mod shift;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use plan::{PlanLimits, PlanTier};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Length of a business join-code.
pub const JOIN_CODE_LENGTH: usize = 8;

/// Alphabet join-codes are drawn from (upper-case alphanumerics).
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the standard working day used for overtime in reports.
///
/// Fixed on purpose: reports never read it from settings.
pub const STANDARD_WORKDAY_HOURS: f64 = 8.0;

/// Late threshold applied when a business has no attendance settings.
pub const DEFAULT_LATE_THRESHOLD_MINUTES: u32 = 15;

/// Worked minutes after which check-out time counts as overtime.
pub const DEFAULT_OVERTIME_THRESHOLD_MINUTES: u32 = 480;

/// Recipient id used for owner-addressed notifications.
pub const OWNER_RECIPIENT: &str = "owner";
