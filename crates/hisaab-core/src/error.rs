//! # Error Types
//!
//! Domain-specific error types for hisaab-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hisaab-core errors (this file)                                        │
//! │  ├── CoreError        - State-machine and plan-gate violations         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hisaab-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  hisaab-attendance errors                                              │
//! │  └── AttendanceError  - What callers see (with an error code)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                        DbError ─────┴──► AttendanceError → UI          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is actionable by an end user ("already checked in
//! today", "staff limit reached"), so messages are written for display.

use thiserror::Error;

use crate::plan::PlanTier;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by the attendance and leave state machines.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced business id or join-code does not resolve.
    #[error("Invalid business: {0}")]
    InvalidBusiness(String),

    /// A record already exists for this staff member today.
    #[error("Staff {staff_id} already checked in on {date}")]
    AlreadyCheckedIn { staff_id: String, date: String },

    /// Today's record already has a check-out time.
    #[error("Staff {staff_id} already checked out on {date}")]
    AlreadyCheckedOut { staff_id: String, date: String },

    /// Check-out attempted without a check-in for today.
    #[error("No check-in found for staff {staff_id} on {date}")]
    NoCheckInFound { staff_id: String, date: String },

    /// The clock did not move past the check-in instant.
    ///
    /// ## When This Occurs
    /// - Check-out in the same instant as check-in
    /// - Clock skew moving local time backwards
    #[error("Check-out must be after check-in")]
    CheckOutNotAfterCheckIn,

    /// Leave end date is before its start date.
    #[error("Invalid date range: {end} is before {start}")]
    InvalidDateRange { start: String, end: String },

    /// Request id (leave or join-request) is unknown.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Request already left the pending state.
    #[error("{entity} {id} is already {status}")]
    AlreadyResolved {
        entity: String,
        id: String,
        status: String,
    },

    /// Plan headcount gate tripped.
    ///
    /// ## User Workflow
    /// ```text
    /// Owner approves 4th join-request on FREE
    ///      │
    ///      ▼
    /// count_active = 3, max_staff = 3
    ///      │
    ///      ▼
    /// StaffLimitReached { current_active_count: 3, max_allowed: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Staff limit reached (3/3). Upgrade to Premium."
    /// ```
    #[error("Staff limit reached for {plan} plan: {current_active_count} of {max_allowed} active")]
    StaffLimitReached {
        plan: PlanTier,
        current_active_count: u32,
        max_allowed: u32,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an AlreadyResolved error.
    pub fn already_resolved(
        entity: impl Into<String>,
        id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        CoreError::AlreadyResolved {
            entity: entity.into(),
            id: id.into(),
            status: status.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before any state is read or written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., bad time-of-day, bad join-code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., join-code already taken).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_limit_message_carries_counts() {
        let err = CoreError::StaffLimitReached {
            plan: PlanTier::Free,
            current_active_count: 3,
            max_allowed: 3,
        };
        assert_eq!(
            err.to_string(),
            "Staff limit reached for FREE plan: 3 of 3 active"
        );
    }

    #[test]
    fn test_state_machine_messages() {
        let err = CoreError::AlreadyCheckedIn {
            staff_id: "staff-a".to_string(),
            date: "2024-03-10".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Staff staff-a already checked in on 2024-03-10"
        );

        let err = CoreError::already_resolved("Leave request", "lr-1", "approved");
        assert_eq!(err.to_string(), "Leave request lr-1 is already approved");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "staff_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
