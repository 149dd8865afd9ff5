//! # Attendance Service Errors
//!
//! The single error type returned by every service in this crate.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CoreError (state machine, validation) ──► AttendanceError::Domain     │
//! │                                                                         │
//! │  DbError (sqlx) ─────────────────────────► AttendanceError::Storage... │
//! │       │                                                                 │
//! │       └─ UniqueViolation on attendance_records ──► Domain(AlreadyCheckedIn)│
//! │          (translated by the ledger, which knows staff and date)         │
//! │                                                                         │
//! │  Notification failures never reach this type: they are logged and      │
//! │  dropped inside the sink.                                               │
//! │                                                                         │
//! │  AttendanceError::code() ──► ErrorCode (SCREAMING_SNAKE_CASE)           │
//! │  so a UI can branch without parsing messages:                           │
//! │                                                                         │
//! │    { "code": "STAFF_LIMIT_REACHED",                                     │
//! │      "message": "Staff limit reached for FREE plan: 3 of 3 active" }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use hisaab_core::{CoreError, ValidationError};
use hisaab_db::DbError;

/// Errors surfaced by the attendance services.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// A domain rule rejected the operation. Actionable by the user.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The store rejected a read or write.
    ///
    /// ## When This Occurs
    /// - Database file unreadable or disk full
    /// - A constraint the services did not anticipate
    /// - A stored column that no longer decodes
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] DbError),

    /// Configuration could not be loaded or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ValidationError> for AttendanceError {
    fn from(err: ValidationError) -> Self {
        AttendanceError::Domain(CoreError::Validation(err))
    }
}

/// Result type for attendance services.
pub type AttendanceResult<T> = Result<T, AttendanceError>;

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidBusiness,
    AlreadyCheckedIn,
    AlreadyCheckedOut,
    NoCheckInFound,
    InvalidCheckOut,
    InvalidDateRange,
    NotFound,
    AlreadyResolved,
    StaffLimitReached,
    ValidationError,
    StorageFailure,
    ConfigError,
}

impl AttendanceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AttendanceError::Domain(err) => match err {
                CoreError::InvalidBusiness(_) => ErrorCode::InvalidBusiness,
                CoreError::AlreadyCheckedIn { .. } => ErrorCode::AlreadyCheckedIn,
                CoreError::AlreadyCheckedOut { .. } => ErrorCode::AlreadyCheckedOut,
                CoreError::NoCheckInFound { .. } => ErrorCode::NoCheckInFound,
                CoreError::CheckOutNotAfterCheckIn => ErrorCode::InvalidCheckOut,
                CoreError::InvalidDateRange { .. } => ErrorCode::InvalidDateRange,
                CoreError::NotFound { .. } => ErrorCode::NotFound,
                CoreError::AlreadyResolved { .. } => ErrorCode::AlreadyResolved,
                CoreError::StaffLimitReached { .. } => ErrorCode::StaffLimitReached,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            AttendanceError::StorageFailure(_) => ErrorCode::StorageFailure,
            AttendanceError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// The domain error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            AttendanceError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

/// Serializable form handed to a UI.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&AttendanceError> for ErrorPayload {
    fn from(err: &AttendanceError) -> Self {
        if let AttendanceError::StorageFailure(inner) = err {
            tracing::error!("Storage failure: {}", inner);
        }

        ErrorPayload {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hisaab_core::PlanTier;

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let err = AttendanceError::from(CoreError::StaffLimitReached {
            plan: PlanTier::Free,
            current_active_count: 3,
            max_allowed: 3,
        });
        let payload = ErrorPayload::from(&err);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["code"], "STAFF_LIMIT_REACHED");
        assert_eq!(
            json["message"],
            "Staff limit reached for FREE plan: 3 of 3 active"
        );
    }

    #[test]
    fn test_storage_and_validation_codes() {
        let storage = AttendanceError::from(DbError::PoolExhausted);
        assert_eq!(storage.code(), ErrorCode::StorageFailure);
        assert!(storage.as_domain().is_none());

        let validation = AttendanceError::from(ValidationError::Required {
            field: "staff_id".into(),
        });
        assert_eq!(validation.code(), ErrorCode::ValidationError);
    }
}
