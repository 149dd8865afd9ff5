//! # Storage Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► AttendanceError::StorageFailure
//!                    │
//!                    └─ UniqueViolation on attendance_records
//!                         ──► AttendanceError::Domain(AlreadyCheckedIn)
//! ```
//!
//! Constraint failures are classified from the driver's error kind, so
//! callers can branch on them instead of matching SQLite message text.

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A `fetch_one` found no row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write.
    ///
    /// ## When This Occurs
    /// - Second attendance record for the same (business, staff, date)
    /// - Join-code already held by another business
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// ## When This Occurs
    /// - A row references a business id that was never stored
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK or NOT NULL constraint rejected the row.
    ///
    /// ## When This Occurs
    /// - Leave end date before start date
    /// - Check-out stored before check-in
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// The store could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement failure reported by SQLite.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored column could not be turned back into a domain value.
    ///
    /// ## When This Occurs
    /// - `shifts.days_of_week` is not a JSON array of weekday indices
    /// - `notifications.data` is not valid JSON
    #[error("Corrupt {column} in row {id}: {reason}")]
    Corrupt {
        column: String,
        id: String,
        reason: String,
    },

    /// Every connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Column list from `UNIQUE constraint failed: t.a, t.b`.
fn unique_columns(message: &str) -> String {
    message
        .split_once(": ")
        .map(|(_, columns)| columns.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: unique_columns(&message),
                        value: "unknown".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation { message }
                    }
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_pool_errors() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_unique_columns() {
        assert_eq!(
            unique_columns(
                "UNIQUE constraint failed: attendance_records.business_id, attendance_records.staff_id, attendance_records.date"
            ),
            "attendance_records.business_id, attendance_records.staff_id, attendance_records.date"
        );
        assert_eq!(unique_columns("garbled"), "unknown");
    }
}
