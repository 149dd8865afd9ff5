//! # Validation Module
//!
//! Input validation for the attendance subsystem.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser UI                                                   │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service call (Rust)                                          │
//! │  └── THIS MODULE: join-codes, names, shift windows, date ranges        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (join_code)                                                │
//! │  └── UNIQUE (business_id, staff_id, date)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hisaab_core::validation::{normalize_join_code, parse_time_of_day};
//!
//! assert_eq!(normalize_join_code(" ab12cd34 ").unwrap(), "AB12CD34");
//! assert!(parse_time_of_day("09:00").is_ok());
//! assert!(parse_time_of_day("25:00").is_err());
//! ```

use chrono::{NaiveDate, NaiveTime};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::ShiftInput;
use crate::JOIN_CODE_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a business display name (1-100 characters).
pub fn validate_business_name(name: &str) -> ValidationResult<()> {
    required("name", name, 100)
}

/// Validates a caller-supplied staff id.
pub fn validate_staff_id(staff_id: &str) -> ValidationResult<()> {
    required("staff_id", staff_id, 64)
}

/// Validates a shift name (1-50 characters).
pub fn validate_shift_name(name: &str) -> ValidationResult<()> {
    required("shift name", name, 50)
}

/// Trims and upper-cases a join-code, then checks its shape.
///
/// ## Rules
/// - Exactly 8 characters after trimming
/// - ASCII letters and digits only
pub fn normalize_join_code(code: &str) -> ValidationResult<String> {
    let code = code.trim().to_ascii_uppercase();

    if code.len() != JOIN_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "join_code".to_string(),
            reason: format!("must be {} letters or digits", JOIN_CODE_LENGTH),
        });
    }

    Ok(code)
}

// =============================================================================
// Time Validators
// =============================================================================

/// Parses a local time-of-day in `HH:MM` (or `HH:MM:SS`) form.
pub fn parse_time_of_day(value: &str) -> ValidationResult<NaiveTime> {
    let value = value.trim();

    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidFormat {
            field: "time".to_string(),
            reason: format!("'{}' is not a valid HH:MM time", value),
        })
}

/// Checks `end >= start` for a leave request.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> CoreResult<()> {
    if end < start {
        return Err(CoreError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

/// Validates weekday indices (0 = Sunday .. 6 = Saturday), no duplicates.
pub fn validate_days_of_week(days: &[u8]) -> ValidationResult<()> {
    if let Some(day) = days.iter().find(|d| **d > 6) {
        return Err(ValidationError::OutOfRange {
            field: format!("days_of_week[{}]", day),
            min: 0,
            max: 6,
        });
    }

    for (i, day) in days.iter().enumerate() {
        if days[..i].contains(day) {
            return Err(ValidationError::Duplicate {
                field: "days_of_week".to_string(),
                value: day.to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a shift before it is stored.
///
/// ## Rules
/// - Name is required
/// - Break is at most 8 hours
/// - Weekday indices are 0-6 without duplicates
/// - Net duration `(end - start) - break` is positive, so overnight windows
///   are rejected
pub fn validate_shift(input: &ShiftInput) -> ValidationResult<()> {
    validate_shift_name(&input.name)?;

    if input.break_duration_minutes > 480 {
        return Err(ValidationError::OutOfRange {
            field: "break_duration_minutes".to_string(),
            min: 0,
            max: 480,
        });
    }

    validate_days_of_week(&input.days_of_week)?;

    let net = (input.end_time - input.start_time).num_minutes()
        - i64::from(input.break_duration_minutes);
    if net <= 0 {
        return Err(ValidationError::InvalidFormat {
            field: "shift".to_string(),
            reason: format!(
                "working time {}-{} minus {}m break must be positive",
                input.start_time.format("%H:%M"),
                input.end_time.format("%H:%M"),
                input.break_duration_minutes
            ),
        });
    }

    Ok(())
}

/// Validates a late or overtime threshold (0 to 24 hours).
pub fn validate_threshold_minutes(field: &str, minutes: u32) -> ValidationResult<()> {
    if minutes > 1440 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 1440,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn input(start: NaiveTime, end: NaiveTime, break_minutes: u32) -> ShiftInput {
        ShiftInput {
            name: "Morning".to_string(),
            start_time: start,
            end_time: end,
            break_duration_minutes: break_minutes,
            days_of_week: vec![1, 2, 3, 4, 5],
            is_active: true,
        }
    }

    #[test]
    fn test_join_code_normalization() {
        assert_eq!(normalize_join_code("abcd1234").unwrap(), "ABCD1234");
        assert!(normalize_join_code("ABC").is_err());
        assert!(normalize_join_code("ABCD-123").is_err());
    }

    #[test]
    fn test_names() {
        assert!(validate_business_name("Corner Store").is_ok());
        assert!(validate_business_name("   ").is_err());
        assert!(validate_staff_id("").is_err());
        assert!(validate_shift_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_time_of_day() {
        assert_eq!(parse_time_of_day("09:00").unwrap(), t(9, 0));
        assert_eq!(parse_time_of_day("17:30:00").unwrap(), t(17, 30));
        assert!(parse_time_of_day("noon").is_err());
    }

    #[test]
    fn test_date_range() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(start, start).is_ok());
        assert!(matches!(
            validate_date_range(end, start),
            Err(CoreError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_shift_rules() {
        assert!(validate_shift(&input(t(9, 0), t(17, 0), 30)).is_ok());
        // Zero net duration
        assert!(validate_shift(&input(t(9, 0), t(9, 30), 30)).is_err());
        // Overnight
        assert!(validate_shift(&input(t(22, 0), t(6, 0), 0)).is_err());

        let mut bad_days = input(t(9, 0), t(17, 0), 0);
        bad_days.days_of_week = vec![1, 7];
        assert!(validate_shift(&bad_days).is_err());
        bad_days.days_of_week = vec![1, 1];
        assert!(matches!(
            validate_shift(&bad_days),
            Err(ValidationError::Duplicate { .. })
        ));
    }
}
