//! # Shift Classification
//!
//! Pure lateness, duration and overtime computations against a shift window.
//!
//! ## Lateness Rule
//! ```text
//!   shift start          start + threshold
//!        │                      │
//!  ──────┼──────────────────────┼─────────────────────►  local time
//!        09:00                 09:10
//!        │◄──── on time ───────►│◄──── late ────────
//!                               ▲
//!                    exactly at the threshold is on time
//! ```
//!
//! The caller picks the window: the staff member's active shift for the day,
//! or a configured default window when the business has no shift.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Shift;

// =============================================================================
// Shift Window
// =============================================================================

/// The time-of-day part of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftWindow {
    #[ts(as = "String")]
    pub start: NaiveTime,
    #[ts(as = "String")]
    pub end: NaiveTime,
    pub break_minutes: u32,
}

impl ShiftWindow {
    pub fn new(start: NaiveTime, end: NaiveTime, break_minutes: u32) -> Self {
        ShiftWindow {
            start,
            end,
            break_minutes,
        }
    }

    /// Net working minutes: `(end - start) - break`.
    ///
    /// Zero or negative for degenerate windows.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes() - i64::from(self.break_minutes)
    }
}

impl Shift {
    #[inline]
    pub fn window(&self) -> ShiftWindow {
        ShiftWindow::new(self.start_time, self.end_time, self.break_duration_minutes)
    }

    /// Net working minutes of the shift.
    #[inline]
    pub fn duration_minutes(&self) -> i64 {
        self.window().duration_minutes()
    }

    /// Checks if the shift runs on the weekday of `date`.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_sunday() as u8;
        self.days_of_week.contains(&weekday)
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Result of classifying a check-in against a shift window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftClassification {
    pub is_late: bool,
    /// Whole minutes past shift start (0 when early).
    pub minutes_after_start: i64,
    #[ts(as = "String")]
    pub expected_end: NaiveTime,
}

/// Classifies a local check-in time against a window.
///
/// ## Example
/// ```rust
/// use chrono::NaiveTime;
/// use hisaab_core::shift::{classify, ShiftWindow};
///
/// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
/// let window = ShiftWindow::new(t(9, 0), t(17, 0), 0);
///
/// assert!(!classify(t(9, 10), &window, 10).is_late);
/// assert!(classify(t(9, 11), &window, 10).is_late);
/// ```
pub fn classify(
    check_in: NaiveTime,
    window: &ShiftWindow,
    late_threshold_minutes: u32,
) -> ShiftClassification {
    // Signed minutes, so a grace window running past midnight does not wrap.
    let after = (check_in - window.start).num_minutes();

    ShiftClassification {
        is_late: after > i64::from(late_threshold_minutes),
        minutes_after_start: after.max(0),
        expected_end: window.end,
    }
}

/// Picks the shift governing `date`.
///
/// Among active shifts running on that weekday, the earliest start wins.
pub fn select_active_shift(shifts: &[Shift], date: NaiveDate) -> Option<&Shift> {
    shifts
        .iter()
        .filter(|shift| shift.is_active && shift.applies_on(date))
        .min_by_key(|shift| shift.start_time)
}

// =============================================================================
// Working Time
// =============================================================================

/// Whole minutes between check-in and check-out.
#[inline]
pub fn worked_minutes(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    (check_out - check_in).num_minutes()
}

/// Hours between check-in and check-out at minute granularity.
///
/// 09:10 → 17:30 is 500 minutes, so 8.333... hours.
pub fn working_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    worked_minutes(check_in, check_out) as f64 / 60.0
}

/// Minutes worked beyond the overtime threshold.
pub fn overtime_minutes(worked_minutes: i64, overtime_threshold_minutes: u32) -> u32 {
    let over = worked_minutes - i64::from(overtime_threshold_minutes);
    u32::try_from(over.max(0)).unwrap_or(u32::MAX)
}

/// Formats minutes as `"7h 30m"`.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

// =============================================================================
// Unit Tests
// =============================================================================
