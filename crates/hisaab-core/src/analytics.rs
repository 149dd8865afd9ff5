//! # Attendance Analytics
//!
//! Pure statistics over a snapshot of attendance records and leave requests.
//!
//! ## Report Assembly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  records (month) ──► staff_stats() per staff ──► summarize()           │
//! │  approved leave  ──► leave days per staff ──┘          │               │
//! │                                                        ▼               │
//! │                                         ┌─────────────────────────┐    │
//! │                                         │    AttendanceReport     │    │
//! │                                         │  staff[], summary       │    │
//! │  records (previous month) ──────────────►  premium: Option<...>   │    │
//! │                                         │   leaderboard, trends   │    │
//! │                                         │   (None on FREE)        │    │
//! │                                         └─────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Percentages are floats in `[0, 100]` and are never rounded here
//! - `0 / 0` is `0`, never NaN
//! - Overtime uses a fixed 8-hour day ([`crate::STANDARD_WORKDAY_HOURS`])

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::plan::{Capability, PlanTier};
use crate::types::{AttendanceRecord, LeaveRequest, LeaveStatus};
use crate::STANDARD_WORKDAY_HOURS;

// =============================================================================
// Report Period
// =============================================================================

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportPeriod {
    pub fn new(year: i32, month: u32) -> CoreResult<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            }
            .into());
        }
        Ok(ReportPeriod { year, month })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        ReportPeriod {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or_default()
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            ReportPeriod {
                year: self.year - 1,
                month: 12,
            }
        } else {
            ReportPeriod {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            ReportPeriod {
                year: self.year + 1,
                month: 1,
            }
        } else {
            ReportPeriod {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// =============================================================================
// Per-Staff Statistics
// =============================================================================

/// One staff member's attendance over a period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffAttendanceStats {
    pub staff_id: String,
    pub total_days: u32,
    pub present_days: u32,
    pub late_days: u32,
    pub absent_days: u32,
    pub wfh_days: u32,
    pub attendance_percentage: f64,
    pub punctuality_score: f64,
    pub average_working_hours: f64,
    pub total_working_hours: f64,
    pub overtime_hours: f64,
    /// Approved leave days inside the period.
    pub leave_days: u32,
}

#[inline]
fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).clamp(0.0, 100.0)
}

#[inline]
fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

/// Computes statistics for one staff member's records.
///
/// Records belonging to other staff are the caller's problem; they are
/// counted as given.
pub fn staff_stats<'a, I>(staff_id: &str, records: I) -> StaffAttendanceStats
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut stats = StaffAttendanceStats {
        staff_id: staff_id.to_string(),
        ..Default::default()
    };
    let mut hours = Vec::new();

    for record in records {
        stats.total_days += 1;
        if record.is_present() {
            stats.present_days += 1;
        }
        if record.is_late {
            stats.late_days += 1;
        }
        if record.is_wfh() {
            stats.wfh_days += 1;
        }
        if let Some(h) = record.working_hours {
            hours.push(h);
        }
    }

    stats.absent_days = stats.total_days.saturating_sub(stats.present_days);
    stats.attendance_percentage = percentage(stats.present_days, stats.total_days);
    stats.punctuality_score = percentage(
        stats.present_days.saturating_sub(stats.late_days),
        stats.present_days,
    );
    stats.total_working_hours = hours.iter().sum();
    stats.overtime_hours = hours
        .iter()
        .map(|h| (h - STANDARD_WORKDAY_HOURS).max(0.0))
        .sum();
    stats.average_working_hours = mean(hours.into_iter());

    stats
}

/// Groups records by staff and computes stats for each, ordered by staff id.
pub fn compute_staff_stats(records: &[AttendanceRecord]) -> Vec<StaffAttendanceStats> {
    let mut by_staff: BTreeMap<&str, Vec<&AttendanceRecord>> = BTreeMap::new();
    for record in records {
        by_staff
            .entry(record.staff_id.as_str())
            .or_default()
            .push(record);
    }

    by_staff
        .into_iter()
        .map(|(staff_id, rows)| staff_stats(staff_id, rows))
        .collect()
}

// =============================================================================
// Per-Business Summary
// =============================================================================

/// Business-wide figures for a period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessAttendanceSummary {
    pub staff_count: u32,
    pub total_records: u32,
    /// Mean of staff attendance percentages.
    pub average_attendance: f64,
    /// Mean of staff punctuality scores.
    pub punctuality_rate: f64,
    /// WFH records over all records.
    pub wfh_utilization: f64,
    pub total_working_hours: f64,
    pub total_overtime_hours: f64,
    pub total_leave_days: u32,
}

/// Aggregates per-staff stats and the raw records they came from.
pub fn summarize(
    stats: &[StaffAttendanceStats],
    records: &[AttendanceRecord],
) -> BusinessAttendanceSummary {
    let total_records = u32::try_from(records.len()).unwrap_or(u32::MAX);
    let wfh_records = u32::try_from(records.iter().filter(|r| r.is_wfh()).count())
        .unwrap_or(u32::MAX);

    BusinessAttendanceSummary {
        staff_count: u32::try_from(stats.len()).unwrap_or(u32::MAX),
        total_records,
        average_attendance: mean(stats.iter().map(|s| s.attendance_percentage)),
        punctuality_rate: mean(stats.iter().map(|s| s.punctuality_score)),
        wfh_utilization: percentage(wfh_records, total_records),
        total_working_hours: stats.iter().map(|s| s.total_working_hours).sum(),
        total_overtime_hours: stats.iter().map(|s| s.overtime_hours).sum(),
        total_leave_days: stats.iter().map(|s| s.leave_days).sum(),
    }
}

// =============================================================================
// Premium Insights
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    /// 1-based.
    pub rank: u32,
    pub staff_id: String,
    pub attendance_percentage: f64,
    pub punctuality_score: f64,
    pub late_days: u32,
}

/// Ranks staff by attendance, then punctuality, then fewer late days.
///
/// Remaining ties keep staff id order.
pub fn leaderboard(stats: &[StaffAttendanceStats]) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&StaffAttendanceStats> = stats.iter().collect();
    ranked.sort_by(|a, b| {
        b.attendance_percentage
            .total_cmp(&a.attendance_percentage)
            .then(b.punctuality_score.total_cmp(&a.punctuality_score))
            .then(a.late_days.cmp(&b.late_days))
            .then(a.staff_id.cmp(&b.staff_id))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, s)| LeaderboardEntry {
            rank: u32::try_from(i + 1).unwrap_or(u32::MAX),
            staff_id: s.staff_id.clone(),
            attendance_percentage: s.attendance_percentage,
            punctuality_score: s.punctuality_score,
            late_days: s.late_days,
        })
        .collect()
}

/// Month-over-month change, in percentage points or hours.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttendanceTrends {
    pub attendance_change: f64,
    pub punctuality_change: f64,
    pub wfh_utilization_change: f64,
    pub working_hours_change: f64,
}

/// Differences between two summaries (`current - previous`).
pub fn trends(
    current: &BusinessAttendanceSummary,
    previous: &BusinessAttendanceSummary,
) -> AttendanceTrends {
    AttendanceTrends {
        attendance_change: current.average_attendance - previous.average_attendance,
        punctuality_change: current.punctuality_rate - previous.punctuality_rate,
        wfh_utilization_change: current.wfh_utilization - previous.wfh_utilization,
        working_hours_change: current.total_working_hours - previous.total_working_hours,
    }
}

/// Sections only PREMIUM reports carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PremiumInsights {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub trends: AttendanceTrends,
}

// =============================================================================
// Report
// =============================================================================

/// Monthly attendance report for one business.
///
/// `premium` is absent, not zeroed, on plans without advanced analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttendanceReport {
    pub business_id: String,
    pub plan: PlanTier,
    pub period: ReportPeriod,
    pub staff: Vec<StaffAttendanceStats>,
    pub summary: BusinessAttendanceSummary,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub premium: Option<PremiumInsights>,
}

/// Inputs to [`build_report`], all already loaded from storage.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub business_id: &'a str,
    pub plan: PlanTier,
    pub period: ReportPeriod,
    pub records: &'a [AttendanceRecord],
    pub previous_records: &'a [AttendanceRecord],
    pub leave_requests: &'a [LeaveRequest],
}

/// Approved leave days per staff member inside the period.
pub fn leave_days_by_staff(
    leave_requests: &[LeaveRequest],
    period: ReportPeriod,
) -> BTreeMap<String, u32> {
    let (first, last) = (period.first_day(), period.last_day());
    let mut days: BTreeMap<String, u32> = BTreeMap::new();

    for request in leave_requests
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved)
    {
        let overlap = u32::try_from(request.overlap_days(first, last)).unwrap_or(0);
        if overlap > 0 {
            *days.entry(request.staff_id.clone()).or_default() += overlap;
        }
    }

    days
}

fn stats_with_leave(
    records: &[AttendanceRecord],
    leave_days: &BTreeMap<String, u32>,
) -> Vec<StaffAttendanceStats> {
    let mut by_staff: BTreeMap<String, StaffAttendanceStats> = compute_staff_stats(records)
        .into_iter()
        .map(|s| (s.staff_id.clone(), s))
        .collect();

    for (staff_id, days) in leave_days {
        by_staff
            .entry(staff_id.clone())
            .or_insert_with(|| staff_stats(staff_id, std::iter::empty()))
            .leave_days = *days;
    }

    by_staff.into_values().collect()
}

/// Builds the monthly report, gating premium sections on the plan.
pub fn build_report(input: ReportInput<'_>) -> AttendanceReport {
    let leave_days = leave_days_by_staff(input.leave_requests, input.period);
    let staff = stats_with_leave(input.records, &leave_days);
    let summary = summarize(&staff, input.records);

    let limits = input.plan.limits();
    let premium = if limits.allows(Capability::AdvancedAnalytics) {
        let previous_leave = leave_days_by_staff(input.leave_requests, input.period.previous());
        let previous_staff = stats_with_leave(input.previous_records, &previous_leave);
        let previous_summary = summarize(&previous_staff, input.previous_records);

        Some(PremiumInsights {
            leaderboard: if limits.allows(Capability::Leaderboards) {
                leaderboard(&staff)
            } else {
                Vec::new()
            },
            trends: if limits.allows(Capability::TrendAnalysis) {
                trends(&summary, &previous_summary)
            } else {
                AttendanceTrends::default()
            },
        })
    } else {
        None
    };

    AttendanceReport {
        business_id: input.business_id.to_string(),
        plan: input.plan,
        period: input.period,
        staff,
        summary,
        premium,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttendanceStatus, LeaveType, WorkLocation};
    use chrono::Utc;

    fn record(staff: &str, day: u32, hours: Option<f64>, late: bool) -> AttendanceRecord {
        let now = Utc::now();
        AttendanceRecord {
            id: format!("{}-{}", staff, day),
            business_id: "biz_1".to_string(),
            staff_id: staff.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            check_in_time: Some(now),
            check_out_time: hours.map(|_| now),
            work_location: WorkLocation::Onsite,
            coordinates: None,
            status: AttendanceStatus::Present,
            is_late: late,
            working_hours: hours,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_overtime_sums_positive_excess_only() {
        let records = vec![
            record("a", 1, Some(9.0), false),
            record("a", 2, Some(7.5), false),
            record("a", 3, Some(10.0), false),
        ];
        let stats = staff_stats("a", &records);

        assert!((stats.overtime_hours - 3.0).abs() < 1e-9);
        assert!((stats.total_working_hours - 26.5).abs() < 1e-9);
        assert!((stats.average_working_hours - 26.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_staff_yields_zero_not_nan() {
        let stats = staff_stats("ghost", std::iter::empty());
        assert_eq!(stats.attendance_percentage, 0.0);
        assert_eq!(stats.punctuality_score, 0.0);
        assert_eq!(stats.average_working_hours, 0.0);

        let summary = summarize(&[], &[]);
        assert_eq!(summary.average_attendance, 0.0);
        assert_eq!(summary.wfh_utilization, 0.0);
    }

    #[test]
    fn test_percentages() {
        let mut absent = record("a", 4, None, false);
        absent.status = AttendanceStatus::Absent;
        let mut wfh = record("a", 2, Some(8.0), false);
        wfh.work_location = WorkLocation::Wfh;

        let records = vec![record("a", 1, Some(8.0), true), wfh, absent, record("a", 3, None, false)];
        let stats = staff_stats("a", &records);

        assert_eq!(stats.total_days, 4);
        assert_eq!(stats.present_days, 3);
        assert_eq!(stats.absent_days, 1);
        assert_eq!(stats.late_days, 1);
        assert_eq!(stats.wfh_days, 1);
        assert!((stats.attendance_percentage - 75.0).abs() < 1e-9);
        assert!((stats.punctuality_score - 200.0 / 3.0).abs() < 1e-9);

        let summary = summarize(&[stats], &records);
        assert!((summary.wfh_utilization - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_leaderboard_ordering() {
        let records = vec![
            record("a", 1, Some(8.0), true),
            record("b", 1, Some(8.0), false),
            record("c", 1, Some(8.0), false),
            record("c", 2, Some(8.0), true),
        ];
        let stats = compute_staff_stats(&records);
        let board = leaderboard(&stats);

        let order: Vec<_> = board.iter().map(|e| e.staff_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(board[0].rank, 1);
    }

    #[test]
    fn test_free_report_omits_premium_sections() {
        let records = vec![record("a", 1, Some(8.0), false)];
        let input = ReportInput {
            business_id: "biz_1",
            plan: PlanTier::Free,
            period: ReportPeriod::new(2024, 3).unwrap(),
            records: &records,
            previous_records: &[],
            leave_requests: &[],
        };

        let report = build_report(input);
        assert!(report.premium.is_none());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("premium").is_none());
        let parsed: AttendanceReport = serde_json::from_value(json).unwrap();
        assert!(parsed.premium.is_none());
        assert_eq!(parsed.business_id, "biz_1");

        let premium = build_report(ReportInput {
            plan: PlanTier::Premium,
            ..input
        });
        let insights = premium.premium.unwrap();
        assert_eq!(insights.leaderboard.len(), 1);
        assert!((insights.trends.attendance_change - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_approved_leave_days_clipped_to_month() {
        let now = Utc::now();
        let leave = LeaveRequest {
            id: "lr-1".to_string(),
            business_id: "biz_1".to_string(),
            staff_id: "d".to_string(),
            leave_type: LeaveType::Annual,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 30).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            reason: String::new(),
            status: LeaveStatus::Approved,
            requested_at: now,
            approved_by: Some("mgr1".to_string()),
            approved_at: Some(now),
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
        };
        let mut pending = leave.clone();
        pending.status = LeaveStatus::Pending;
        pending.staff_id = "e".to_string();

        let report = build_report(ReportInput {
            business_id: "biz_1",
            plan: PlanTier::Free,
            period: ReportPeriod::new(2024, 3).unwrap(),
            records: &[],
            previous_records: &[],
            leave_requests: &[leave, pending],
        });

        assert_eq!(report.staff.len(), 1);
        assert_eq!(report.staff[0].staff_id, "d");
        assert_eq!(report.staff[0].leave_days, 2);
        assert_eq!(report.staff[0].attendance_percentage, 0.0);
        assert_eq!(report.summary.total_leave_days, 2);
    }

    #[test]
    fn test_report_period_bounds() {
        let feb = ReportPeriod::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(ReportPeriod::new(2024, 1).unwrap().previous(), ReportPeriod::new(2023, 12).unwrap());
        assert!(ReportPeriod::new(2024, 13).is_err());
        assert_eq!(feb.to_string(), "2024-02");
    }
}
