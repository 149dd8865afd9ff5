//! # Domain Types
//!
//! Core domain types for the attendance subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Business     │   │AttendanceRecord │   │  LeaveRequest   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (biz_…)     │◄──│  business_id    │   │  business_id    │       │
//! │  │  plan           │   │  staff_id, date │   │  start..=end    │       │
//! │  │  join_code      │   │  check_in/out   │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │           ▲                                                             │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StaffRequest   │   │     Shift       │   │AttendanceSettings│      │
//! │  │  PENDING/ACTIVE │   │  start/end/break│   │  late threshold │       │
//! │  │  /REJECTED      │   │  days_of_week   │   │  overtime thresh│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Time Representation
//! - Instants (`check_in_time`, `requested_at`, ...) are `DateTime<Utc>`
//! - Calendar days (`date`, `start_date`) are business-local `NaiveDate`
//! - Shift boundaries are local `NaiveTime`

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::plan::PlanTier;

// =============================================================================
// Business
// =============================================================================

/// A tenant of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Business {
    /// `biz_` + UUID v4.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Kind of business ("retail", "restaurant", ...).
    pub business_type: String,

    pub plan: PlanTier,

    /// 8-character upper-case join-code. Globally unique.
    pub join_code: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a business.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBusiness {
    pub name: String,
    pub business_type: String,
    /// Explicit join-code; generated when absent.
    pub join_code: Option<String>,
}

// =============================================================================
// Attendance Enums
// =============================================================================

/// Where the staff member worked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WorkLocation {
    #[default]
    Onsite,
    Wfh,
    Field,
}

/// Day status of an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    EarlyLeave,
    Holiday,
    Leave,
}

/// GPS position captured at check-in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

// =============================================================================
// Attendance Record
// =============================================================================

/// Position of a (business, staff, date) triple in the daily state machine.
///
/// ```text
/// NoRecord ──check_in──► CheckedIn ──check_out──► CheckedOut (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    NoRecord,
    CheckedIn,
    CheckedOut,
}

impl AttendanceState {
    /// State of today's record, if any.
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        match record {
            None => AttendanceState::NoRecord,
            Some(r) if r.check_in_time.is_none() => AttendanceState::NoRecord,
            Some(r) if r.check_out_time.is_some() => AttendanceState::CheckedOut,
            Some(_) => AttendanceState::CheckedIn,
        }
    }
}

/// One staff member's attendance for one business-local day.
///
/// At most one exists per `(business_id, staff_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttendanceRecord {
    pub id: String,
    pub business_id: String,
    pub staff_id: String,

    /// Business-local calendar day.
    #[ts(as = "String")]
    pub date: NaiveDate,

    #[ts(as = "Option<String>")]
    pub check_in_time: Option<DateTime<Utc>>,

    /// Strictly after `check_in_time` when set.
    #[ts(as = "Option<String>")]
    pub check_out_time: Option<DateTime<Utc>>,

    pub work_location: WorkLocation,
    pub coordinates: Option<Coordinates>,
    pub status: AttendanceStatus,

    /// Check-in was past shift start plus the late threshold.
    pub is_late: bool,

    /// Hours between check-in and check-out (minute granularity).
    pub working_hours: Option<f64>,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    #[inline]
    pub fn state(&self) -> AttendanceState {
        AttendanceState::of(Some(self))
    }

    #[inline]
    pub fn is_wfh(&self) -> bool {
        self.work_location == WorkLocation::Wfh
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

// =============================================================================
// Leave
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Sick,
    Casual,
    Annual,
    Emergency,
    Maternity,
    Paternity,
    Other,
}

/// Leave workflow status.
///
/// `Pending → Approved` and `Pending → Rejected` are the only transitions.
/// `Cancelled` exists in stored data but nothing in this crate produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }
}

/// A staff member's request for time off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LeaveRequest {
    pub id: String,
    pub business_id: String,
    pub staff_id: String,

    #[serde(rename = "type")]
    pub leave_type: LeaveType,

    #[ts(as = "String")]
    pub start_date: NaiveDate,

    /// Never before `start_date`.
    #[ts(as = "String")]
    pub end_date: NaiveDate,

    pub reason: String,
    pub status: LeaveStatus,

    #[ts(as = "String")]
    pub requested_at: DateTime<Utc>,

    pub approved_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,

    pub rejected_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub rejected_at: Option<DateTime<Utc>>,

    /// Always written on rejection, possibly empty.
    pub rejection_reason: Option<String>,
}

impl LeaveRequest {
    /// Inclusive number of days covered.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Days of this request falling within `first..=last`.
    pub fn overlap_days(&self, first: NaiveDate, last: NaiveDate) -> i64 {
        let start = self.start_date.max(first);
        let end = self.end_date.min(last);
        if end < start {
            return 0;
        }
        (end - start).num_days() + 1
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }
}

/// Input for submitting a leave request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewLeaveRequest {
    pub business_id: String,
    pub staff_id: String,
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub reason: String,
}

// =============================================================================
// Shift
// =============================================================================

/// A named recurring working window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub business_id: String,
    pub name: String,

    #[ts(as = "String")]
    pub start_time: NaiveTime,

    #[ts(as = "String")]
    pub end_time: NaiveTime,

    pub break_duration_minutes: u32,

    /// Weekday indices, 0 = Sunday through 6 = Saturday.
    pub days_of_week: Vec<u8>,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields an owner supplies when creating or editing a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftInput {
    pub name: String,
    #[ts(as = "String")]
    pub start_time: NaiveTime,
    #[ts(as = "String")]
    pub end_time: NaiveTime,
    pub break_duration_minutes: u32,
    pub days_of_week: Vec<u8>,
    pub is_active: bool,
}

// =============================================================================
// Attendance Settings
// =============================================================================

/// Per-business attendance configuration.
///
/// Only the two thresholds feed the ledger; the rest is stored for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AttendanceSettings {
    pub business_id: String,
    pub geo_fence_radius_meters: u32,
    #[ts(as = "String")]
    pub auto_checkout_time: NaiveTime,
    pub late_threshold_minutes: u32,
    pub overtime_threshold_minutes: u32,
    pub require_face_verification: bool,
}

impl AttendanceSettings {
    /// Settings a business gets before the owner edits anything.
    pub fn defaults_for(business_id: impl Into<String>) -> Self {
        AttendanceSettings {
            business_id: business_id.into(),
            geo_fence_radius_meters: 100,
            auto_checkout_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            late_threshold_minutes: crate::DEFAULT_LATE_THRESHOLD_MINUTES,
            overtime_threshold_minutes: crate::DEFAULT_OVERTIME_THRESHOLD_MINUTES,
            require_face_verification: false,
        }
    }
}

// =============================================================================
// Staff Join Requests
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum StaffRequestStatus {
    #[default]
    Pending,
    Active,
    Rejected,
}

impl StaffRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRequestStatus::Pending => "PENDING",
            StaffRequestStatus::Active => "ACTIVE",
            StaffRequestStatus::Rejected => "REJECTED",
        }
    }
}

/// A request by a staff member to join a business via its join-code.
///
/// ACTIVE requests are the business's active staff for the headcount gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StaffRequest {
    /// `sr_` + UUID v4.
    pub id: String,
    pub business_id: String,
    pub business_code: String,
    pub staff_name: String,
    pub role: String,
    pub status: StaffRequestStatus,
    pub rejection_reason: Option<String>,
    #[ts(as = "String")]
    pub requested_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub resolved_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StaffCheckin,
    StaffCheckout,
    LeaveRequest,
    LeaveApproved,
    LeaveRejected,
    StaffJoinRequest,
    PlanUpgrade,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::StaffCheckin => "staff_checkin",
            NotificationKind::StaffCheckout => "staff_checkout",
            NotificationKind::LeaveRequest => "leave_request",
            NotificationKind::LeaveApproved => "leave_approved",
            NotificationKind::LeaveRejected => "leave_rejected",
            NotificationKind::StaffJoinRequest => "staff_join_request",
            NotificationKind::PlanUpgrade => "plan_upgrade",
        }
    }
}

/// Event handed to the notification sink. Delivery is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationEvent {
    pub business_id: String,
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[ts(type = "Record<string, unknown>")]
    pub data: serde_json::Value,
}

/// A notification after it has been written to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoredNotification {
    /// `notif_` + UUID v4.
    pub id: String,
    pub business_id: String,
    pub recipient_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[ts(type = "Record<string, unknown>")]
    pub data: serde_json::Value,
    pub is_read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
