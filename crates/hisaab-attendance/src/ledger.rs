//! # Attendance Ledger
//!
//! The daily check-in / check-out state machine.
//!
//! ## States per (business, staff, local date)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────┐  check_in()   ┌───────────┐  check_out()  ┌────────────┐ │
//! │   │ NoRecord │──────────────►│ CheckedIn │──────────────►│ CheckedOut │ │
//! │   └──────────┘               └───────────┘               └────────────┘ │
//! │        │                          │                            │        │
//! │        │ check_out()              │ check_in()                 │ any    │
//! │        ▼                          ▼                            ▼        │
//! │   NoCheckInFound            AlreadyCheckedIn      AlreadyCheckedIn /    │
//! │                                                   AlreadyCheckedOut     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Record per Day
//! Writes for a business are serialised through a per-business async lock,
//! and `attendance_records` carries `UNIQUE (business_id, staff_id, date)`.
//! A second check-in that slips past the read still loses at the index and
//! is reported as `AlreadyCheckedIn`.
//!
//! ## Local Day
//! `date` is the calendar day of the check-in instant in the configured
//! business offset; check-out looks up the record of the current local day.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{FixedOffset, NaiveDate};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};
use uuid::Uuid;

use hisaab_core::analytics::ReportPeriod;
use hisaab_core::shift::{format_duration, overtime_minutes, worked_minutes, working_hours};
use hisaab_core::validation::validate_staff_id;
use hisaab_core::{
    AttendanceRecord, AttendanceState, AttendanceStatus, Coordinates, CoreError,
    NotificationKind, WorkLocation,
};
use hisaab_db::{AttendanceRepository, Database};

use crate::clock::Clock;
use crate::error::{AttendanceError, AttendanceResult};
use crate::notify::Notifier;
use crate::registry::BusinessRegistry;
use crate::shifts::ShiftCatalog;

type BusinessLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

#[derive(Clone)]
pub struct AttendanceLedger {
    registry: BusinessRegistry,
    catalog: ShiftCatalog,
    attendance: AttendanceRepository,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    offset: FixedOffset,
    locks: Arc<BusinessLocks>,
}

impl AttendanceLedger {
    pub fn new(
        db: &Database,
        registry: BusinessRegistry,
        catalog: ShiftCatalog,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
        offset: FixedOffset,
    ) -> Self {
        AttendanceLedger {
            registry,
            catalog,
            attendance: db.attendance(),
            clock,
            notifier,
            offset,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Today's date in the business offset.
    pub fn today(&self) -> NaiveDate {
        self.clock.today(self.offset)
    }

    async fn lock_business(&self, business_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(business_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Opens today's record for a staff member.
    ///
    /// ## Errors
    /// - `InvalidBusiness` if the business id does not resolve
    /// - `AlreadyCheckedIn` if a record exists for today
    pub async fn check_in(
        &self,
        business_id: &str,
        staff_id: &str,
        work_location: WorkLocation,
        coordinates: Option<Coordinates>,
    ) -> AttendanceResult<AttendanceRecord> {
        validate_staff_id(staff_id)?;
        let business = self.registry.require(business_id).await?;

        let now = self.clock.now();
        let local = now.with_timezone(&self.offset);
        let date = local.date_naive();

        let _guard = self.lock_business(&business.id).await;

        if self
            .attendance
            .get_for_day(&business.id, staff_id, date)
            .await?
            .is_some()
        {
            return Err(already_checked_in(staff_id, date));
        }

        let resolved = self.catalog.resolve(&business.id, date).await?;
        let classification = resolved.classify(local.time());

        let record = AttendanceRecord {
            id: Uuid::new_v4().to_string(),
            business_id: business.id.clone(),
            staff_id: staff_id.to_string(),
            date,
            check_in_time: Some(now),
            check_out_time: None,
            work_location,
            coordinates,
            status: AttendanceStatus::Present,
            is_late: classification.is_late,
            working_hours: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        match self.attendance.insert(&record).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation() => return Err(already_checked_in(staff_id, date)),
            Err(e) => return Err(e.into()),
        }

        info!(
            business_id = %record.business_id,
            staff_id = %record.staff_id,
            date = %date,
            is_late = record.is_late,
            minutes_after_start = classification.minutes_after_start,
            shift = resolved.shift.as_ref().map(|s| s.name.as_str()).unwrap_or("default"),
            "Staff checked in"
        );

        self.notifier.to_owner(
            &record.business_id,
            NotificationKind::StaffCheckin,
            "Staff Check-in",
            format!(
                "{} checked in at {}{}",
                staff_id,
                local.format("%H:%M"),
                if record.is_late { " (late)" } else { "" }
            ),
            serde_json::json!({
                "staffId": record.staff_id,
                "attendanceId": record.id,
                "checkInTime": now,
                "isLate": record.is_late,
                "workLocation": record.work_location,
            }),
        );

        Ok(record)
    }

    /// Closes today's record for a staff member.
    ///
    /// ## Errors
    /// - `InvalidBusiness` if the business id does not resolve
    /// - `NoCheckInFound` if there is no check-in today
    /// - `AlreadyCheckedOut` if today's record is closed
    /// - `CheckOutNotAfterCheckIn` if the clock has not moved past check-in
    pub async fn check_out(
        &self,
        business_id: &str,
        staff_id: &str,
    ) -> AttendanceResult<AttendanceRecord> {
        validate_staff_id(staff_id)?;
        let business = self.registry.require(business_id).await?;

        let now = self.clock.now();
        let date = now.with_timezone(&self.offset).date_naive();

        let _guard = self.lock_business(&business.id).await;

        let record = self
            .attendance
            .get_for_day(&business.id, staff_id, date)
            .await?;

        let record = record.ok_or_else(|| no_check_in(staff_id, date))?;
        let check_in = match (record.check_in_time, record.check_out_time) {
            (_, Some(_)) => return Err(already_checked_out(staff_id, date)),
            (None, None) => return Err(no_check_in(staff_id, date)),
            (Some(at), None) => at,
        };

        if now <= check_in {
            return Err(CoreError::CheckOutNotAfterCheckIn.into());
        }

        let minutes = worked_minutes(check_in, now);
        let hours = working_hours(check_in, now);
        let settings = self.catalog.settings(&business.id).await?;
        let overtime = overtime_minutes(minutes, settings.overtime_threshold_minutes);

        if !self.attendance.record_check_out(&record.id, now, hours).await? {
            return Err(already_checked_out(staff_id, date));
        }

        let record = AttendanceRecord {
            check_out_time: Some(now),
            working_hours: Some(hours),
            updated_at: now,
            ..record
        };

        info!(
            business_id = %record.business_id,
            staff_id = %record.staff_id,
            date = %date,
            worked_minutes = minutes,
            overtime_minutes = overtime,
            "Staff checked out"
        );

        self.notifier.to_owner(
            &record.business_id,
            NotificationKind::StaffCheckout,
            "Staff Check-out",
            format!(
                "{} checked out after {}",
                staff_id,
                format_duration(minutes)
            ),
            serde_json::json!({
                "staffId": record.staff_id,
                "attendanceId": record.id,
                "checkOutTime": now,
                "workingHours": hours,
                "overtimeMinutes": overtime,
            }),
        );

        Ok(record)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Records with `start <= date <= end`, ordered by date then staff.
    pub async fn get_by_date_range(
        &self,
        business_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        debug!(business_id = %business_id, %start, %end, "Loading attendance range");
        Ok(self
            .attendance
            .list_by_date_range(business_id, start, end)
            .await?)
    }

    pub async fn get_today_for(
        &self,
        business_id: &str,
        staff_id: &str,
    ) -> AttendanceResult<Option<AttendanceRecord>> {
        Ok(self
            .attendance
            .get_for_day(business_id, staff_id, self.today())
            .await?)
    }

    pub async fn state_today(
        &self,
        business_id: &str,
        staff_id: &str,
    ) -> AttendanceResult<AttendanceState> {
        let record = self.get_today_for(business_id, staff_id).await?;
        Ok(AttendanceState::of(record.as_ref()))
    }

    pub async fn today_for_business(&self, business_id: &str) -> AttendanceResult<Vec<AttendanceRecord>> {
        let today = self.today();
        self.get_by_date_range(business_id, today, today).await
    }

    /// Every record of one calendar month.
    pub async fn monthly(
        &self,
        business_id: &str,
        year: i32,
        month: u32,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let period = ReportPeriod::new(year, month)?;
        self.get_by_date_range(business_id, period.first_day(), period.last_day())
            .await
    }

    /// A staff member's history, newest day first.
    pub async fn records_for_staff(&self, staff_id: &str) -> AttendanceResult<Vec<AttendanceRecord>> {
        Ok(self.attendance.list_by_staff(staff_id).await?)
    }
}

fn already_checked_in(staff_id: &str, date: NaiveDate) -> AttendanceError {
    CoreError::AlreadyCheckedIn {
        staff_id: staff_id.to_string(),
        date: date.to_string(),
    }
    .into()
}

fn already_checked_out(staff_id: &str, date: NaiveDate) -> AttendanceError {
    CoreError::AlreadyCheckedOut {
        staff_id: staff_id.to_string(),
        date: date.to_string(),
    }
    .into()
}

fn no_check_in(staff_id: &str, date: NaiveDate) -> AttendanceError {
    CoreError::NoCheckInFound {
        staff_id: staff_id.to_string(),
        date: date.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================
