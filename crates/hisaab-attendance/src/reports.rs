//! Monthly reports.
//!
//! Loads one month of attendance (and the month before, for trends) plus the
//! approved leave touching either month, then hands everything to
//! [`hisaab_core::analytics::build_report`]. Plan gating happens there.

use tracing::debug;

use hisaab_core::analytics::{build_report, AttendanceReport, ReportInput, ReportPeriod};
use hisaab_db::{AttendanceRepository, Database, LeaveRepository};

use crate::error::AttendanceResult;
use crate::registry::BusinessRegistry;

#[derive(Clone)]
pub struct Reporting {
    registry: BusinessRegistry,
    attendance: AttendanceRepository,
    leave: LeaveRepository,
}

impl Reporting {
    pub fn new(db: &Database, registry: BusinessRegistry) -> Self {
        Reporting {
            registry,
            attendance: db.attendance(),
            leave: db.leave(),
        }
    }

    pub async fn monthly_report(
        &self,
        business_id: &str,
        year: i32,
        month: u32,
    ) -> AttendanceResult<AttendanceReport> {
        let period = ReportPeriod::new(year, month)?;
        let business = self.registry.require(business_id).await?;
        let previous = period.previous();

        let records = self
            .attendance
            .list_by_date_range(&business.id, period.first_day(), period.last_day())
            .await?;
        let previous_records = self
            .attendance
            .list_by_date_range(&business.id, previous.first_day(), previous.last_day())
            .await?;
        let leave_requests = self
            .leave
            .list_approved_overlapping(&business.id, previous.first_day(), period.last_day())
            .await?;

        debug!(
            business_id = %business.id,
            year,
            month,
            records = records.len(),
            previous = previous_records.len(),
            leave = leave_requests.len(),
            "Building monthly report"
        );

        Ok(build_report(ReportInput {
            business_id: &business.id,
            plan: business.plan,
            period,
            records: &records,
            previous_records: &previous_records,
            leave_requests: &leave_requests,
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notifier;
    use crate::test_support::{business, database, fixed_clock};
    use chrono::{NaiveDate, TimeZone, Utc};
    use hisaab_core::{
        AttendanceRecord, AttendanceStatus, CoreError, LeaveRequest, LeaveStatus, LeaveType,
        PlanTier, WorkLocation,
    };

    async fn record(db: &Database, business_id: &str, staff_id: &str, day: u32, hours: f64) {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let check_in = Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap();
        db.attendance()
            .insert(&AttendanceRecord {
                id: format!("att-{}-{}", staff_id, day),
                business_id: business_id.to_string(),
                staff_id: staff_id.to_string(),
                date,
                check_in_time: Some(check_in),
                check_out_time: Some(check_in + chrono::Duration::minutes((hours * 60.0) as i64)),
                working_hours: Some(hours),
                status: AttendanceStatus::Present,
                is_late: day % 2 == 0,
                work_location: WorkLocation::Onsite,
                coordinates: None,
                notes: None,
                created_at: check_in,
                updated_at: check_in,
            })
            .await
            .unwrap();
    }

    async fn approved_leave(db: &Database, business_id: &str, staff_id: &str) {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        db.leave()
            .insert(&LeaveRequest {
                id: format!("leave-{}", staff_id),
                business_id: business_id.to_string(),
                staff_id: staff_id.to_string(),
                leave_type: LeaveType::Casual,
                start_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
                reason: String::new(),
                status: LeaveStatus::Approved,
                requested_at: now,
                approved_by: Some("mgr1".to_string()),
                approved_at: Some(now),
                rejected_by: None,
                rejected_at: None,
                rejection_reason: None,
            })
            .await
            .unwrap();
    }

    fn reporting(db: &Database) -> Reporting {
        Reporting::new(db, BusinessRegistry::new(db, fixed_clock(), Notifier::disabled()))
    }

    #[tokio::test]
    async fn test_free_report_omits_premium_sections() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        record(&db, &biz.id, "staff-a", 11, 8.0).await;
        record(&db, &biz.id, "staff-a", 12, 7.5).await;
        record(&db, &biz.id, "staff-b", 11, 6.0).await;
        approved_leave(&db, &biz.id, "staff-b").await;

        let report = reporting(&db).monthly_report(&biz.id, 2024, 3).await.unwrap();
        assert_eq!(report.plan, PlanTier::Free);
        assert!(report.premium.is_none());
        assert_eq!(report.staff.len(), 2);

        let b = report.staff.iter().find(|s| s.staff_id == "staff-b").unwrap();
        assert_eq!(b.leave_days, 2);
        assert!((report.summary.total_working_hours - 21.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_premium_report_includes_leaderboard() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        db.businesses()
            .set_plan(&biz.id, PlanTier::Premium, Utc::now())
            .await
            .unwrap();
        record(&db, &biz.id, "staff-a", 11, 8.0).await;
        record(&db, &biz.id, "staff-a", 13, 8.0).await;
        record(&db, &biz.id, "staff-b", 12, 4.0).await;

        let report = reporting(&db).monthly_report(&biz.id, 2024, 3).await.unwrap();
        let premium = report.premium.expect("premium insights");
        assert_eq!(premium.leaderboard.len(), 2);
        assert_eq!(premium.leaderboard[0].staff_id, "staff-a");
        assert_eq!(premium.leaderboard[1].late_days, 1);
    }

    #[tokio::test]
    async fn test_report_rejects_unknown_business_and_bad_month() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let reporting = reporting(&db);

        let err = reporting.monthly_report("biz_missing", 2024, 3).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidBusiness(_))));

        let err = reporting.monthly_report(&biz.id, 2024, 13).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));
    }
}
