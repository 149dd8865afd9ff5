//! # Attendance Record Repository
//!
//! ## Daily Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UNIQUE INDEX idx_attendance_business_staff_date                        │
//! │        ON attendance_records (business_id, staff_id, date)              │
//! │                                                                         │
//! │  insert() #1 for (biz_1, staff-a, 2024-03-11)  → Ok                     │
//! │  insert() #2 for (biz_1, staff-a, 2024-03-11)  → DbError::UniqueViolation│
//! │                                                                         │
//! │  record_check_out() only touches rows with check_out_time IS NULL,     │
//! │  so a record cannot be checked out twice.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use hisaab_core::{AttendanceRecord, AttendanceStatus, Coordinates, WorkLocation};

const SELECT_RECORD: &str = r#"
    SELECT id, business_id, staff_id, date, check_in_time, check_out_time,
           work_location, latitude, longitude, status, is_late, working_hours,
           notes, created_at, updated_at
    FROM attendance_records
"#;

/// Raw `attendance_records` row; coordinates are split into two columns.
#[derive(Debug, FromRow)]
struct AttendanceRow {
    id: String,
    business_id: String,
    staff_id: String,
    date: NaiveDate,
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    work_location: WorkLocation,
    latitude: Option<f64>,
    longitude: Option<f64>,
    status: AttendanceStatus,
    is_late: bool,
    working_hours: Option<f64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        let coordinates = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        AttendanceRecord {
            id: row.id,
            business_id: row.business_id,
            staff_id: row.staff_id,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            work_location: row.work_location,
            coordinates,
            status: row.status,
            is_late: row.is_late,
            working_hours: row.working_hours,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for attendance records.
#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: SqlitePool,
}

impl AttendanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AttendanceRepository { pool }
    }

    /// Inserts a new record.
    ///
    /// ## Errors
    /// `UniqueViolation` if the staff member already has a record that day.
    pub async fn insert(&self, record: &AttendanceRecord) -> DbResult<()> {
        debug!(
            id = %record.id,
            business_id = %record.business_id,
            staff_id = %record.staff_id,
            date = %record.date,
            "Inserting attendance record"
        );

        sqlx::query(
            r#"
            INSERT INTO attendance_records (
                id, business_id, staff_id, date, check_in_time, check_out_time,
                work_location, latitude, longitude, status, is_late, working_hours,
                notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&record.id)
        .bind(&record.business_id)
        .bind(&record.staff_id)
        .bind(record.date)
        .bind(record.check_in_time)
        .bind(record.check_out_time)
        .bind(record.work_location)
        .bind(record.coordinates.map(|c| c.latitude))
        .bind(record.coordinates.map(|c| c.longitude))
        .bind(record.status)
        .bind(record.is_late)
        .bind(record.working_hours)
        .bind(&record.notes)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!("{} WHERE id = ?1", SELECT_RECORD))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AttendanceRecord::from))
    }

    /// The record for one staff member on one business-local day.
    pub async fn get_for_day(
        &self,
        business_id: &str,
        staff_id: &str,
        date: NaiveDate,
    ) -> DbResult<Option<AttendanceRecord>> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{} WHERE business_id = ?1 AND staff_id = ?2 AND date = ?3",
            SELECT_RECORD
        ))
        .bind(business_id)
        .bind(staff_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AttendanceRecord::from))
    }

    /// Sets check-out data on a record that has not been checked out.
    ///
    /// Returns false if the record is missing or already checked out.
    pub async fn record_check_out(
        &self,
        id: &str,
        check_out_time: DateTime<Utc>,
        working_hours: f64,
    ) -> DbResult<bool> {
        debug!(id = %id, working_hours, "Recording check-out");

        let result = sqlx::query(
            r#"
            UPDATE attendance_records
            SET check_out_time = ?1, working_hours = ?2, updated_at = ?1
            WHERE id = ?3 AND check_in_time IS NOT NULL AND check_out_time IS NULL
            "#,
        )
        .bind(check_out_time)
        .bind(working_hours)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Records with `start <= date <= end`, ordered by date then staff id.
    pub async fn list_by_date_range(
        &self,
        business_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{} WHERE business_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date, staff_id",
            SELECT_RECORD
        ))
        .bind(business_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    /// All of a staff member's records, newest day first.
    pub async fn list_by_staff(&self, staff_id: &str) -> DbResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "{} WHERE staff_id = ?1 ORDER BY date DESC",
            SELECT_RECORD
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_business, setup};
    use chrono::{Datelike, TimeZone};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn record(id: &str, staff: &str, date: NaiveDate) -> AttendanceRecord {
        let check_in = Utc.with_ymd_and_hms(2024, 3, date.day(), 9, 0, 0).unwrap();
        AttendanceRecord {
            id: id.to_string(),
            business_id: "biz_1".to_string(),
            staff_id: staff.to_string(),
            date,
            check_in_time: Some(check_in),
            check_out_time: None,
            work_location: WorkLocation::Field,
            coordinates: Some(Coordinates {
                latitude: 24.86,
                longitude: 67.01,
            }),
            status: AttendanceStatus::Present,
            is_late: false,
            working_hours: None,
            notes: None,
            created_at: check_in,
            updated_at: check_in,
        }
    }

    #[tokio::test]
    async fn test_one_record_per_staff_per_day() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;
        let repo = db.attendance();

        repo.insert(&record("a-1", "staff-a", day(11))).await.unwrap();
        let err = repo
            .insert(&record("a-2", "staff-a", day(11)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        // Other staff, same day is fine
        repo.insert(&record("b-1", "staff-b", day(11))).await.unwrap();
    }

    #[tokio::test]
    async fn test_round_trip_and_check_out_once() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;
        let repo = db.attendance();

        let original = record("a-1", "staff-a", day(11));
        repo.insert(&original).await.unwrap();

        let stored = repo
            .get_for_day("biz_1", "staff-a", day(11))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, original);

        let out = Utc.with_ymd_and_hms(2024, 3, 11, 17, 30, 0).unwrap();
        assert!(repo.record_check_out("a-1", out, 8.5).await.unwrap());
        assert!(!repo.record_check_out("a-1", out, 9.0).await.unwrap());

        let stored = repo.get_by_id("a-1").await.unwrap().unwrap();
        assert_eq!(stored.check_out_time, Some(out));
        assert_eq!(stored.working_hours, Some(8.5));
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive_and_stable() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;
        let repo = db.attendance();

        for (i, d) in [9, 10, 11, 12, 13].iter().enumerate() {
            repo.insert(&record(&format!("a-{}", i), "staff-a", day(*d)))
                .await
                .unwrap();
        }

        let first = repo.list_by_date_range("biz_1", day(10), day(12)).await.unwrap();
        let second = repo.list_by_date_range("biz_1", day(10), day(12)).await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);

        let by_staff = repo.list_by_staff("staff-a").await.unwrap();
        assert_eq!(by_staff.first().unwrap().date, day(13));
    }
}
