//! # Leave Request Repository
//!
//! ## Leave Lifecycle
//! ```text
//! insert() ──► pending ──approve()──► approved   (approved_by, approved_at)
//!                 │
//!                 └─────reject()───► rejected   (rejected_by, rejected_at,
//!                                                rejection_reason)
//! ```
//! Both transitions are guarded by `status = 'pending'` in the UPDATE, so
//! each request moves at most once.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use hisaab_core::LeaveRequest;

const SELECT_LEAVE: &str = r#"
    SELECT id, business_id, staff_id, leave_type, start_date, end_date, reason,
           status, requested_at, approved_by, approved_at, rejected_by, rejected_at,
           rejection_reason
    FROM leave_requests
"#;

/// Repository for leave requests.
#[derive(Debug, Clone)]
pub struct LeaveRepository {
    pool: SqlitePool,
}

impl LeaveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LeaveRepository { pool }
    }

    pub async fn insert(&self, request: &LeaveRequest) -> DbResult<()> {
        debug!(
            id = %request.id,
            staff_id = %request.staff_id,
            start = %request.start_date,
            end = %request.end_date,
            "Inserting leave request"
        );

        sqlx::query(
            r#"
            INSERT INTO leave_requests (
                id, business_id, staff_id, leave_type, start_date, end_date, reason,
                status, requested_at, approved_by, approved_at, rejected_by, rejected_at,
                rejection_reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&request.id)
        .bind(&request.business_id)
        .bind(&request.staff_id)
        .bind(request.leave_type)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.status)
        .bind(request.requested_at)
        .bind(&request.approved_by)
        .bind(request.approved_at)
        .bind(&request.rejected_by)
        .bind(request.rejected_at)
        .bind(&request.rejection_reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LeaveRequest>> {
        let request = sqlx::query_as::<_, LeaveRequest>(&format!("{} WHERE id = ?1", SELECT_LEAVE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    /// pending → approved. Returns false if the request was not pending.
    pub async fn approve(&self, id: &str, approver_id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = 'approved', approved_by = ?1, approved_at = ?2
            WHERE id = ?3 AND status = 'pending'
            "#,
        )
        .bind(approver_id)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// pending → rejected, always writing the reason (possibly empty).
    pub async fn reject(
        &self,
        id: &str,
        rejecter_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = 'rejected', rejected_by = ?1, rejected_at = ?2, rejection_reason = ?3
            WHERE id = ?4 AND status = 'pending'
            "#,
        )
        .bind(rejecter_id)
        .bind(at)
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Pending requests of a business, oldest first.
    pub async fn list_pending(&self, business_id: &str) -> DbResult<Vec<LeaveRequest>> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            "{} WHERE business_id = ?1 AND status = 'pending' ORDER BY requested_at, id",
            SELECT_LEAVE
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// A staff member's requests, newest first.
    pub async fn list_by_staff(&self, staff_id: &str) -> DbResult<Vec<LeaveRequest>> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            "{} WHERE staff_id = ?1 ORDER BY requested_at DESC, id",
            SELECT_LEAVE
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Every request of a business, newest first.
    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<LeaveRequest>> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            "{} WHERE business_id = ?1 ORDER BY requested_at DESC, id",
            SELECT_LEAVE
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Approved requests overlapping `first..=last`.
    pub async fn list_approved_overlapping(
        &self,
        business_id: &str,
        first: NaiveDate,
        last: NaiveDate,
    ) -> DbResult<Vec<LeaveRequest>> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"{} WHERE business_id = ?1 AND status = 'approved'
                  AND start_date <= ?3 AND end_date >= ?2
                ORDER BY start_date, id"#,
            SELECT_LEAVE
        ))
        .bind(business_id)
        .bind(first)
        .bind(last)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
