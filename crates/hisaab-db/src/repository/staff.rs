//! # Staff Join-Request Repository
//!
//! ```text
//! submit ──► PENDING ──approve──► ACTIVE     (counted by the headcount gate)
//!               │
//!               └────reject────► REJECTED
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use hisaab_core::{StaffRequest, StaffRequestStatus};

const SELECT_REQUEST: &str = r#"
    SELECT id, business_id, business_code, staff_name, role, status,
           rejection_reason, requested_at, resolved_at
    FROM staff_requests
"#;

#[derive(Debug, Clone)]
pub struct StaffRequestRepository {
    pool: SqlitePool,
}

impl StaffRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRequestRepository { pool }
    }

    pub async fn insert(&self, request: &StaffRequest) -> DbResult<()> {
        debug!(id = %request.id, business_id = %request.business_id, "Inserting join-request");

        sqlx::query(
            r#"
            INSERT INTO staff_requests (
                id, business_id, business_code, staff_name, role, status,
                rejection_reason, requested_at, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&request.id)
        .bind(&request.business_id)
        .bind(&request.business_code)
        .bind(&request.staff_name)
        .bind(&request.role)
        .bind(request.status)
        .bind(&request.rejection_reason)
        .bind(request.requested_at)
        .bind(request.resolved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StaffRequest>> {
        let request =
            sqlx::query_as::<_, StaffRequest>(&format!("{} WHERE id = ?1", SELECT_REQUEST))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    /// Requests for a business, oldest first, optionally filtered by status.
    pub async fn list_by_business(
        &self,
        business_id: &str,
        status: Option<StaffRequestStatus>,
    ) -> DbResult<Vec<StaffRequest>> {
        let requests = sqlx::query_as::<_, StaffRequest>(&format!(
            "{} WHERE business_id = ?1 AND (?2 IS NULL OR status = ?2) ORDER BY requested_at, id",
            SELECT_REQUEST
        ))
        .bind(business_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Number of ACTIVE staff for a business.
    pub async fn count_active(&self, business_id: &str) -> DbResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM staff_requests WHERE business_id = ?1 AND status = 'ACTIVE'",
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// PENDING → ACTIVE. Returns false if the request was not pending.
    pub async fn activate(&self, id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE staff_requests
            SET status = 'ACTIVE', resolved_at = ?1
            WHERE id = ?2 AND status = 'PENDING'
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// PENDING → REJECTED. Returns false if the request was not pending.
    pub async fn reject(&self, id: &str, reason: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE staff_requests
            SET status = 'REJECTED', rejection_reason = ?1, resolved_at = ?2
            WHERE id = ?3 AND status = 'PENDING'
            "#,
        )
        .bind(reason)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_business, setup};

    fn request(id: &str) -> StaffRequest {
        StaffRequest {
            id: id.to_string(),
            business_id: "biz_1".to_string(),
            business_code: "AB12CD34".to_string(),
            staff_name: format!("Staff {}", id),
            role: "cashier".to_string(),
            status: StaffRequestStatus::Pending,
            rejection_reason: None,
            requested_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[tokio::test]
    async fn test_activate_counts_and_is_one_shot() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;
        let repo = db.staff_requests();

        repo.insert(&request("sr_1")).await.unwrap();
        repo.insert(&request("sr_2")).await.unwrap();
        assert_eq!(repo.count_active("biz_1").await.unwrap(), 0);

        assert!(repo.activate("sr_1", Utc::now()).await.unwrap());
        assert!(!repo.activate("sr_1", Utc::now()).await.unwrap());
        assert_eq!(repo.count_active("biz_1").await.unwrap(), 1);

        let stored = repo.get_by_id("sr_1").await.unwrap().unwrap();
        assert_eq!(stored.status, StaffRequestStatus::Active);
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_reject_and_filter() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;
        let repo = db.staff_requests();

        repo.insert(&request("sr_1")).await.unwrap();
        repo.insert(&request("sr_2")).await.unwrap();
        assert!(repo.reject("sr_2", "not hiring", Utc::now()).await.unwrap());
        assert!(!repo.activate("sr_2", Utc::now()).await.unwrap());

        let pending = repo
            .list_by_business("biz_1", Some(StaffRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "sr_1");

        let all = repo.list_by_business("biz_1", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let rejected = repo.get_by_id("sr_2").await.unwrap().unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("not hiring"));
    }
}
