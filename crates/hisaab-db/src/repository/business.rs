//! # Business Repository
//!
//! Storage for tenants. Join-codes are stored upper-case behind a UNIQUE
//! index, so every lookup upper-cases its input and comparison is
//! case-insensitive.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use hisaab_core::{Business, PlanTier};

const SELECT_BUSINESS: &str = r#"
    SELECT id, name, business_type, plan, join_code, created_at, updated_at
    FROM businesses
"#;

/// Repository for business records.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    /// Inserts a business.
    ///
    /// ## Errors
    /// `UniqueViolation` when the join-code is taken.
    pub async fn insert(&self, business: &Business) -> DbResult<()> {
        debug!(id = %business.id, join_code = %business.join_code, "Inserting business");

        sqlx::query(
            r#"
            INSERT INTO businesses (
                id, name, business_type, plan, join_code, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, UPPER(?5), ?6, ?7)
            "#,
        )
        .bind(&business.id)
        .bind(&business.name)
        .bind(&business.business_type)
        .bind(business.plan)
        .bind(&business.join_code)
        .bind(business.created_at)
        .bind(business.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: business.join_code.clone(),
            },
            other => other,
        })?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(&format!("{} WHERE id = ?1", SELECT_BUSINESS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(business)
    }

    /// Case-insensitive join-code lookup.
    pub async fn get_by_join_code(&self, code: &str) -> DbResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(&format!(
            "{} WHERE join_code = UPPER(?1)",
            SELECT_BUSINESS
        ))
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(business)
    }

    /// Case-insensitive exact name match. First registered wins.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(&format!(
            "{} WHERE name = ?1 COLLATE NOCASE ORDER BY created_at LIMIT 1",
            SELECT_BUSINESS
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(business)
    }

    pub async fn list(&self) -> DbResult<Vec<Business>> {
        let businesses = sqlx::query_as::<_, Business>(&format!(
            "{} ORDER BY created_at, id",
            SELECT_BUSINESS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(businesses)
    }

    /// Overwrites the plan tier. Returns `None` if the id is unknown.
    pub async fn set_plan(
        &self,
        id: &str,
        plan: PlanTier,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Business>> {
        debug!(id = %id, plan = %plan, "Setting business plan");

        let result = sqlx::query("UPDATE businesses SET plan = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(plan)
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_business, setup};

    #[tokio::test]
    async fn test_join_code_lookup_is_case_insensitive() {
        let db = setup().await;
        insert_business(&db, "biz_1", "ab12cd34").await;

        let found = db.businesses().get_by_join_code("Ab12cD34").await.unwrap();
        let found = found.unwrap();
        assert_eq!(found.id, "biz_1");
        assert_eq!(found.join_code, "AB12CD34");

        assert!(db
            .businesses()
            .get_by_join_code("ZZZZZZZZ")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_join_code_rejected() {
        let db = setup().await;
        let first = insert_business(&db, "biz_1", "AB12CD34").await;

        let mut second = first.clone();
        second.id = "biz_2".to_string();
        second.join_code = "ab12cd34".to_string();

        let err = db.businesses().insert(&second).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_set_plan() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;

        let updated = db
            .businesses()
            .set_plan("biz_1", PlanTier::Premium, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.plan, PlanTier::Premium);

        let missing = db
            .businesses()
            .set_plan("biz_missing", PlanTier::Premium, Utc::now())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_by_name_and_list() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AAAAAAAA").await;
        insert_business(&db, "biz_2", "BBBBBBBB").await;

        let found = db.businesses().find_by_name("business BIZ_2").await.unwrap();
        assert_eq!(found.unwrap().id, "biz_2");
        assert_eq!(db.businesses().list().await.unwrap().len(), 2);
        assert_eq!(db.businesses().count().await.unwrap(), 2);
    }
}
