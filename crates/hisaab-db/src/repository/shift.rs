//! # Shift Repository
//!
//! Shifts store their weekdays as a JSON array in `days_of_week`; [`ShiftRow`]
//! handles the conversion.

use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hisaab_core::Shift;

const SELECT_SHIFT: &str = r#"
    SELECT id, business_id, name, start_time, end_time, break_duration_minutes,
           days_of_week, is_active, created_at, updated_at
    FROM shifts
"#;

/// Raw `shifts` row.
#[derive(Debug, FromRow)]
struct ShiftRow {
    id: String,
    business_id: String,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    break_duration_minutes: u32,
    days_of_week: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = DbError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        let days_of_week: Vec<u8> =
            serde_json::from_str(&row.days_of_week).map_err(|e| DbError::Corrupt {
                column: "shifts.days_of_week".to_string(),
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Shift {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            start_time: row.start_time,
            end_time: row.end_time,
            break_duration_minutes: row.break_duration_minutes,
            days_of_week,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn encode_days(shift: &Shift) -> DbResult<String> {
    serde_json::to_string(&shift.days_of_week).map_err(|e| DbError::Internal(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    pub async fn insert(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, business_id = %shift.business_id, "Inserting shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, business_id, name, start_time, end_time, break_duration_minutes,
                days_of_week, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.business_id)
        .bind(&shift.name)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.break_duration_minutes)
        .bind(encode_days(shift)?)
        .bind(shift.is_active)
        .bind(shift.created_at)
        .bind(shift.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrites an existing shift. Returns false if no such shift exists
    /// for the business.
    pub async fn update(&self, shift: &Shift) -> DbResult<bool> {
        debug!(id = %shift.id, "Updating shift");

        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                name = ?1, start_time = ?2, end_time = ?3, break_duration_minutes = ?4,
                days_of_week = ?5, is_active = ?6, updated_at = ?7
            WHERE id = ?8 AND business_id = ?9
            "#,
        )
        .bind(&shift.name)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.break_duration_minutes)
        .bind(encode_days(shift)?)
        .bind(shift.is_active)
        .bind(shift.updated_at)
        .bind(&shift.id)
        .bind(&shift.business_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, business_id: &str, id: &str) -> DbResult<bool> {
        debug!(id = %id, business_id = %business_id, "Deleting shift");

        let result = sqlx::query("DELETE FROM shifts WHERE id = ?1 AND business_id = ?2")
            .bind(id)
            .bind(business_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let row = sqlx::query_as::<_, ShiftRow>(&format!("{} WHERE id = ?1", SELECT_SHIFT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Shift::try_from).transpose()
    }

    /// All shifts of a business ordered by start time.
    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<Shift>> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "{} WHERE business_id = ?1 ORDER BY start_time, name",
            SELECT_SHIFT
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Shift::try_from).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_business, setup};

    fn shift(id: &str, start: u32) -> Shift {
        let now = Utc::now();
        Shift {
            id: id.to_string(),
            business_id: "biz_1".to_string(),
            name: format!("Shift {}", id),
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(start + 8, 0, 0).unwrap(),
            break_duration_minutes: 30,
            days_of_week: vec![1, 2, 3, 4, 5],
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_round_trip_weekdays_and_order() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;
        let repo = db.shifts();

        repo.insert(&shift("evening", 14)).await.unwrap();
        repo.insert(&shift("morning", 6)).await.unwrap();

        let listed = repo.list_by_business("biz_1").await.unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["morning", "evening"]);
        assert_eq!(listed[0].days_of_week, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_update_and_delete_scoped_to_business() {
        let db = setup().await;
        insert_business(&db, "biz_1", "AB12CD34").await;
        let repo = db.shifts();

        let mut morning = shift("morning", 9);
        repo.insert(&morning).await.unwrap();

        morning.days_of_week = vec![0, 6];
        morning.is_active = false;
        assert!(repo.update(&morning).await.unwrap());

        let stored = repo.get_by_id("morning").await.unwrap().unwrap();
        assert_eq!(stored.days_of_week, vec![0, 6]);
        assert!(!stored.is_active);

        assert!(!repo.delete("biz_other", "morning").await.unwrap());
        assert!(repo.delete("biz_1", "morning").await.unwrap());
        assert!(repo.get_by_id("morning").await.unwrap().is_none());
    }
}
