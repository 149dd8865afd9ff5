//! # Notification Repository
//!
//! Append-only log of delivered notifications with per-recipient read
//! tracking. `data` is stored as JSON text.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hisaab_core::{NotificationKind, StoredNotification};

const SELECT_NOTIFICATION: &str = r#"
    SELECT id, business_id, recipient_id, kind, title, message, data, is_read, created_at
    FROM notifications
"#;

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: String,
    business_id: String,
    recipient_id: String,
    kind: NotificationKind,
    title: String,
    message: String,
    data: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for StoredNotification {
    type Error = DbError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let data = serde_json::from_str(&row.data).map_err(|e| DbError::Corrupt {
            column: "notifications.data".to_string(),
            id: row.id.clone(),
            reason: e.to_string(),
        })?;

        Ok(StoredNotification {
            id: row.id,
            business_id: row.business_id,
            recipient_id: row.recipient_id,
            kind: row.kind,
            title: row.title,
            message: row.message,
            data,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    pub async fn insert(&self, notification: &StoredNotification) -> DbResult<()> {
        debug!(
            id = %notification.id,
            kind = notification.kind.as_str(),
            recipient = %notification.recipient_id,
            "Storing notification"
        );

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, business_id, recipient_id, kind, title, message, data, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.business_id)
        .bind(&notification.recipient_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.data.to_string())
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Notifications of a business, newest first, optionally for one recipient.
    pub async fn list_for(
        &self,
        business_id: &str,
        recipient_id: Option<&str>,
        limit: u32,
    ) -> DbResult<Vec<StoredNotification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"{} WHERE business_id = ?1 AND (?2 IS NULL OR recipient_id = ?2)
                ORDER BY created_at DESC, rowid DESC
                LIMIT ?3"#,
            SELECT_NOTIFICATION
        ))
        .bind(business_id)
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredNotification::try_from).collect()
    }

    pub async fn mark_read(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Marks every unread notification of a recipient as read.
    pub async fn mark_all_read(&self, business_id: &str, recipient_id: &str) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET is_read = 1
            WHERE business_id = ?1 AND recipient_id = ?2 AND is_read = 0
            "#,
        )
        .bind(business_id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, business_id: &str, recipient_id: &str) -> DbResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE business_id = ?1 AND recipient_id = ?2 AND is_read = 0
            "#,
        )
        .bind(business_id)
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
