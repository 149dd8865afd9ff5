//! # Attendance Settings Repository
//!
//! One row per business. Businesses without a row fall back to the
//! configured defaults.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use hisaab_core::AttendanceSettings;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self, business_id: &str) -> DbResult<Option<AttendanceSettings>> {
        let settings = sqlx::query_as::<_, AttendanceSettings>(
            r#"
            SELECT business_id, geo_fence_radius_meters, auto_checkout_time,
                   late_threshold_minutes, overtime_threshold_minutes,
                   require_face_verification
            FROM attendance_settings
            WHERE business_id = ?1
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Inserts or replaces a business's settings.
    pub async fn upsert(&self, settings: &AttendanceSettings) -> DbResult<()> {
        debug!(business_id = %settings.business_id, "Saving attendance settings");

        sqlx::query(
            r#"
            INSERT INTO attendance_settings (
                business_id, geo_fence_radius_meters, auto_checkout_time,
                late_threshold_minutes, overtime_threshold_minutes,
                require_face_verification
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (business_id) DO UPDATE SET
                geo_fence_radius_meters = excluded.geo_fence_radius_meters,
                auto_checkout_time = excluded.auto_checkout_time,
                late_threshold_minutes = excluded.late_threshold_minutes,
                overtime_threshold_minutes = excluded.overtime_threshold_minutes,
                require_face_verification = excluded.require_face_verification
            "#,
        )
        .bind(&settings.business_id)
        .bind(settings.geo_fence_radius_meters)
        .bind(settings.auto_checkout_time)
        .bind(settings.late_threshold_minutes)
        .bind(settings.overtime_threshold_minutes)
        .bind(settings.require_face_verification)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
