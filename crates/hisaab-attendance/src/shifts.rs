//! # Shift Catalog
//!
//! Per-business shift definitions and attendance settings, plus the lookup
//! the ledger uses to decide which window a check-in is judged against.
//!
//! ## Window Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  window_for(business, local date)                                       │
//! │                                                                         │
//! │  active shifts whose days_of_week contain the weekday                   │
//! │       │                                                                 │
//! │       ├── some ──► earliest start_time wins ──► shift.window()          │
//! │       │                                                                 │
//! │       └── none ──► configured default window (09:00 - 17:00)            │
//! │                                                                         │
//! │  late threshold: attendance_settings.late_threshold_minutes            │
//! │                  (configured default when the owner saved none)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Edits apply to every later lookup; there is no shift history.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::info;
use uuid::Uuid;

use hisaab_core::shift::{classify, select_active_shift, ShiftClassification, ShiftWindow};
use hisaab_core::validation::{validate_shift, validate_threshold_minutes};
use hisaab_core::{
    AttendanceSettings, CoreError, Shift, ShiftInput, DEFAULT_LATE_THRESHOLD_MINUTES,
    DEFAULT_OVERTIME_THRESHOLD_MINUTES,
};
use hisaab_db::{BusinessRepository, Database, SettingsRepository, ShiftRepository};

use crate::clock::Clock;
use crate::config::AttendanceConfig;
use crate::error::AttendanceResult;

// =============================================================================
// Defaults
// =============================================================================

/// What a business without shifts or saved settings is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftDefaults {
    pub window: ShiftWindow,
    pub late_threshold_minutes: u32,
    pub overtime_threshold_minutes: u32,
}

impl Default for ShiftDefaults {
    fn default() -> Self {
        ShiftDefaults {
            window: ShiftWindow::new(
                NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
                0,
            ),
            late_threshold_minutes: DEFAULT_LATE_THRESHOLD_MINUTES,
            overtime_threshold_minutes: DEFAULT_OVERTIME_THRESHOLD_MINUTES,
        }
    }
}

impl ShiftDefaults {
    pub fn from_config(config: &AttendanceConfig) -> AttendanceResult<Self> {
        Ok(ShiftDefaults {
            window: config.default_shift_window()?,
            late_threshold_minutes: config.attendance.default_late_threshold_minutes,
            overtime_threshold_minutes: config.attendance.default_overtime_threshold_minutes,
        })
    }
}

/// The window and thresholds governing one staff day.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedShift {
    /// `None` when the default window applies.
    pub shift: Option<Shift>,
    pub window: ShiftWindow,
    pub settings: AttendanceSettings,
}

impl ResolvedShift {
    pub fn classify(&self, check_in: NaiveTime) -> ShiftClassification {
        classify(check_in, &self.window, self.settings.late_threshold_minutes)
    }
}

// =============================================================================
// Shift Catalog
// =============================================================================

#[derive(Clone)]
pub struct ShiftCatalog {
    businesses: BusinessRepository,
    shifts: ShiftRepository,
    settings: SettingsRepository,
    clock: Arc<dyn Clock>,
    defaults: ShiftDefaults,
}

impl ShiftCatalog {
    pub fn new(db: &Database, clock: Arc<dyn Clock>, defaults: ShiftDefaults) -> Self {
        ShiftCatalog {
            businesses: db.businesses(),
            shifts: db.shifts(),
            settings: db.settings(),
            clock,
            defaults,
        }
    }

    async fn ensure_business(&self, business_id: &str) -> AttendanceResult<()> {
        if self.businesses.get_by_id(business_id).await?.is_none() {
            return Err(CoreError::InvalidBusiness(business_id.to_string()).into());
        }
        Ok(())
    }

    pub async fn create(&self, business_id: &str, input: ShiftInput) -> AttendanceResult<Shift> {
        validate_shift(&input)?;
        self.ensure_business(business_id).await?;

        let now = self.clock.now();
        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            name: input.name.trim().to_string(),
            start_time: input.start_time,
            end_time: input.end_time,
            break_duration_minutes: input.break_duration_minutes,
            days_of_week: normalized_days(input.days_of_week),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };

        self.shifts.insert(&shift).await?;
        info!(id = %shift.id, business_id = %business_id, name = %shift.name, "Shift created");

        Ok(shift)
    }

    pub async fn update(
        &self,
        business_id: &str,
        shift_id: &str,
        input: ShiftInput,
    ) -> AttendanceResult<Shift> {
        validate_shift(&input)?;

        let existing = self
            .shifts
            .get_by_id(shift_id)
            .await?
            .filter(|s| s.business_id == business_id)
            .ok_or_else(|| CoreError::not_found("Shift", shift_id))?;

        let shift = Shift {
            name: input.name.trim().to_string(),
            start_time: input.start_time,
            end_time: input.end_time,
            break_duration_minutes: input.break_duration_minutes,
            days_of_week: normalized_days(input.days_of_week),
            is_active: input.is_active,
            updated_at: self.clock.now(),
            ..existing
        };

        if !self.shifts.update(&shift).await? {
            return Err(CoreError::not_found("Shift", shift_id).into());
        }
        info!(id = %shift.id, business_id = %business_id, "Shift updated");

        Ok(shift)
    }

    pub async fn delete(&self, business_id: &str, shift_id: &str) -> AttendanceResult<()> {
        if !self.shifts.delete(business_id, shift_id).await? {
            return Err(CoreError::not_found("Shift", shift_id).into());
        }
        info!(id = %shift_id, business_id = %business_id, "Shift deleted");
        Ok(())
    }

    /// Shifts of a business ordered by start time.
    pub async fn list(&self, business_id: &str) -> AttendanceResult<Vec<Shift>> {
        Ok(self.shifts.list_by_business(business_id).await?)
    }

    /// The shift governing `date`, if any is configured for that weekday.
    pub async fn active_shift_for(
        &self,
        business_id: &str,
        date: NaiveDate,
    ) -> AttendanceResult<Option<Shift>> {
        let shifts = self.list(business_id).await?;
        Ok(select_active_shift(&shifts, date).cloned())
    }

    /// Shift, window and thresholds for one business-local day.
    pub async fn resolve(&self, business_id: &str, date: NaiveDate) -> AttendanceResult<ResolvedShift> {
        let shift = self.active_shift_for(business_id, date).await?;
        let settings = self.settings(business_id).await?;
        let window = shift
            .as_ref()
            .map(Shift::window)
            .unwrap_or(self.defaults.window);

        Ok(ResolvedShift {
            shift,
            window,
            settings,
        })
    }

    // =========================================================================
    // Attendance Settings
    // =========================================================================

    /// Saved settings, or the configured defaults.
    pub async fn settings(&self, business_id: &str) -> AttendanceResult<AttendanceSettings> {
        Ok(self
            .settings
            .get(business_id)
            .await?
            .unwrap_or_else(|| AttendanceSettings {
                late_threshold_minutes: self.defaults.late_threshold_minutes,
                overtime_threshold_minutes: self.defaults.overtime_threshold_minutes,
                ..AttendanceSettings::defaults_for(business_id)
            }))
    }

    pub async fn update_settings(&self, settings: AttendanceSettings) -> AttendanceResult<AttendanceSettings> {
        validate_threshold_minutes("late_threshold_minutes", settings.late_threshold_minutes)?;
        validate_threshold_minutes(
            "overtime_threshold_minutes",
            settings.overtime_threshold_minutes,
        )?;
        self.ensure_business(&settings.business_id).await?;

        self.settings.upsert(&settings).await?;
        info!(
            business_id = %settings.business_id,
            late_threshold = settings.late_threshold_minutes,
            overtime_threshold = settings.overtime_threshold_minutes,
            "Attendance settings saved"
        );

        Ok(settings)
    }
}

fn normalized_days(mut days: Vec<u8>) -> Vec<u8> {
    days.sort_unstable();
    days
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{business, database, fixed_clock};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn input(name: &str, start: NaiveTime, end: NaiveTime, days: Vec<u8>) -> ShiftInput {
        ShiftInput {
            name: name.to_string(),
            start_time: start,
            end_time: end,
            break_duration_minutes: 30,
            days_of_week: days,
            is_active: true,
        }
    }

    fn catalog(db: &Database) -> ShiftCatalog {
        ShiftCatalog::new(db, fixed_clock(), ShiftDefaults::default())
    }

    #[tokio::test]
    async fn test_crud_scoped_to_business() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let catalog = catalog(&db);

        let shift = catalog
            .create(&biz.id, input("Morning", t(9, 0), t(17, 30), vec![5, 1, 3]))
            .await
            .unwrap();
        assert_eq!(shift.days_of_week, vec![1, 3, 5]);
        assert_eq!(shift.duration_minutes(), 480);

        let updated = catalog
            .update(&biz.id, &shift.id, input("Early", t(8, 0), t(16, 0), vec![1]))
            .await
            .unwrap();
        assert_eq!(updated.name, "Early");
        assert_eq!(updated.created_at, shift.created_at);

        let err = catalog
            .update("biz_other", &shift.id, input("X", t(8, 0), t(16, 0), vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));

        catalog.delete(&biz.id, &shift.id).await.unwrap();
        assert!(catalog.list(&biz.id).await.unwrap().is_empty());
        assert!(catalog.delete(&biz.id, &shift.id).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_non_positive_duration_and_unknown_business() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let catalog = catalog(&db);

        let overnight = input("Night", t(22, 0), t(6, 0), vec![1]);
        let err = catalog.create(&biz.id, overnight).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));

        let err = catalog
            .create("biz_missing", input("Day", t(9, 0), t(17, 0), vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidBusiness(_))));
    }

    #[tokio::test]
    async fn test_resolve_prefers_shift_then_default() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let catalog = catalog(&db);

        // 2024-03-11 is a Monday (1), 2024-03-16 a Saturday (6)
        let monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();

        catalog
            .create(&biz.id, input("Late", t(11, 0), t(19, 0), vec![1, 2, 3, 4, 5]))
            .await
            .unwrap();
        catalog
            .create(&biz.id, input("Early", t(7, 0), t(15, 0), vec![1, 2, 3, 4, 5]))
            .await
            .unwrap();

        let resolved = catalog.resolve(&biz.id, monday).await.unwrap();
        assert_eq!(resolved.shift.as_ref().unwrap().name, "Early");
        assert_eq!(resolved.window.start, t(7, 0));
        assert_eq!(resolved.settings.late_threshold_minutes, 15);

        let weekend = catalog.resolve(&biz.id, saturday).await.unwrap();
        assert!(weekend.shift.is_none());
        assert_eq!(weekend.window.start, t(9, 0));
    }

    #[tokio::test]
    async fn test_settings_default_then_saved() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let catalog = ShiftCatalog::new(
            &db,
            fixed_clock(),
            ShiftDefaults {
                late_threshold_minutes: 5,
                ..ShiftDefaults::default()
            },
        );

        let defaults = catalog.settings(&biz.id).await.unwrap();
        assert_eq!(defaults.late_threshold_minutes, 5);
        assert_eq!(defaults.overtime_threshold_minutes, 480);

        let saved = catalog
            .update_settings(AttendanceSettings {
                late_threshold_minutes: 10,
                ..defaults
            })
            .await
            .unwrap();
        assert_eq!(catalog.settings(&biz.id).await.unwrap(), saved);

        let err = catalog
            .update_settings(AttendanceSettings {
                late_threshold_minutes: 2000,
                ..saved
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));
    }
}
