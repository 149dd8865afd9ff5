//! # Attendance Configuration
//!
//! Process-wide configuration for the attendance services.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HISAAB_DB_PATH=/var/lib/hisaab/hisaab.db                           │
//! │     HISAAB_UTC_OFFSET_MINUTES=300                                      │
//! │     HISAAB_LATE_THRESHOLD_MINUTES=10                                   │
//! │     HISAAB_NOTIFICATIONS=false                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/hisaab/attendance.toml (Linux)                           │
//! │     ~/Library/Application Support/pk.hisaab.hisaab/attendance.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-business thresholds live in `attendance_settings`; the values here are
//! what a business gets before its owner changes anything.
//!
//! ## Configuration File Format
//! ```toml
//! # attendance.toml
//! [database]
//! path = "/var/lib/hisaab/hisaab.db"
//! max_connections = 5
//!
//! [attendance]
//! utc_offset_minutes = 300   # PKT
//! default_shift_start = "09:00"
//! default_shift_end = "17:00"
//! default_late_threshold_minutes = 15
//! default_overtime_threshold_minutes = 480
//!
//! [notifications]
//! enabled = true
//! channel_capacity = 256
//! owner_recipient = "owner"
//! ```

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use hisaab_core::shift::ShiftWindow;
use hisaab_core::validation::parse_time_of_day;
use hisaab_core::{DEFAULT_LATE_THRESHOLD_MINUTES, DEFAULT_OVERTIME_THRESHOLD_MINUTES, OWNER_RECIPIENT};
use hisaab_db::DbConfig;

use crate::error::{AttendanceError, AttendanceResult};

/// Largest UTC offset in the tz database (+14:00).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. `None` resolves to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Attendance Settings
// =============================================================================

/// Defaults for lateness and the business-local calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceDefaults {
    /// Offset of business-local time from UTC. Decides which calendar day a
    /// check-in belongs to.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Start of the implicit shift used when a business has none configured.
    #[serde(default = "default_shift_start")]
    pub default_shift_start: String,

    #[serde(default = "default_shift_end")]
    pub default_shift_end: String,

    #[serde(default = "default_late_threshold")]
    pub default_late_threshold_minutes: u32,

    #[serde(default = "default_overtime_threshold")]
    pub default_overtime_threshold_minutes: u32,
}

fn default_shift_start() -> String {
    "09:00".to_string()
}

fn default_shift_end() -> String {
    "17:00".to_string()
}

fn default_late_threshold() -> u32 {
    DEFAULT_LATE_THRESHOLD_MINUTES
}

fn default_overtime_threshold() -> u32 {
    DEFAULT_OVERTIME_THRESHOLD_MINUTES
}

impl Default for AttendanceDefaults {
    fn default() -> Self {
        AttendanceDefaults {
            utc_offset_minutes: 0,
            default_shift_start: default_shift_start(),
            default_shift_end: default_shift_end(),
            default_late_threshold_minutes: default_late_threshold(),
            default_overtime_threshold_minutes: default_overtime_threshold(),
        }
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// When false, events go to a no-op sink.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bounded queue between the ledgers and the dispatcher task.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Recipient id for owner-facing notifications.
    #[serde(default = "default_owner_recipient")]
    pub owner_recipient: String,
}

fn default_true() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    256
}

fn default_owner_recipient() -> String {
    OWNER_RECIPIENT.to_string()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            channel_capacity: default_channel_capacity(),
            owner_recipient: default_owner_recipient(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete attendance service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub attendance: AttendanceDefaults,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl AttendanceConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (attendance.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> AttendanceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading attendance config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| AttendanceError::Config(format!("{}: {}", path.display(), e)))?;
                config = toml::from_str(&contents)
                    .map_err(|e| AttendanceError::Config(format!("{}: {}", path.display(), e)))?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load attendance config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> AttendanceResult<()> {
        let offset = self.attendance.utc_offset_minutes;
        if offset.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(AttendanceError::Config(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES, offset
            )));
        }

        let window = self.default_shift_window()?;
        if window.duration_minutes() <= 0 {
            return Err(AttendanceError::Config(format!(
                "default shift {} - {} has no working time",
                self.attendance.default_shift_start, self.attendance.default_shift_end
            )));
        }

        if self.notifications.channel_capacity == 0 {
            return Err(AttendanceError::Config(
                "channel_capacity must be greater than 0".into(),
            ));
        }

        if self.notifications.owner_recipient.trim().is_empty() {
            return Err(AttendanceError::Config(
                "owner_recipient must not be empty".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(AttendanceError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("HISAAB_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(offset) = std::env::var("HISAAB_UTC_OFFSET_MINUTES") {
            match offset.parse::<i32>() {
                Ok(minutes) => self.attendance.utc_offset_minutes = minutes,
                Err(_) => warn!(value = %offset, "Ignoring invalid HISAAB_UTC_OFFSET_MINUTES"),
            }
        }

        if let Ok(threshold) = std::env::var("HISAAB_LATE_THRESHOLD_MINUTES") {
            match threshold.parse::<u32>() {
                Ok(minutes) => self.attendance.default_late_threshold_minutes = minutes,
                Err(_) => warn!(value = %threshold, "Ignoring invalid HISAAB_LATE_THRESHOLD_MINUTES"),
            }
        }

        if let Ok(enabled) = std::env::var("HISAAB_NOTIFICATIONS") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "on" => self.notifications.enabled = true,
                "0" | "false" | "off" => self.notifications.enabled = false,
                _ => warn!(value = %enabled, "Unknown HISAAB_NOTIFICATIONS value"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("pk", "hisaab", "hisaab")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("attendance.toml"))
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    /// Database file, falling back to `hisaab.db` in the platform data dir.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join("hisaab.db")))
            .unwrap_or_else(|| PathBuf::from("hisaab.db"))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path()).max_connections(self.database.max_connections)
    }

    /// Business-local offset. Out-of-range values fall back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.attendance.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Implicit shift for businesses without one.
    pub fn default_shift_window(&self) -> AttendanceResult<ShiftWindow> {
        let start = parse_config_time("default_shift_start", &self.attendance.default_shift_start)?;
        let end = parse_config_time("default_shift_end", &self.attendance.default_shift_end)?;
        Ok(ShiftWindow::new(start, end, 0))
    }
}

fn parse_config_time(field: &str, value: &str) -> AttendanceResult<NaiveTime> {
    parse_time_of_day(value).map_err(|e| AttendanceError::Config(format!("{}: {}", field, e)))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AttendanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attendance.default_late_threshold_minutes, 15);
        assert_eq!(config.attendance.default_overtime_threshold_minutes, 480);
        assert_eq!(config.notifications.owner_recipient, "owner");
        assert!(config.notifications.enabled);

        let window = config.default_shift_window().unwrap();
        assert_eq!(window.duration_minutes(), 480);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AttendanceConfig = toml::from_str(
            r#"
            [attendance]
            utc_offset_minutes = 300
            default_shift_start = "08:30"

            [notifications]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.attendance.utc_offset_minutes, 300);
        assert_eq!(config.attendance.default_shift_end, "17:00");
        assert_eq!(config.attendance.default_late_threshold_minutes, 15);
        assert!(!config.notifications.enabled);
        assert_eq!(config.notifications.channel_capacity, 256);
        assert_eq!(config.utc_offset().local_minus_utc(), 300 * 60);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AttendanceConfig::default();

        config.attendance.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());
        config.attendance.utc_offset_minutes = -300;
        assert!(config.validate().is_ok());

        config.attendance.default_shift_end = "08:00".to_string();
        assert!(config.validate().is_err());
        config.attendance.default_shift_end = "5pm".to_string();
        assert!(config.validate().is_err());
        config.attendance.default_shift_end = "17:00".to_string();

        config.notifications.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AttendanceConfig::default();
        config.database.path = Some(PathBuf::from("/tmp/hisaab.db"));

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AttendanceConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.database_path(), PathBuf::from("/tmp/hisaab.db"));
    }
}
