//! # Plan Policy
//!
//! Pure mapping from plan tier to capability limits.
//!
//! ## Tier Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Plan Limits                                     │
//! │                                                                         │
//! │  Capability               FREE          PREMIUM                         │
//! │  ─────────────────────    ──────────    ──────────                      │
//! │  max_staff                3             30                              │
//! │  advanced attendance      ✗             ✓                              │
//! │  advanced analytics       ✗             ✓                              │
//! │  geo-fencing              ✗             ✓                              │
//! │  face verification        ✗             ✓                              │
//! │  export (Excel/PDF)       ✗             ✓                              │
//! │  leaderboards             ✗             ✓                              │
//! │  trend analysis           ✗             ✓                              │
//! │  EBITDA / PAT             ✗             ✓                              │
//! │                                                                         │
//! │  Invariant: FREE ⊆ PREMIUM for every capability                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Plan Tier
// =============================================================================

/// Subscription tier of a business. Exactly two values exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanTier {
    #[default]
    Free,
    Premium,
}

impl PlanTier {
    /// Returns the capability limits for this tier.
    pub fn limits(self) -> PlanLimits {
        limits_for(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "FREE",
            PlanTier::Premium => "PREMIUM",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FREE" => Ok(PlanTier::Free),
            "PREMIUM" => Ok(PlanTier::Premium),
            other => Err(CoreError::Validation(
                crate::error::ValidationError::InvalidFormat {
                    field: "plan".to_string(),
                    reason: format!("unknown plan tier '{}', expected FREE or PREMIUM", other),
                },
            )),
        }
    }
}

// =============================================================================
// Plan Limits
// =============================================================================

/// Capability limits derived from a plan tier. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanLimits {
    /// Maximum number of ACTIVE staff members.
    pub max_staff: u32,
    pub has_advanced_attendance: bool,
    pub has_advanced_analytics: bool,
    pub has_geo_fencing: bool,
    pub has_face_verification: bool,
    pub has_export_features: bool,
    pub has_leaderboards: bool,
    pub has_trend_analysis: bool,
    pub has_full_notifications: bool,
    pub has_ebitda_calculation: bool,
    pub has_pat_calculation: bool,
}

const FREE_LIMITS: PlanLimits = PlanLimits {
    max_staff: 3,
    has_advanced_attendance: false,
    has_advanced_analytics: false,
    has_geo_fencing: false,
    has_face_verification: false,
    has_export_features: false,
    has_leaderboards: false,
    has_trend_analysis: false,
    has_full_notifications: false,
    has_ebitda_calculation: false,
    has_pat_calculation: false,
};

const PREMIUM_LIMITS: PlanLimits = PlanLimits {
    max_staff: 30,
    has_advanced_attendance: true,
    has_advanced_analytics: true,
    has_geo_fencing: true,
    has_face_verification: true,
    has_export_features: true,
    has_leaderboards: true,
    has_trend_analysis: true,
    has_full_notifications: true,
    has_ebitda_calculation: true,
    has_pat_calculation: true,
};

/// Returns the limits for a tier.
pub const fn limits_for(tier: PlanTier) -> PlanLimits {
    match tier {
        PlanTier::Free => FREE_LIMITS,
        PlanTier::Premium => PREMIUM_LIMITS,
    }
}

/// A boolean capability gated by plan tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    AdvancedAttendance,
    AdvancedAnalytics,
    GeoFencing,
    FaceVerification,
    ExportFeatures,
    Leaderboards,
    TrendAnalysis,
    FullNotifications,
    EbitdaCalculation,
    PatCalculation,
}

impl Capability {
    /// Every capability, for exhaustive checks.
    pub const ALL: [Capability; 10] = [
        Capability::AdvancedAttendance,
        Capability::AdvancedAnalytics,
        Capability::GeoFencing,
        Capability::FaceVerification,
        Capability::ExportFeatures,
        Capability::Leaderboards,
        Capability::TrendAnalysis,
        Capability::FullNotifications,
        Capability::EbitdaCalculation,
        Capability::PatCalculation,
    ];

    /// Maps a UI feature id to its capability.
    ///
    /// Unknown ids return `None` (they are not plan-gated).
    pub fn from_feature_id(id: &str) -> Option<Self> {
        match id {
            "advanced-attendance" => Some(Capability::AdvancedAttendance),
            "advanced-analytics" => Some(Capability::AdvancedAnalytics),
            "geo-fencing" => Some(Capability::GeoFencing),
            "face-verification" => Some(Capability::FaceVerification),
            "export-features" => Some(Capability::ExportFeatures),
            "leaderboards" => Some(Capability::Leaderboards),
            "trend-analysis" => Some(Capability::TrendAnalysis),
            "full-notifications" => Some(Capability::FullNotifications),
            "ebitda-calculation" => Some(Capability::EbitdaCalculation),
            "pat-calculation" => Some(Capability::PatCalculation),
            _ => None,
        }
    }
}

impl PlanLimits {
    /// Checks whether a capability is enabled.
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::AdvancedAttendance => self.has_advanced_attendance,
            Capability::AdvancedAnalytics => self.has_advanced_analytics,
            Capability::GeoFencing => self.has_geo_fencing,
            Capability::FaceVerification => self.has_face_verification,
            Capability::ExportFeatures => self.has_export_features,
            Capability::Leaderboards => self.has_leaderboards,
            Capability::TrendAnalysis => self.has_trend_analysis,
            Capability::FullNotifications => self.has_full_notifications,
            Capability::EbitdaCalculation => self.has_ebitda_calculation,
            Capability::PatCalculation => self.has_pat_calculation,
        }
    }
}

/// Returns true if the feature id is available on the tier.
///
/// Feature ids that are not plan-gated are available everywhere.
pub fn is_feature_available(tier: PlanTier, feature_id: &str) -> bool {
    match Capability::from_feature_id(feature_id) {
        Some(capability) => tier.limits().allows(capability),
        None => true,
    }
}

// =============================================================================
// Premium Feature Catalogue
// =============================================================================

/// Category a premium feature is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Analytics,
    Staff,
    Communication,
    Reports,
}

/// A premium-only feature shown on the upgrade screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PremiumFeature {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: FeatureCategory,
}

/// Attendance-related premium features.
pub const PREMIUM_FEATURES: &[PremiumFeature] = &[
    PremiumFeature {
        id: "advanced-attendance",
        name: "Advanced Staff Attendance",
        description: "Detailed attendance tracking with location, overtime, and reports",
        category: FeatureCategory::Staff,
    },
    PremiumFeature {
        id: "advanced-analytics",
        name: "Advanced Analytics",
        description: "Gross/net profit, EBITDA, PAT calculations with detailed insights",
        category: FeatureCategory::Analytics,
    },
    PremiumFeature {
        id: "leaderboards",
        name: "Staff Leaderboards",
        description: "Performance rankings and achievement tracking",
        category: FeatureCategory::Staff,
    },
    PremiumFeature {
        id: "trend-analysis",
        name: "Trend Analysis",
        description: "Month-over-month attendance and punctuality trends",
        category: FeatureCategory::Analytics,
    },
    PremiumFeature {
        id: "export-features",
        name: "Export to Excel/PDF",
        description: "Export reports and data in multiple formats",
        category: FeatureCategory::Reports,
    },
    PremiumFeature {
        id: "full-notifications",
        name: "Full Notification System",
        description: "In-app notifications with categories and read tracking",
        category: FeatureCategory::Communication,
    },
    PremiumFeature {
        id: "extended-staff",
        name: "Up to 30 Staff Members",
        description: "Manage larger teams with extended staff limits",
        category: FeatureCategory::Staff,
    },
];

/// Premium features in one category.
pub fn features_in(category: FeatureCategory) -> impl Iterator<Item = &'static PremiumFeature> {
    PREMIUM_FEATURES
        .iter()
        .filter(move |feature| feature.category == category)
}

// =============================================================================
// Headcount Gate
// =============================================================================

/// Outcome of the staff headcount check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeadcountCheck {
    pub plan: PlanTier,
    pub allowed: bool,
    pub current_active_count: u32,
    pub max_allowed: u32,
}

impl HeadcountCheck {
    /// Converts a failed check into `StaffLimitReached`.
    pub fn ensure_allowed(self) -> CoreResult<()> {
        if self.allowed {
            return Ok(());
        }

        Err(CoreError::StaffLimitReached {
            plan: self.plan,
            current_active_count: self.current_active_count,
            max_allowed: self.max_allowed,
        })
    }

    /// Upgrade prompt shown when the gate is closed.
    pub fn message(&self) -> Option<String> {
        if self.allowed {
            return None;
        }

        Some(format!(
            "Staff limit reached for {} plan ({} max). Upgrade to Premium for up to {} staff members.",
            self.plan,
            self.max_allowed,
            PREMIUM_LIMITS.max_staff
        ))
    }
}

/// Checks whether one more staff member may become active.
///
/// `allowed` is `current_active_count < max_staff`.
pub fn check_headcount(tier: PlanTier, current_active_count: u32) -> HeadcountCheck {
    let max_allowed = tier.limits().max_staff;

    HeadcountCheck {
        plan: tier,
        allowed: current_active_count < max_allowed,
        current_active_count,
        max_allowed,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_is_superset_of_free() {
        let free = limits_for(PlanTier::Free);
        let premium = limits_for(PlanTier::Premium);

        for capability in Capability::ALL {
            if free.allows(capability) {
                assert!(premium.allows(capability), "{:?} lost on PREMIUM", capability);
            }
        }
        assert!(premium.max_staff >= free.max_staff);
    }

    #[test]
    fn test_tier_limits() {
        assert_eq!(PlanTier::Free.limits().max_staff, 3);
        assert_eq!(PlanTier::Premium.limits().max_staff, 30);
        assert!(!PlanTier::Free.limits().has_advanced_attendance);
        assert!(PlanTier::Premium.limits().has_advanced_attendance);
    }

    #[test]
    fn test_headcount_gate_at_limit() {
        let check = check_headcount(PlanTier::Free, 3);
        assert!(!check.allowed);
        assert_eq!(check.current_active_count, 3);
        assert_eq!(check.max_allowed, 3);
        assert!(check.message().is_some());

        match check.ensure_allowed() {
            Err(CoreError::StaffLimitReached {
                current_active_count,
                max_allowed,
                ..
            }) => {
                assert_eq!(current_active_count, 3);
                assert_eq!(max_allowed, 3);
            }
            other => panic!("expected StaffLimitReached, got {:?}", other),
        }
    }

    #[test]
    fn test_headcount_gate_premium_has_room() {
        let check = check_headcount(PlanTier::Premium, 3);
        assert!(check.allowed);
        assert_eq!(check.max_allowed, 30);
        assert!(check.ensure_allowed().is_ok());
        assert!(check.message().is_none());
    }

    #[test]
    fn test_feature_availability() {
        assert!(!is_feature_available(PlanTier::Free, "leaderboards"));
        assert!(is_feature_available(PlanTier::Premium, "leaderboards"));
        // Not gated
        assert!(is_feature_available(PlanTier::Free, "basic-attendance"));
    }

    #[test]
    fn test_plan_tier_parsing() {
        assert_eq!("free".parse::<PlanTier>().unwrap(), PlanTier::Free);
        assert_eq!("PREMIUM".parse::<PlanTier>().unwrap(), PlanTier::Premium);
        assert!("gold".parse::<PlanTier>().is_err());
        assert_eq!(PlanTier::default(), PlanTier::Free);
    }

    #[test]
    fn test_features_by_category() {
        let staff: Vec<_> = features_in(FeatureCategory::Staff).map(|f| f.id).collect();
        assert!(staff.contains(&"leaderboards"));
        assert!(!staff.contains(&"trend-analysis"));
    }
}
