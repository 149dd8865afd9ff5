//! # Business Registry
//!
//! Owns business records: creation with a unique join-code, lookups, and plan
//! changes.
//!
//! ## Join-Code Allocation
//! ```text
//! create(NewBusiness { join_code: None, .. })
//!      │
//!      ▼
//! generate 8 chars from A-Z0-9 ──► INSERT ──► Ok(Business)
//!      ▲                              │
//!      └──── UniqueViolation ◄────────┘   (retried, bounded)
//!
//! create(NewBusiness { join_code: Some("ab12cd34"), .. })
//!      │
//!      ▼
//! normalise to "AB12CD34" ──► INSERT ──► Ok / Validation(Duplicate)
//! ```
//! The UNIQUE index on `businesses.join_code` is the arbiter, so two creates
//! racing for the same code cannot both win.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use hisaab_core::validation::{normalize_join_code, validate_business_name};
use hisaab_core::{
    Business, CoreError, NewBusiness, NotificationKind, PlanTier, ValidationError,
    JOIN_CODE_ALPHABET, JOIN_CODE_LENGTH,
};
use hisaab_db::{BusinessRepository, Database, DbError};

use crate::clock::Clock;
use crate::error::{AttendanceError, AttendanceResult};
use crate::notify::Notifier;

/// Generated codes tried before giving up.
const MAX_JOIN_CODE_ATTEMPTS: usize = 16;

/// Random 8-character upper-case alphanumeric code.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(Clone)]
pub struct BusinessRegistry {
    businesses: BusinessRepository,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
}

impl BusinessRegistry {
    pub fn new(db: &Database, clock: Arc<dyn Clock>, notifier: Notifier) -> Self {
        BusinessRegistry {
            businesses: db.businesses(),
            clock,
            notifier,
        }
    }

    /// Registers a business on the FREE plan.
    pub async fn create(&self, input: NewBusiness) -> AttendanceResult<Business> {
        validate_business_name(&input.name)?;

        let now = self.clock.now();
        let mut business = Business {
            id: format!("biz_{}", Uuid::new_v4()),
            name: input.name.trim().to_string(),
            business_type: input.business_type.trim().to_string(),
            plan: PlanTier::Free,
            join_code: String::new(),
            created_at: now,
            updated_at: now,
        };

        if let Some(code) = input.join_code.as_deref() {
            business.join_code = normalize_join_code(code)?;
            return match self.businesses.insert(&business).await {
                Ok(()) => {
                    info!(id = %business.id, join_code = %business.join_code, "Business created");
                    Ok(business)
                }
                Err(e) if e.is_unique_violation() => Err(ValidationError::Duplicate {
                    field: "join_code".into(),
                    value: business.join_code,
                }
                .into()),
                Err(e) => Err(e.into()),
            };
        }

        for attempt in 1..=MAX_JOIN_CODE_ATTEMPTS {
            business.join_code = generate_join_code();

            match self.businesses.insert(&business).await {
                Ok(()) => {
                    info!(id = %business.id, join_code = %business.join_code, "Business created");
                    return Ok(business);
                }
                Err(e) if e.is_unique_violation() => {
                    debug!(attempt, join_code = %business.join_code, "Join-code taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AttendanceError::StorageFailure(DbError::Internal(format!(
            "no free join-code after {} attempts",
            MAX_JOIN_CODE_ATTEMPTS
        ))))
    }

    pub async fn find_by_id(&self, id: &str) -> AttendanceResult<Option<Business>> {
        Ok(self.businesses.get_by_id(id).await?)
    }

    /// Case-insensitive join-code lookup.
    pub async fn find_by_code(&self, code: &str) -> AttendanceResult<Option<Business>> {
        Ok(self.businesses.get_by_join_code(code.trim()).await?)
    }

    /// Case-insensitive name lookup.
    pub async fn find_by_name(&self, name: &str) -> AttendanceResult<Option<Business>> {
        Ok(self.businesses.find_by_name(name.trim()).await?)
    }

    pub async fn list(&self) -> AttendanceResult<Vec<Business>> {
        Ok(self.businesses.list().await?)
    }

    /// Resolves a business or fails with `InvalidBusiness`.
    pub async fn require(&self, id: &str) -> AttendanceResult<Business> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::InvalidBusiness(id.to_string()).into())
    }

    /// Overwrites the plan. `None` when the id is unknown.
    pub async fn set_plan(&self, id: &str, plan: PlanTier) -> AttendanceResult<Option<Business>> {
        let updated = self.businesses.set_plan(id, plan, self.clock.now()).await?;

        match &updated {
            Some(business) => info!(id = %business.id, plan = %plan, "Plan set"),
            None => debug!(id = %id, "Plan change for unknown business ignored"),
        }

        Ok(updated)
    }

    /// Moves a business to PREMIUM and tells the owner.
    pub async fn upgrade_to_premium(&self, id: &str) -> AttendanceResult<Business> {
        let business = self
            .set_plan(id, PlanTier::Premium)
            .await?
            .ok_or_else(|| CoreError::InvalidBusiness(id.to_string()))?;

        let limits = business.plan.limits();
        self.notifier.to_owner(
            &business.id,
            NotificationKind::PlanUpgrade,
            "Upgraded to Premium",
            format!(
                "{} is now on Premium. You can add up to {} staff members.",
                business.name, limits.max_staff
            ),
            serde_json::json!({
                "plan": business.plan,
                "maxStaff": limits.max_staff,
            }),
        );

        Ok(business)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingSink;
    use crate::test_support::{database, fixed_clock};

    fn input(name: &str, join_code: Option<&str>) -> NewBusiness {
        NewBusiness {
            name: name.to_string(),
            business_type: "retail".to_string(),
            join_code: join_code.map(str::to_string),
        }
    }

    #[test]
    fn test_generated_join_code_shape() {
        for _ in 0..100 {
            let code = generate_join_code();
            assert_eq!(code.len(), JOIN_CODE_LENGTH);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_free_and_finds_by_code() {
        let db = database().await;
        let registry = BusinessRegistry::new(&db, fixed_clock(), Notifier::disabled());

        let created = registry.create(input("Corner Store", None)).await.unwrap();
        assert_eq!(created.plan, PlanTier::Free);
        assert!(created.id.starts_with("biz_"));

        let lower = created.join_code.to_lowercase();
        let found = registry.find_by_code(&lower).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let by_name = registry.find_by_name("corner store").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_join_code_is_normalised_and_unique() {
        let db = database().await;
        let registry = BusinessRegistry::new(&db, fixed_clock(), Notifier::disabled());

        let first = registry
            .create(input("First", Some(" ab12cd34 ")))
            .await
            .unwrap();
        assert_eq!(first.join_code, "AB12CD34");

        let err = registry
            .create(input("Second", Some("AB12cd34")))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        let err = registry.create(input("Third", Some("short"))).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_plan_unknown_business_is_none() {
        let db = database().await;
        let registry = BusinessRegistry::new(&db, fixed_clock(), Notifier::disabled());

        assert!(registry
            .set_plan("biz_missing", PlanTier::Premium)
            .await
            .unwrap()
            .is_none());

        let err = registry.require("biz_missing").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidBusiness(_))));
    }

    #[tokio::test]
    async fn test_upgrade_sets_premium_and_notifies_owner() {
        let db = database().await;
        let sink = Arc::new(RecordingSink::new());
        let registry = BusinessRegistry::new(&db, fixed_clock(), Notifier::new(sink.clone(), "owner"));

        let business = registry.create(input("Spice Kitchen", None)).await.unwrap();
        let upgraded = registry.upgrade_to_premium(&business.id).await.unwrap();
        assert_eq!(upgraded.plan, PlanTier::Premium);

        // Idempotent overwrite
        let again = registry
            .set_plan(&business.id, PlanTier::Premium)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.plan, PlanTier::Premium);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::PlanUpgrade);
        assert_eq!(events[0].recipient_id, "owner");
        assert_eq!(events[0].data["maxStaff"], 30);
    }
}
