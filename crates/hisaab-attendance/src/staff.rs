//! # Staff Gate
//!
//! Staff join a business with its join-code; the owner then approves or
//! rejects. Approval is the only place the plan headcount blocks anything.
//!
//! ```text
//!   submit_join_request(code) ──► PENDING ──approve──► ACTIVE
//!                                    │          │
//!                                    │          └─ active >= maxStaff
//!                                    │               → StaffLimitReached
//!                                    └──reject──► REJECTED
//! ```
//!
//! Approvals for one business run one at a time so two approvals cannot
//! both take the last seat.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use hisaab_core::plan::{check_headcount, HeadcountCheck};
use hisaab_core::{CoreError, NotificationKind, StaffRequest, StaffRequestStatus, ValidationError};
use hisaab_db::{Database, StaffRequestRepository};

use crate::clock::Clock;
use crate::error::AttendanceResult;
use crate::notify::Notifier;
use crate::registry::BusinessRegistry;

const ENTITY: &str = "StaffRequest";
const MAX_NAME_LENGTH: usize = 100;

#[derive(Clone)]
pub struct StaffGate {
    registry: BusinessRegistry,
    requests: StaffRequestRepository,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl StaffGate {
    pub fn new(
        db: &Database,
        registry: BusinessRegistry,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
    ) -> Self {
        StaffGate {
            registry,
            requests: db.staff_requests(),
            clock,
            notifier,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_business(&self, business_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(business_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub async fn count_active(&self, business_id: &str) -> AttendanceResult<u32> {
        Ok(self.requests.count_active(business_id).await?)
    }

    /// Whether one more staff member fits the current plan.
    pub async fn can_approve(&self, business_id: &str) -> AttendanceResult<HeadcountCheck> {
        let business = self.registry.require(business_id).await?;
        let active = self.requests.count_active(&business.id).await?;
        Ok(check_headcount(business.plan, active))
    }

    /// Files a PENDING join request against the business owning `code`.
    pub async fn submit_join_request(
        &self,
        code: &str,
        staff_name: &str,
        role: &str,
    ) -> AttendanceResult<StaffRequest> {
        let staff_name = staff_name.trim();
        if staff_name.is_empty() {
            return Err(ValidationError::Required {
                field: "staff_name".into(),
            }
            .into());
        }
        if staff_name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "staff_name".into(),
                max: MAX_NAME_LENGTH,
            }
            .into());
        }

        let business = self
            .registry
            .find_by_code(code)
            .await?
            .ok_or_else(|| CoreError::InvalidBusiness(code.trim().to_string()))?;

        let request = StaffRequest {
            id: format!("sr_{}", Uuid::new_v4()),
            business_id: business.id.clone(),
            business_code: business.join_code.clone(),
            staff_name: staff_name.to_string(),
            role: role.trim().to_string(),
            status: StaffRequestStatus::Pending,
            rejection_reason: None,
            requested_at: self.clock.now(),
            resolved_at: None,
        };

        self.requests.insert(&request).await?;
        info!(id = %request.id, business_id = %business.id, "Join request submitted");

        self.notifier.to_owner(
            &business.id,
            NotificationKind::StaffJoinRequest,
            "New Join Request",
            format!("{} wants to join {} as {}", request.staff_name, business.name, request.role),
            serde_json::json!({
                "requestId": request.id,
                "staffName": request.staff_name,
                "role": request.role,
            }),
        );

        Ok(request)
    }

    async fn pending(&self, request_id: &str) -> AttendanceResult<StaffRequest> {
        let request = self
            .requests
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, request_id))?;

        if request.status != StaffRequestStatus::Pending {
            return Err(CoreError::already_resolved(ENTITY, request_id, request.status.as_str()).into());
        }

        Ok(request)
    }

    /// PENDING → ACTIVE, refused when the plan has no free seat.
    pub async fn approve_join_request(&self, request_id: &str) -> AttendanceResult<StaffRequest> {
        let request = self.pending(request_id).await?;
        let _guard = self.lock_business(&request.business_id).await;

        let headcount = self.can_approve(&request.business_id).await?;
        if let Err(e) = headcount.ensure_allowed() {
            warn!(
                business_id = %request.business_id,
                plan = %headcount.plan,
                active = headcount.current_active_count,
                max = headcount.max_allowed,
                "Join request refused: {}",
                headcount.message().unwrap_or_default()
            );
            return Err(e.into());
        }

        let now = self.clock.now();
        if !self.requests.activate(request_id, now).await? {
            // Resolved by someone else while waiting on the lock.
            return self.pending(request_id).await;
        }
        info!(id = %request_id, business_id = %request.business_id, "Staff activated");

        Ok(StaffRequest {
            status: StaffRequestStatus::Active,
            resolved_at: Some(now),
            ..request
        })
    }

    pub async fn reject_join_request(
        &self,
        request_id: &str,
        reason: Option<&str>,
    ) -> AttendanceResult<StaffRequest> {
        let request = self.pending(request_id).await?;
        let reason = reason.unwrap_or_default().trim().to_string();

        let now = self.clock.now();
        if !self.requests.reject(request_id, &reason, now).await? {
            return self.pending(request_id).await;
        }
        info!(id = %request_id, business_id = %request.business_id, "Join request rejected");

        Ok(StaffRequest {
            status: StaffRequestStatus::Rejected,
            rejection_reason: Some(reason),
            resolved_at: Some(now),
            ..request
        })
    }

    pub async fn list_requests(
        &self,
        business_id: &str,
        status: Option<StaffRequestStatus>,
    ) -> AttendanceResult<Vec<StaffRequest>> {
        Ok(self.requests.list_by_business(business_id, status).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
