//! # Leave Ledger
//!
//! ## Leave Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  submit() ──► pending ──approve(id, approver)──► approved               │
//! │     │            │                                                      │
//! │     │            └─────reject(id, approver, reason?)──► rejected        │
//! │     │                                                                   │
//! │     ├─ end < start        → InvalidDateRange                            │
//! │     └─ unknown business   → InvalidBusiness                             │
//! │                                                                         │
//! │  approve / reject on:                                                   │
//! │     unknown id            → NotFound                                    │
//! │     approved / rejected   → AlreadyResolved                             │
//! │                                                                         │
//! │  Notifications:  submit  → owner  (leave_request)                       │
//! │                  approve → staff  (leave_approved)                      │
//! │                  reject  → staff  (leave_rejected)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Approval looks at the plan headcount and logs it, but never blocks on it;
//! only staff join approval is gated (see [`crate::staff`]).
//!
//! Callers are expected to have checked that the approver may approve.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use hisaab_core::plan::check_headcount;
use hisaab_core::validation::{validate_date_range, validate_staff_id};
use hisaab_core::{CoreError, LeaveRequest, LeaveStatus, NewLeaveRequest, NotificationKind};
use hisaab_db::{Database, LeaveRepository, StaffRequestRepository};

use crate::clock::Clock;
use crate::error::AttendanceResult;
use crate::notify::Notifier;
use crate::registry::BusinessRegistry;

const ENTITY: &str = "LeaveRequest";

#[derive(Clone)]
pub struct LeaveLedger {
    registry: BusinessRegistry,
    leave: LeaveRepository,
    staff: StaffRequestRepository,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
}

impl LeaveLedger {
    pub fn new(
        db: &Database,
        registry: BusinessRegistry,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
    ) -> Self {
        LeaveLedger {
            registry,
            leave: db.leave(),
            staff: db.staff_requests(),
            clock,
            notifier,
        }
    }

    /// Files a pending leave request.
    pub async fn submit(&self, input: NewLeaveRequest) -> AttendanceResult<LeaveRequest> {
        validate_staff_id(&input.staff_id)?;
        validate_date_range(input.start_date, input.end_date)?;
        let business = self.registry.require(&input.business_id).await?;

        let request = LeaveRequest {
            id: Uuid::new_v4().to_string(),
            business_id: business.id,
            staff_id: input.staff_id,
            leave_type: input.leave_type,
            start_date: input.start_date,
            end_date: input.end_date,
            reason: input.reason,
            status: LeaveStatus::Pending,
            requested_at: self.clock.now(),
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
        };

        self.leave.insert(&request).await?;
        info!(
            id = %request.id,
            business_id = %request.business_id,
            staff_id = %request.staff_id,
            days = request.days(),
            "Leave requested"
        );

        self.notifier.to_owner(
            &request.business_id,
            NotificationKind::LeaveRequest,
            "Leave Request",
            format!(
                "{} requested {} day(s) of leave from {}",
                request.staff_id,
                request.days(),
                request.start_date
            ),
            serde_json::json!({
                "leaveRequestId": request.id,
                "staffId": request.staff_id,
                "type": request.leave_type,
                "startDate": request.start_date,
                "endDate": request.end_date,
                "days": request.days(),
            }),
        );

        Ok(request)
    }

    /// Loads a request that is still pending.
    async fn pending(&self, request_id: &str) -> AttendanceResult<LeaveRequest> {
        let request = self
            .leave
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, request_id))?;

        if !request.is_pending() {
            return Err(CoreError::already_resolved(ENTITY, request_id, request.status.as_str()).into());
        }

        Ok(request)
    }

    /// Reloads after a conditional update that did not match.
    async fn lost_transition(&self, request_id: &str) -> AttendanceResult<LeaveRequest> {
        let current = self.leave.get_by_id(request_id).await?;
        Err(match current {
            Some(r) => CoreError::already_resolved(ENTITY, request_id, r.status.as_str()),
            None => CoreError::not_found(ENTITY, request_id),
        }
        .into())
    }

    pub async fn approve(&self, request_id: &str, approver_id: &str) -> AttendanceResult<LeaveRequest> {
        let request = self.pending(request_id).await?;

        if let Some(business) = self.registry.find_by_id(&request.business_id).await? {
            let active = self.staff.count_active(&business.id).await?;
            let headcount = check_headcount(business.plan, active);
            if headcount.allowed {
                info!(
                    business_id = %business.id,
                    active = headcount.current_active_count,
                    max = headcount.max_allowed,
                    "Headcount within plan"
                );
            } else {
                warn!(
                    business_id = %business.id,
                    active = headcount.current_active_count,
                    max = headcount.max_allowed,
                    "Headcount at plan limit; leave approval continues"
                );
            }
        }

        let now = self.clock.now();
        if !self.leave.approve(request_id, approver_id, now).await? {
            return self.lost_transition(request_id).await;
        }

        let approved = LeaveRequest {
            status: LeaveStatus::Approved,
            approved_by: Some(approver_id.to_string()),
            approved_at: Some(now),
            ..request
        };
        info!(id = %approved.id, approver = %approver_id, "Leave approved");

        self.notifier.to_staff(
            &approved.business_id,
            &approved.staff_id,
            NotificationKind::LeaveApproved,
            "Leave Approved",
            format!(
                "Your leave from {} to {} was approved",
                approved.start_date, approved.end_date
            ),
            serde_json::json!({
                "leaveRequestId": approved.id,
                "approvedBy": approver_id,
            }),
        );

        Ok(approved)
    }

    /// Rejects a pending request. A missing reason is stored as `""`.
    pub async fn reject(
        &self,
        request_id: &str,
        approver_id: &str,
        reason: Option<&str>,
    ) -> AttendanceResult<LeaveRequest> {
        let request = self.pending(request_id).await?;
        let reason = reason.unwrap_or_default().trim().to_string();

        let now = self.clock.now();
        if !self.leave.reject(request_id, approver_id, &reason, now).await? {
            return self.lost_transition(request_id).await;
        }

        let rejected = LeaveRequest {
            status: LeaveStatus::Rejected,
            rejected_by: Some(approver_id.to_string()),
            rejected_at: Some(now),
            rejection_reason: Some(reason),
            ..request
        };
        info!(id = %rejected.id, approver = %approver_id, "Leave rejected");

        self.notifier.to_staff(
            &rejected.business_id,
            &rejected.staff_id,
            NotificationKind::LeaveRejected,
            "Leave Rejected",
            match rejected.rejection_reason.as_deref() {
                Some(r) if !r.is_empty() => format!("Your leave request was rejected: {}", r),
                _ => "Your leave request was rejected".to_string(),
            },
            serde_json::json!({
                "leaveRequestId": rejected.id,
                "rejectedBy": approver_id,
                "reason": rejected.rejection_reason,
            }),
        );

        Ok(rejected)
    }

    /// Pending requests of a business, oldest first.
    pub async fn list_pending(&self, business_id: &str) -> AttendanceResult<Vec<LeaveRequest>> {
        Ok(self.leave.list_pending(business_id).await?)
    }

    pub async fn list_by_staff(&self, staff_id: &str) -> AttendanceResult<Vec<LeaveRequest>> {
        Ok(self.leave.list_by_staff(staff_id).await?)
    }

    pub async fn list_by_business(&self, business_id: &str) -> AttendanceResult<Vec<LeaveRequest>> {
        Ok(self.leave.list_by_business(business_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingSink;
    use crate::test_support::{business, database, fixed_clock};
    use chrono::NaiveDate;
    use hisaab_core::LeaveType;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn sick(business_id: &str, start: NaiveDate, end: NaiveDate) -> NewLeaveRequest {
        NewLeaveRequest {
            business_id: business_id.to_string(),
            staff_id: "staff-a".to_string(),
            leave_type: LeaveType::Sick,
            start_date: start,
            end_date: end,
            reason: "Fever".to_string(),
        }
    }

    async fn ledger(db: &Database, sink: Arc<RecordingSink>) -> LeaveLedger {
        let clock = fixed_clock();
        let notifier = Notifier::new(sink, "owner");
        LeaveLedger::new(
            db,
            BusinessRegistry::new(db, clock.clone(), notifier.clone()),
            clock,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_submit_approve_lifecycle() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let sink = Arc::new(RecordingSink::new());
        let leave = ledger(&db, sink.clone()).await;

        let request = leave.submit(sick(&biz.id, day(10), day(12))).await.unwrap();
        assert_eq!(request.status, LeaveStatus::Pending);
        assert_eq!(request.days(), 3);
        assert_eq!(leave.list_pending(&biz.id).await.unwrap().len(), 1);

        let approved = leave.approve(&request.id, "mgr1").await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("mgr1"));
        assert!(approved.approved_at.is_some());

        let stored = db.leave().get_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);
        assert_eq!(stored.approved_by.as_deref(), Some("mgr1"));

        let err = leave.approve(&request.id, "mgr1").await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::AlreadyResolved { status, .. }) if status == "approved"
        ));
        assert!(leave.list_pending(&biz.id).await.unwrap().is_empty());

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, NotificationKind::LeaveRequest);
        assert_eq!(events[0].recipient_id, "owner");
        assert_eq!(events[1].kind, NotificationKind::LeaveApproved);
        assert_eq!(events[1].recipient_id, "staff-a");
    }

    #[tokio::test]
    async fn test_reject_persists_empty_reason() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let sink = Arc::new(RecordingSink::new());
        let leave = ledger(&db, sink.clone()).await;

        let request = leave.submit(sick(&biz.id, day(10), day(10))).await.unwrap();
        let rejected = leave.reject(&request.id, "mgr1", None).await.unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);

        let stored = db.leave().get_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.rejection_reason.as_deref(), Some(""));
        assert_eq!(stored.rejected_by.as_deref(), Some("mgr1"));

        let err = leave.approve(&request.id, "mgr1").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::AlreadyResolved { .. })));

        assert_eq!(sink.events()[1].kind, NotificationKind::LeaveRejected);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let leave = ledger(&db, Arc::new(RecordingSink::new())).await;

        let err = leave.submit(sick(&biz.id, day(12), day(10))).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidDateRange { .. })));

        let err = leave.submit(sick("biz_missing", day(10), day(12))).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidBusiness(_))));

        let mut blank = sick(&biz.id, day(10), day(12));
        blank.staff_id = "  ".to_string();
        let err = leave.submit(blank).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));

        let err = leave.approve("missing", "mgr1").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));
        let err = leave.reject("missing", "mgr1", Some("no")).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_listing_by_staff_and_business() {
        let db = database().await;
        let biz = business(&db, "AB12CD34").await;
        let leave = ledger(&db, Arc::new(RecordingSink::new())).await;

        let first = leave.submit(sick(&biz.id, day(1), day(2))).await.unwrap();
        leave.submit(sick(&biz.id, day(20), day(22))).await.unwrap();
        leave.approve(&first.id, "mgr1").await.unwrap();

        assert_eq!(leave.list_by_staff("staff-a").await.unwrap().len(), 2);
        assert_eq!(leave.list_by_business(&biz.id).await.unwrap().len(), 2);
        assert_eq!(leave.list_pending(&biz.id).await.unwrap().len(), 1);
    }
}
