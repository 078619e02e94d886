//! Leave requests and absence reports.
//!
//! Status machine:
//!   Pending  → Overdue    7+ days after submission with no action
//!   Pending  → Approved | Rejected   by a reviewer allowed to validate
//!   Overdue  → Approved | Rejected   (still awaiting a decision)
//!   Approved, Rejected   terminal
//!
//! Approved leave and approved full-day absences make an agent unavailable
//! through `LeaveBook`'s `AvailabilityHook` impl.

use crate::{
    availability::AvailabilityHook,
    calendar::days_inclusive,
    directory::Agent,
    error::{PlanError, PlanResult},
    types::AgentId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days a request may wait before it is flagged overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Overdue,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending  => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Overdue  => "overdue",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }

    /// Still waiting on a reviewer.
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AbsencePeriod {
    FullDay,
    Morning,
    Afternoon,
    Evening,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    Leave { start: NaiveDate, end: NaiveDate },
    Absence { date: NaiveDate, period: AbsencePeriod },
}

/// Role check result for whoever acts on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reviewer {
    pub username:     String,
    pub can_validate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaveRequest {
    pub id:           String,
    pub agent_id:     AgentId,
    pub kind:         RequestKind,
    pub reason:       String,
    pub status:       RequestStatus,
    pub submitted_on: NaiveDate,
    pub reviewed_by:  Option<String>,
    pub reviewed_on:  Option<NaiveDate>,
}

impl LeaveRequest {
    pub fn leave(
        agent_id:     &str,
        start:        NaiveDate,
        end:          NaiveDate,
        reason:       &str,
        submitted_on: NaiveDate,
    ) -> PlanResult<Self> {
        if end < start {
            return Err(PlanError::InvalidLeaveRange { start, end });
        }
        Ok(Self::with_kind(agent_id, RequestKind::Leave { start, end }, reason, submitted_on))
    }

    /// An absence report must say why.
    pub fn absence(
        agent_id:     &str,
        date:         NaiveDate,
        period:       AbsencePeriod,
        reason:       &str,
        submitted_on: NaiveDate,
    ) -> PlanResult<Self> {
        if reason.trim().is_empty() {
            return Err(PlanError::MissingReason { agent_id: agent_id.to_string(), date });
        }
        Ok(Self::with_kind(agent_id, RequestKind::Absence { date, period }, reason, submitted_on))
    }

    fn with_kind(agent_id: &str, kind: RequestKind, reason: &str, submitted_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            kind,
            reason: reason.trim().to_string(),
            status: RequestStatus::Pending,
            submitted_on,
            reviewed_by: None,
            reviewed_on: None,
        }
    }

    /// Inclusive number of calendar days covered.
    pub fn duration_days(&self) -> i64 {
        match &self.kind {
            RequestKind::Leave { start, end } => (*end - *start).num_days() + 1,
            RequestKind::Absence { .. }       => 1,
        }
    }

    /// True when an approved request takes the whole of `date` off.
    pub fn blocks(&self, date: NaiveDate) -> bool {
        if self.status != RequestStatus::Approved {
            return false;
        }
        match &self.kind {
            RequestKind::Leave { start, end } => *start <= date && date <= *end,
            RequestKind::Absence { date: d, period } => *d == date && *period == AbsencePeriod::FullDay,
        }
    }

    /// Flag a pending request overdue once `OVERDUE_AFTER_DAYS` have elapsed.
    /// Returns true if the status changed.
    pub fn refresh_overdue(&mut self, today: NaiveDate) -> bool {
        if self.status == RequestStatus::Pending
            && (today - self.submitted_on).num_days() >= OVERDUE_AFTER_DAYS
        {
            self.status = RequestStatus::Overdue;
            return true;
        }
        false
    }

    pub fn approve(&mut self, reviewer: &Reviewer, today: NaiveDate) -> PlanResult<()> {
        self.review(reviewer, today, RequestStatus::Approved, "approved")
    }

    pub fn reject(&mut self, reviewer: &Reviewer, today: NaiveDate) -> PlanResult<()> {
        self.review(reviewer, today, RequestStatus::Rejected, "rejected")
    }

    fn review(
        &mut self,
        reviewer: &Reviewer,
        today:    NaiveDate,
        outcome:  RequestStatus,
        action:   &'static str,
    ) -> PlanResult<()> {
        if !reviewer.can_validate {
            return Err(PlanError::NotAuthorized { reviewer: reviewer.username.clone() });
        }
        if self.status.is_terminal() {
            return Err(PlanError::InvalidTransition {
                request_id: self.id.clone(),
                from: self.status,
                action,
            });
        }
        self.status = outcome;
        self.reviewed_by = Some(reviewer.username.clone());
        self.reviewed_on = Some(today);
        log::info!("Request {} for {} {action} by {}", self.id, self.agent_id, reviewer.username);
        Ok(())
    }
}

/// All known requests, used as the engine's availability source.
#[derive(Debug, Clone, Default)]
pub struct LeaveBook {
    requests: Vec<LeaveRequest>,
}

impl LeaveBook {
    pub fn new(requests: Vec<LeaveRequest>) -> Self {
        Self { requests }
    }

    pub fn submit(&mut self, request: LeaveRequest) -> &LeaveRequest {
        self.requests.push(request);
        &self.requests[self.requests.len() - 1]
    }

    pub fn requests(&self) -> &[LeaveRequest] {
        &self.requests
    }

    pub fn get(&self, request_id: &str) -> Option<&LeaveRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    /// Approve or reject a request. The decision is made on a copy and only
    /// replaces the held request once `persist` accepts it.
    pub fn decide(
        &mut self,
        request_id: &str,
        reviewer:   &Reviewer,
        approve:    bool,
        today:      NaiveDate,
        persist:    impl FnOnce(&LeaveRequest) -> PlanResult<()>,
    ) -> PlanResult<&LeaveRequest> {
        let idx = self
            .requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(|| PlanError::UnknownRequest { request_id: request_id.to_string() })?;

        let mut decided = self.requests[idx].clone();
        if approve {
            decided.approve(reviewer, today)?;
        } else {
            decided.reject(reviewer, today)?;
        }
        persist(&decided)?;
        self.requests[idx] = decided;
        Ok(&self.requests[idx])
    }

    /// Requests still awaiting a decision (pending or overdue).
    pub fn open_requests(&self) -> impl Iterator<Item = &LeaveRequest> + '_ {
        self.requests.iter().filter(|r| r.status.is_open())
    }

    /// Apply the overdue rule to every request. Returns how many changed.
    pub fn refresh_overdue(&mut self, today: NaiveDate) -> usize {
        self.requests
            .iter_mut()
            .map(|r| r.refresh_overdue(today))
            .filter(|changed| *changed)
            .count()
    }

    /// Days in `[start, end]` on which `agent_id` is on approved leave.
    pub fn blocked_days(&self, agent_id: &str, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        days_inclusive(start, end)
            .filter(|d| self.is_blocked(agent_id, *d))
            .collect()
    }

    fn is_blocked(&self, agent_id: &str, date: NaiveDate) -> bool {
        self.requests
            .iter()
            .any(|r| r.agent_id == agent_id && r.blocks(date))
    }
}

impl AvailabilityHook for LeaveBook {
    fn is_available(&self, agent: &Agent, date: NaiveDate) -> bool {
        !self.is_blocked(&agent.id, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn supervisor() -> Reviewer {
        Reviewer { username: "supervisor".into(), can_validate: true }
    }

    #[test]
    fn pending_turns_overdue_after_seven_days() {
        let mut r = LeaveRequest::leave("Patrick", d(20), d(24), "holiday", d(1)).unwrap();
        assert!(!r.refresh_overdue(d(7)));
        assert_eq!(r.status, RequestStatus::Pending);
        assert!(r.refresh_overdue(d(8)));
        assert_eq!(r.status, RequestStatus::Overdue);
        assert!(!r.refresh_overdue(d(30)));
    }

    #[test]
    fn overdue_request_can_still_be_decided() {
        let mut r = LeaveRequest::leave("Patrick", d(20), d(24), "", d(1)).unwrap();
        r.refresh_overdue(d(10));
        r.approve(&supervisor(), d(10)).unwrap();
        assert_eq!(r.status, RequestStatus::Approved);
        assert_eq!(r.reviewed_by.as_deref(), Some("supervisor"));
        assert_eq!(r.reviewed_on, Some(d(10)));
    }

    #[test]
    fn decided_requests_are_terminal() {
        let mut r = LeaveRequest::absence("Olivier", d(3), AbsencePeriod::FullDay, "sick", d(3)).unwrap();
        r.reject(&supervisor(), d(4)).unwrap();
        let err = r.approve(&supervisor(), d(5)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition { from: RequestStatus::Rejected, .. }));
        // Terminal requests never go overdue.
        assert!(!r.refresh_overdue(d(30)));
    }

    #[test]
    fn reviewer_without_rights_is_refused() {
        let mut r = LeaveRequest::leave("Olivier", d(3), d(3), "", d(1)).unwrap();
        let tech = Reviewer { username: "Melissa".into(), can_validate: false };
        assert!(matches!(r.approve(&tech, d(2)), Err(PlanError::NotAuthorized { .. })));
        assert_eq!(r.status, RequestStatus::Pending);
    }

    #[test]
    fn inverted_leave_range_is_rejected() {
        let err = LeaveRequest::leave("Olivier", d(5), d(3), "", d(1)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidLeaveRange { .. }));
    }

    #[test]
    fn only_approved_full_days_block() {
        let mut leave = LeaveRequest::leave("Olivier", d(3), d(5), "", d(1)).unwrap();
        let mut morning = LeaveRequest::absence("Olivier", d(10), AbsencePeriod::Morning, "dentist", d(9)).unwrap();
        let pending = LeaveRequest::absence("Olivier", d(12), AbsencePeriod::FullDay, "flu", d(9)).unwrap();
        assert_eq!(leave.duration_days(), 3);

        leave.approve(&supervisor(), d(2)).unwrap();
        morning.approve(&supervisor(), d(9)).unwrap();
        let book = LeaveBook::new(vec![leave, morning, pending]);

        assert_eq!(book.blocked_days("Olivier", d(1), d(15)), vec![d(3), d(4), d(5)]);
        assert!(book.blocked_days("Patrick", d(1), d(15)).is_empty());
        assert_eq!(book.open_requests().count(), 1);
    }

    #[test]
    fn absence_without_reason_is_refused() {
        let err = LeaveRequest::absence("Olivier", d(4), AbsencePeriod::FullDay, "   ", d(2)).unwrap_err();
        assert!(matches!(err, PlanError::MissingReason { ref agent_id, date } if agent_id == "Olivier" && date == d(4)));
    }

    #[test]
    fn failed_persist_leaves_the_book_untouched() {
        let request = LeaveRequest::leave("Patrick", d(20), d(24), "", d(1)).unwrap();
        let id = request.id.clone();
        let mut book = LeaveBook::new(vec![request]);

        let err = book
            .decide(&id, &supervisor(), true, d(2), |_| {
                Err(PlanError::CorruptRecord { detail: "disk full".into() })
            })
            .unwrap_err();
        assert!(matches!(err, PlanError::CorruptRecord { .. }));
        assert_eq!(book.get(&id).unwrap().status, RequestStatus::Pending);
        assert!(book.blocked_days("Patrick", d(20), d(24)).is_empty());

        let mut persisted = None;
        book.decide(&id, &supervisor(), true, d(2), |r| {
            persisted = Some(r.status);
            Ok(())
        })
        .unwrap();
        assert_eq!(persisted, Some(RequestStatus::Approved));
        assert_eq!(book.get(&id).unwrap().status, RequestStatus::Approved);
        assert_eq!(book.blocked_days("Patrick", d(20), d(24)).len(), 5);
    }

    #[test]
    fn deciding_an_unknown_request_fails() {
        let mut book = LeaveBook::default();
        let err = book.decide("nope", &supervisor(), false, d(2), |_| Ok(())).unwrap_err();
        assert!(matches!(err, PlanError::UnknownRequest { .. }));
    }
}
