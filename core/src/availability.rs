//! Availability hook consulted by the engine on top of the weekday rule.
//!
//! The engine never depends on the leave subsystem directly; a caller wires
//! approved-leave data in by handing the engine an `AvailabilityHook`.

use crate::directory::Agent;
use chrono::NaiveDate;

pub trait AvailabilityHook: Send {
    /// False when `agent` must not be scheduled on `date` for a reason the
    /// directory does not know about (approved leave, reported absence).
    fn is_available(&self, agent: &Agent, date: NaiveDate) -> bool;
}

/// Every agent is available; the weekday rule is the only filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl AvailabilityHook for AlwaysAvailable {
    fn is_available(&self, _agent: &Agent, _date: NaiveDate) -> bool {
        true
    }
}
