//! Weekly load, derived from the ledger on demand and never cached.

use crate::{
    calendar::week_start,
    ledger::AssignmentLedger,
};
use chrono::{Duration, NaiveDate};

/// Working days (Mon..Fri) counted towards the weekly cap.
pub const WORKING_DAYS_PER_WEEK: i64 = 5;

/// Number of days Monday..Friday of `date`'s ISO week on which `agent_id`
/// already holds a position.
pub fn weekly_load(ledger: &AssignmentLedger, agent_id: &str, date: NaiveDate) -> u32 {
    let monday = week_start(date);
    (0..WORKING_DAYS_PER_WEEK)
        .map(|offset| monday + Duration::days(offset))
        .filter(|day| ledger.has_position(agent_id, *day))
        .count() as u32
}
