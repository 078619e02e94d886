//! Staffing coverage derived from the ledger.
//!
//! For every working day, compares the head-count on each position with the
//! catalog's min/max per day. The engine fills at most one agent per
//! position per day, so overstaffing only shows up after manual edits.

use crate::{
    calendar::{days_inclusive, HolidayCalendar},
    catalog::PositionCatalog,
    config::EngineOptions,
    ledger::{AssignmentKind, AssignmentLedger},
    types::PositionCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    Understaffed,
    Overstaffed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverageGap {
    pub date:     NaiveDate,
    pub position: PositionCode,
    pub assigned: u32,
    pub min:      u32,
    pub max:      u32,
    pub kind:     GapKind,
}

pub fn coverage_report(
    ledger:   &AssignmentLedger,
    catalog:  &PositionCatalog,
    calendar: &HolidayCalendar,
    start:    NaiveDate,
    end:      NaiveDate,
    options:  &EngineOptions,
) -> Vec<CoverageGap> {
    let mut counts: HashMap<(NaiveDate, &str), u32> = HashMap::new();
    for (key, code) in ledger.iter_kind(AssignmentKind::Position) {
        if key.date >= start && key.date <= end {
            *counts.entry((key.date, code)).or_default() += 1;
        }
    }

    let mut gaps = Vec::new();
    for date in days_inclusive(start, end) {
        if HolidayCalendar::is_weekend(date)
            || (options.holidays_block_assignment && calendar.is_holiday(date))
        {
            continue;
        }
        for position in catalog.positions() {
            let assigned = counts.get(&(date, position.code.as_str())).copied().unwrap_or(0);
            let kind = if assigned < position.min_agents_per_day {
                GapKind::Understaffed
            } else if assigned > position.max_agents_per_day {
                GapKind::Overstaffed
            } else {
                continue;
            };
            gaps.push(CoverageGap {
                date,
                position: position.code.clone(),
                assigned,
                min: position.min_agents_per_day,
                max: position.max_agents_per_day,
                kind,
            });
        }
    }
    gaps
}
