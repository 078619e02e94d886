//! Commands accepted by the planning runner over its JSON line protocol.

use crate::{
    directory::AgentOrder,
    leave::AbsencePeriod,
    ledger::AssignmentKind,
    types::AgentId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Variants are appended only — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlanCommand {
    // ── Assignment ────────────────────────────────
    AssignPositions {
        start:  NaiveDate,
        end:    NaiveDate,
        /// Empty selects the whole directory.
        #[serde(default)]
        agents: Vec<AgentId>,
        #[serde(default)]
        order:  AgentOrder,
    },
    AssignSchedules {
        start:  NaiveDate,
        end:    NaiveDate,
        #[serde(default)]
        agents: Vec<AgentId>,
        #[serde(default)]
        order:  AgentOrder,
    },
    ClearAssignments {
        start:  NaiveDate,
        end:    NaiveDate,
        #[serde(default)]
        agents: Vec<AgentId>,
        kind:   AssignmentKind,
    },

    // ── Leave ─────────────────────────────────────
    SubmitLeave {
        agent_id: AgentId,
        start:    NaiveDate,
        end:      NaiveDate,
        #[serde(default)]
        reason:   String,
    },
    ReviewRequest {
        request_id:   String,
        reviewer:     String,
        can_validate: bool,
        approve:      bool,
    },

    // ── Session ───────────────────────────────────
    GetState {
        start: NaiveDate,
        end:   NaiveDate,
    },
    Quit,

    // ── Leave ─────────────────────────────────────
    SubmitAbsence {
        agent_id: AgentId,
        date:     NaiveDate,
        period:   AbsencePeriod,
        reason:   String,
    },
}

/// `(start, end)` with the earlier date first. The engine expects callers
/// to hand it an ordered range.
pub fn ordered_range(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    if start > end { (end, start) } else { (start, end) }
}
