//! Planning events — the audit trail of every run.
//!
//! The engine returns events alongside its assignments; the caller decides
//! whether to persist them (`store::PlanStore::append_events`).

use crate::{
    ledger::AssignmentKind,
    types::{AgentId, PositionCode, RunId, SlotLabel},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Weekend,
    Holiday,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnfilledReason {
    /// The position's exclusive agent is not available that day.
    ExclusiveAgentUnavailable,
    /// Nobody left with a positive score.
    NoQualifyingAgent,
}

/// Every event emitted during planning.
/// Variants are appended only — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    RunStarted {
        kind:        AssignmentKind,
        start:       NaiveDate,
        end:         NaiveDate,
        agent_count: usize,
    },
    DaySkipped {
        date:   NaiveDate,
        reason: SkipReason,
    },
    PositionAssigned {
        date:      NaiveDate,
        agent_id:  AgentId,
        position:  PositionCode,
        /// None for exclusive positions, which bypass scoring.
        score:     Option<i32>,
    },
    PositionUnfilled {
        date:     NaiveDate,
        position: PositionCode,
        reason:   UnfilledReason,
    },
    SlotAssigned {
        date:     NaiveDate,
        agent_id: AgentId,
        slot:     SlotLabel,
    },
    AssignmentsCleared {
        kind:    AssignmentKind,
        start:   NaiveDate,
        end:     NaiveDate,
        removed: usize,
    },
    RunCompleted {
        kind:    AssignmentKind,
        records: usize,
    },
}

impl PlanEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            PlanEvent::RunStarted { .. }         => "run_started",
            PlanEvent::DaySkipped { .. }         => "day_skipped",
            PlanEvent::PositionAssigned { .. }   => "position_assigned",
            PlanEvent::PositionUnfilled { .. }   => "position_unfilled",
            PlanEvent::SlotAssigned { .. }       => "slot_assigned",
            PlanEvent::AssignmentsCleared { .. } => "assignments_cleared",
            PlanEvent::RunCompleted { .. }       => "run_completed",
        }
    }
}

/// A persisted event with its position in the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub seq:        u64,
    pub event_type: String,
    pub payload:    String,
}
