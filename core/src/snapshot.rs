//! Ledger snapshots: full assignment state to/from JSON.
//!
//! A snapshot is taken after each persisted run so a planning state can be
//! restored without replaying the event log.

use crate::{
    ledger::{AssignmentLedger, AssignmentRecord},
    types::RunId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    pub run_id:  RunId,
    pub records: Vec<AssignmentRecord>,
}

impl LedgerSnapshot {
    pub fn capture(run_id: &str, ledger: &AssignmentLedger) -> Self {
        Self { run_id: run_id.to_string(), records: ledger.records() }
    }

    pub fn restore(self) -> AssignmentLedger {
        AssignmentLedger::from_records(self.records)
    }
}
