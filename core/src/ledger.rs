//! The in-memory Assignment Store.
//!
//! RULE: at most one value per (agent, date, kind). A later write for the
//! same key overwrites; it is never additive.
//!
//! The engine reads and writes a ledger passed in by the caller. Durable
//! storage is a separate flush step (see `store::PlanStore::save_ledger`).

use crate::{
    calendar::days_inclusive,
    types::AgentId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Position,
    Schedule,
}

impl AssignmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentKind::Position => "position",
            AssignmentKind::Schedule => "schedule",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "position" => Some(AssignmentKind::Position),
            "schedule" => Some(AssignmentKind::Schedule),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssignmentKey {
    pub agent_id: AgentId,
    pub date:     NaiveDate,
    pub kind:     AssignmentKind,
}

impl AssignmentKey {
    pub fn new(agent_id: &str, date: NaiveDate, kind: AssignmentKind) -> Self {
        Self { agent_id: agent_id.to_string(), date, kind }
    }
}

/// One stored decision: a position code or a schedule-slot label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub agent_id: AgentId,
    pub date:     NaiveDate,
    pub kind:     AssignmentKind,
    pub value:    String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentLedger {
    entries: BTreeMap<AssignmentKey, String>,
}

impl AssignmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = AssignmentRecord>) -> Self {
        let mut ledger = Self::new();
        for r in records {
            ledger.set(AssignmentKey { agent_id: r.agent_id, date: r.date, kind: r.kind }, r.value);
        }
        ledger
    }

    /// Write `value` under `key`, returning whatever it replaced.
    pub fn set(&mut self, key: AssignmentKey, value: String) -> Option<String> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, agent_id: &str, date: NaiveDate, kind: AssignmentKind) -> Option<&str> {
        self.entries
            .get(&AssignmentKey::new(agent_id, date, kind))
            .map(String::as_str)
    }

    pub fn position(&self, agent_id: &str, date: NaiveDate) -> Option<&str> {
        self.get(agent_id, date, AssignmentKind::Position)
    }

    pub fn schedule(&self, agent_id: &str, date: NaiveDate) -> Option<&str> {
        self.get(agent_id, date, AssignmentKind::Schedule)
    }

    pub fn has_position(&self, agent_id: &str, date: NaiveDate) -> bool {
        self.position(agent_id, date).is_some()
    }

    pub fn remove(&mut self, agent_id: &str, date: NaiveDate, kind: AssignmentKind) -> Option<String> {
        self.entries.remove(&AssignmentKey::new(agent_id, date, kind))
    }

    /// Remove every `kind` record of `agent_ids` in `[start, end]`.
    /// Returns the number of records removed.
    pub fn clear<S: AsRef<str>>(
        &mut self,
        start:     NaiveDate,
        end:       NaiveDate,
        agent_ids: &[S],
        kind:      AssignmentKind,
    ) -> usize {
        let mut removed = 0;
        for date in days_inclusive(start, end) {
            for agent_id in agent_ids {
                if self.remove(agent_id.as_ref(), date, kind).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssignmentKey, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Records of one kind, ordered by agent then date.
    pub fn iter_kind(&self, kind: AssignmentKind) -> impl Iterator<Item = (&AssignmentKey, &str)> + '_ {
        self.iter().filter(move |(k, _)| k.kind == kind)
    }

    pub fn records(&self) -> Vec<AssignmentRecord> {
        self.entries
            .iter()
            .map(|(k, v)| AssignmentRecord {
                agent_id: k.agent_id.clone(),
                date:     k.date,
                kind:     k.kind,
                value:    v.clone(),
            })
            .collect()
    }
}
