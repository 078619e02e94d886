//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The engine works on an in-memory `AssignmentLedger`; flushing it here is
//! a separate step the caller takes once a run has completed.

use crate::{
    error::{PlanError, PlanResult},
    event::{EventLogEntry, PlanEvent},
    ledger::{AssignmentKind, AssignmentLedger, AssignmentRecord},
    snapshot::LedgerSnapshot,
    types::RunId,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

mod leave;

pub struct PlanStore {
    conn: Connection,
}

impl PlanStore {
    /// Open (or create) the planning database at `path`.
    pub fn open(path: &str) -> PlanResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PlanResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PlanResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_leave.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        kind:   AssignmentKind,
        start:  NaiveDate,
        end:    NaiveDate,
    ) -> PlanResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, kind, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, kind.as_str(), start, end],
        )?;
        Ok(())
    }

    pub fn run_count(&self) -> PlanResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM run", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Event log ──────────────────────────────────────────────

    /// Append `events` after whatever the run already logged.
    pub fn append_events(&self, run_id: &str, events: &[PlanEvent]) -> PlanResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let next: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM event_log WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        for (i, event) in events.iter().enumerate() {
            tx.execute(
                "INSERT INTO event_log (run_id, seq, event_type, payload)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    run_id,
                    next + i as i64,
                    event.type_name(),
                    serde_json::to_string(event)?,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> PlanResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    seq:        row.get::<_, i64>(2)? as u64,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Assignments ────────────────────────────────────────────

    /// Replace the stored assignment table with `ledger`, atomically.
    pub fn save_ledger(&self, ledger: &AssignmentLedger) -> PlanResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM assignment", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO assignment (agent_id, date, kind, value) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (key, value) in ledger.iter() {
                stmt.execute(params![key.agent_id, key.date, key.kind.as_str(), value])?;
            }
        }
        tx.commit()?;
        log::debug!("Flushed {} assignment records", ledger.len());
        Ok(())
    }

    pub fn load_ledger(&self) -> PlanResult<AssignmentLedger> {
        let mut stmt = self.conn.prepare(
            "SELECT agent_id, date, kind, value FROM assignment
             ORDER BY agent_id, date, kind",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, NaiveDate>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let records = rows
            .into_iter()
            .map(|(agent_id, date, kind, value)| -> PlanResult<AssignmentRecord> {
                let kind = AssignmentKind::parse(&kind).ok_or_else(|| PlanError::CorruptRecord {
                    detail: format!("unknown assignment kind '{kind}' for {agent_id} on {date}"),
                })?;
                Ok(AssignmentRecord { agent_id, date, kind, value })
            })
            .collect::<PlanResult<Vec<_>>>()?;
        Ok(AssignmentLedger::from_records(records))
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, run_id: &str, ledger: &AssignmentLedger) -> PlanResult<()> {
        let json = serde_json::to_string(&LedgerSnapshot::capture(run_id, ledger))?;
        self.conn.execute(
            "INSERT INTO snapshot (run_id, state_json) VALUES (?1, ?2)",
            params![run_id, json],
        )?;
        Ok(())
    }

    /// Most recent snapshot, with the run that produced it.
    pub fn latest_snapshot(&self) -> PlanResult<Option<(RunId, AssignmentLedger)>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT state_json FROM snapshot ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => {
                let snapshot: LedgerSnapshot = serde_json::from_str(&json)?;
                Ok(Some((snapshot.run_id.clone(), snapshot.restore())))
            }
            None => Ok(None),
        }
    }
}
