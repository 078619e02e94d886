//! Store methods for leave requests and absence reports.

use crate::{
    error::{PlanError, PlanResult},
    leave::LeaveRequest,
};
use rusqlite::{params, params_from_iter};

use super::PlanStore;

impl PlanStore {
    /// Insert a request, or replace it after a status change.
    pub fn upsert_leave_request(&self, request: &LeaveRequest) -> PlanResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO leave_request
                (request_id, agent_id, status, submitted_on, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.id,
                request.agent_id,
                request.status.as_str(),
                request.submitted_on,
                serde_json::to_string(request)?,
            ],
        )?;
        Ok(())
    }

    pub fn leave_requests(&self) -> PlanResult<Vec<LeaveRequest>> {
        self.query_leave_requests(
            "SELECT payload FROM leave_request ORDER BY submitted_on, request_id",
            None,
        )
    }

    pub fn leave_requests_for(&self, agent_id: &str) -> PlanResult<Vec<LeaveRequest>> {
        self.query_leave_requests(
            "SELECT payload FROM leave_request WHERE agent_id = ?1
             ORDER BY submitted_on, request_id",
            Some(agent_id),
        )
    }

    fn query_leave_requests(&self, sql: &str, agent_id: Option<&str>) -> PlanResult<Vec<LeaveRequest>> {
        let mut stmt = self.conn.prepare(sql)?;
        let payloads = stmt
            .query_map(params_from_iter(agent_id), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(PlanError::from))
            .collect()
    }

    /// Number of requests in a given status (for tests and summaries).
    pub fn leave_request_count(&self, status: &str) -> PlanResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM leave_request WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
