use crate::leave::RequestStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Agent '{agent_id}' not found")]
    UnknownAgent { agent_id: String },

    #[error("Agent '{agent_id}' defined more than once")]
    DuplicateAgent { agent_id: String },

    #[error("Invalid position '{code}': {reason}")]
    InvalidPosition { code: String, reason: String },

    #[error("Request {request_id} cannot be {action} while {from:?}")]
    InvalidTransition {
        request_id: String,
        from:       RequestStatus,
        action:     &'static str,
    },

    #[error("Reviewer '{reviewer}' is not allowed to validate requests")]
    NotAuthorized { reviewer: String },

    #[error("Leave ends ({end}) before it starts ({start})")]
    InvalidLeaveRange {
        start: chrono::NaiveDate,
        end:   chrono::NaiveDate,
    },

    #[error("Absence for {agent_id} on {date} needs a reason")]
    MissingReason {
        agent_id: String,
        date:     chrono::NaiveDate,
    },

    #[error("Request {request_id} not found")]
    UnknownRequest { request_id: String },

    #[error("Corrupt stored record: {detail}")]
    CorruptRecord { detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;
