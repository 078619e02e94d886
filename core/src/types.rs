//! Shared primitive types used across the planner.

/// Stable identifier of a technician (their username).
pub type AgentId = String;

/// Position code, e.g. "P1".
pub type PositionCode = String;

/// Schedule-slot label, e.g. "8h00-16h00".
pub type SlotLabel = String;

/// The canonical planning-run identifier.
pub type RunId = String;
