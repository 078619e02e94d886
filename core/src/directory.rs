//! Agent directory — the technicians the planner may assign.
//!
//! Agents are configured once and read-only during a run.
//! Directory order is preserved: it is one of the explicit orderings a
//! caller may pick for tie-breaking (see `AgentOrder`).

use crate::{
    error::{PlanError, PlanResult},
    types::{AgentId, PositionCode},
};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id:                       AgentId,
    #[serde(default)]
    pub unavailable_weekdays:     Vec<Weekday>,
    #[serde(default)]
    pub preferred_position_codes: Vec<PositionCode>,
    pub specialization:           String,
    pub max_weekdays_per_week:    u32,
}

impl Agent {
    pub fn is_unavailable_on(&self, weekday: Weekday) -> bool {
        self.unavailable_weekdays.contains(&weekday)
    }

    pub fn prefers(&self, code: &str) -> bool {
        self.preferred_position_codes.iter().any(|p| p == code)
    }
}

/// Order in which selected agents are handed to the engine.
/// The engine breaks score ties by first-seen in this order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentOrder {
    /// Keep the order of the ids passed to `select`.
    AsSelected,
    /// Keep directory (configuration) order.
    #[default]
    Directory,
    /// Sort by agent id.
    ById,
}

#[derive(Debug, Clone)]
pub struct AgentDirectory {
    agents: Vec<Agent>,
    index:  HashMap<AgentId, usize>,
}

impl AgentDirectory {
    pub fn new(agents: Vec<Agent>) -> PlanResult<Self> {
        let mut index = HashMap::with_capacity(agents.len());
        for (i, agent) in agents.iter().enumerate() {
            if index.insert(agent.id.clone(), i).is_some() {
                return Err(PlanError::DuplicateAgent { agent_id: agent.id.clone() });
            }
        }
        Ok(Self { agents, index })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, agent_id: &str) -> Option<&Agent> {
        self.index.get(agent_id).map(|&i| &self.agents[i])
    }

    /// Resolve `ids` to agents in the requested order.
    /// Duplicate ids are collapsed to their first occurrence.
    pub fn select<S: AsRef<str>>(&self, ids: &[S], order: AgentOrder) -> PlanResult<Vec<Agent>> {
        let mut positions: Vec<usize> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            let i = *self
                .index
                .get(id)
                .ok_or_else(|| PlanError::UnknownAgent { agent_id: id.to_string() })?;
            if !positions.contains(&i) {
                positions.push(i);
            }
        }

        match order {
            AgentOrder::AsSelected => {}
            AgentOrder::Directory  => positions.sort_unstable(),
            AgentOrder::ById       => positions.sort_by(|a, b| self.agents[*a].id.cmp(&self.agents[*b].id)),
        }

        Ok(positions.into_iter().map(|i| self.agents[i].clone()).collect())
    }
}
