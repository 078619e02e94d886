//! Position catalog: the lab workstations filled each day.
//!
//! Catalog order is significant: within a priority tier positions are
//! visited in the order they were configured.

use crate::{
    error::{PlanError, PlanResult},
    types::{AgentId, PositionCode},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    /// Fixed visiting order of the engine.
    pub const ORDER: [PriorityTier; 3] = [PriorityTier::High, PriorityTier::Medium, PriorityTier::Low];

    fn index(self) -> usize {
        match self {
            PriorityTier::High   => 0,
            PriorityTier::Medium => 1,
            PriorityTier::Low    => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub code:               PositionCode,
    pub display_name:       String,
    pub priority:           PriorityTier,
    #[serde(default)]
    pub required_skills:    Vec<String>,
    /// When set, only this agent may ever hold the position.
    /// Required skills are then advisory only.
    #[serde(default)]
    pub exclusive_agent:    Option<AgentId>,
    pub min_agents_per_day: u32,
    pub max_agents_per_day: u32,
}

impl Position {
    /// "P1 : Tri & urgences"
    pub fn label(&self) -> String {
        format!("{} : {}", self.code, self.display_name)
    }

    /// Code part used to match agent preferences ("P1" for "P1 : Tri").
    pub fn code_prefix(&self) -> &str {
        self.code.split(':').next().unwrap_or_default().trim()
    }

    pub fn requires(&self, skill: &str) -> bool {
        self.required_skills.iter().any(|s| s == skill)
    }
}

#[derive(Debug, Clone)]
pub struct PositionCatalog {
    positions: Vec<Position>,
    /// Catalog indices grouped per tier, in catalog order.
    by_tier:   [Vec<usize>; 3],
}

impl PositionCatalog {
    pub fn new(positions: Vec<Position>) -> PlanResult<Self> {
        let mut seen = HashSet::with_capacity(positions.len());
        let mut by_tier: [Vec<usize>; 3] = Default::default();

        for (i, p) in positions.iter().enumerate() {
            if p.code.trim().is_empty() {
                return Err(PlanError::InvalidPosition {
                    code:   p.code.clone(),
                    reason: "empty code".into(),
                });
            }
            if !seen.insert(p.code.clone()) {
                return Err(PlanError::InvalidPosition {
                    code:   p.code.clone(),
                    reason: "duplicate code".into(),
                });
            }
            if p.min_agents_per_day > p.max_agents_per_day {
                return Err(PlanError::InvalidPosition {
                    code:   p.code.clone(),
                    reason: format!(
                        "min_agents_per_day {} exceeds max_agents_per_day {}",
                        p.min_agents_per_day, p.max_agents_per_day
                    ),
                });
            }
            by_tier[p.priority.index()].push(i);
        }

        Ok(Self { positions, by_tier })
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn get(&self, code: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.code == code)
    }

    /// Positions of one tier, in catalog order.
    pub fn tier(&self, tier: PriorityTier) -> impl Iterator<Item = &Position> + '_ {
        self.by_tier[tier.index()].iter().map(move |&i| &self.positions[i])
    }

    /// Every position in engine visiting order: High, Medium, Low.
    pub fn in_priority_order(&self) -> impl Iterator<Item = &Position> + '_ {
        PriorityTier::ORDER.into_iter().flat_map(move |t| self.tier(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(code: &str, priority: PriorityTier) -> Position {
        Position {
            code: code.to_string(),
            display_name: format!("{code} bench"),
            priority,
            required_skills: vec![],
            exclusive_agent: None,
            min_agents_per_day: 1,
            max_agents_per_day: 1,
        }
    }

    #[test]
    fn priority_order_keeps_catalog_order_within_tier() {
        let catalog = PositionCatalog::new(vec![
            position("P8", PriorityTier::Low),
            position("P4", PriorityTier::Medium),
            position("P1", PriorityTier::High),
            position("P9", PriorityTier::Low),
            position("P2", PriorityTier::High),
        ])
        .unwrap();
        let codes: Vec<&str> = catalog.in_priority_order().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, ["P1", "P2", "P4", "P8", "P9"]);
    }

    #[test]
    fn min_above_max_is_rejected() {
        let mut p = position("P2", PriorityTier::High);
        p.min_agents_per_day = 3;
        p.max_agents_per_day = 2;
        let err = PositionCatalog::new(vec![p]).unwrap_err();
        assert!(matches!(err, PlanError::InvalidPosition { code, .. } if code == "P2"));
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let err = PositionCatalog::new(vec![
            position("P1", PriorityTier::High),
            position("P1", PriorityTier::Low),
        ])
        .unwrap_err();
        assert!(matches!(err, PlanError::InvalidPosition { .. }));
    }

    #[test]
    fn label_and_prefix() {
        let mut p = position("P1", PriorityTier::High);
        p.display_name = "Tri & urgences".into();
        assert_eq!(p.label(), "P1 : Tri & urgences");
        assert_eq!(p.code_prefix(), "P1");

        p.code = "P3 : PCR".into();
        assert_eq!(p.code_prefix(), "P3");
    }
}
