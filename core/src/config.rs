use crate::{
    calendar::{EasterDate, FixedHoliday, HolidayCalendar},
    catalog::{Position, PositionCatalog, PriorityTier},
    directory::{Agent, AgentDirectory},
    error::PlanResult,
    types::SlotLabel,
};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineOptions {
    /// Skip public holidays like weekends. Off by default: the lab shows
    /// holidays as closed but the scheduler still plans them.
    #[serde(default)]
    pub holidays_block_assignment: bool,
    /// Erase the selected agents' position records for the range before a
    /// position run, so that re-running over the same inputs is idempotent.
    #[serde(default = "default_true")]
    pub clear_before_run: bool,
}

fn default_true() -> bool { true }

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            holidays_block_assignment: false,
            clear_before_run:          true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HolidayConfig {
    pub fixed:  Vec<FixedHoliday>,
    pub easter: Vec<EasterDate>,
}

#[derive(Debug, Clone, Deserialize)]
struct AgentsFile {
    agents: Vec<Agent>,
}

#[derive(Debug, Clone, Deserialize)]
struct PositionCatalogFile {
    positions: Vec<Position>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleSlotsFile {
    slots: Vec<SlotLabel>,
}

#[derive(Debug, Clone)]
pub struct PlanConfig {
    pub agents:         Vec<Agent>,
    pub positions:      Vec<Position>,
    pub schedule_slots: Vec<SlotLabel>,
    pub holidays:       HolidayConfig,
    pub engine:         EngineOptions,
}

impl PlanConfig {
    /// Load the lab configuration from `data_dir`.
    /// `engine/engine_options.json` is optional; everything else is required.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let agents_file: AgentsFile = read_json(data_dir, "agents/agents.json")?;
        let catalog_file: PositionCatalogFile = read_json(data_dir, "positions/position_catalog.json")?;
        let slots_file: ScheduleSlotsFile = read_json(data_dir, "schedules/schedule_slots.json")?;
        let holidays: HolidayConfig = read_json(data_dir, "calendar/holidays.json")?;

        let engine_path = format!("{data_dir}/engine/engine_options.json");
        let engine = if Path::new(&engine_path).exists() {
            read_json(data_dir, "engine/engine_options.json")?
        } else {
            log::debug!("No {engine_path}; using default engine options");
            EngineOptions::default()
        };

        log::info!(
            "Loaded config from {data_dir}: {} agents, {} positions, {} slots",
            agents_file.agents.len(),
            catalog_file.positions.len(),
            slots_file.slots.len()
        );

        Ok(Self {
            agents:         agents_file.agents,
            positions:      catalog_file.positions,
            schedule_slots: slots_file.slots,
            holidays,
            engine,
        })
    }

    pub fn directory(&self) -> PlanResult<AgentDirectory> {
        AgentDirectory::new(self.agents.clone())
    }

    pub fn catalog(&self) -> PlanResult<PositionCatalog> {
        PositionCatalog::new(self.positions.clone())
    }

    pub fn calendar(&self) -> HolidayCalendar {
        HolidayCalendar::new(self.holidays.fixed.clone(), self.holidays.easter.clone())
    }

    /// The built-in lab: eight technicians, positions P1–P9, five slots,
    /// Belgian holidays. Used by tests and as the runner's fallback.
    pub fn default_lab() -> Self {
        let agent = |id: &str, off: &[Weekday], prefs: &[&str], spec: &str, max: u32| Agent {
            id:                       id.to_string(),
            unavailable_weekdays:     off.to_vec(),
            preferred_position_codes: prefs.iter().map(|p| p.to_string()).collect(),
            specialization:           spec.to_string(),
            max_weekdays_per_week:    max,
        };
        let agents = vec![
            agent("Melissa",    &[Weekday::Mon], &["P1", "P2", "P3"], "Front-end processing", 4),
            agent("Laetitia",   &[],             &["P4", "P5", "P6"], "Molecular biology",    5),
            agent("Michaël",    &[],             &["P7", "P8"],       "Equipment and QC",     5),
            agent("Olivier",    &[],             &["P1", "P2", "P8"], "Generalist",           5),
            agent("Patrick",    &[],             &["P3", "P4", "P5"], "Molecular biology",    5),
            agent("Caroline",   &[],             &["P9"],             "Mycoses specialist",   5),
            agent("Fabrice",    &[Weekday::Fri], &["P6", "P7"],       "Equipment specialist", 4),
            agent("Giuseppina", &[],             &["P1", "P2", "P3"], "Front-end processing", 5),
        ];

        let position = |code: &str, name: &str, priority: PriorityTier, skills: &[&str], max: u32| Position {
            code:               code.to_string(),
            display_name:       name.to_string(),
            priority,
            required_skills:    skills.iter().map(|s| s.to_string()).collect(),
            exclusive_agent:    None,
            min_agents_per_day: 1,
            max_agents_per_day: max,
        };
        let mut mycoses = position("P9", "Mycoses", PriorityTier::Low, &["Mycoses specialist"], 1);
        mycoses.exclusive_agent = Some("Caroline".to_string());
        let positions = vec![
            position("P1", "Tri & urgences",     PriorityTier::High,   &["Front-end processing"], 1),
            position("P2", "Extraction",         PriorityTier::High,   &["Front-end processing"], 2),
            position("P3", "PCR & détection",    PriorityTier::High,   &["Molecular biology"], 1),
            position("P4", "Génotypage HCV",     PriorityTier::Medium, &["Molecular biology"], 1),
            position("P5", "NGS HIV",            PriorityTier::Medium, &["Molecular biology"], 1),
            position("P6", "Alinity",            PriorityTier::Medium, &["Equipment specialist"], 1),
            position("P7", "C6800",              PriorityTier::Medium, &["Equipment specialist"], 1),
            position("P8", "QC & maintenances",  PriorityTier::Low,    &["Equipment and QC", "Generalist"], 1),
            mycoses,
        ];

        let schedule_slots = ["8h00-16h00", "8h30-16h30", "9h00-17h00", "9h30-17h30", "10h00-18h00"]
            .into_iter()
            .map(String::from)
            .collect();

        let belgian = HolidayCalendar::belgian();
        let holidays = HolidayConfig {
            fixed:  belgian.fixed_holidays().to_vec(),
            easter: vec![
                EasterDate { year: 2024, month: 3, day: 31 },
                EasterDate { year: 2025, month: 4, day: 20 },
                EasterDate { year: 2026, month: 4, day: 5 },
                EasterDate { year: 2027, month: 3, day: 28 },
                EasterDate { year: 2028, month: 4, day: 16 },
                EasterDate { year: 2029, month: 4, day: 1 },
                EasterDate { year: 2030, month: 4, day: 21 },
            ],
        };

        Self {
            agents,
            positions,
            schedule_slots,
            holidays,
            engine: EngineOptions::default(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(data_dir: &str, relative: &str) -> anyhow::Result<T> {
    let path = format!("{data_dir}/{relative}");
    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let parsed = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
    Ok(parsed)
}
