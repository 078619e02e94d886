//! The assignment engine.
//!
//! POSITION PASS, per calendar day in `[start, end]`:
//!   1. Skip Saturday/Sunday (and holidays when the switch is on).
//!   2. Available = agents not off on this weekday, not blocked by the
//!      availability hook, and below their weekly cap.
//!   3. Exclusive-agent positions first, in tier then catalog order.
//!      The exclusive agent or nobody.
//!   4. Remaining positions High → Medium → Low, catalog order within a
//!      tier. Best score wins; ties go to the first agent in the order the
//!      caller passed. Nobody is assigned unless the best score is > 0.
//!   5. An assigned agent leaves the pool for the rest of the day.
//!
//! SCHEDULE PASS, independent: available agents (weekday rule and hook
//! only, no weekly cap) rotate through the slot list by pool index.
//!
//! RULES:
//!   - The engine never validates `start <= end`; an inverted range is
//!     simply empty. Callers swap it.
//!   - Output is a pure function of (range, agents and their order,
//!     catalog, options, hook, ledger state).

use crate::{
    availability::{AlwaysAvailable, AvailabilityHook},
    calendar::{days_inclusive, HolidayCalendar},
    catalog::{Position, PositionCatalog},
    config::{EngineOptions, PlanConfig},
    coverage::{coverage_report, CoverageGap},
    directory::Agent,
    error::PlanResult,
    event::{PlanEvent, SkipReason, UnfilledReason},
    ledger::{AssignmentKey, AssignmentKind, AssignmentLedger},
    load::weekly_load,
    types::{AgentId, PositionCode, SlotLabel},
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const SKILL_MATCH_SCORE: i32 = 10;
pub const PREFERENCE_SCORE:  i32 = 5;
/// Load-balancing term is `LOAD_BALANCE_BASE - weekly_load`.
pub const LOAD_BALANCE_BASE: i32 = 5;

/// Decisions of one run, keyed by (agent, date).
pub type AssignmentMap<V> = BTreeMap<(AgentId, NaiveDate), V>;

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome<V> {
    pub assignments: AssignmentMap<V>,
    pub events:      Vec<PlanEvent>,
}

impl<V> RunOutcome<V> {
    fn new() -> Self {
        Self { assignments: BTreeMap::new(), events: Vec::new() }
    }
}

/// Score of `agent` for `position` given the agent's load this week.
pub fn compatibility_score(agent: &Agent, position: &Position, weekly_load: u32) -> i32 {
    let mut score = 0;
    if position.requires(&agent.specialization) {
        score += SKILL_MATCH_SCORE;
    }
    if agent.prefers(position.code_prefix()) {
        score += PREFERENCE_SCORE;
    }
    score + LOAD_BALANCE_BASE - weekly_load as i32
}

pub struct PlanEngine {
    catalog:        PositionCatalog,
    calendar:       HolidayCalendar,
    schedule_slots: Vec<SlotLabel>,
    options:        EngineOptions,
    availability:   Box<dyn AvailabilityHook>,
}

impl PlanEngine {
    pub fn new(
        catalog:        PositionCatalog,
        calendar:       HolidayCalendar,
        schedule_slots: Vec<SlotLabel>,
        options:        EngineOptions,
    ) -> Self {
        Self {
            catalog,
            calendar,
            schedule_slots,
            options,
            availability: Box::new(AlwaysAvailable),
        }
    }

    /// Build an engine from a loaded configuration.
    pub fn from_config(config: &PlanConfig) -> PlanResult<Self> {
        Ok(Self::new(
            config.catalog()?,
            config.calendar(),
            config.schedule_slots.clone(),
            config.engine,
        ))
    }

    /// Replace the availability hook (e.g. with a `LeaveBook`).
    pub fn with_availability(mut self, hook: impl AvailabilityHook + 'static) -> Self {
        self.availability = Box::new(hook);
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn catalog(&self) -> &PositionCatalog {
        &self.catalog
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    pub fn schedule_slots(&self) -> &[SlotLabel] {
        &self.schedule_slots
    }

    // ── Position pass ──────────────────────────────────────────────

    pub fn compute_position_assignments(
        &self,
        ledger: &mut AssignmentLedger,
        start:  NaiveDate,
        end:    NaiveDate,
        agents: &[Agent],
    ) -> RunOutcome<PositionCode> {
        let mut out = RunOutcome::new();
        self.begin_run(&mut out.events, AssignmentKind::Position, start, end, agents.len());

        if self.options.clear_before_run {
            let removed = self.clear_assignments(ledger, start, end, agents, AssignmentKind::Position);
            out.events.push(PlanEvent::AssignmentsCleared {
                kind: AssignmentKind::Position,
                start,
                end,
                removed,
            });
        }

        for date in days_inclusive(start, end) {
            if let Some(reason) = self.skip_reason(date) {
                out.events.push(PlanEvent::DaySkipped { date, reason });
                continue;
            }

            let mut pool: Vec<&Agent> = agents
                .iter()
                .filter(|a| self.is_available(a, date))
                .filter(|a| weekly_load(ledger, &a.id, date) < a.max_weekdays_per_week)
                .collect();

            // Exclusive positions are reserved before anyone is scored.
            for position in self.catalog.in_priority_order() {
                let Some(owner) = position.exclusive_agent.as_deref() else { continue };
                match pool.iter().position(|a| a.id == owner) {
                    Some(idx) => {
                        let agent = pool.remove(idx);
                        self.assign_position(ledger, &mut out, agent, position, date, None);
                    }
                    None => self.unfilled(&mut out, position, date, UnfilledReason::ExclusiveAgentUnavailable),
                }
            }

            for position in self.catalog.in_priority_order() {
                if position.exclusive_agent.is_some() {
                    continue;
                }
                match best_candidate(ledger, &pool, position, date) {
                    Some((idx, score)) if score > 0 => {
                        let agent = pool.remove(idx);
                        self.assign_position(ledger, &mut out, agent, position, date, Some(score));
                    }
                    _ => self.unfilled(&mut out, position, date, UnfilledReason::NoQualifyingAgent),
                }
            }
        }

        self.finish_run(&mut out.events, AssignmentKind::Position, out.assignments.len());
        out
    }

    fn assign_position(
        &self,
        ledger:   &mut AssignmentLedger,
        out:      &mut RunOutcome<PositionCode>,
        agent:    &Agent,
        position: &Position,
        date:     NaiveDate,
        score:    Option<i32>,
    ) {
        ledger.set(
            AssignmentKey::new(&agent.id, date, AssignmentKind::Position),
            position.code.clone(),
        );
        out.assignments.insert((agent.id.clone(), date), position.code.clone());
        log::debug!("{date} {} -> {} (score {score:?})", agent.id, position.code);
        out.events.push(PlanEvent::PositionAssigned {
            date,
            agent_id: agent.id.clone(),
            position: position.code.clone(),
            score,
        });
    }

    fn unfilled(
        &self,
        out:      &mut RunOutcome<PositionCode>,
        position: &Position,
        date:     NaiveDate,
        reason:   UnfilledReason,
    ) {
        log::warn!("{date} {} left unfilled: {reason:?}", position.code);
        out.events.push(PlanEvent::PositionUnfilled {
            date,
            position: position.code.clone(),
            reason,
        });
    }

    // ── Schedule pass ──────────────────────────────────────────────

    pub fn compute_schedule_assignments(
        &self,
        ledger: &mut AssignmentLedger,
        start:  NaiveDate,
        end:    NaiveDate,
        agents: &[Agent],
    ) -> RunOutcome<SlotLabel> {
        let mut out = RunOutcome::new();
        self.begin_run(&mut out.events, AssignmentKind::Schedule, start, end, agents.len());

        if self.schedule_slots.is_empty() {
            log::warn!("No schedule slots configured; nothing to rotate");
            self.finish_run(&mut out.events, AssignmentKind::Schedule, 0);
            return out;
        }

        for date in days_inclusive(start, end) {
            if let Some(reason) = self.skip_reason(date) {
                out.events.push(PlanEvent::DaySkipped { date, reason });
                continue;
            }

            let pool = agents.iter().filter(|a| self.is_available(a, date));
            for (i, agent) in pool.enumerate() {
                let slot = &self.schedule_slots[i % self.schedule_slots.len()];
                ledger.set(
                    AssignmentKey::new(&agent.id, date, AssignmentKind::Schedule),
                    slot.clone(),
                );
                out.assignments.insert((agent.id.clone(), date), slot.clone());
                out.events.push(PlanEvent::SlotAssigned {
                    date,
                    agent_id: agent.id.clone(),
                    slot:     slot.clone(),
                });
            }
        }

        self.finish_run(&mut out.events, AssignmentKind::Schedule, out.assignments.len());
        out
    }

    // ── Clear / coverage ───────────────────────────────────────────

    /// Remove `kind` records of `agents` in `[start, end]`. Returns the count.
    pub fn clear_assignments(
        &self,
        ledger: &mut AssignmentLedger,
        start:  NaiveDate,
        end:    NaiveDate,
        agents: &[Agent],
        kind:   AssignmentKind,
    ) -> usize {
        let ids: Vec<&str> = agents.iter().map(|a| a.id.as_str()).collect();
        let removed = ledger.clear(start, end, &ids, kind);
        log::info!("Cleared {removed} {} records {start}..={end}", kind.as_str());
        removed
    }

    /// Staffing gaps of the working days in `[start, end]`.
    pub fn coverage(&self, ledger: &AssignmentLedger, start: NaiveDate, end: NaiveDate) -> Vec<CoverageGap> {
        coverage_report(ledger, &self.catalog, &self.calendar, start, end, &self.options)
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn skip_reason(&self, date: NaiveDate) -> Option<SkipReason> {
        if HolidayCalendar::is_weekend(date) {
            Some(SkipReason::Weekend)
        } else if self.options.holidays_block_assignment && self.calendar.is_holiday(date) {
            Some(SkipReason::Holiday)
        } else {
            None
        }
    }

    fn is_available(&self, agent: &Agent, date: NaiveDate) -> bool {
        !agent.is_unavailable_on(HolidayCalendar::weekday_name(date))
            && self.availability.is_available(agent, date)
    }

    fn begin_run(
        &self,
        events:      &mut Vec<PlanEvent>,
        kind:        AssignmentKind,
        start:       NaiveDate,
        end:         NaiveDate,
        agent_count: usize,
    ) {
        if start > end {
            log::warn!("{} run with inverted range {start} > {end}; nothing to plan", kind.as_str());
        }
        log::info!("{} run {start}..={end} for {agent_count} agents", kind.as_str());
        events.push(PlanEvent::RunStarted { kind, start, end, agent_count });
    }

    fn finish_run(&self, events: &mut Vec<PlanEvent>, kind: AssignmentKind, records: usize) {
        log::info!("{} run complete: {records} records", kind.as_str());
        events.push(PlanEvent::RunCompleted { kind, records });
    }
}

/// Index in `pool` and score of the best agent for `position`.
/// Strictly-greater comparison: the first agent seen wins a tie.
fn best_candidate(
    ledger:   &AssignmentLedger,
    pool:     &[&Agent],
    position: &Position,
    date:     NaiveDate,
) -> Option<(usize, i32)> {
    let mut best: Option<(usize, i32)> = None;
    for (idx, agent) in pool.iter().enumerate() {
        let score = compatibility_score(agent, position, weekly_load(ledger, &agent.id, date));
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((idx, score));
        }
    }
    best
}
