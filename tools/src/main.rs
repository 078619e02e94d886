//! plan-runner: headless planning runner for the lab.
//!
//! Usage:
//!   plan-runner --start 2025-06-02 --end 2025-06-06 --db plan.db
//!   plan-runner --agents Melissa,Patrick --schedules --block-holidays
//!   plan-runner --db plan.db --ipc-mode

use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate};
use labplan_core::{
    calendar::{days_inclusive, week_start},
    command::{ordered_range, PlanCommand},
    config::PlanConfig,
    coverage::CoverageGap,
    directory::{Agent, AgentDirectory, AgentOrder},
    engine::PlanEngine,
    leave::{AbsencePeriod, LeaveBook, LeaveRequest, Reviewer},
    ledger::{AssignmentKind, AssignmentLedger, AssignmentRecord},
    store::PlanStore,
    types::{AgentId, RunId},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Serialize)]
struct UiState {
    start:         NaiveDate,
    end:           NaiveDate,
    last_run:      Option<RunId>,
    assignments:   Vec<AssignmentRecord>,
    coverage:      Vec<CoverageGap>,
    open_requests: Vec<LeaveRequest>,
}

/// Everything a planning session keeps between commands.
struct Session {
    config:    PlanConfig,
    directory: AgentDirectory,
    store:     PlanStore,
    ledger:    AssignmentLedger,
    leave:     LeaveBook,
    today:     NaiveDate,
    last_run:  Option<RunId>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let today = Local::now().date_naive();
    let monday = week_start(today);
    let start = parse_arg(&args, "--start", monday);
    let end = parse_arg(&args, "--end", monday + Duration::days(4));
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let with_schedules = args.iter().any(|a| a == "--schedules");
    let block_holidays = args.iter().any(|a| a == "--block-holidays");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let agent_ids: Vec<AgentId> = flag_value(&args, "--agents")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let mut config = PlanConfig::load(data_dir).unwrap_or_else(|e| {
        log::warn!("{e:#}; falling back to the built-in lab");
        PlanConfig::default_lab()
    });
    if block_holidays {
        config.engine.holidays_block_assignment = true;
    }

    if !ipc_mode {
        println!("Lab planner: plan-runner");
        println!("  range:     {start} .. {end}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  agents:    {}", if agent_ids.is_empty() { "all".to_string() } else { agent_ids.join(", ") });
        println!();
    }

    let mut session = Session::open(config, db, today)?;

    if ipc_mode {
        run_ipc_loop(&mut session)?;
    } else {
        let (start, end) = ordered_range(start, end);
        session.run(AssignmentKind::Position, start, end, &agent_ids, AgentOrder::Directory)?;
        if with_schedules {
            session.run(AssignmentKind::Schedule, start, end, &agent_ids, AgentOrder::Directory)?;
        }
        print_summary(&session, start, end, &agent_ids)?;
    }

    Ok(())
}

impl Session {
    fn open(config: PlanConfig, db: &str, today: NaiveDate) -> Result<Self> {
        let directory = config.directory()?;
        let store = PlanStore::open(db)?;
        store.migrate()?;

        let ledger = store.load_ledger()?;
        let mut leave = LeaveBook::new(store.leave_requests()?);
        if leave.refresh_overdue(today) > 0 {
            for request in leave.requests() {
                store.upsert_leave_request(request)?;
            }
        }
        log::info!(
            "Session opened: {} agents, {} stored records, {} leave requests",
            directory.len(),
            ledger.len(),
            leave.requests().len()
        );

        Ok(Self { config, directory, store, ledger, leave, today, last_run: None })
    }

    /// The engine sees the leave book as it stands right now.
    fn engine(&self) -> Result<PlanEngine> {
        Ok(PlanEngine::from_config(&self.config)?.with_availability(self.leave.clone()))
    }

    /// Empty `ids` selects the whole directory in directory order.
    fn agents(&self, ids: &[AgentId], order: AgentOrder) -> Result<Vec<Agent>> {
        if ids.is_empty() {
            return Ok(self.directory.agents().to_vec());
        }
        Ok(self.directory.select(ids, order)?)
    }

    fn run(
        &mut self,
        kind:  AssignmentKind,
        start: NaiveDate,
        end:   NaiveDate,
        ids:   &[AgentId],
        order: AgentOrder,
    ) -> Result<RunId> {
        let (start, end) = ordered_range(start, end);
        let agents = self.agents(ids, order)?;
        let engine = self.engine()?;

        let run_id = format!("run-{}", self.store.run_count()? + 1);
        let mut staged = self.ledger.clone();
        let events = match kind {
            AssignmentKind::Position => {
                engine.compute_position_assignments(&mut staged, start, end, &agents).events
            }
            AssignmentKind::Schedule => {
                engine.compute_schedule_assignments(&mut staged, start, end, &agents).events
            }
        };

        let store = &self.store;
        commit(&mut self.ledger, staged, |ledger| {
            store.insert_run(&run_id, kind, start, end)?;
            store.append_events(&run_id, &events)?;
            store.save_ledger(ledger)?;
            store.save_snapshot(&run_id, ledger)?;
            Ok(())
        })?;
        self.last_run = Some(run_id.clone());
        Ok(run_id)
    }

    fn clear(&mut self, start: NaiveDate, end: NaiveDate, ids: &[AgentId], kind: AssignmentKind) -> Result<usize> {
        let (start, end) = ordered_range(start, end);
        let agents = self.agents(ids, AgentOrder::Directory)?;
        let mut staged = self.ledger.clone();
        let removed = self.engine()?.clear_assignments(&mut staged, start, end, &agents, kind);
        let store = &self.store;
        commit(&mut self.ledger, staged, |ledger| Ok(store.save_ledger(ledger)?))?;
        Ok(removed)
    }

    fn submit_leave(&mut self, agent_id: &str, start: NaiveDate, end: NaiveDate, reason: &str) -> Result<()> {
        if self.directory.get(agent_id).is_none() {
            return Err(anyhow!("Unknown agent '{agent_id}'"));
        }
        let request = LeaveRequest::leave(agent_id, start, end, reason, self.today)?;
        self.store.upsert_leave_request(&request)?;
        self.leave.submit(request);
        Ok(())
    }

    fn submit_absence(
        &mut self,
        agent_id: &str,
        date:     NaiveDate,
        period:   AbsencePeriod,
        reason:   &str,
    ) -> Result<()> {
        if self.directory.get(agent_id).is_none() {
            return Err(anyhow!("Unknown agent '{agent_id}'"));
        }
        let request = LeaveRequest::absence(agent_id, date, period, reason, self.today)?;
        self.store.upsert_leave_request(&request)?;
        self.leave.submit(request);
        Ok(())
    }

    fn review(&mut self, request_id: &str, reviewer: Reviewer, approve: bool) -> Result<()> {
        let store = &self.store;
        self.leave
            .decide(request_id, &reviewer, approve, self.today, |r| store.upsert_leave_request(r))?;
        Ok(())
    }

    fn state(&self, start: NaiveDate, end: NaiveDate) -> Result<UiState> {
        let (start, end) = ordered_range(start, end);
        let assignments = self
            .ledger
            .records()
            .into_iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect();
        Ok(UiState {
            start,
            end,
            last_run: self.last_run.clone(),
            assignments,
            coverage: self.engine()?.coverage(&self.ledger, start, end),
            open_requests: self.leave.open_requests().cloned().collect(),
        })
    }
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: PlanCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };
        if cmd == PlanCommand::Quit {
            break;
        }

        match handle_command(session, cmd) {
            Ok(state) => writeln!(stdout, "{}", serde_json::to_string(&state)?)?,
            Err(e) => {
                log::warn!("Command failed: {e:#}");
                write_error(&mut stdout, &format!("{e:#}"))?;
                continue;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Apply one command and return the state of the range it touched.
fn handle_command(session: &mut Session, cmd: PlanCommand) -> Result<UiState> {
    match cmd {
        PlanCommand::AssignPositions { start, end, agents, order } => {
            session.run(AssignmentKind::Position, start, end, &agents, order)?;
            session.state(start, end)
        }
        PlanCommand::AssignSchedules { start, end, agents, order } => {
            session.run(AssignmentKind::Schedule, start, end, &agents, order)?;
            session.state(start, end)
        }
        PlanCommand::ClearAssignments { start, end, agents, kind } => {
            session.clear(start, end, &agents, kind)?;
            session.state(start, end)
        }
        PlanCommand::SubmitLeave { agent_id, start, end, reason } => {
            session.submit_leave(&agent_id, start, end, &reason)?;
            session.state(start, end)
        }
        PlanCommand::ReviewRequest { request_id, reviewer, can_validate, approve } => {
            session.review(&request_id, Reviewer { username: reviewer, can_validate }, approve)?;
            let monday = week_start(session.today);
            session.state(monday, monday + Duration::days(6))
        }
        PlanCommand::GetState { start, end } => session.state(start, end),
        PlanCommand::Quit => Err(anyhow!("quit is handled by the loop")),
        PlanCommand::SubmitAbsence { agent_id, date, period, reason } => {
            session.submit_absence(&agent_id, date, period, &reason)?;
            session.state(date, date)
        }
    }
}

/// Replace `current` with `staged` once `persist` has written it.
fn commit<T>(current: &mut T, staged: T, persist: impl FnOnce(&T) -> Result<()>) -> Result<()> {
    persist(&staged)?;
    *current = staged;
    Ok(())
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(session: &Session, start: NaiveDate, end: NaiveDate, ids: &[AgentId]) -> Result<()> {
    let agents = session.agents(ids, AgentOrder::Directory)?;
    let days: Vec<NaiveDate> = days_inclusive(start, end).collect();

    println!("=== ASSIGNMENTS ===");
    print!("  {:<12}", "agent");
    for day in &days {
        print!(" {:<18}", day.format("%a %d/%m").to_string());
    }
    println!();
    for agent in &agents {
        print!("  {:<12}", agent.id);
        for day in &days {
            let cell = match (session.ledger.position(&agent.id, *day), session.ledger.schedule(&agent.id, *day)) {
                (Some(p), Some(s)) => format!("{p} {s}"),
                (Some(p), None)    => p.to_string(),
                (None, Some(s))    => s.to_string(),
                (None, None)       => "-".to_string(),
            };
            print!(" {cell:<18}");
        }
        println!();
    }

    println!();
    println!("=== COVERAGE GAPS ===");
    let gaps = session.engine()?.coverage(&session.ledger, start, end);
    if gaps.is_empty() {
        println!("  (every position staffed within bounds)");
    }
    for gap in &gaps {
        println!(
            "  {} {:<4} {:?}: {} assigned (min {}, max {})",
            gap.date, gap.position, gap.kind, gap.assigned, gap.min, gap.max
        );
    }

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  last run:       {}", session.last_run.as_deref().unwrap_or("-"));
    println!("  runs stored:    {}", session.store.run_count()?);
    println!("  records stored: {}", session.ledger.len());
    println!("  open requests:  {}", session.leave.open_requests().count());
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
