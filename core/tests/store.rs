//! PlanStore — assignments, event log, snapshots and leave requests.

use chrono::NaiveDate;
use labplan_core::{
    config::PlanConfig,
    engine::PlanEngine,
    event::PlanEvent,
    leave::{AbsencePeriod, LeaveBook, LeaveRequest, RequestStatus, Reviewer},
    ledger::{AssignmentKey, AssignmentKind, AssignmentLedger},
    store::PlanStore,
};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

fn fresh_store() -> PlanStore {
    let store = PlanStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn supervisor() -> Reviewer {
    Reviewer { username: "supervisor".into(), can_validate: true }
}

#[test]
fn migrations_are_repeatable() {
    let store = fresh_store();
    store.migrate().expect("second migrate");
    assert_eq!(store.run_count().unwrap(), 0);
}

#[test]
fn save_ledger_replaces_the_whole_table() {
    let store = fresh_store();
    let mut ledger = AssignmentLedger::new();
    ledger.set(AssignmentKey::new("Patrick", d(3), AssignmentKind::Position), "P3".into());
    ledger.set(AssignmentKey::new("Patrick", d(3), AssignmentKind::Schedule), "9h30-17h30".into());
    store.save_ledger(&ledger).unwrap();

    ledger.remove("Patrick", d(3), AssignmentKind::Schedule);
    ledger.set(AssignmentKey::new("Patrick", d(3), AssignmentKind::Position), "P4".into());
    store.save_ledger(&ledger).unwrap();

    let loaded = store.load_ledger().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.position("Patrick", d(3)), Some("P4"));
    assert_eq!(loaded.schedule("Patrick", d(3)), None);
}

#[test]
fn events_keep_their_sequence_across_appends() {
    let store = fresh_store();
    let cfg = PlanConfig::default_lab();
    let engine = PlanEngine::from_config(&cfg).unwrap();
    let agents = cfg.directory().unwrap().agents().to_vec();
    let mut ledger = AssignmentLedger::new();

    store.insert_run("run-1", AssignmentKind::Position, d(2), d(8)).unwrap();
    let out = engine.compute_position_assignments(&mut ledger, d(2), d(8), &agents);
    let (head, tail) = out.events.split_at(out.events.len() / 2);
    store.append_events("run-1", head).unwrap();
    store.append_events("run-1", tail).unwrap();

    let entries = store.events_for_run("run-1").unwrap();
    assert_eq!(entries.len(), out.events.len());
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.seq, i as u64);
        let event: PlanEvent = serde_json::from_str(&entry.payload).unwrap();
        assert_eq!(event, out.events[i]);
        assert_eq!(entry.event_type, event.type_name());
    }
    assert_eq!(entries[0].event_type, "run_started");
    assert_eq!(entries.last().unwrap().event_type, "run_completed");
    assert!(entries.iter().any(|e| e.event_type == "day_skipped"));
}

#[test]
fn latest_snapshot_wins() {
    let store = fresh_store();
    assert!(store.latest_snapshot().unwrap().is_none());

    let mut ledger = AssignmentLedger::new();
    ledger.set(AssignmentKey::new("Caroline", d(3), AssignmentKind::Position), "P9".into());
    store.insert_run("run-1", AssignmentKind::Position, d(3), d(3)).unwrap();
    store.save_snapshot("run-1", &ledger).unwrap();

    ledger.set(AssignmentKey::new("Caroline", d(4), AssignmentKind::Position), "P9".into());
    store.insert_run("run-2", AssignmentKind::Position, d(4), d(4)).unwrap();
    store.save_snapshot("run-2", &ledger).unwrap();

    let (run_id, restored) = store.latest_snapshot().unwrap().expect("snapshot");
    assert_eq!(run_id, "run-2");
    assert_eq!(restored, ledger);
    assert_eq!(store.run_count().unwrap(), 2);
}

#[test]
fn leave_requests_survive_status_changes() {
    let store = fresh_store();
    let mut leave = LeaveRequest::leave("Laetitia", d(10), d(13), " congé ", d(1)).unwrap();
    let absence = LeaveRequest::absence("Olivier", d(5), AbsencePeriod::Morning, "médecin", d(2)).unwrap();
    store.upsert_leave_request(&leave).unwrap();
    store.upsert_leave_request(&absence).unwrap();
    assert_eq!(store.leave_request_count("pending").unwrap(), 2);

    leave.approve(&supervisor(), d(3)).unwrap();
    store.upsert_leave_request(&leave).unwrap();

    assert_eq!(store.leave_request_count("pending").unwrap(), 1);
    assert_eq!(store.leave_request_count("approved").unwrap(), 1);

    let all = store.leave_requests().unwrap();
    assert_eq!(all.len(), 2);
    let laetitia = store.leave_requests_for("Laetitia").unwrap();
    assert_eq!(laetitia, vec![leave.clone()]);
    assert_eq!(laetitia[0].status, RequestStatus::Approved);
    assert_eq!(laetitia[0].reason, "congé");
    assert_eq!(laetitia[0].reviewed_by.as_deref(), Some("supervisor"));
}

#[test]
fn stored_leave_feeds_the_engine() {
    let store = fresh_store();
    let mut leave = LeaveRequest::leave("Laetitia", d(3), d(3), "", d(1)).unwrap();
    leave.approve(&supervisor(), d(2)).unwrap();
    store.upsert_leave_request(&leave).unwrap();

    let cfg = PlanConfig::default_lab();
    let agents = cfg.directory().unwrap().agents().to_vec();
    let book = LeaveBook::new(store.leave_requests().unwrap());
    let engine = PlanEngine::from_config(&cfg).unwrap().with_availability(book);
    let mut ledger = AssignmentLedger::new();

    engine.compute_position_assignments(&mut ledger, d(3), d(3), &agents);
    engine.compute_schedule_assignments(&mut ledger, d(3), d(3), &agents);

    assert!(!ledger.has_position("Laetitia", d(3)));
    assert_eq!(ledger.schedule("Laetitia", d(3)), None);
    assert!(ledger.has_position("Patrick", d(3)));
}
