//! End-to-end scenarios through the public pipeline surface.

use std::fs;

use serde_json::json;

use qa_core::sources::{RawCapacity, RawId, RawItem, RawMember, RawPreAssignment, RawPreferences, RawRoster};
use qa_core::variables::{BalanceRule, RebalanceMode};
use qa_core::{Assignee, BlockState, Diagnostic, EngineConfig, ItemId, WorkerName};
use qa_io::sink::JsonAssignmentSink;
use qa_pipeline::{run, run_from_manifest_path, write_back, PipelineError};

fn member(name: &str, cap: i64) -> RawMember {
    RawMember { name: name.into(), capacity: Some(RawCapacity::Count(cap)), preferences: RawPreferences::default() }
}

fn roster(members: &[(&str, i64)]) -> RawRoster {
    RawRoster { members: members.iter().map(|&(n, c)| member(n, c)).collect(), ..RawRoster::default() }
}

fn items(brand: &str, ids: std::ops::Range<u64>) -> Vec<RawItem> {
    ids.map(|i| RawItem { id: Some(RawId::Number(i)), brand: Some(brand.into()), ..RawItem::default() })
        .collect()
}

fn assigned_to(outcome: &qa_pipeline::AllocationOutcome, name: &str) -> usize {
    outcome.assignments.values().filter(|a| a.to_string() == name).count()
}

#[test]
fn zero_capacity_worker_is_excluded_and_block_splits_evenly() {
    let mut r = roster(&[("a", 5), ("b", 5), ("c", 0)]);
    r.absent = vec!["c".into()];
    let out = run(items("X", 0..8), r, &EngineConfig::default()).unwrap();

    assert_eq!(out.targets.len(), 2);
    assert_eq!(out.summary.workers.iter().map(|w| w.target).collect::<Vec<_>>(), vec![4, 4]);
    assert_eq!(assigned_to(&out, "A"), 4);
    assert_eq!(assigned_to(&out, "B"), 4);
    assert!(out.backlog.is_empty());
}

#[test]
fn shortfall_goes_to_backlog() {
    let out = run(items("X", 0..10), roster(&[("a", 3), ("b", 3)]), &EngineConfig::default()).unwrap();
    assert_eq!(assigned_to(&out, "A"), 3);
    assert_eq!(assigned_to(&out, "B"), 3);
    assert_eq!(out.backlog.len(), 4);
    assert_eq!(out.summary.backlog_count, 4);
    assert_eq!(assigned_to(&out, "Backlog"), 4);
}

#[test]
fn pre_assignment_is_capacity_bound_and_survives_rebalancing() {
    let mut r = roster(&[("a", 5), ("b", 5)]);
    r.pre_assignments = vec![RawPreAssignment { brand: "X".into(), worker: "a".into() }];
    let out = run(items("X", 0..3), r, &EngineConfig::default()).unwrap();
    assert_eq!(assigned_to(&out, "A"), 3);
    assert_eq!(out.summary.workers[0].variance, 1);
    assert_eq!(out.decisions.len(), 1);
    assert_eq!(out.decisions[0].size, 3);
    assert_eq!(out.decisions[0].state, BlockState::PlacedWhole { worker: WorkerName::normalize("a").unwrap() });
}

#[test]
fn pre_assigned_brand_with_overflow_is_reported_as_split() {
    let mut r = roster(&[("a", 5), ("b", 5)]);
    r.pre_assignments = vec![RawPreAssignment { brand: "X".into(), worker: "a".into() }];
    let out = run(items("X", 0..7), r, &EngineConfig::default()).unwrap();

    // A is filled to capacity with pinned items, the two left over go to B
    assert_eq!(assigned_to(&out, "A"), 5);
    assert_eq!(assigned_to(&out, "B"), 2);
    assert_eq!(out.decisions.len(), 1);
    let d = &out.decisions[0];
    assert_eq!(d.brand.as_str(), "X");
    assert_eq!(d.size, 7);
    assert_eq!(
        d.state,
        BlockState::PlacedSplit {
            workers: vec![WorkerName::normalize("a").unwrap(), WorkerName::normalize("b").unwrap()],
            backlogged: 0,
        }
    );
}

#[test]
fn priority_item_with_full_team_is_backlogged_without_error() {
    let mut xs = items("X", 0..3);
    for it in &mut xs {
        it.priority_markers = vec![json!(1)];
    }
    let out = run(xs, roster(&[("a", 1), ("b", 1)]), &EngineConfig::default()).unwrap();
    assert_eq!(out.backlog, vec![ItemId::from(2u64)]);
    assert_eq!(out.rows.len(), 3);
}

#[test]
fn every_item_resolved_once_and_rows_follow_catalog_order() {
    let mut xs = items("X", 0..5);
    xs.extend(items("Y", 5..7));
    xs.extend(items("X", 7..9));
    let out = run(xs, roster(&[("a", 4), ("b", 3)]), &EngineConfig::default()).unwrap();

    let ids: Vec<&str> = out.rows.iter().map(|r| r.item.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8"]);
    assert_eq!(out.assignments.len(), 9);
    for w in &out.summary.workers {
        assert!(w.assigned <= w.limit);
    }
    let placed: u32 = out.counts.values().sum();
    assert_eq!(placed + out.summary.backlog_count, 9);
    assert_eq!(out.summary.backlog_count, 2);
}

#[test]
fn unassignable_records_are_reported_not_dropped() {
    let mut xs = items("X", 0..2);
    xs.push(RawItem { id: None, brand: Some("X".into()), ..RawItem::default() });
    xs.push(RawItem { id: Some(RawId::Text("1".into())), ..RawItem::default() });
    let out = run(xs, roster(&[("a", 10)]), &EngineConfig::default()).unwrap();

    assert_eq!(out.rows.len(), 2);
    let positions: Vec<usize> = out.unassignable.iter().map(|u| u.position).collect();
    assert_eq!(positions, vec![2, 3]);
    assert_eq!(out.summary.unassignable_count, 2);
    assert!(out
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::UnassignableItem { position: 3, .. })));
}

#[test]
fn backlog_mode_assigns_earliest_first() {
    let keys = ["2025-04-01", "2025-01-01", "2025-03-01", "2025-02-01"];
    let xs: Vec<RawItem> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| RawItem {
            id: Some(RawId::Number(i as u64)),
            brand: Some("X".into()),
            sequence_key: Some((*k).into()),
            ..RawItem::default()
        })
        .collect();
    let cfg = EngineConfig { backlog_mode: true, ..EngineConfig::default() };
    let out = run(xs, roster(&[("a", 2)]), &cfg).unwrap();

    assert_eq!(out.assignments[&ItemId::from(1u64)].to_string(), "A");
    assert_eq!(out.assignments[&ItemId::from(3u64)].to_string(), "A");
    assert_eq!(out.backlog.len(), 2);
    assert!(out.assignments[&ItemId::from(0u64)].is_backlog());
}

#[test]
fn hard_errors_surface_before_any_assignment() {
    let no_roster = run(items("X", 0..2), RawRoster::default(), &EngineConfig::default());
    assert!(matches!(no_roster, Err(PipelineError::Config(_))));

    let no_ids = vec![RawItem::default(), RawItem::default()];
    assert!(matches!(run(no_ids, roster(&[("a", 1)]), &EngineConfig::default()), Err(PipelineError::Data(_))));

    let bad_cfg = EngineConfig { balance: BalanceRule::Ratio { ratio_pct: 50 }, ..EngineConfig::default() };
    assert!(matches!(run(items("X", 0..1), roster(&[("a", 1)]), &bad_cfg), Err(PipelineError::Config(_))));
}

#[test]
fn identical_inputs_give_identical_outcomes_and_digests() {
    let cfg = EngineConfig { rebalance: RebalanceMode::Brand, ..EngineConfig::default() };
    let mk = || {
        let mut xs = items("X", 0..7);
        xs.extend(items("Y", 7..10));
        xs.extend(items("Z", 10..11));
        xs
    };
    let a = run(mk(), roster(&[("b", 6), ("a", 6), ("c", 2)]), &cfg).unwrap();
    let b = run(mk(), roster(&[("b", 6), ("a", 6), ("c", 2)]), &cfg).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.input_digest.len(), 64);

    let other = EngineConfig { rebalance: RebalanceMode::Item, ..EngineConfig::default() };
    let c = run(mk(), roster(&[("b", 6), ("a", 6), ("c", 2)]), &other).unwrap();
    assert_ne!(a.input_digest, c.input_digest);
}

#[test]
fn write_back_records_every_row_then_finishes() {
    let out = run(items("X", 0..4), roster(&[("a", 2), ("b", 1)]), &EngineConfig::default()).unwrap();

    let mut collected: Vec<(ItemId, Assignee)> = Vec::new();
    write_back(&out, &mut collected).unwrap();
    assert_eq!(collected.len(), 4);
    assert_eq!(collected[0].0, ItemId::from(0u64));

    let dir = tempfile::tempdir().unwrap();
    let mut sink = JsonAssignmentSink::new(dir.path().join("assignments.json"));
    write_back(&out, &mut sink).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(sink.path()).unwrap()).unwrap();
    assert_eq!(v["assignments"].as_array().unwrap().len(), 4);
    assert_eq!(v["assignments"][3]["assignee"], "Backlog");
}

#[test]
fn manifest_run_uses_its_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("items.json"), json!({"items": [{"id": 1, "brand": "x"}, {"id": 2}]}).to_string()).unwrap();
    fs::write(dir.path().join("roster.json"), json!({"members": [{"name": "ann"}]}).to_string()).unwrap();
    fs::write(dir.path().join("cfg.json"), json!({"default_capacity": 1}).to_string()).unwrap();
    let m = dir.path().join("run.json");
    fs::write(&m, json!({"items_path": "items.json", "roster_path": "roster.json", "config_path": "cfg.json"}).to_string())
        .unwrap();

    let out = run_from_manifest_path(&m, &EngineConfig::default()).unwrap();
    assert_eq!(out.config.default_capacity, 1);
    assert_eq!(out.counts.values().sum::<u32>(), 1);
    assert_eq!(out.backlog.len(), 1);
}
