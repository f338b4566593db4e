//! End-to-end runs of the `qa-assign` binary in isolated temp directories.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn qa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("qa-assign").unwrap();
    cmd.current_dir(dir);
    cmd.env("QA_LOG", "error");
    cmd
}

fn write(dir: &Path, name: &str, v: &Value) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, v.to_string()).unwrap();
    p
}

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let items: Vec<Value> = (0..10).map(|i| json!({"id": i, "brand": "acme"})).collect();
    write(dir.path(), "items.json", &Value::Array(items));
    write(
        dir.path(),
        "roster.json",
        &json!({"members": [{"name": "ann", "capacity": 3}, {"name": "bob", "capacity": 3}, {"name": "cy"}],
                "absent": ["cy"]}),
    );
    dir
}

fn read_json(p: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(p).unwrap()).unwrap()
}

#[test]
fn run_writes_artifacts_and_prints_summary() {
    let dir = fixture();
    qa(dir.path())
        .args(["--items", "items.json", "--roster", "roster.json", "--out", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Ann: 3 products (Limit: 3)"))
        .stdout(predicate::str::contains("- Backlog: 4 products"));

    let assignments = read_json(&dir.path().join("out/assignments.json"));
    assert_eq!(assignments["assignments"].as_array().unwrap().len(), 10);
    let summary = read_json(&dir.path().join("out/summary.json"));
    assert_eq!(summary["summary"]["backlog_count"], 4);
    assert_eq!(summary["input_digest"].as_str().unwrap().len(), 64);
}

#[test]
fn overrides_change_the_team() {
    let dir = fixture();
    qa(dir.path())
        .args(["--items", "items.json", "--roster", "roster.json", "--out", "out", "--quiet"])
        .args(["--absent", "none", "--limit", "Cy:4"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let summary = read_json(&dir.path().join("out/summary.json"));
    assert_eq!(summary["summary"]["workers"].as_array().unwrap().len(), 3);
    assert_eq!(summary["summary"]["backlog_count"], 0);
}

#[test]
fn identical_runs_write_identical_bytes() {
    let dir = fixture();
    for out in ["a", "b"] {
        qa(dir.path())
            .args(["--items", "items.json", "--roster", "roster.json", "--out", out, "--quiet"])
            .assert()
            .success();
    }
    for f in ["assignments.json", "summary.json"] {
        assert_eq!(fs::read(dir.path().join("a").join(f)).unwrap(), fs::read(dir.path().join("b").join(f)).unwrap());
    }
}

#[test]
fn manifest_mode_and_renders() {
    let dir = fixture();
    write(dir.path(), "cfg.json", &json!({"rebalance": "off"}));
    write(
        dir.path(),
        "run.json",
        &json!({"items_path": "items.json", "roster_path": "roster.json", "config_path": "cfg.json"}),
    );
    qa(dir.path())
        .args(["--manifest", "run.json", "--out", "out", "--render", "text", "--render", "json", "--quiet"])
        .assert()
        .success();
    assert!(dir.path().join("out/report.txt").is_file());
    let report = read_json(&dir.path().join("out/report.json"));
    assert_eq!(report["backlog"]["count"], 4);
    assert_eq!(read_json(&dir.path().join("out/summary.json"))["config"]["rebalance"], "off");
}

#[test]
fn validate_only_writes_nothing() {
    let dir = fixture();
    qa(dir.path())
        .args(["--items", "items.json", "--roster", "roster.json", "--out", "out", "--validate-only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 items"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn exit_codes_by_failure_kind() {
    let dir = fixture();
    // flags
    qa(dir.path()).args(["--items", "items.json"]).assert().code(2);
    qa(dir.path()).args(["--items", "http://x/items.json", "--roster", "roster.json"]).assert().code(2);
    // roster / config
    write(dir.path(), "empty.json", &json!({"members": []}));
    qa(dir.path())
        .args(["--items", "items.json", "--roster", "empty.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration"));
    qa(dir.path())
        .args(["--items", "items.json", "--roster", "roster.json", "--limit", "Ann:lots"])
        .assert()
        .code(2);
    // data
    write(dir.path(), "noids.json", &json!([{"brand": "x"}, {"brand": "y"}]));
    qa(dir.path()).args(["--items", "noids.json", "--roster", "roster.json"]).assert().code(5);
    // bad JSON
    fs::write(dir.path().join("broken.json"), "[{").unwrap();
    qa(dir.path()).args(["--items", "broken.json", "--roster", "roster.json"]).assert().code(2);
}
