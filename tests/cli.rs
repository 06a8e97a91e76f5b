//! End-to-end tests for the `datacollect` binary.
//!
//! Every test runs against a database in its own temp directory with no
//! usable Google credentials, so sync attempts fail and records stay pending.

use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("app.sqlite")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("datacollect").unwrap();
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("DATACOLLECT_CREDENTIALS", self.dir.path().join("missing.json"))
            .env_remove("GOOGLE_CREDENTIALS")
            .env_remove("DATACOLLECT_DB")
            .env_remove("DC_TEST_DB")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(self.db())
            .arg("--sheet-id")
            .arg("test-sheet");
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).arg("--json").assert().success();
        serde_json::from_slice(&output.get_output().stdout).unwrap()
    }

    fn init(&self) {
        self.cmd().args(["init", "--json"]).assert().success();
    }
}

#[test]
fn init_creates_database() {
    let ws = Workspace::new();
    let out = ws.json(&["init"]);

    assert_eq!(out["spreadsheet_id"], "test-sheet");
    assert!(ws.db().exists());
}

#[test]
fn init_twice_requires_force() {
    let ws = Workspace::new();
    ws.init();

    ws.cmd().args(["init", "--json"]).assert().code(2);
    ws.cmd().args(["init", "--force", "--json"]).assert().success();
}

#[test]
fn commands_before_init_report_not_initialized() {
    let ws = Workspace::new();

    let output = ws
        .cmd()
        .args(["record", "list", "agronomic", "--json"])
        .assert()
        .code(2);
    let err: Value = serde_json::from_slice(&output.get_output().stderr).unwrap();
    assert_eq!(err["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn add_without_credentials_saves_record_as_pending() {
    let ws = Workspace::new();
    ws.init();

    let out = ws.json(&[
        "record",
        "add",
        "agronomic",
        "-s",
        "plot_number=P1",
        "-s",
        "plant_height=88.5",
    ]);

    assert_eq!(out["record"]["id"], 1);
    assert_eq!(out["record"]["plot_number"], "P1");
    assert_eq!(out["record"]["synced"], false);
    assert_eq!(out["outcome"], "failed");

    let list = ws.json(&["record", "list", "agronomic", "--unsynced"]);
    assert_eq!(list["count"], 1);
}

#[test]
fn add_no_sync_skips_the_sheet() {
    let ws = Workspace::new();
    ws.init();

    let out = ws.json(&["record", "add", "disease", "-s", "plot_number=D4", "--no-sync"]);
    assert!(out.get("outcome").is_none());
    assert_eq!(out["record"]["kind"], "disease");
}

#[test]
fn add_rejects_bad_input() {
    let ws = Workspace::new();
    ws.init();

    ws.cmd()
        .args(["record", "add", "orchard", "-s", "plot_number=P1", "--json"])
        .assert()
        .code(4);
    ws.cmd()
        .args(["record", "add", "agronomic", "-s", "colour=red", "--json"])
        .assert()
        .code(4);
    ws.cmd()
        .args(["record", "add", "agronomic", "-s", "tillers=many", "--json"])
        .assert()
        .code(4);
}

#[test]
fn show_missing_record_is_not_found() {
    let ws = Workspace::new();
    ws.init();

    ws.cmd()
        .args(["record", "show", "agronomic", "99", "--json"])
        .assert()
        .code(3);
}

#[test]
fn sync_status_counts_pending_records() {
    let ws = Workspace::new();
    ws.init();
    ws.json(&["record", "add", "agronomic", "-s", "plot_number=P1", "--no-sync"]);
    ws.json(&["record", "add", "growth-field", "-s", "plot_number=G1", "--no-sync"]);

    let status = ws.json(&["sync", "status"]);
    assert_eq!(status["pending"], 2);
    assert_eq!(status["spreadsheet_id"], "test-sheet");

    let kinds = status["kinds"].as_array().unwrap();
    assert_eq!(kinds.len(), 8);
    let agronomic = kinds.iter().find(|k| k["kind"] == "agronomic").unwrap();
    assert_eq!(agronomic["unsynced"], 1);
}

#[test]
fn sync_all_without_credentials_keeps_records_pending() {
    let ws = Workspace::new();
    ws.init();
    ws.json(&["record", "add", "agronomic", "-s", "plot_number=P1", "--no-sync"]);

    let out = ws.json(&["sync", "all"]);
    assert_eq!(out["report"]["total_synced"], 0);
    assert_eq!(out["pending"], 1);
}

#[test]
fn sync_one_without_credentials_is_a_credential_error() {
    let ws = Workspace::new();
    ws.init();
    ws.json(&["record", "add", "agronomic", "-s", "plot_number=P1", "--no-sync"]);

    let output = ws
        .cmd()
        .args(["sync", "one", "agronomic", "1", "--json"])
        .assert()
        .code(6);
    let err: Value = serde_json::from_slice(&output.get_output().stderr).unwrap();
    assert_eq!(err["error"]["code"], "CREDENTIAL_ERROR");
    assert!(err["error"]["hint"].as_str().unwrap().contains("GOOGLE_CREDENTIALS"));

    // The record is untouched
    let list = ws.json(&["record", "list", "agronomic", "--unsynced"]);
    assert_eq!(list["count"], 1);
}

#[test]
fn dashboard_summarizes_records() {
    let ws = Workspace::new();
    ws.init();
    ws.json(&[
        "record",
        "add",
        "agronomic",
        "-s",
        "plot_number=P1",
        "-s",
        "genotype=IR64",
        "--no-sync",
    ]);

    let dash = ws.json(&["dashboard"]);
    assert_eq!(dash["total_records"], 1);
    assert_eq!(dash["total_unsynced"], 1);
    assert_eq!(dash["recent_entries"].as_array().unwrap().len(), 1);
}

#[test]
fn version_reports_schema() {
    let ws = Workspace::new();
    let out = ws.json(&["version"]);
    assert_eq!(out["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(out["schema"], 1);
}
