#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn archie(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("archie").unwrap();
    cmd.current_dir(dir.path())
        .env("ARCHIE_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    archie(dir).arg("init").assert().success();
}

fn write_feature(dir: &Path, key: &str, body: &str) {
    std::fs::write(dir.join("features").join(format!("{key}.md")), body).unwrap();
}

fn status_block(status: &str) -> String {
    format!("# Feature\n\n## Status\n- Value: {status}\n- Owner: kim\n- Last Updated:\n- Reason:\n")
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ---------------------------------------------------------------------------
// archie init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_layout() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    for d in [".archie", ".archie/docs", "features", "api", "workflow", "spec", "assets"] {
        assert!(dir.path().join(d).is_dir(), "{d}");
    }
    assert!(dir.path().join("background.md").is_file());
    assert!(dir.path().join("api/api.md").is_file());
    assert!(dir.path().join("AGENTS.md").is_file());
    assert!(dir.path().join(".archie/config.yaml").is_file());
    assert!(dir.path().join(".archie/docs/feature-template.md").is_file());
}

#[test]
fn init_is_idempotent_and_keeps_documents() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(dir.path().join("background.md"), "# Why\n").unwrap();

    archie(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));

    assert_eq!(
        std::fs::read_to_string(dir.path().join("background.md")).unwrap(),
        "# Why\n"
    );
}

#[test]
fn init_refuses_foreign_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

    archie(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not empty"));
}

#[test]
fn init_json_lists_created_files() {
    let dir = TempDir::new().unwrap();
    let output = archie(&dir).args(["init", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value = stdout_json(&output);
    let created = value["created_files"].as_array().unwrap();
    assert!(created.iter().any(|f| f == "background.md"));
}

// ---------------------------------------------------------------------------
// archie status
// ---------------------------------------------------------------------------

#[test]
fn status_overview_reports_progress() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "x", &status_block("FINISHED"));
    write_feature(dir.path(), "y", &status_block("IMPLEMENTING"));
    write_feature(dir.path(), "z", "# Feature z\n\nNo status yet.\n");

    archie(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("61%"))
        .stdout(predicate::str::contains("Completed (1)"))
        .stdout(predicate::str::contains("UNKNOWN (1)"));
}

#[test]
fn status_json_summary() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "x", &status_block("FINISHED"));
    write_feature(dir.path(), "y", &status_block("IMPLEMENTING"));
    write_feature(dir.path(), "z", "no status\n");

    let output = archie(&dir).args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value = stdout_json(&output);
    let summary = &value["summary"];
    assert_eq!(summary["total_features"], 3);
    assert_eq!(summary["completed_count"], 1);
    assert_eq!(summary["not_started_count"], 1);
    assert_eq!(summary["overall_progress"], 61);
    assert_eq!(summary["status_counts"]["DESIGNED"], 0);
}

#[test]
fn status_compact_is_one_line_summary() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "a", &status_block("BLOCKED"));

    archie(&dir)
        .args(["status", "-c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 features | 0% complete | 1 blocked"));
}

#[test]
fn status_without_features_suggests_template() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    archie(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No features found"));
}

#[test]
fn feature_list_groups_active_work_first() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "done", &status_block("FINISHED"));
    write_feature(dir.path(), "busy", &status_block("IMPLEMENTING"));

    let output = archie(&dir).args(["status", "-f"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let busy = stdout.find("busy").unwrap();
    let done = stdout.find("done").unwrap();
    assert!(busy < done);
}

#[test]
fn feature_detail_accepts_paths() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(
        dir.path(),
        "payments",
        "## Status\n- Value: DESIGNED\n- Owner: dana\n\n## Summary\n- One-liner: Card checkout\n\n## Requirements\n- R1: Charge cards\n- R2:\n",
    );

    archie(&dir)
        .args(["status", "--feature", "./features/payments.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Feature: payments"))
        .stdout(predicate::str::contains("DESIGNED"))
        .stdout(predicate::str::contains("Card checkout"))
        .stdout(predicate::str::contains("R1: Charge cards"))
        .stdout(predicate::str::contains("R2:").not());
}

#[test]
fn unknown_feature_suggests_closest() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    for key in ["payments", "auth", "billing"] {
        write_feature(dir.path(), key, &status_block("NOT_REVIEWED"));
    }

    archie(&dir)
        .args(["status", "-f", "paymnets"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Did you mean"))
        .stdout(predicate::str::contains("  - payments"))
        .stdout(predicate::str::contains("Available features"))
        .stderr(predicate::str::contains("feature 'paymnets' not found"));
}

#[test]
fn deps_orders_prerequisites_first() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "a", "## Status\n- Value: DESIGNED\n\n## Feature Dependencies\n- `b`: needs b\n");
    write_feature(dir.path(), "b", &status_block("DESIGNED"));
    write_feature(dir.path(), "c", "## Feature Dependencies\n- `b`: needs b too\n");

    let output = archie(&dir).args(["status", "--deps", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["design_order"], serde_json::json!(["b", "a", "c"]));
    assert_eq!(value["depended_by"]["b"], serde_json::json!(["a", "c"]));

    archie(&dir)
        .args(["status", "-d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended Design Order"))
        .stdout(predicate::str::contains("├─ a"))
        .stdout(predicate::str::contains("└─ c"));
}

#[test]
fn deps_reports_cycles() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "a", "## Feature Dependencies\n- `b`: x\n");
    write_feature(dir.path(), "b", "## Feature Dependencies\n- `c`: x\n");
    write_feature(dir.path(), "c", "## Feature Dependencies\n- `a`: x\n");

    archie(&dir)
        .args(["status", "--deps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Circular Dependencies Detected!"));
}

#[test]
fn deps_missing_dependency_is_listed_and_left_out_of_order() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "auth", &status_block("DESIGNED"));
    write_feature(dir.path(), "payments", "## Feature Dependencies\n- `ledger`: balances\n");

    let output = archie(&dir).args(["status", "--deps", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["design_order"], serde_json::json!(["auth"]));
    assert_eq!(
        value["missing"],
        serde_json::json!([{ "feature": "payments", "dependency": "ledger" }])
    );

    archie(&dir)
        .args(["status", "--deps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("payments → ledger [NOT FOUND]"));
}

// ---------------------------------------------------------------------------
// archie export
// ---------------------------------------------------------------------------

#[test]
fn export_writes_single_document() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(dir.path().join("background.md"), "We need payments.\n").unwrap();
    write_feature(dir.path(), "auth", &status_block("FINISHED"));
    write_feature(
        dir.path(),
        "payments",
        "## Status\n- Value: UNDER_DESIGN\n\n## Feature Dependencies\n- `auth`: sign in first\n",
    );
    let out = dir.path().join("bundle.md");

    archie(&dir)
        .args(["export", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 features"));

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.starts_with("# Archie Project Export"));
    assert!(content.contains("## Table of Contents"));
    assert!(content.contains("## Status Statistics"));
    assert!(content.contains("auth[\"auth\"] --> payments[\"payments\"]"));
    assert!(content.contains("## Background\n\nWe need payments."));
    assert!(content.contains("# Features"));
}

#[test]
fn export_flags_drop_sections() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_feature(dir.path(), "auth", &status_block("FINISHED"));
    let out = dir.path().join("bundle.md");

    archie(&dir)
        .args(["export", "--no-toc", "--no-stats", "--no-dep-graph", "--root-doc", "background.md", "-o"])
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(!content.contains("## Table of Contents"));
    assert!(!content.contains("## Status Statistics"));
    assert!(!content.contains("## Storage Design"));
}

#[test]
fn export_outside_project_fails() {
    let dir = TempDir::new().unwrap();
    archie(&dir)
        .args(["export", "-o", "out.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// ---------------------------------------------------------------------------
// archie clone
// ---------------------------------------------------------------------------

#[test]
fn clone_copies_context_without_overwriting() {
    let src = TempDir::new().unwrap();
    init_project(&src);
    std::fs::write(src.path().join("background.md"), "Source background").unwrap();
    std::fs::write(src.path().join("api/api.md"), "GET /v1").unwrap();
    write_feature(src.path(), "auth", &status_block("DESIGNED"));

    let dst = TempDir::new().unwrap();
    init_project(&dst);
    std::fs::write(dst.path().join("background.md"), "Keep me").unwrap();

    archie(&dst)
        .arg("clone")
        .arg(src.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped: background.md"));

    assert_eq!(
        std::fs::read_to_string(dst.path().join("background.md")).unwrap(),
        "Keep me"
    );
    assert!(!dst.path().join("features/auth.md").exists());
}

#[test]
fn clone_custom_items_into_new_directory() {
    let src = TempDir::new().unwrap();
    init_project(&src);
    std::fs::write(src.path().join("storage.md"), "Postgres").unwrap();
    write_feature(src.path(), "auth", &status_block("DESIGNED"));

    let parent = TempDir::new().unwrap();
    let target = parent.path().join("fresh");

    archie(&parent)
        .arg("clone")
        .arg(src.path())
        .arg(&target)
        .args(["--item", "storage.md", "--item", "features"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(target.join("storage.md")).unwrap(),
        "Postgres"
    );
    assert!(target.join("features/auth.md").is_file());
    assert!(target.join(".archie/config.yaml").is_file());
}

#[test]
fn clone_rejects_non_project_source() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();

    archie(&dst)
        .arg("clone")
        .arg(src.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing .archie"));
}

// ---------------------------------------------------------------------------
// archie config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_clean_project() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    archie(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}
