//! Integration tests for the `mapdep` binary: exit codes and emitted
//! artifacts.
#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};

fn mapdep_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mapdep"))
}

fn run_mapdep(args: &[&str]) -> Output {
    Command::new(mapdep_bin())
        .args(args)
        .output()
        .expect("run mapdep")
}

fn entity(object_id: &str, code: &str) -> Value {
    json!({
        "Id": object_id, "Name": code, "Code": code,
        "CreationDate": "2025-01-01 08:00:00", "Creator": "etl",
        "ModificationDate": "2025-01-01 08:00:00", "Modifier": "etl"
    })
}

fn mapping(object_id: &str, code: &str, sources: &[&str], target: &str) -> Value {
    let composition: Vec<Value> = sources
        .iter()
        .map(|c| {
            json!({"Entity": {"Id": format!("e-{c}"), "Name": c, "Code": c, "CodeModel": "M"}})
        })
        .collect();
    json!({
        "Id": object_id, "Name": code, "Code": code,
        "CreationDate": "2025-01-01 08:00:00", "Creator": "etl",
        "ModificationDate": "2025-01-01 08:00:00", "Modifier": "etl",
        "EntityTarget": {
            "Id": format!("e-{target}"), "Name": target, "Code": target, "CodeModel": "M"
        },
        "SourceComposition": composition
    })
}

/// Writes a workload with one extracted RETW file under
/// `<root>/T/v01.00.00/RETW/` and returns the config path.
fn setup_workload(root: &Path, entities: &[Value], mappings: &[Value]) -> PathBuf {
    let retw_dir = root.join("T/v01.00.00/RETW");
    std::fs::create_dir_all(&retw_dir).expect("mkdir");
    let fixture = json!({
        "Models": [{
            "Id": "o1", "Name": "M", "Code": "M", "IsDocumentModel": true,
            "Entities": entities
        }],
        "Mappings": mappings
    });
    std::fs::write(
        retw_dir.join("flow.json"),
        serde_json::to_string(&fixture).expect("encode"),
    )
    .expect("write fixture");

    let config_path = root.join("mapdep.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
            title = "T"
            folder_intermediate_root = "{}"

            [power_designer]
            files = ["flow.ldm"]
        "#,
            root.display()
        ),
    )
    .expect("write config");
    config_path
}

fn chain_fixture(root: &Path) -> PathBuf {
    setup_workload(
        root,
        &[entity("o2", "E1"), entity("o3", "E2"), entity("o4", "E3")],
        &[
            mapping("o10", "M1", &["E1"], "E2"),
            mapping("o11", "M2", &["E2"], "E3"),
        ],
    )
}

// ---------------------------------------------------------------------------
// Success path
// ---------------------------------------------------------------------------

#[test]
fn clean_run_exits_0_and_writes_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = chain_fixture(dir.path());

    let out = run_mapdep(&[config.to_str().expect("path")]);
    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let order_path = dir.path().join("T/v01.00.01/mapping_order.json");
    let order: Value = serde_json::from_str(
        &std::fs::read_to_string(&order_path).expect("mapping_order.json exists"),
    )
    .expect("valid JSON");
    let records = order.as_array().expect("array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["Code"], "M1");
    assert_eq!(records[1]["Code"], "M2");
    assert_eq!(records[1]["RunLevel"], 1);

    assert!(
        dir.path()
            .join("T/v01.00.01/file_dependencies.json")
            .exists()
    );
}

#[test]
fn second_run_bumps_the_patch_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = chain_fixture(dir.path());

    assert_eq!(run_mapdep(&[config.to_str().expect("path")]).status.code(), Some(0));
    // The second run reads from v01.00.01 (latest) — which holds no
    // RETW folder, so every configured input is missing.
    let out = run_mapdep(&[config.to_str().expect("path")]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("could not be ingested"), "{stderr}");
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_reports_and_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = chain_fixture(dir.path());

    let out = run_mapdep(&[config.to_str().expect("path"), "--dry-run"]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("would ingest"), "{stdout}");
    assert!(stdout.contains("mapping_order.json"), "{stdout}");
    assert!(!dir.path().join("T/v01.00.01").exists());
}

// ---------------------------------------------------------------------------
// Structural failures (exit 2)
// ---------------------------------------------------------------------------

#[test]
fn missing_config_exits_2() {
    let out = run_mapdep(&["definitely-missing.toml"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn invalid_config_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("mapdep.toml");
    std::fs::write(&config, "title = \"T\"\n# no folder_intermediate_root").expect("write");
    let out = run_mapdep(&[config.to_str().expect("path")]);
    assert_eq!(out.status.code(), Some(2));
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("folder_intermediate_root"),
        "stderr should name the missing key"
    );
}

#[test]
fn workload_without_versions_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("mapdep.toml");
    std::fs::write(
        &config,
        format!(
            "title = \"T\"\nfolder_intermediate_root = \"{}\"\n\n[power_designer]\nfiles = [\"flow.ldm\"]\n",
            dir.path().display()
        ),
    )
    .expect("write");
    let out = run_mapdep(&[config.to_str().expect("path")]);
    assert_eq!(out.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// Data-quality failures (exit 1)
// ---------------------------------------------------------------------------

#[test]
fn cyclic_flow_exits_1() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = setup_workload(
        dir.path(),
        &[entity("o2", "E1"), entity("o3", "E2")],
        &[
            mapping("o10", "M1", &["E1"], "E2"),
            mapping("o11", "M2", &["E2"], "E1"),
        ],
    );
    let out = run_mapdep(&[config.to_str().expect("path")]);
    assert_eq!(out.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("cyclic"),
        "stderr names the cycle failure"
    );
}

#[test]
fn degraded_input_exits_1_but_still_writes_the_plan() {
    let dir = tempfile::tempdir().expect("tempdir");
    // M2 has no target entity: retained, flagged at error severity.
    let mut broken = mapping("o11", "M2", &["E2"], "E3");
    broken
        .as_object_mut()
        .expect("object")
        .remove("EntityTarget");
    let config = setup_workload(
        dir.path(),
        &[entity("o2", "E1"), entity("o3", "E2"), entity("o4", "E3")],
        &[mapping("o10", "M1", &["E1"], "E2"), broken],
    );

    let out = run_mapdep(&[config.to_str().expect("path")]);
    assert_eq!(out.status.code(), Some(1));
    let order_path = dir.path().join("T/v01.00.01/mapping_order.json");
    assert!(order_path.exists(), "artifacts are written before gating");
    let order: Value =
        serde_json::from_str(&std::fs::read_to_string(&order_path).expect("read"))
            .expect("valid JSON");
    assert_eq!(order.as_array().map(Vec::len), Some(2), "M2 is retained");
}
