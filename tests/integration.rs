use std::fs;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

const FIXTURE: &str = "tests/fixtures/small.json";

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gazegraph"))
        .args(args)
        .output()
        .expect("Failed to execute gazegraph")
}

fn run_json(args: &[&str]) -> Value {
    let output = run(args);
    assert!(
        output.status.success(),
        "gazegraph exited with error: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn position(node: &Value) -> [f64; 3] {
    let pos = node["pos"].as_array().expect("pos array");
    [
        pos[0].as_f64().unwrap(),
        pos[1].as_f64().unwrap(),
        pos[2].as_f64().unwrap(),
    ]
}

#[test]
fn grid_layout_prints_positions_in_rank_order() {
    let report = run_json(&["layout", "--input", FIXTURE, "--algorithm", "grid"]);

    assert_eq!(report["layout"], "grid");
    let nodes = report["nodes"].as_array().unwrap();
    // "Lonely" has no links and is dropped
    assert_eq!(nodes.len(), 7);
    assert!(nodes.iter().all(|n| n["name"] != "Lonely"));

    let ranks: Vec<i64> = nodes.iter().map(|n| n["rank"].as_i64().unwrap()).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6, 7]);

    let first = position(&nodes[0]);
    assert!((first[0] + 4.5).abs() < 1e-4, "x = {}", first[0]);
    assert!((first[1] - 2.8).abs() < 1e-4, "y = {}", first[1]);
    assert!((first[2] + 5.0).abs() < 1e-4, "z = {}", first[2]);
    assert_eq!(nodes[2]["id"], "3");
}

#[test]
fn settings_file_scales_the_stage() {
    let dir = tempdir().unwrap();
    let settings = dir.path().join("settings.yaml");
    fs::write(&settings, "stageSize: 20\nfuseDurationMs: 1000\n").unwrap();

    let report = run_json(&[
        "layout",
        "--input",
        FIXTURE,
        "--algorithm",
        "spiral",
        "--settings",
        settings.to_str().unwrap(),
    ]);

    for node in report["nodes"].as_array().unwrap() {
        let [x, _, z] = position(node);
        assert!((x.hypot(z) - 10.0).abs() < 1e-3, "node off the ring: {node}");
    }
}

#[test]
fn simulation_layout_stays_on_stage() {
    let report = run_json(&["layout", "--input", FIXTURE, "--algorithm", "simulation"]);

    assert_eq!(report["layout"], "simulation");
    for node in report["nodes"].as_array().unwrap() {
        let [x, y, z] = position(node);
        assert!(x.abs() <= 5.0 + 1e-4 && z.abs() <= 5.0 + 1e-4, "{node}");
        assert!((0.4 - 1e-4..=3.2 + 1e-4).contains(&y), "{node}");
    }
}

#[test]
fn simulate_focuses_the_gazed_node() {
    let report = run_json(&[
        "simulate",
        "--input",
        FIXTURE,
        "--algorithm",
        "grid",
        "--rank",
        "1",
    ]);

    assert_eq!(report["focused"], "1");
    let status = |id: &str| {
        report["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["id"] == id)
            .map(|n| n["status"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(status("1"), "center");
    for id in ["2", "3", "4"] {
        assert_eq!(status(id), "adjacent", "node {id}");
    }
    for id in ["5", "6", "7"] {
        assert_eq!(status(id), "none", "node {id}");
    }

    for link in report["links"].as_array().unwrap() {
        let touches = link["source"] == "1" || link["target"] == "1";
        let expected = match (touches, link["source"] == "1") {
            (false, _) => "none",
            (true, true) => "out",
            (true, false) => "in",
        };
        assert_eq!(link["status"], expected, "{link}");
    }
}

#[test]
fn short_gaze_does_not_fuse() {
    let report = run_json(&[
        "simulate",
        "--input",
        FIXTURE,
        "--rank",
        "1",
        "--duration-ms",
        "500",
    ]);

    assert_eq!(report["focused"], Value::Null);
}

#[test]
fn missing_dataset_is_reported() {
    let output = run(&["layout", "--input", "tests/fixtures/missing.json"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load dataset"), "{stderr}");
}

#[test]
fn unknown_rank_is_reported() {
    let output = run(&["simulate", "--input", FIXTURE, "--rank", "42"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no node with rank 42"), "{stderr}");
}
