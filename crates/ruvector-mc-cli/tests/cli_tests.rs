//! Integration tests for the ruvector-mc CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("ruvector-mc").unwrap();
    cmd.arg("--no-color");
    cmd
}

const TASK_3X3: &str = "3\n4 1 0\n1 4 1\n0 1 4\n5\n6\n5\n0 2 20000\n";

#[test]
fn test_cli_version() {
    Command::cargo_bin("ruvector-mc")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ruvector-mc"));
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("ruvector-mc")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Monte Carlo"));
}

#[test]
fn test_solve_writes_output_file() {
    let dir = tempdir().unwrap();
    let task = dir.path().join("task.txt");
    let out = dir.path().join("out.txt");
    fs::write(&task, TASK_3X3).unwrap();

    cmd()
        .args(["solve", task.to_str().unwrap(), "--seed", "7", "--no-progress"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Solved"))
        .stdout(predicate::str::contains("Residual"));

    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("0 2"));
    let values: Vec<f64> = lines.map(|l| l.parse().unwrap()).collect();
    assert_eq!(values.len(), 3);
    // x = [1, 1, 1]
    for v in values {
        assert!((v - 1.0).abs() < 0.05, "estimate {v}");
    }
}

#[test]
fn test_solve_to_stdout_is_task_output() {
    let dir = tempdir().unwrap();
    let task = dir.path().join("task.txt");
    fs::write(&task, "1\n2\n4\n0 0 10\n").unwrap();

    cmd()
        .args(["solve", task.to_str().unwrap(), "--seed", "1"])
        .assert()
        .success()
        .stdout("0 0\n2.000000000000000e+00\n");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = tempdir().unwrap();
    let task = dir.path().join("task.txt");
    let out = dir.path().join("out.txt");
    fs::write(&task, TASK_3X3).unwrap();

    cmd()
        .env_remove("RUST_LOG")
        .args(["-v", "solve", task.to_str().unwrap(), "--seed", "2", "--no-progress"])
        .args(["--walks", "100", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("task loaded"))
        .stderr(predicate::str::contains("task solved"));

    let a = dir.path().join("a.txt");
    fs::write(&a, "0 0\n1.0\n").unwrap();
    cmd()
        .env_remove("RUST_LOG")
        .args(["-v", "merge"])
        .arg(&a)
        .assert()
        .success()
        .stderr(predicate::str::contains("task output read"))
        .stderr(predicate::str::contains("merge pass finished"));
}

#[test]
fn test_merge_skips_out_of_range_output() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "50000000 50000000\n1.0\n").unwrap();
    fs::write(&b, "0 0\n1.0\n").unwrap();

    cmd()
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected result 1"))
        .stdout(predicate::str::contains("canonical result 2"));
}

#[test]
fn test_solve_singular_diagonal_fails() {
    let dir = tempdir().unwrap();
    let task = dir.path().join("task.txt");
    fs::write(&task, "2\n0 1\n1 4\n1\n1\n").unwrap();

    cmd()
        .args(["solve", task.to_str().unwrap(), "--no-progress"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("singular diagonal"));
}

#[test]
fn test_solve_missing_file_fails() {
    cmd()
        .args(["solve", "/nonexistent/task.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_merge_complete_outputs() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let merged = dir.path().join("merged.txt");
    let events = dir.path().join("events.jsonl");
    let audit = dir.path().join("audit.json");
    fs::write(&a, "0 1\n1.0\n2.0\n").unwrap();
    fs::write(&b, "2 2\n3.0\n").unwrap();

    cmd()
        .arg("merge")
        .arg(format!("5={}", a.display()))
        .arg(&b)
        .arg("--output")
        .arg(&merged)
        .arg("--events")
        .arg(&events)
        .arg("--audit")
        .arg(&audit)
        .assert()
        .success()
        .stdout(predicate::str::contains("canonical result 5"))
        .stdout(predicate::str::contains("Credit: 30.00"));

    let text = fs::read_to_string(&merged).unwrap();
    assert!(text.starts_with("0 2\n"));
    assert_eq!(text.lines().count(), 4);

    let events = fs::read_to_string(&events).unwrap();
    assert!(events.lines().next().unwrap().contains("MergeStarted"));
    assert!(events.lines().last().unwrap().contains("MergeCompleted"));

    let audit: serde_json::Value = serde_json::from_str(&fs::read_to_string(&audit).unwrap()).unwrap();
    assert_eq!(audit["accepted"], 2);
    assert_eq!(audit["canonical_result_id"], 5);
}

#[test]
fn test_merge_gap_is_retryable() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "0 2\n1.0\n2.0\n3.0\n").unwrap();
    fs::write(&b, "4 6\n5.0\n6.0\n7.0\n").unwrap();

    cmd()
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("incomplete coverage"))
        .stderr(predicate::str::contains("retryable"));
}

#[test]
fn test_merge_rejects_disagreeing_replica() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "0 1\n1.0\n2.0\n").unwrap();
    fs::write(&b, "0 1\n1.0\n2.5\n").unwrap();

    cmd()
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected result 2"))
        .stdout(predicate::str::contains("Credit: 20.00"));
}

#[test]
fn test_merge_config_changes_reward() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let config = dir.path().join("mc.json");
    fs::write(&a, "0 1\n1.0\n2.0\n").unwrap();
    fs::write(&config, r#"{ "credit": { "reward_per_component": 2.5 } }"#).unwrap();

    cmd()
        .arg("--config")
        .arg(&config)
        .arg("merge")
        .arg(&a)
        .assert()
        .success()
        .stdout(predicate::str::contains("Credit: 5.00"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("mc.json");
    fs::write(&config, r#"{ "walk": { "termination_prob": 2.0 } }"#).unwrap();

    cmd()
        .arg("--config")
        .arg(&config)
        .args(["demo", "-n", "3"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid walk parameters"));
}

#[test]
fn test_generate_solve_merge_round_trip() {
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");

    cmd()
        .args(["generate", "-n", "6", "--units", "2", "--walks", "20000", "--seed", "3"])
        .arg("--out-dir")
        .arg(&work)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 work unit(s)"));

    let mut outputs = Vec::new();
    for k in 0..2 {
        let task = work.join(format!("task_{k:03}.txt"));
        let out = work.join(format!("out_{k}.txt"));
        cmd()
            .arg("solve")
            .arg(&task)
            .args(["--seed", &(k + 10).to_string(), "--no-progress", "--output"])
            .arg(&out)
            .assert()
            .success();
        outputs.push(out);
    }

    let merged = work.join("merged.txt");
    cmd()
        .arg("merge")
        .args(&outputs)
        .arg("--output")
        .arg(&merged)
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 6 components"));

    let parse = |text: String| -> Vec<f64> {
        text.lines().skip(1).map(|l| l.parse().unwrap()).collect()
    };
    let estimate = parse(fs::read_to_string(&merged).unwrap());
    let truth = parse(fs::read_to_string(work.join("solution.txt")).unwrap());
    assert_eq!(estimate.len(), 6);
    for (e, t) in estimate.iter().zip(&truth) {
        assert!((e - t).abs() < 0.1, "estimate {e} vs true {t}");
    }
}

#[test]
fn test_demo_reports_errors() {
    cmd()
        .args(["demo", "-n", "5", "--units", "2", "--walks", "5000", "--seed", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Error versus direct solve"))
        .stdout(predicate::str::contains("merged 5 components from 2 unit(s)"));
}
