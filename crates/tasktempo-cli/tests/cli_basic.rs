//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temporary
//! directory, so config and task files never touch the real profile.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tasktempo"));
    cmd.env("HOME", home.path())
        .env_remove("TASKTEMPO_ENV")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = cli(home)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn add_task(home: &TempDir, title: &str, subtasks: &[&str]) -> serde_json::Value {
    let mut args = vec!["task", "add", title];
    for subtask in subtasks {
        args.extend(["--subtask", *subtask]);
    }
    let (stdout, stderr, code) = run_cli(home, &args);
    assert_eq!(code, 0, "task add failed: {stderr}");
    serde_json::from_str(&stdout).expect("task add prints the task as JSON")
}

#[test]
fn test_config_get_set_reset() {
    let home = TempDir::new().unwrap();

    let (stdout, _, code) = run_cli(&home, &["config", "get", "timer.focus_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(&home, &["config", "set", "timer.focus_duration", "50"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "get", "timer.focus_duration"]);
    assert_eq!(stdout.trim(), "50");

    let (_, _, code) = run_cli(&home, &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "get", "timer.focus_duration"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "set", "timer.long_break", "15"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("timer.long_break"));
}

#[test]
fn test_config_list() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("alerts.dismiss_expiry_min = 120"));
}

#[test]
fn test_task_lifecycle() {
    let home = TempDir::new().unwrap();
    let task = add_task(&home, "Write report", &["Outline"]);
    let id = task["id"].as_str().unwrap();
    let subtask_id = task["subtasks"][0]["id"].as_str().unwrap();

    let (_, _, code) = run_cli(&home, &["task", "status", id, "in-progress"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(&home, &["task", "subtask", id, subtask_id]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(&home, &["task", "list", "--json"]);
    assert_eq!(code, 0);
    let tasks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(tasks[0]["status"], "in_progress");
    assert_eq!(tasks[0]["subtasks"][0]["completed"], true);

    let (_, _, code) = run_cli(&home, &["task", "remove", id]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["task", "list"]);
    assert!(stdout.contains("no tasks"));
}

#[test]
fn test_task_status_rejects_unknown_task() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["task", "status", "missing", "done"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("missing"));
}

#[test]
fn test_session_prints_events_and_stops_on_quit() {
    let home = TempDir::new().unwrap();
    let task = add_task(&home, "Deep work", &[]);
    let id = task["id"].as_str().unwrap();

    let mut child = cli(&home)
        .args(["session", id, "--fast"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start session");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"status\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let types: Vec<String> = stdout
        .lines()
        .map(|line| {
            let json: serde_json::Value =
                serde_json::from_str(line).expect("stdout carries only JSON lines");
            json["type"]
                .as_str()
                .expect("every stdout line is an event")
                .to_string()
        })
        .collect();
    assert!(types.contains(&"timer_started".to_string()));
    assert!(types.contains(&"timer_stopped".to_string()));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"pending_focus_decision\""));
}

#[test]
fn test_session_requires_known_task() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["session", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("nope"));
}
