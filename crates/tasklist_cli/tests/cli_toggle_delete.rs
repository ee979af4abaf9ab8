use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn command(store_path: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tasklist"));
    command
        .args(args)
        .env("TASKLIST_STORE_PATH", store_path)
        .env("TASKLIST_CONFIG_PATH", store_path.with_extension("config.json"))
        .env("TASKLIST_DISABLE_NOTIFICATIONS", "1");
    command
}

fn run(store_path: &Path, args: &[&str]) -> Output {
    command(store_path, args)
        .output()
        .expect("failed to run tasklist")
}

fn run_with_input(store_path: &Path, args: &[&str], input: &str) -> Output {
    let mut child = command(store_path, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn tasklist");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child.wait_with_output().expect("failed to read output")
}

fn seed(store_path: &Path, tasks: serde_json::Value) {
    let content = serde_json::json!({ "tasks": tasks.to_string() });
    std::fs::write(store_path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn stored_tasks(store_path: &Path) -> Vec<serde_json::Value> {
    let content = std::fs::read_to_string(store_path).expect("store written");
    let entries: serde_json::Value = serde_json::from_str(&content).expect("store json");
    let tasks = entries["tasks"].as_str().expect("tasks entry");
    serde_json::from_str(tasks).expect("tasks json")
}

fn two_tasks() -> serde_json::Value {
    serde_json::json!([
        { "id": 1, "text": "first", "completed": false, "dueDate": "2024-01-04T12:00:00Z" },
        { "id": 2, "text": "second", "completed": true, "dueDate": "2024-01-05T12:00:00Z" }
    ])
}

#[test]
fn toggle_flips_completion() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path, two_tasks());

    let output = run(&store_path, &["toggle", "1"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Completed task: first"));

    let output = run(&store_path, &["toggle", "2"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Reopened task: second"));

    let tasks = stored_tasks(&store_path);
    assert_eq!(tasks[0]["completed"], true);
    assert_eq!(tasks[1]["completed"], false);
}

#[test]
fn toggle_unknown_id_fails_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path, two_tasks());
    let before = std::fs::read_to_string(&store_path).unwrap();

    let output = run(&store_path, &["toggle", "99"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - task not found"));
    assert_eq!(std::fs::read_to_string(&store_path).unwrap(), before);
}

#[test]
fn delete_with_yes_removes_task() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path, two_tasks());

    let output = run(&store_path, &["--json", "delete", "1", "--yes"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let removed: serde_json::Value = serde_json::from_str(stdout.trim()).expect("json output");
    assert_eq!(removed["id"], 1);

    let tasks = stored_tasks(&store_path);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], 2);
}

#[test]
fn delete_confirmed_on_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path, two_tasks());

    let output = run_with_input(&store_path, &["delete", "2"], "y\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Delete task \"second\"?"));
    assert!(stdout.contains("Deleted task: second"));
    assert_eq!(stored_tasks(&store_path).len(), 1);
}

#[test]
fn delete_declined_keeps_task() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path, two_tasks());

    let output = run_with_input(&store_path, &["delete", "2"], "n\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Kept task: second"));
    assert_eq!(stored_tasks(&store_path).len(), 2);
}

#[test]
fn delete_unknown_id_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path, two_tasks());

    let output = run(&store_path, &["delete", "42", "--yes"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("task not found"));
    assert_eq!(stored_tasks(&store_path).len(), 2);
}
