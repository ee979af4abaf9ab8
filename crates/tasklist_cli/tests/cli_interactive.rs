use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn run_interactive(store_path: &Path, input: &str) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_tasklist");

    let mut child = Command::new(exe)
        .env("TASKLIST_STORE_PATH", store_path)
        .env("TASKLIST_CONFIG_PATH", store_path.with_extension("config.json"))
        .env("TASKLIST_DISABLE_NOTIFICATIONS", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

#[test]
fn interactive_help_shows_usage() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_interactive(&dir.path().join("store.json"), "help\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_prints_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_interactive(&dir.path().join("store.json"), "nope\nexit\n");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn interactive_add_highlights_new_task() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_interactive(
        &dir.path().join("store.json"),
        "add \"demo task\" --due 2024-01-05T12:00:00Z\nlist\nexit\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: demo task"));
    assert!(stdout.contains("2024-01-05"));
    assert!(stdout.contains("new"));
}

#[test]
fn interactive_delete_reads_confirmation_from_next_line() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    let tasks = serde_json::json!([{ "id": 7, "text": "stale", "completed": false }]);
    let content = serde_json::json!({ "tasks": tasks.to_string() });
    std::fs::write(&store_path, content.to_string()).unwrap();

    let output = run_interactive(&store_path, "delete 7\ny\nlist\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted task: stale"));
    assert!(stdout.contains("No tasks (all)."));
}

#[test]
fn interactive_rejects_config_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_interactive(
        &dir.path().join("store.json"),
        "list --config-override theme=noir\nexit\n",
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config overrides are only accepted on the command line"));
}
