use std::path::Path;
use std::process::{Command, Output};

fn run(store_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasklist"))
        .args(args)
        .env("TASKLIST_STORE_PATH", store_path)
        .env("TASKLIST_CONFIG_PATH", store_path.with_extension("config.json"))
        .env("TASKLIST_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run tasklist")
}

fn seed(store_path: &Path) {
    let tasks = serde_json::json!([
        { "id": 1, "text": "older", "completed": true, "dueDate": "2024-01-04T12:00:00Z" },
        { "id": 2, "text": "newer", "completed": false, "dueDate": "2024-01-05T12:00:00Z" },
        { "id": 3, "text": "undated", "completed": false },
        { "id": 4, "text": "also newer", "completed": true, "dueDate": "2024-01-05T13:00:00Z" }
    ]);
    let content = serde_json::json!({ "tasks": tasks.to_string() });
    std::fs::write(store_path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn list_json(store_path: &Path, args: &[&str]) -> serde_json::Value {
    let output = run(store_path, args);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("json output")
}

#[test]
fn list_groups_latest_day_first() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path);

    let parsed = list_json(&store_path, &["--json", "list"]);

    assert_eq!(parsed["filter"], "all");
    assert_eq!(parsed["dates"], serde_json::json!(["2024-01-05", "2024-01-04"]));
    let groups = parsed["groups"].as_array().expect("groups");
    let labels: Vec<&str> = groups
        .iter()
        .map(|group| group["date"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(labels, vec!["2024-01-05", "2024-01-04", "No Date"]);

    let newest: Vec<&str> = groups[0]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["text"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(newest, vec!["newer", "also newer"]);
    assert_eq!(parsed["can_load_previous"], true);
}

#[test]
fn list_plain_prints_headings_and_import_hint() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path);

    let output = run(&store_path, &["list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let newer = stdout.find("2024-01-05").expect("newest heading");
    let older = stdout.find("2024-01-04").expect("older heading");
    let undated = stdout.find("No Date").expect("undated heading");
    assert!(newer < older && older < undated);
    assert!(stdout.contains("[x]"));
    assert!(stdout.contains("tasklist import"));
}

#[test]
fn filter_is_saved_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path);

    let output = run(&store_path, &["filter", "done"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Filter set to done"));

    let parsed = list_json(&store_path, &["--json", "list"]);

    assert_eq!(parsed["filter"], "done");
    let texts: Vec<&str> = parsed["groups"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|group| group["tasks"].as_array().unwrap().iter())
        .map(|task| task["text"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(texts, vec!["also newer", "older"]);
}

#[test]
fn list_filter_open_drops_days_without_open_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    seed(&store_path);

    let parsed = list_json(&store_path, &["--json", "list", "--filter", "open"]);

    assert_eq!(parsed["filter"], "open");
    assert_eq!(parsed["dates"], serde_json::json!(["2024-01-05"]));
}

#[test]
fn empty_store_lists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");

    let output = run(&store_path, &["list"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No tasks (all)."));
}

#[test]
fn unknown_filter_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");

    let output = run(&store_path, &["filter", "someday"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input"));
}

#[test]
fn corrupt_store_file_is_set_aside_and_add_still_works() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("store.json");
    std::fs::write(&store_path, "{\"tasks\": \"[{\\\"id\\\":1").unwrap();

    let output = run(&store_path, &["add", "fresh start", "--due", "2024-01-05T12:00:00Z"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Added task: fresh start"));
    assert!(dir.path().join("store.json.corrupt").exists());

    let parsed = list_json(&store_path, &["--json", "list"]);
    assert_eq!(parsed["dates"], serde_json::json!(["2024-01-05"]));
}
