use std::time::Instant;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasklist_core::config::Palette;
use tasklist_core::derive::DateKey;
use tasklist_core::importer::TaskSource;
use tasklist_core::model::Task;
use tasklist_core::session::Session;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "")]
    marker: &'static str,
}

/// Groups of the current view in display order: latest day first, then the
/// tasks without a date.
pub fn ordered_groups<S: TaskSource>(session: &Session<S>) -> Vec<(DateKey, Vec<Task>)> {
    let mut grouped = session.grouped_tasks();
    let mut ordered: Vec<(DateKey, Vec<Task>)> = session
        .sorted_date_keys()
        .into_iter()
        .filter_map(|day| {
            let key = DateKey::Day(day);
            grouped.remove(&key).map(|tasks| (key, tasks))
        })
        .collect();
    if let Some(undated) = grouped.remove(&DateKey::NoDate) {
        ordered.push((DateKey::NoDate, undated));
    }
    ordered
}

pub fn print_groups_plain<S: TaskSource>(session: &Session<S>, palette: &Palette) {
    let groups = ordered_groups(session);
    if groups.is_empty() {
        println!("{}", palette.mutedize(&format!("No tasks ({}).", session.filter())));
        return;
    }

    let highlighted = session.recently_added(Instant::now());
    for (index, (key, tasks)) in groups.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("{}", palette.accentize(&key.label()));
        let rows = tasks.iter().map(|task| TaskRow {
            id: task.id,
            done: if task.completed { "[x]" } else { "[ ]" },
            text: task.text.clone(),
            marker: if highlighted == Some(task.id) { "new" } else { "" },
        });
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if session.can_load_previous() {
        println!();
        println!(
            "{}",
            palette.mutedize("Run `tasklist import` to load previous tasks.")
        );
    }
}

pub fn print_groups_json<S: TaskSource>(session: &Session<S>) {
    let groups: Vec<serde_json::Value> = ordered_groups(session)
        .into_iter()
        .map(|(key, tasks)| {
            serde_json::json!({
                "date": key.label(),
                "tasks": tasks,
            })
        })
        .collect();
    let dates: Vec<String> = session
        .sorted_date_keys()
        .into_iter()
        .map(|day| DateKey::Day(day).label())
        .collect();

    let json = serde_json::json!({
        "filter": session.filter(),
        "dates": dates,
        "groups": groups,
        "can_load_previous": session.can_load_previous(),
    });
    println!("{}", json);
}

pub fn print_task_json(task: &Task) {
    println!("{}", serde_json::json!(task));
}

pub fn describe(task: &Task) -> String {
    let due = task.due_date.as_deref().unwrap_or("-");
    format!("{} ({}) due {}", task.text, task.id, due)
}
