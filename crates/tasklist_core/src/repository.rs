use crate::error::AppError;
use crate::ids::IdGenerator;
use crate::model::Task;
use crate::state::PersistentState;
use crate::storage::{KeyValueStore, TASKS_KEY};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::debug;

/// The persisted task collection and the mutations allowed on it.
///
/// Every mutation builds a new collection, keeps it sorted by due date and
/// writes it through to the store.
pub struct TaskRepository {
    tasks: PersistentState<Vec<Task>>,
    ids: Box<dyn IdGenerator>,
}

impl TaskRepository {
    pub fn load(store: Rc<dyn KeyValueStore>, ids: Box<dyn IdGenerator>) -> Result<Self, AppError> {
        let tasks = PersistentState::load(store, TASKS_KEY, Vec::new())?;
        Ok(Self { tasks, ids })
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.get()
    }

    pub fn find(&self, id: u64) -> Option<&Task> {
        self.tasks().iter().find(|task| task.id == id)
    }

    /// Returns the id of the new task, or `None` when `text` is blank.
    ///
    /// `due_date` must already be whole-second UTC RFC 3339 (see
    /// [`crate::dates::to_iso`]); ordering compares the raw strings.
    /// [`crate::session::Session::on_add_task`] normalizes user input first.
    pub fn add_task(&mut self, text: &str, due_date: Option<String>) -> Result<Option<u64>, AppError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("ignoring blank task text");
            return Ok(None);
        }

        let id = fresh_id(self.ids.as_mut(), self.tasks.get());
        let task = Task::new(id, trimmed, due_date);
        debug!(id, due_date = ?task.due_date, "adding task");

        self.tasks.update(|prev| {
            let mut next = prev.clone();
            next.push(task);
            sort_by_due_date(&mut next);
            next
        })?;

        Ok(Some(id))
    }

    /// Flips `completed` on the matching task. Unknown ids are ignored.
    pub fn toggle_completion(&mut self, id: u64) -> Result<bool, AppError> {
        if self.find(id).is_none() {
            debug!(id, "toggle ignored, task not found");
            return Ok(false);
        }

        self.tasks.update(|prev| {
            let mut next: Vec<Task> = prev
                .iter()
                .map(|task| {
                    if task.id == id {
                        Task {
                            completed: !task.completed,
                            ..task.clone()
                        }
                    } else {
                        task.clone()
                    }
                })
                .collect();
            sort_by_due_date(&mut next);
            next
        })?;
        debug!(id, "toggled task");

        Ok(true)
    }

    pub fn delete_task(&mut self, id: u64) -> Result<Option<Task>, AppError> {
        let removed = match self.find(id) {
            Some(task) => task.clone(),
            None => {
                debug!(id, "delete ignored, task not found");
                return Ok(None);
            }
        };

        self.tasks.update(|prev| {
            let mut next: Vec<Task> = prev
                .iter()
                .filter(|task| task.id != id)
                .cloned()
                .collect();
            sort_by_due_date(&mut next);
            next
        })?;
        debug!(id, "deleted task");

        Ok(Some(removed))
    }

    /// Appends already-finished historical tasks.
    ///
    /// Imported ids that clash with existing ones are replaced by fresh ids.
    pub fn import_historical_tasks(&mut self, imported: Vec<Task>) -> Result<usize, AppError> {
        if imported.is_empty() {
            return Ok(0);
        }

        let mut next = self.tasks().to_vec();
        let count = imported.len();
        for mut task in imported {
            if next.iter().any(|existing| existing.id == task.id) {
                let replacement = fresh_id(self.ids.as_mut(), &next);
                debug!(from = task.id, to = replacement, "reassigning clashing id");
                task.id = replacement;
            }
            task.completed = true;
            next.push(task);
        }
        sort_by_due_date(&mut next);

        self.tasks.set(next)?;
        debug!(count, "imported historical tasks");

        Ok(count)
    }
}

fn fresh_id(ids: &mut dyn IdGenerator, taken: &[Task]) -> u64 {
    let taken: HashSet<u64> = taken.iter().map(|task| task.id).collect();
    loop {
        let id = ids.next_id();
        if !taken.contains(&id) {
            return id;
        }
    }
}

/// Date-less tasks first, then ascending due date. Stable, so equal keys keep
/// their current order.
pub fn sort_by_due_date(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| compare_due_dates(a.due_date.as_deref(), b.due_date.as_deref()));
}

fn compare_due_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}
