use crate::dates::{local_offset, parse_due_date};
use crate::derive::{DateKey, filter_by_status, group_by_due_date, sorted_date_keys};
use crate::error::AppError;
use crate::ids::IdGenerator;
use crate::importer::{Importer, TaskSource};
use crate::model::{Filter, Task};
use crate::repository::TaskRepository;
use crate::state::PersistentState;
use crate::storage::{FILTER_KEY, HAS_FETCHED_PREVIOUS_KEY, KeyValueStore};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};
use time::{Date, UtcOffset};
use tracing::{debug, info};

pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecentlyAdded {
    id: u64,
    at: Instant,
}

/// Everything a front end needs: the task collection, the persisted view
/// settings, the historical importer and a little transient UI state.
pub struct Session<S> {
    repository: TaskRepository,
    filter: PersistentState<Filter>,
    has_fetched_previous: PersistentState<bool>,
    importer: Importer<S>,
    offset: UtcOffset,
    pending_deletion: Option<u64>,
    recently_added: Option<RecentlyAdded>,
}

impl<S: TaskSource> Session<S> {
    pub fn open(
        store: Rc<dyn KeyValueStore>,
        ids: Box<dyn IdGenerator>,
        source: S,
    ) -> Result<Self, AppError> {
        Self::open_with_offset(store, ids, source, local_offset())
    }

    pub fn open_with_offset(
        store: Rc<dyn KeyValueStore>,
        ids: Box<dyn IdGenerator>,
        source: S,
        offset: UtcOffset,
    ) -> Result<Self, AppError> {
        let repository = TaskRepository::load(store.clone(), ids)?;
        let filter = PersistentState::load(store.clone(), FILTER_KEY, Filter::All)?;
        let has_fetched_previous = PersistentState::load(store, HAS_FETCHED_PREVIOUS_KEY, false)?;
        debug!(
            tasks = repository.tasks().len(),
            filter = %filter.get(),
            has_fetched_previous = *has_fetched_previous.get(),
            "opened session"
        );

        Ok(Self {
            repository,
            filter,
            has_fetched_previous,
            importer: Importer::new(source),
            offset,
            pending_deletion: None,
            recently_added: None,
        })
    }

    /// `due_date` may be RFC 3339 with any offset or a bare `YYYY-MM-DD`; it
    /// is stored as whole-second UTC. A blank date means no date.
    pub fn on_add_task(&mut self, text: &str, due_date: Option<String>) -> Result<Option<u64>, AppError> {
        let due_date = due_date
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_due_date(&raw, self.offset))
            .transpose()?;
        let added = self.repository.add_task(text, due_date)?;
        if let Some(id) = added {
            self.recently_added = Some(RecentlyAdded {
                id,
                at: Instant::now(),
            });
        }
        Ok(added)
    }

    pub fn on_toggle_task_completion(&mut self, id: u64) -> Result<bool, AppError> {
        self.repository.toggle_completion(id)
    }

    /// Stages `id` for deletion until [`Session::on_confirmed_delete`] or
    /// [`Session::on_cancel_delete`].
    pub fn on_confirm_delete_task(&mut self, id: u64) {
        self.pending_deletion = Some(id);
    }

    pub fn on_cancel_delete(&mut self) {
        self.pending_deletion = None;
    }

    pub fn on_confirmed_delete(&mut self) -> Result<Option<Task>, AppError> {
        match self.pending_deletion.take() {
            Some(id) => {
                if self.recently_added.is_some_and(|recent| recent.id == id) {
                    self.recently_added = None;
                }
                self.repository.delete_task(id)
            }
            None => Ok(None),
        }
    }

    pub fn on_filter_change(&mut self, filter: Filter) -> Result<(), AppError> {
        debug!(%filter, "changing filter");
        self.filter.set(filter)
    }

    /// Fetches historical tasks and appends whatever arrived. Failures show up
    /// in [`Session::import_error`].
    pub async fn on_load_previous_tasks(&mut self) -> Result<usize, AppError> {
        let fetched = self.importer.load_tasks().await;
        if fetched.is_empty() {
            return Ok(0);
        }

        let count = self.repository.import_historical_tasks(fetched)?;
        self.has_fetched_previous.set(true)?;
        info!(count, "appended previous tasks");
        Ok(count)
    }

    pub fn tasks(&self) -> &[Task] {
        self.repository.tasks()
    }

    pub fn filter(&self) -> Filter {
        *self.filter.get()
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn filtered_tasks(&self) -> Vec<Task> {
        filter_by_status(self.tasks(), self.filter())
    }

    pub fn grouped_tasks(&self) -> BTreeMap<DateKey, Vec<Task>> {
        group_by_due_date(&self.filtered_tasks(), self.offset)
    }

    pub fn sorted_date_keys(&self) -> Vec<Date> {
        sorted_date_keys(&self.filtered_tasks(), self.offset)
    }

    pub fn is_loading(&self) -> bool {
        self.importer.is_loading()
    }

    pub fn import_error(&self) -> Option<String> {
        self.importer.error()
    }

    pub fn has_fetched_previous(&self) -> bool {
        *self.has_fetched_previous.get()
    }

    pub fn can_load_previous(&self) -> bool {
        !self.has_fetched_previous() && !self.is_loading()
    }

    pub fn pending_deletion(&self) -> Option<&Task> {
        self.pending_deletion.and_then(|id| self.repository.find(id))
    }

    /// Id of the task added within the last [`HIGHLIGHT_DURATION`].
    pub fn recently_added(&self, now: Instant) -> Option<u64> {
        self.recently_added
            .filter(|recent| now.saturating_duration_since(recent.at) < HIGHLIGHT_DURATION)
            .map(|recent| recent.id)
    }
}
