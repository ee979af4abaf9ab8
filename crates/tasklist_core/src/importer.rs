use crate::dates::yesterday_iso;
use crate::error::AppError;
use crate::model::{RemoteTask, Task};
use std::cell::{Cell, RefCell};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub const DEFAULT_IMPORT_URL: &str = "https://my-json-server.typicode.com/typicode/demo/posts";
pub const DEFAULT_IMPORT_TIMEOUT: Duration = Duration::from_secs(30);
pub const LOAD_FAILED_MESSAGE: &str = "Tasks could not be loaded.";

/// Where historical tasks come from.
#[allow(async_fn_in_trait)]
pub trait TaskSource {
    async fn fetch(&self) -> Result<Vec<RemoteTask>, AppError>;
}

pub struct HttpTaskSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTaskSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::network(format!("failed building HTTP client: {err}")))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

impl TaskSource for HttpTaskSource {
    async fn fetch(&self) -> Result<Vec<RemoteTask>, AppError> {
        debug!(url = %self.url, "requesting historical tasks");
        let response = self
            .client
            .get(self.url.as_str())
            .send()
            .await
            .map_err(|err| AppError::network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = %status, "historical task request failed");
            return Err(AppError::network(LOAD_FAILED_MESSAGE));
        }

        response
            .json::<Vec<RemoteTask>>()
            .await
            .map_err(|err| AppError::network(err.to_string()))
    }
}

/// Turns remote records into finished tasks due the day before `now`.
pub fn map_remote_tasks(items: Vec<RemoteTask>, now: OffsetDateTime) -> Result<Vec<Task>, AppError> {
    let due_date = yesterday_iso(now)?;
    Ok(items
        .into_iter()
        .map(|item| Task {
            id: item.id,
            text: item.title,
            completed: true,
            due_date: Some(due_date.clone()),
        })
        .collect())
}

/// Clears the in-flight flag however the load ends, including when the
/// caller drops the future mid-fetch.
struct LoadingGuard<'a>(&'a Cell<bool>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Loads historical tasks and tracks the status of the last attempt.
///
/// Failures never escape `load_tasks`: they land in [`Importer::error`] and
/// the call yields no tasks. A call made while another is still running is
/// ignored.
pub struct Importer<S> {
    source: S,
    loading: Cell<bool>,
    error: RefCell<Option<String>>,
}

impl<S: TaskSource> Importer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            loading: Cell::new(false),
            error: RefCell::new(None),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub async fn load_tasks(&self) -> Vec<Task> {
        if self.loading.replace(true) {
            debug!("historical import already in flight, ignoring");
            return Vec::new();
        }
        self.error.replace(None);

        let result = {
            let _loading = LoadingGuard(&self.loading);
            match self.source.fetch().await {
                Ok(items) => map_remote_tasks(items, OffsetDateTime::now_utc()),
                Err(err) => Err(err),
            }
        };

        match result {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded historical tasks");
                tasks
            }
            Err(err) => {
                warn!(error = %err, "historical import failed");
                let message = if err.message().trim().is_empty() {
                    LOAD_FAILED_MESSAGE.to_string()
                } else {
                    err.message().to_string()
                };
                self.error.replace(Some(message));
                Vec::new()
            }
        }
    }
}
