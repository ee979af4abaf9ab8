use crate::error::AppError;
use tracing::warn;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "TASKLIST_DISABLE_NOTIFICATIONS";

/// Short-lived toast shown outside the terminal.
pub trait Notifier {
    fn notify(&self, summary: &str, body: &str) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _summary: &str, _body: &str) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notifier_from_env() -> Box<dyn Notifier> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Box::new(NoopNotifier);
    }

    platform_notifier()
}

/// Sends a toast, logging instead of failing when the desktop refuses it.
pub fn notify_quietly(notifier: &dyn Notifier, summary: &str, body: &str) {
    if let Err(err) = notifier.notify(summary, body) {
        warn!(error = %err, "notification failed");
    }
}

pub fn import_summary(count: usize, error: Option<&str>) -> String {
    match (count, error) {
        (_, Some(message)) => message.to_string(),
        (0, None) => "No previous tasks found.".to_string(),
        (1, None) => "Loaded 1 previous task.".to_string(),
        (count, None) => format!("Loaded {count} previous tasks."),
    }
}

#[cfg(target_os = "linux")]
fn platform_notifier() -> Box<dyn Notifier> {
    Box::new(LinuxNotifier)
}

#[cfg(windows)]
fn platform_notifier() -> Box<dyn Notifier> {
    Box::new(WindowsNotifier)
}

#[cfg(not(any(target_os = "linux", windows)))]
fn platform_notifier() -> Box<dyn Notifier> {
    Box::new(NoopNotifier)
}
