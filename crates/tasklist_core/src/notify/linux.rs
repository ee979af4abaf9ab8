use crate::error::AppError;
use crate::notify::Notifier;
use notify_rust::{Notification, Timeout};

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, summary: &str, body: &str) -> Result<(), AppError> {
        Notification::new()
            .appname("tasklist")
            .summary(summary)
            .body(body)
            .timeout(Timeout::Milliseconds(4000))
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
