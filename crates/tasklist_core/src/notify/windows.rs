use crate::error::AppError;
use crate::notify::Notifier;
use tauri_winrt_notification::{Duration, Toast};

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, summary: &str, body: &str) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(summary)
            .text1(body)
            .duration(Duration::Short)
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
