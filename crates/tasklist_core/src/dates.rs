use crate::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Formats `moment` as whole-second RFC 3339 in UTC.
///
/// Stored due dates all share this shape so that string order matches time
/// order.
pub fn to_iso(moment: OffsetDateTime) -> Result<String, AppError> {
    let moment = moment
        .to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    moment
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn yesterday_iso(now: OffsetDateTime) -> Result<String, AppError> {
    to_iso(now - Duration::days(1))
}

/// Normalizes user input into a stored due date.
///
/// Accepts RFC 3339 date-times or a bare `YYYY-MM-DD`, which means midnight
/// at `offset`.
pub fn parse_due_date(input: &str, offset: UtcOffset) -> Result<String, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("due date is required"));
    }

    if let Ok(moment) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return to_iso(moment);
    }

    let day = Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input("due date must be RFC3339 or YYYY-MM-DD"))?;
    to_iso(day.midnight().assume_offset(offset))
}

/// Calendar day of a stored due date as seen from `offset`.
pub fn due_day(raw: &str, offset: UtcOffset) -> Option<Date> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(moment) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(moment.to_offset(offset).date());
    }

    Date::parse(trimmed, format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_day(day: Date) -> String {
    day.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| day.to_string())
}
