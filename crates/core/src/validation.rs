//! Input validation helpers shared by the DB and API layers.

use chrono::NaiveTime;

use crate::error::CoreError;

/// Accepted prayer names, lowercase.
pub const VALID_PRAYER_NAMES: &[&str] =
    &["fajr", "sunrise", "dhuhr", "asr", "maghrib", "isha", "jumuah"];

/// Maximum length of a push-notification title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a push-notification body.
pub const MAX_BODY_LEN: usize = 2000;

/// Maximum accepted delivery token length.
pub const MAX_TOKEN_LEN: usize = 4096;

/// Normalize and validate a prayer name.
pub fn validate_prayer_name(name: &str) -> Result<String, CoreError> {
    let normalized = name.trim().to_ascii_lowercase();
    if VALID_PRAYER_NAMES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid prayer name '{name}'. Must be one of: {}",
            VALID_PRAYER_NAMES.join(", ")
        )))
    }
}

/// Parse an `HH:MM` (24-hour) prayer time.
pub fn parse_prayer_time(value: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| CoreError::Validation(format!("Invalid time '{value}'. Expected HH:MM")))
}

/// Validate a push title/body pair.
pub fn validate_message(title: &str, body: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    if body.chars().count() > MAX_BODY_LEN {
        return Err(CoreError::Validation(format!(
            "Body must be at most {MAX_BODY_LEN} characters"
        )));
    }
    Ok(())
}

/// Trim and validate a delivery token.
pub fn validate_push_token(token: &str) -> Result<String, CoreError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Push token must not be empty".into()));
    }
    if trimmed.len() > MAX_TOKEN_LEN {
        return Err(CoreError::Validation("Push token is too long".into()));
    }
    Ok(trimmed.to_string())
}
