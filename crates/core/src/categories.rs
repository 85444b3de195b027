//! Notification categories and the preference keys they map to.
//!
//! [`NotificationCategory`] is the fixed wire-level enum accepted on
//! announcements. [`PreferenceCategory`] is the per-recipient toggle key
//! consulted during fan-out; it has one extra key, `questions`, used by
//! question and reply notifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const CATEGORY_PRAYER_TIMES: &str = "Prayer Times";
pub const CATEGORY_DONATIONS: &str = "Donations";
pub const CATEGORY_EVENTS: &str = "Events";
pub const CATEGORY_GENERAL: &str = "General";

/// All valid wire-level notification category values.
pub const VALID_CATEGORIES: &[&str] = &[
    CATEGORY_PRAYER_TIMES,
    CATEGORY_DONATIONS,
    CATEGORY_EVENTS,
    CATEGORY_GENERAL,
];

/// Wire-level category of an announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationCategory {
    #[serde(rename = "Prayer Times")]
    PrayerTimes,
    #[serde(rename = "Donations")]
    Donations,
    #[serde(rename = "Events")]
    Events,
    #[serde(rename = "General")]
    General,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::PrayerTimes => CATEGORY_PRAYER_TIMES,
            NotificationCategory::Donations => CATEGORY_DONATIONS,
            NotificationCategory::Events => CATEGORY_EVENTS,
            NotificationCategory::General => CATEGORY_GENERAL,
        }
    }

    /// The preference toggle that gates delivery of this category.
    pub fn preference(self) -> PreferenceCategory {
        match self {
            NotificationCategory::PrayerTimes => PreferenceCategory::PrayerTimes,
            NotificationCategory::Donations => PreferenceCategory::Donations,
            NotificationCategory::Events => PreferenceCategory::Events,
            NotificationCategory::General => PreferenceCategory::General,
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CATEGORY_PRAYER_TIMES => Ok(NotificationCategory::PrayerTimes),
            CATEGORY_DONATIONS => Ok(NotificationCategory::Donations),
            CATEGORY_EVENTS => Ok(NotificationCategory::Events),
            CATEGORY_GENERAL => Ok(NotificationCategory::General),
            other => Err(CoreError::Validation(format!(
                "Invalid category '{other}'. Must be one of: {}",
                VALID_CATEGORIES.join(", ")
            ))),
        }
    }
}

impl TryFrom<String> for NotificationCategory {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Per-recipient preference key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceCategory {
    PrayerTimes,
    Events,
    Donations,
    General,
    Questions,
}

impl PreferenceCategory {
    pub const ALL: [PreferenceCategory; 5] = [
        PreferenceCategory::PrayerTimes,
        PreferenceCategory::Events,
        PreferenceCategory::Donations,
        PreferenceCategory::General,
        PreferenceCategory::Questions,
    ];

    /// Column name in `user_settings` / `device_settings`.
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceCategory::PrayerTimes => "prayer_times",
            PreferenceCategory::Events => "events",
            PreferenceCategory::Donations => "donations",
            PreferenceCategory::General => "general",
            PreferenceCategory::Questions => "questions",
        }
    }
}

impl fmt::Display for PreferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
