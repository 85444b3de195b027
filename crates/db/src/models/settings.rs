//! Per-recipient notification settings (`user_settings`, `device_settings`).

use masjid_core::preferences::PreferenceSet;
use masjid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `user_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSettings {
    pub id: DbId,
    pub user_id: DbId,
    pub prayer_times: bool,
    pub events: bool,
    pub donations: bool,
    pub general: bool,
    pub questions: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `device_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceSettings {
    pub id: DbId,
    pub device_id: String,
    pub prayer_times: bool,
    pub events: bool,
    pub donations: bool,
    pub general: bool,
    pub questions: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSettings {
    pub fn preferences(&self) -> PreferenceSet {
        PreferenceSet {
            prayer_times: self.prayer_times,
            events: self.events,
            donations: self.donations,
            general: self.general,
            questions: self.questions,
        }
    }
}

impl DeviceSettings {
    pub fn preferences(&self) -> PreferenceSet {
        PreferenceSet {
            prayer_times: self.prayer_times,
            events: self.events,
            donations: self.donations,
            general: self.general,
            questions: self.questions,
        }
    }
}

/// DTO for updating settings. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    pub prayer_times: Option<bool>,
    pub events: Option<bool>,
    pub donations: Option<bool>,
    pub general: Option<bool>,
    pub questions: Option<bool>,
}
