//! Push-notification recipients.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A notification target: an authenticated user or an anonymous device.
///
/// Subscriptions, preferences, and question authorship all branch on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    User(DbId),
    Device(String),
}

impl Recipient {
    /// Build a recipient from the nullable column pair stored on
    /// subscription and question rows. Returns `None` unless exactly one
    /// side is set.
    pub fn from_columns(user_id: Option<DbId>, device_id: Option<&str>) -> Option<Self> {
        match (user_id, device_id) {
            (Some(id), None) => Some(Recipient::User(id)),
            (None, Some(device)) if !device.is_empty() => Some(Recipient::Device(device.to_string())),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Recipient::User(id) => Some(*id),
            Recipient::Device(_) => None,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        match self {
            Recipient::User(_) => None,
            Recipient::Device(id) => Some(id),
        }
    }
}
