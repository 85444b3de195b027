//! Community question model and DTOs.

use masjid_core::recipient::Recipient;
use masjid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: DbId,
    pub masjid_id: DbId,
    pub user_id: Option<DbId>,
    pub device_id: Option<String>,
    pub title: String,
    pub body: String,
    pub answer: Option<String>,
    pub answered_by: Option<DbId>,
    pub answered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Question {
    /// Who asked the question, if still known.
    pub fn author(&self) -> Option<Recipient> {
        Recipient::from_columns(self.user_id, self.device_id.as_deref())
    }
}

/// DTO for creating a question.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestion {
    pub title: String,
    pub body: String,
}
