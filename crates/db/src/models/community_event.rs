//! Community event model and DTOs.

use masjid_core::lifecycle::EventStatus;
use masjid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `community_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommunityEvent {
    pub id: DbId,
    pub masjid_id: DbId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a community event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommunityEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub starts_at: Timestamp,
    pub ends_at: Option<Timestamp>,
}
