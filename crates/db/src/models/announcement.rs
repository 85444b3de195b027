//! Announcement (masjid-wide notification) model.

use masjid_core::categories::NotificationCategory;
use masjid_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `announcements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Announcement {
    pub id: DbId,
    pub masjid_id: DbId,
    pub title: String,
    pub body: String,
    #[sqlx(try_from = "String")]
    pub category: NotificationCategory,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for inserting an announcement.
#[derive(Debug, Clone)]
pub struct CreateAnnouncement {
    pub masjid_id: DbId,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub created_by: Option<DbId>,
}
