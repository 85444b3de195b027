//! Repository for the `community_events` table.

use masjid_core::lifecycle::EventStatus;
use masjid_core::types::DbId;
use sqlx::PgPool;

use crate::models::community_event::{CommunityEvent, CreateCommunityEvent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, masjid_id, title, description, location, starts_at, ends_at, status, \
                        created_by, created_at, updated_at";

/// Provides community event persistence.
pub struct CommunityEventRepo;

impl CommunityEventRepo {
    /// Insert a new, active event.
    pub async fn create(
        pool: &PgPool,
        masjid_id: DbId,
        created_by: DbId,
        input: &CreateCommunityEvent,
    ) -> Result<CommunityEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO community_events
                (masjid_id, title, description, location, starts_at, ends_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CommunityEvent>(&query)
            .bind(masjid_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Find an event by ID, regardless of status.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CommunityEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM community_events WHERE id = $1");
        sqlx::query_as::<_, CommunityEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Write a status that the caller has already validated as a legal transition.
    ///
    /// The `status = $3` guard makes a concurrent transition lose cleanly:
    /// `None` means the row was not in `from` any more.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<CommunityEvent>, sqlx::Error> {
        let query = format!(
            "UPDATE community_events SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CommunityEvent>(&query)
            .bind(id)
            .bind(to.as_str())
            .bind(from.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Active events of a masjid ordered by start time.
    pub async fn list_active_for_masjid(
        pool: &PgPool,
        masjid_id: DbId,
    ) -> Result<Vec<CommunityEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM community_events
             WHERE masjid_id = $1 AND status = $2
             ORDER BY starts_at"
        );
        sqlx::query_as::<_, CommunityEvent>(&query)
            .bind(masjid_id)
            .bind(EventStatus::Active.as_str())
            .fetch_all(pool)
            .await
    }
}
