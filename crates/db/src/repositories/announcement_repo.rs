//! Repository for the `announcements` table.

use masjid_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::announcement::{Announcement, CreateAnnouncement};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, masjid_id, title, body, category, created_by, created_at";

/// Provides announcement persistence.
pub struct AnnouncementRepo;

impl AnnouncementRepo {
    /// Insert an announcement.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAnnouncement,
    ) -> Result<Announcement, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        insert_announcement(&mut conn, input).await
    }

    /// Most recent announcements of a masjid.
    pub async fn list_for_masjid(
        pool: &PgPool,
        masjid_id: DbId,
        limit: i64,
    ) -> Result<Vec<Announcement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM announcements
             WHERE masjid_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Announcement>(&query)
            .bind(masjid_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

/// Insert an announcement on an existing connection or transaction.
pub(crate) async fn insert_announcement(
    conn: &mut PgConnection,
    input: &CreateAnnouncement,
) -> Result<Announcement, sqlx::Error> {
    let query = format!(
        "INSERT INTO announcements (masjid_id, title, body, category, created_by)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Announcement>(&query)
        .bind(input.masjid_id)
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.category.as_str())
        .bind(input.created_by)
        .fetch_one(&mut *conn)
        .await
}
