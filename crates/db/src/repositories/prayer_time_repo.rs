//! Repository for the `prayer_times` table.

use chrono::NaiveDate;
use masjid_core::types::DbId;
use sqlx::PgPool;

use crate::models::announcement::{Announcement, CreateAnnouncement};
use crate::models::prayer_time::{PrayerTime, UpsertPrayerTime};
use crate::repositories::announcement_repo::insert_announcement;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, masjid_id, prayer_name, adhan_time, iqamah_time, effective_date, \
                        updated_by, created_at, updated_at";

/// Provides prayer time persistence.
pub struct PrayerTimeRepo;

impl PrayerTimeRepo {
    /// Insert or replace the time for (masjid, prayer, date) and record the
    /// accompanying announcement in the same transaction.
    pub async fn upsert_and_announce(
        pool: &PgPool,
        masjid_id: DbId,
        updated_by: DbId,
        input: &UpsertPrayerTime,
        announcement: &CreateAnnouncement,
    ) -> Result<(PrayerTime, Announcement), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO prayer_times
                (masjid_id, prayer_name, adhan_time, iqamah_time, effective_date, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_prayer_times_masjid_name_date DO UPDATE SET
                adhan_time = EXCLUDED.adhan_time,
                iqamah_time = EXCLUDED.iqamah_time,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        let prayer_time = sqlx::query_as::<_, PrayerTime>(&query)
            .bind(masjid_id)
            .bind(&input.prayer_name)
            .bind(input.adhan_time)
            .bind(input.iqamah_time)
            .bind(input.effective_date)
            .bind(updated_by)
            .fetch_one(&mut *tx)
            .await?;

        let announcement = insert_announcement(&mut tx, announcement).await?;

        tx.commit().await?;
        Ok((prayer_time, announcement))
    }

    /// Times for one masjid on one date, in prayer order.
    pub async fn list_for_date(
        pool: &PgPool,
        masjid_id: DbId,
        date: NaiveDate,
    ) -> Result<Vec<PrayerTime>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prayer_times
             WHERE masjid_id = $1 AND effective_date = $2
             ORDER BY adhan_time"
        );
        sqlx::query_as::<_, PrayerTime>(&query)
            .bind(masjid_id)
            .bind(date)
            .fetch_all(pool)
            .await
    }
}
