//! Repository for the `user_settings` and `device_settings` tables.
//!
//! Rows are created lazily. Readers that only need effective preferences
//! should treat a missing row as [`PreferenceSet::default`].

use masjid_core::preferences::PreferenceSet;
use masjid_core::types::DbId;
use sqlx::PgPool;

use crate::models::settings::{DeviceSettings, UpdateSettings, UserSettings};

const USER_COLUMNS: &str = "id, user_id, prayer_times, events, donations, general, questions, \
                             created_at, updated_at";

const DEVICE_COLUMNS: &str = "id, device_id, prayer_times, events, donations, general, \
                               questions, created_at, updated_at";

/// Provides per-recipient settings reads and upserts.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Return the user's settings row, inserting the all-true default if absent.
    pub async fn get_or_create_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<UserSettings, sqlx::Error> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let query = format!(
            "INSERT INTO user_settings (user_id) VALUES ($1)
             ON CONFLICT ON CONSTRAINT uq_user_settings_user
             DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserSettings>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Return the device's settings row, inserting the all-true default if absent.
    pub async fn get_or_create_device(
        pool: &PgPool,
        device_id: &str,
    ) -> Result<DeviceSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_settings (device_id) VALUES ($1)
             ON CONFLICT ON CONSTRAINT uq_device_settings_device
             DO UPDATE SET device_id = EXCLUDED.device_id
             RETURNING {DEVICE_COLUMNS}"
        );
        sqlx::query_as::<_, DeviceSettings>(&query)
            .bind(device_id)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update to the user's settings, creating the row first if needed.
    pub async fn update_user(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdateSettings,
    ) -> Result<UserSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_settings (user_id, prayer_times, events, donations, general, questions)
             VALUES ($1, COALESCE($2, true), COALESCE($3, true), COALESCE($4, true),
                     COALESCE($5, true), COALESCE($6, true))
             ON CONFLICT ON CONSTRAINT uq_user_settings_user DO UPDATE SET
                prayer_times = COALESCE($2, user_settings.prayer_times),
                events = COALESCE($3, user_settings.events),
                donations = COALESCE($4, user_settings.donations),
                general = COALESCE($5, user_settings.general),
                questions = COALESCE($6, user_settings.questions),
                updated_at = NOW()
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserSettings>(&query)
            .bind(user_id)
            .bind(input.prayer_times)
            .bind(input.events)
            .bind(input.donations)
            .bind(input.general)
            .bind(input.questions)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update to the device's settings, creating the row first if needed.
    pub async fn update_device(
        pool: &PgPool,
        device_id: &str,
        input: &UpdateSettings,
    ) -> Result<DeviceSettings, sqlx::Error> {
        let query = format!(
            "INSERT INTO device_settings (device_id, prayer_times, events, donations, general, questions)
             VALUES ($1, COALESCE($2, true), COALESCE($3, true), COALESCE($4, true),
                     COALESCE($5, true), COALESCE($6, true))
             ON CONFLICT ON CONSTRAINT uq_device_settings_device DO UPDATE SET
                prayer_times = COALESCE($2, device_settings.prayer_times),
                events = COALESCE($3, device_settings.events),
                donations = COALESCE($4, device_settings.donations),
                general = COALESCE($5, device_settings.general),
                questions = COALESCE($6, device_settings.questions),
                updated_at = NOW()
             RETURNING {DEVICE_COLUMNS}"
        );
        sqlx::query_as::<_, DeviceSettings>(&query)
            .bind(device_id)
            .bind(input.prayer_times)
            .bind(input.events)
            .bind(input.donations)
            .bind(input.general)
            .bind(input.questions)
            .fetch_one(pool)
            .await
    }

    /// Stored preferences for a batch of users. Users without a row are absent.
    pub async fn preferences_for_users(
        pool: &PgPool,
        user_ids: &[DbId],
    ) -> Result<Vec<(DbId, PreferenceSet)>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {USER_COLUMNS} FROM user_settings WHERE user_id = ANY($1)");
        let rows = sqlx::query_as::<_, UserSettings>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(|r| (r.user_id, r.preferences())).collect())
    }

    /// Stored preferences for a batch of devices. Devices without a row are absent.
    pub async fn preferences_for_devices(
        pool: &PgPool,
        device_ids: &[String],
    ) -> Result<Vec<(String, PreferenceSet)>, sqlx::Error> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query =
            format!("SELECT {DEVICE_COLUMNS} FROM device_settings WHERE device_id = ANY($1)");
        let rows = sqlx::query_as::<_, DeviceSettings>(&query)
            .bind(device_ids)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| {
                let prefs = r.preferences();
                (r.device_id, prefs)
            })
            .collect())
    }
}
