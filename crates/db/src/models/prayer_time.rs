//! Prayer time model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use masjid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `prayer_times` table. Unique per (masjid, prayer, date).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PrayerTime {
    pub id: DbId,
    pub masjid_id: DbId,
    pub prayer_name: String,
    pub adhan_time: NaiveTime,
    pub iqamah_time: Option<NaiveTime>,
    pub effective_date: NaiveDate,
    pub updated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting or replacing a prayer time.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPrayerTime {
    pub prayer_name: String,
    pub adhan_time: NaiveTime,
    pub iqamah_time: Option<NaiveTime>,
    pub effective_date: NaiveDate,
}
