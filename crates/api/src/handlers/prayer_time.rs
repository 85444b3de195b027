//! Handlers for `/masjids/{id}/prayer-times`.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use masjid_core::capabilities::Capability;
use masjid_core::categories::NotificationCategory;
use masjid_core::permissions::PermissionCheck;
use masjid_core::types::DbId;
use masjid_core::validation::{parse_prayer_time, validate_prayer_name};
use masjid_db::models::announcement::CreateAnnouncement;
use masjid_db::models::prayer_time::{PrayerTime, UpsertPrayerTime};
use masjid_db::repositories::PrayerTimeRepo;
use masjid_events::{AnnouncementOrigin, DomainEvent};
use serde::Deserialize;

use crate::authz::{authorize, find_active_masjid};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /masjids/{id}/prayer-times`. Times are `HH:MM`.
#[derive(Debug, Deserialize)]
pub struct UpsertPrayerTimeRequest {
    pub prayer_name: String,
    pub adhan_time: String,
    pub iqamah_time: Option<String>,
    pub effective_date: NaiveDate,
}

/// Query parameters for `GET /masjids/{id}/prayer-times`.
#[derive(Debug, Deserialize)]
pub struct PrayerTimeDateParams {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

/// POST /api/v1/masjids/{id}/prayer-times
///
/// Inserts or replaces the time for (masjid, prayer, date) and records a
/// `Prayer Times` announcement in the same transaction. Subscribers are
/// notified once, through [`DomainEvent::PrayerTimesChanged`].
pub async fn upsert_prayer_time(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(masjid_id): Path<DbId>,
    Json(input): Json<UpsertPrayerTimeRequest>,
) -> AppResult<Json<DataResponse<PrayerTime>>> {
    let dto = UpsertPrayerTime {
        prayer_name: validate_prayer_name(&input.prayer_name)?,
        adhan_time: parse_prayer_time(&input.adhan_time)?,
        iqamah_time: input
            .iqamah_time
            .as_deref()
            .map(parse_prayer_time)
            .transpose()?,
        effective_date: input.effective_date,
    };

    let user = authorize(
        &state.pool,
        Some(auth),
        masjid_id,
        PermissionCheck::Capability(Capability::ChangePrayerTimes),
    )
    .await?;

    let announcement = CreateAnnouncement {
        masjid_id,
        title: "Prayer time updated".to_string(),
        body: format!(
            "{} adhan is now at {} from {}",
            dto.prayer_name,
            dto.adhan_time.format("%H:%M"),
            dto.effective_date
        ),
        category: NotificationCategory::PrayerTimes,
        created_by: Some(user.id),
    };

    let (prayer_time, announcement) =
        PrayerTimeRepo::upsert_and_announce(&state.pool, masjid_id, user.id, &dto, &announcement)
            .await?;

    tracing::info!(
        masjid_id,
        prayer_name = %prayer_time.prayer_name,
        effective_date = %prayer_time.effective_date,
        "Prayer time updated"
    );

    state.event_bus.publish(DomainEvent::PrayerTimesChanged {
        masjid_id,
        prayer_name: prayer_time.prayer_name.clone(),
        adhan_time: prayer_time.adhan_time,
        effective_date: prayer_time.effective_date,
    });
    state.event_bus.publish(DomainEvent::AnnouncementCreated {
        masjid_id,
        announcement_id: announcement.id,
        category: announcement.category,
        title: announcement.title,
        body: announcement.body,
        origin: AnnouncementOrigin::PrayerTimeChange,
    });

    Ok(Json(DataResponse { data: prayer_time }))
}

/// GET /api/v1/masjids/{id}/prayer-times?date=YYYY-MM-DD
///
/// Public.
pub async fn list_prayer_times(
    State(state): State<AppState>,
    Path(masjid_id): Path<DbId>,
    Query(params): Query<PrayerTimeDateParams>,
) -> AppResult<Json<DataResponse<Vec<PrayerTime>>>> {
    find_active_masjid(&state.pool, masjid_id).await?;
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    let times = PrayerTimeRepo::list_for_date(&state.pool, masjid_id, date).await?;
    Ok(Json(DataResponse { data: times }))
}
