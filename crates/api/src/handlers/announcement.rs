//! Handlers for `/masjids/{id}/announcements`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use masjid_core::capabilities::Capability;
use masjid_core::categories::NotificationCategory;
use masjid_core::permissions::PermissionCheck;
use masjid_core::types::DbId;
use masjid_core::validation::validate_message;
use masjid_db::models::announcement::{Announcement, CreateAnnouncement};
use masjid_db::repositories::AnnouncementRepo;
use masjid_events::{AnnouncementOrigin, DomainEvent};
use serde::Deserialize;

use crate::authz::{authorize, find_active_masjid};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::{created, DataResponse};
use crate::state::AppState;

/// Request body for `POST /masjids/{id}/announcements`.
///
/// `category` must be one of `Prayer Times`, `Donations`, `Events`, `General`.
#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub category: String,
}

/// POST /api/v1/masjids/{id}/announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(masjid_id): Path<DbId>,
    Json(input): Json<CreateAnnouncementRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Announcement>>)> {
    let category: NotificationCategory = input.category.parse()?;
    validate_message(&input.title, &input.body)?;

    let user = authorize(
        &state.pool,
        Some(auth),
        masjid_id,
        PermissionCheck::Capability(Capability::CreateNotifications),
    )
    .await?;

    let dto = CreateAnnouncement {
        masjid_id,
        title: input.title.trim().to_string(),
        body: input.body,
        category,
        created_by: Some(user.id),
    };
    let announcement = AnnouncementRepo::create(&state.pool, &dto).await?;

    tracing::info!(
        masjid_id,
        announcement_id = announcement.id,
        category = %category,
        "Announcement created"
    );
    state.event_bus.publish(DomainEvent::AnnouncementCreated {
        masjid_id,
        announcement_id: announcement.id,
        category: announcement.category,
        title: announcement.title.clone(),
        body: announcement.body.clone(),
        origin: AnnouncementOrigin::Direct,
    });

    Ok(created(announcement))
}

/// GET /api/v1/masjids/{id}/announcements
///
/// Public, newest first.
pub async fn list_announcements(
    State(state): State<AppState>,
    Path(masjid_id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Announcement>>>> {
    find_active_masjid(&state.pool, masjid_id).await?;
    let announcements = AnnouncementRepo::list_for_masjid(&state.pool, masjid_id, page.limit()).await?;
    Ok(Json(DataResponse {
        data: announcements,
    }))
}
