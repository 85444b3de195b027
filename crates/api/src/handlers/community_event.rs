//! Handlers for community events.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use masjid_core::capabilities::Capability;
use masjid_core::error::CoreError;
use masjid_core::lifecycle::EventStatus;
use masjid_core::permissions::PermissionCheck;
use masjid_core::types::DbId;
use masjid_core::validation::validate_message;
use masjid_db::models::community_event::{CommunityEvent, CreateCommunityEvent};
use masjid_db::repositories::CommunityEventRepo;
use masjid_events::DomainEvent;

use crate::authz::{authorize, find_active_masjid};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{created, DataResponse};
use crate::state::AppState;

/// POST /api/v1/masjids/{id}/events
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(masjid_id): Path<DbId>,
    Json(input): Json<CreateCommunityEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<CommunityEvent>>)> {
    validate_message(&input.title, &input.description)?;
    if input.ends_at.is_some_and(|ends| ends < input.starts_at) {
        return Err(CoreError::Validation("Event cannot end before it starts".into()).into());
    }

    let user = authorize(
        &state.pool,
        Some(auth),
        masjid_id,
        PermissionCheck::Capability(Capability::CreateEvents),
    )
    .await?;

    let event = CommunityEventRepo::create(&state.pool, masjid_id, user.id, &input).await?;

    state.event_bus.publish(DomainEvent::CommunityEventCreated {
        masjid_id,
        event_id: event.id,
        title: event.title.clone(),
        starts_at: event.starts_at,
    });

    Ok(created(event))
}

/// GET /api/v1/masjids/{id}/events
///
/// Public; deleted events are excluded.
pub async fn list_events(
    State(state): State<AppState>,
    Path(masjid_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CommunityEvent>>>> {
    find_active_masjid(&state.pool, masjid_id).await?;
    let events = CommunityEventRepo::list_active_for_masjid(&state.pool, masjid_id).await?;
    Ok(Json(DataResponse { data: events }))
}

/// DELETE /api/v1/events/{id}
///
/// Moves the event from `active` to `deleted`. There is no way back;
/// deleting twice is a conflict.
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let event = CommunityEventRepo::find_by_id(&state.pool, event_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Event",
            id: event_id,
        }))?;

    authorize(
        &state.pool,
        Some(auth),
        event.masjid_id,
        PermissionCheck::Capability(Capability::CreateEvents),
    )
    .await?;

    let next = event.status.transition_to(EventStatus::Deleted)?;
    CommunityEventRepo::set_status(&state.pool, event_id, event.status, next)
        .await?
        .ok_or_else(|| CoreError::Conflict("Event was modified concurrently".into()))?;

    Ok(StatusCode::NO_CONTENT)
}
