//! Handlers for the `/masjids` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use masjid_core::error::CoreError;
use masjid_core::permissions::PermissionCheck;
use masjid_core::types::DbId;
use masjid_db::models::masjid::{CreateMasjid, Masjid, UpdateMasjid};
use masjid_db::models::membership::Membership;
use masjid_db::repositories::MasjidRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::authz::{authorize, find_active_masjid, load_actor};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /masjids`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMasjidRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// Request body for `PUT /masjids/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMasjidRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// A new masjid together with its creator's admin membership.
#[derive(Debug, Serialize)]
pub struct CreatedMasjid {
    pub masjid: Masjid,
    pub membership: Membership,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/masjids
///
/// Any active user may create a masjid and becomes its first admin.
pub async fn create_masjid(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateMasjidRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedMasjid>>)> {
    input.validate()?;
    let user = load_actor(&state.pool, auth).await?;

    let dto = CreateMasjid {
        name: input.name.trim().to_string(),
        address: input.address,
        city: input.city,
        country: input.country,
        latitude: input.latitude,
        longitude: input.longitude,
    };
    let (masjid, membership) = MasjidRepo::create_with_admin(&state.pool, user.id, &dto).await?;

    tracing::info!(masjid_id = masjid.id, user_id = user.id, "Masjid created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedMasjid { masjid, membership },
        }),
    ))
}

/// GET /api/v1/masjids
pub async fn list_masjids(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Masjid>>>> {
    let masjids = MasjidRepo::list_active(&state.pool).await?;
    Ok(Json(DataResponse { data: masjids }))
}

/// GET /api/v1/masjids/{id}
pub async fn get_masjid(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Masjid>>> {
    let masjid = find_active_masjid(&state.pool, id).await?;
    Ok(Json(DataResponse { data: masjid }))
}

/// PUT /api/v1/masjids/{id}
pub async fn update_masjid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMasjidRequest>,
) -> AppResult<Json<DataResponse<Masjid>>> {
    input.validate()?;
    authorize(&state.pool, Some(auth), id, PermissionCheck::ManageMasjid).await?;

    let dto = UpdateMasjid {
        name: input.name.map(|n| n.trim().to_string()),
        address: input.address,
        city: input.city,
        country: input.country,
        latitude: input.latitude,
        longitude: input.longitude,
    };
    let masjid = MasjidRepo::update(&state.pool, id, &dto)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Masjid",
            id,
        }))?;

    Ok(Json(DataResponse { data: masjid }))
}

/// POST /api/v1/masjids/{id}/deactivate
///
/// Soft-deactivates the masjid. Returns 204 No Content.
pub async fn deactivate_masjid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let user = authorize(&state.pool, Some(auth), id, PermissionCheck::ManageMasjid).await?;

    if !MasjidRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Masjid",
            id,
        }));
    }

    tracing::info!(masjid_id = id, user_id = user.id, "Masjid deactivated");
    Ok(StatusCode::NO_CONTENT)
}
