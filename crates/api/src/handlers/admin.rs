//! Handlers for the `/admin` resource (platform-wide user management).
//!
//! Super-admin only. Self-modification guards run before the super-admin
//! check, so even a super-admin cannot change their own flag or deactivate
//! their own account.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use masjid_core::error::CoreError;
use masjid_core::permissions::{guard_not_self, SelfAction};
use masjid_core::types::DbId;
use masjid_db::models::user::User;
use masjid_db::repositories::UserRepo;
use serde::Deserialize;

use crate::authz::require_super_admin;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /admin/users/{id}/super-admin`.
#[derive(Debug, Deserialize)]
pub struct SetSuperAdminRequest {
    pub is_super_admin: bool,
}

/// PUT /api/v1/admin/users/{id}/super-admin
pub async fn set_super_admin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<SetSuperAdminRequest>,
) -> AppResult<Json<DataResponse<User>>> {
    guard_not_self(auth.user_id, id, SelfAction::ChangeOwnSuperAdmin)?;
    let admin = require_super_admin(&state.pool, auth).await?;

    let user = UserRepo::set_super_admin(&state.pool, id, input.is_super_admin)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(
        user_id = id,
        is_super_admin = input.is_super_admin,
        changed_by = admin.id,
        "Super-admin flag changed"
    );
    Ok(Json(DataResponse { data: user }))
}

/// POST /api/v1/admin/users/{id}/deactivate
///
/// Soft-deactivate a user. Returns 204 No Content.
pub async fn deactivate_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    guard_not_self(auth.user_id, id, SelfAction::DeactivateSelf)?;
    let admin = require_super_admin(&state.pool, auth).await?;

    if UserRepo::deactivate(&state.pool, id).await? {
        tracing::info!(user_id = id, deactivated_by = admin.id, "User deactivated");
        return Ok(StatusCode::NO_CONTENT);
    }

    match UserRepo::find_by_id(&state.pool, id).await? {
        Some(_) => Err(CoreError::Conflict("User is already deactivated".into()).into()),
        None => Err(AppError::Core(CoreError::NotFound { entity: "User", id })),
    }
}
