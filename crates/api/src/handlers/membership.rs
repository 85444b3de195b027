//! Handlers for masjid memberships (`/masjids/{id}/members`) and the
//! caller's default membership (`/me/default-membership`).
//!
//! Role changes and removals check the self-modification guard before the
//! `ManageUsers` permission, and leave the last-admin rule to the
//! transactional repository methods.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use masjid_core::capabilities::CapabilityOverrides;
use masjid_core::error::CoreError;
use masjid_core::permissions::{guard_not_self, PermissionCheck, SelfAction};
use masjid_core::roles::Role;
use masjid_core::types::DbId;
use masjid_db::models::membership::{Membership, MembershipChange, NewMembership};
use masjid_db::repositories::{MembershipRepo, UserRepo};
use serde::Deserialize;

use crate::authz::{authorize, find_active_masjid, load_actor};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::response::{created, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /masjids/{id}/members`.
///
/// Capabilities start from the role's defaults; any field given in
/// `capabilities` overrides the default.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: DbId,
    pub role: String,
    #[serde(default)]
    pub capabilities: CapabilityOverrides,
}

/// Request body for `PUT /masjids/{id}/members/{membership_id}/role`.
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/masjids/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Path(masjid_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Membership>>>> {
    authorize(&state.pool, auth, masjid_id, PermissionCheck::Member).await?;
    let members = MembershipRepo::list_for_masjid(&state.pool, masjid_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/masjids/{id}/members
///
/// Returns 409 if the user already holds the role on this masjid.
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(masjid_id): Path<DbId>,
    Json(input): Json<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Membership>>)> {
    let role: Role = input.role.parse()?;
    let actor = authorize(&state.pool, Some(auth), masjid_id, PermissionCheck::ManageUsers).await?;

    let target = UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }))?;

    let mut new_member = NewMembership::with_role_defaults(target.id, masjid_id, role, Some(actor.id));
    new_member.capabilities = new_member.capabilities.with_overrides(&input.capabilities);

    let membership = MembershipRepo::add(&state.pool, &new_member).await?;

    tracing::info!(
        masjid_id,
        membership_id = membership.id,
        user_id = target.id,
        role = %role,
        assigned_by = actor.id,
        "Member added"
    );
    Ok(created(membership))
}

/// PUT /api/v1/masjids/{id}/members/{membership_id}/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((masjid_id, membership_id)): Path<(DbId, DbId)>,
    Json(input): Json<ChangeRoleRequest>,
) -> AppResult<Json<DataResponse<Membership>>> {
    let role: Role = input.role.parse()?;
    let target = find_target(&state, masjid_id, membership_id).await?;
    guard_not_self(auth.user_id, target.user_id, SelfAction::ChangeOwnRole)?;
    let actor = authorize(&state.pool, Some(auth), masjid_id, PermissionCheck::ManageUsers).await?;

    match MembershipRepo::change_role(&state.pool, masjid_id, membership_id, role).await? {
        MembershipChange::Updated(membership) => {
            tracing::info!(
                masjid_id,
                membership_id,
                role = %role,
                changed_by = actor.id,
                "Member role changed"
            );
            Ok(Json(DataResponse { data: membership }))
        }
        MembershipChange::Rejected(reason) => Err(reason.into()),
        MembershipChange::NotFound | MembershipChange::Removed => {
            Err(membership_not_found(membership_id))
        }
    }
}

/// PUT /api/v1/masjids/{id}/members/{membership_id}/capabilities
///
/// Fields omitted from the body keep their stored value.
pub async fn update_capabilities(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((masjid_id, membership_id)): Path<(DbId, DbId)>,
    Json(input): Json<CapabilityOverrides>,
) -> AppResult<Json<DataResponse<Membership>>> {
    authorize(&state.pool, Some(auth), masjid_id, PermissionCheck::ManageUsers).await?;
    let target = find_target(&state, masjid_id, membership_id).await?;

    let caps = target.capabilities().with_overrides(&input);
    let membership =
        MembershipRepo::update_capabilities(&state.pool, masjid_id, membership_id, &caps)
            .await?
            .ok_or_else(|| membership_not_found(membership_id))?;

    Ok(Json(DataResponse { data: membership }))
}

/// DELETE /api/v1/masjids/{id}/members/{membership_id}
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((masjid_id, membership_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let target = find_target(&state, masjid_id, membership_id).await?;
    guard_not_self(auth.user_id, target.user_id, SelfAction::RemoveSelf)?;
    let actor = authorize(&state.pool, Some(auth), masjid_id, PermissionCheck::ManageUsers).await?;

    match MembershipRepo::remove(&state.pool, masjid_id, membership_id).await? {
        MembershipChange::Removed => {
            tracing::info!(masjid_id, membership_id, removed_by = actor.id, "Member removed");
            Ok(StatusCode::NO_CONTENT)
        }
        MembershipChange::Rejected(reason) => Err(reason.into()),
        MembershipChange::NotFound | MembershipChange::Updated(_) => {
            Err(membership_not_found(membership_id))
        }
    }
}

/// PUT /api/v1/me/default-membership/{membership_id}
pub async fn set_default_membership(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(membership_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Membership>>> {
    let user = load_actor(&state.pool, auth).await?;
    let membership = MembershipRepo::set_default(&state.pool, user.id, membership_id)
        .await?
        .ok_or_else(|| membership_not_found(membership_id))?;
    Ok(Json(DataResponse { data: membership }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a membership that must belong to an active `masjid_id`.
async fn find_target(state: &AppState, masjid_id: DbId, membership_id: DbId) -> AppResult<Membership> {
    find_active_masjid(&state.pool, masjid_id).await?;
    MembershipRepo::find_by_id(&state.pool, membership_id)
        .await?
        .filter(|m| m.masjid_id == masjid_id)
        .ok_or_else(|| membership_not_found(membership_id))
}

fn membership_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Membership",
        id,
    })
}
