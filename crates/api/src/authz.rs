//! Permission guards for masjid-scoped handlers.
//!
//! Loads what [`masjid_core::permissions::resolve`] needs (the actor row and
//! every membership the actor holds on the masjid) and maps its decision
//! into an [`AppError`]. Not-found checks on the masjid run first so a
//! missing masjid is a 404, never a 403.

use masjid_core::error::CoreError;
use masjid_core::permissions::{resolve, MembershipGrant, PermissionCheck};
use masjid_core::types::DbId;
use masjid_db::models::masjid::Masjid;
use masjid_db::models::user::User;
use masjid_db::repositories::{MasjidRepo, MembershipRepo, UserRepo};
use masjid_db::DbPool;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Load the calling user, rejecting deleted or deactivated accounts.
pub async fn load_actor(pool: &DbPool, auth: AuthUser) -> AppResult<User> {
    let user = UserRepo::find_by_id(pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("Account no longer exists".into()))?;
    if !user.is_active {
        return Err(CoreError::Unauthorized("Account is deactivated".into()).into());
    }
    Ok(user)
}

/// Load an active masjid or fail with not-found.
pub async fn find_active_masjid(pool: &DbPool, masjid_id: DbId) -> AppResult<Masjid> {
    MasjidRepo::find_by_id(pool, masjid_id)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Masjid",
                id: masjid_id,
            }
            .into()
        })
}

/// Check that `auth` may perform `check` on `masjid_id`.
///
/// Anonymous callers (`None`) are always denied with a forbidden result.
/// Returns the loaded actor so handlers need not query it again.
pub async fn authorize(
    pool: &DbPool,
    auth: Option<AuthUser>,
    masjid_id: DbId,
    check: PermissionCheck,
) -> AppResult<User> {
    find_active_masjid(pool, masjid_id).await?;

    let Some(auth) = auth else {
        return Err(CoreError::forbidden("Authentication required").into());
    };

    let user = load_actor(pool, auth).await?;
    let grants: Vec<MembershipGrant> =
        MembershipRepo::list_for_user_in_masjid(pool, user.id, masjid_id)
            .await?
            .iter()
            .map(|m| m.grant())
            .collect();

    if let Err(denied) = resolve(Some(&user.actor()), &grants, check) {
        tracing::debug!(
            user_id = user.id,
            masjid_id,
            check = %check,
            "Permission denied"
        );
        return Err(denied.into());
    }
    Ok(user)
}

/// Require the global super-admin flag.
pub async fn require_super_admin(pool: &DbPool, auth: AuthUser) -> AppResult<User> {
    let user = load_actor(pool, auth).await?;
    if !user.is_super_admin {
        return Err(CoreError::forbidden("Super-admin access required").into());
    }
    Ok(user)
}
