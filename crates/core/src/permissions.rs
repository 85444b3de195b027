//! Permission resolution for masjid-scoped actions.
//!
//! [`resolve`] is pure: callers load the actor and every membership row the
//! actor holds on the target masjid, then ask whether a [`PermissionCheck`]
//! passes. Evaluation order:
//!
//! 1. Super-admins pass every check on every masjid.
//! 2. Anonymous actors and actors with no membership rows are denied.
//! 3. Coarse checks (member / imam / admin / imam-or-admin) look at roles only.
//! 4. `ManageMasjid` and `ManageUsers` reduce to "is admin".
//! 5. Capability checks require a row whose stored bit is set; the role
//!    label never implies a capability here.
//!
//! Self-modification guards ([`guard_not_self`]) and the last-admin rule
//! ([`ensure_not_last_admin`]) are separate because they compare identities
//! and counts rather than grants.

use std::fmt;

use crate::capabilities::{Capabilities, Capability};
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The acting user as far as authorization is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: DbId,
    pub is_super_admin: bool,
}

/// One membership row held by the actor on the masjid being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipGrant {
    pub role: Role,
    pub capabilities: Capabilities,
}

/// What the caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCheck {
    Member,
    Imam,
    Admin,
    ImamOrAdmin,
    ManageMasjid,
    ManageUsers,
    Capability(Capability),
}

impl fmt::Display for PermissionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionCheck::Member => f.write_str("member"),
            PermissionCheck::Imam => f.write_str("imam"),
            PermissionCheck::Admin => f.write_str("admin"),
            PermissionCheck::ImamOrAdmin => f.write_str("imam_or_admin"),
            PermissionCheck::ManageMasjid => f.write_str("manage_masjid"),
            PermissionCheck::ManageUsers => f.write_str("manage_users"),
            PermissionCheck::Capability(c) => f.write_str(c.as_str()),
        }
    }
}

/// Decide whether `actor` passes `check` given its membership rows on one masjid.
pub fn resolve(
    actor: Option<&ActorContext>,
    grants: &[MembershipGrant],
    check: PermissionCheck,
) -> Result<(), CoreError> {
    let Some(actor) = actor else {
        return Err(CoreError::forbidden("Authentication required"));
    };

    if actor.is_super_admin {
        return Ok(());
    }

    if grants.is_empty() {
        return Err(CoreError::forbidden("You are not a member of this masjid"));
    }

    let has_role = |role: Role| grants.iter().any(|g| g.role == role);

    let allowed = match check {
        PermissionCheck::Member => true,
        PermissionCheck::Imam => has_role(Role::Imam),
        PermissionCheck::Admin | PermissionCheck::ManageMasjid | PermissionCheck::ManageUsers => {
            has_role(Role::Admin)
        }
        PermissionCheck::ImamOrAdmin => has_role(Role::Imam) || has_role(Role::Admin),
        PermissionCheck::Capability(capability) => {
            grants.iter().any(|g| g.capabilities.has(capability))
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(CoreError::forbidden(denial_reason(check)))
    }
}

fn denial_reason(check: PermissionCheck) -> String {
    match check {
        PermissionCheck::Member => "You are not a member of this masjid".to_string(),
        PermissionCheck::Imam => "Imam role required for this masjid".to_string(),
        PermissionCheck::Admin => "Admin role required for this masjid".to_string(),
        PermissionCheck::ImamOrAdmin => "Imam or admin role required for this masjid".to_string(),
        PermissionCheck::ManageMasjid => "Only masjid admins can manage this masjid".to_string(),
        PermissionCheck::ManageUsers => "Only masjid admins can manage members".to_string(),
        PermissionCheck::Capability(c) => format!("Missing permission: {c}"),
    }
}

/// Actions an actor may never perform on their own account or membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfAction {
    ChangeOwnRole,
    RemoveSelf,
    ChangeOwnSuperAdmin,
    DeactivateSelf,
}

/// Reject `action` when the actor targets themselves.
///
/// Runs before any capability check; super-admins are not exempt.
pub fn guard_not_self(
    actor_id: DbId,
    target_user_id: DbId,
    action: SelfAction,
) -> Result<(), CoreError> {
    if actor_id != target_user_id {
        return Ok(());
    }
    let reason = match action {
        SelfAction::ChangeOwnRole => "You cannot change your own role",
        SelfAction::RemoveSelf => "You cannot remove yourself from a masjid",
        SelfAction::ChangeOwnSuperAdmin => "You cannot change your own super-admin status",
        SelfAction::DeactivateSelf => "You cannot deactivate your own account",
    };
    Err(CoreError::forbidden(reason))
}

/// Reject a demotion or removal that would leave the masjid without an admin.
///
/// `admin_count` must be read inside the same transaction as the mutation.
pub fn ensure_not_last_admin(admin_count: i64) -> Result<(), CoreError> {
    if admin_count <= 1 {
        return Err(CoreError::forbidden(
            "Cannot remove or demote the last admin of a masjid",
        ));
    }
    Ok(())
}
