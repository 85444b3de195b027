//! Membership (user x masjid x role) model and DTOs.

use masjid_core::capabilities::Capabilities;
use masjid_core::error::CoreError;
use masjid_core::permissions::MembershipGrant;
use masjid_core::roles::Role;
use masjid_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `masjid_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Membership {
    pub id: DbId,
    pub user_id: DbId,
    pub masjid_id: DbId,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub can_view_complaints: bool,
    pub can_answer_complaints: bool,
    pub can_view_questions: bool,
    pub can_answer_questions: bool,
    pub can_change_prayer_times: bool,
    pub can_create_events: bool,
    pub can_create_notifications: bool,
    pub is_default: bool,
    pub assigned_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Membership {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_view_complaints: self.can_view_complaints,
            can_answer_complaints: self.can_answer_complaints,
            can_view_questions: self.can_view_questions,
            can_answer_questions: self.can_answer_questions,
            can_change_prayer_times: self.can_change_prayer_times,
            can_create_events: self.can_create_events,
            can_create_notifications: self.can_create_notifications,
        }
    }

    pub fn grant(&self) -> MembershipGrant {
        MembershipGrant {
            role: self.role,
            capabilities: self.capabilities(),
        }
    }
}

/// DTO for inserting a membership. Capability values are mandatory.
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub user_id: DbId,
    pub masjid_id: DbId,
    pub role: Role,
    pub capabilities: Capabilities,
    pub assigned_by: Option<DbId>,
}

impl NewMembership {
    /// A membership seeded with the role's default capabilities.
    pub fn with_role_defaults(
        user_id: DbId,
        masjid_id: DbId,
        role: Role,
        assigned_by: Option<DbId>,
    ) -> Self {
        Self {
            user_id,
            masjid_id,
            role,
            capabilities: Capabilities::defaults_for(role),
            assigned_by,
        }
    }
}

/// Outcome of a transactional membership mutation.
#[derive(Debug)]
pub enum MembershipChange {
    Updated(Membership),
    Removed,
    NotFound,
    /// The mutation was refused (last admin, role already held, ...).
    Rejected(CoreError),
}
