//! Users as this service sees them: an id, a contact address and the two
//! flags authorization depends on. Credentials are held by the identity
//! service.

use masjid_core::permissions::ActorContext;
use masjid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    /// Deactivated users fail authentication even with a valid token.
    pub is_active: bool,
    pub is_super_admin: bool,
    pub created_at: Timestamp,
    #[serde(skip)]
    pub updated_at: Timestamp,
}

impl User {
    /// Authorization view of this user.
    pub fn actor(&self) -> ActorContext {
        ActorContext {
            user_id: self.id,
            is_super_admin: self.is_super_admin,
        }
    }
}

/// Provisioning input, used when the identity service first introduces a user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub display_name: String,
}
