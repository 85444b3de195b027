//! Push subscription model.

use masjid_core::recipient::Recipient;
use masjid_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `subscriptions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subscription {
    pub id: DbId,
    pub masjid_id: DbId,
    pub user_id: Option<DbId>,
    pub device_id: Option<String>,
    pub fcm_token: Option<String>,
    /// Deprecated; recipients receive every category and are filtered by settings.
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    pub fn recipient(&self) -> Option<Recipient> {
        Recipient::from_columns(self.user_id, self.device_id.as_deref())
    }
}

/// Result of [`SubscriptionRepo::subscribe`](crate::repositories::SubscriptionRepo::subscribe).
#[derive(Debug)]
pub enum SubscribeOutcome {
    Created(Subscription),
    /// An existing row was reactivated or had its token refreshed.
    Updated(Subscription),
    AlreadyActive,
}

/// Result of [`SubscriptionRepo::unsubscribe`](crate::repositories::SubscriptionRepo::unsubscribe).
#[derive(Debug, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Deactivated,
    AlreadyInactive,
    NotFound,
}
