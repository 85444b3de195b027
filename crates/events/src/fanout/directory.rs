//! Subscriber directory port: where the engine reads candidates and
//! preferences and writes token deactivations.

use async_trait::async_trait;
use masjid_core::preferences::PreferenceSet;
use masjid_core::recipient::Recipient;
use masjid_core::types::DbId;
use masjid_db::models::subscription::Subscription;
use masjid_db::repositories::{SettingsRepo, SubscriptionRepo};
use masjid_db::DbPool;

/// One deliverable subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub subscription_id: DbId,
    pub recipient: Recipient,
    pub token: String,
}

impl Candidate {
    /// `None` for rows with no token or a broken recipient pair.
    pub fn from_subscription(sub: Subscription) -> Option<Self> {
        let recipient = sub.recipient()?;
        Some(Self {
            subscription_id: sub.id,
            recipient,
            token: sub.fcm_token?,
        })
    }
}

/// Stored preference rows for a batch of recipients. Recipients without a
/// row are simply absent.
#[derive(Debug, Clone, Default)]
pub struct StoredPreferences {
    pub users: Vec<(DbId, PreferenceSet)>,
    pub devices: Vec<(String, PreferenceSet)>,
}

/// Data access needed by the fan-out engine.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// Active subscriptions with a non-blank token on `masjid_id`.
    async fn candidates(&self, masjid_id: DbId, limit: i64) -> Result<Vec<Candidate>, sqlx::Error>;

    /// Active subscriptions of exactly `recipient` on `masjid_id`.
    async fn recipient_candidates(
        &self,
        masjid_id: DbId,
        recipient: &Recipient,
        limit: i64,
    ) -> Result<Vec<Candidate>, sqlx::Error>;

    /// Active anonymous (device) subscriptions on `masjid_id`.
    async fn anonymous_candidates(
        &self,
        masjid_id: DbId,
        limit: i64,
    ) -> Result<Vec<Candidate>, sqlx::Error>;

    async fn preferences(
        &self,
        user_ids: &[DbId],
        device_ids: &[String],
    ) -> Result<StoredPreferences, sqlx::Error>;

    /// Deactivate every active subscription carrying one of `tokens`.
    /// Returns the number of rows changed.
    async fn deactivate_tokens(&self, tokens: &[String]) -> Result<u64, sqlx::Error>;
}

/// [`SubscriberDirectory`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgSubscriberDirectory {
    pool: DbPool,
}

impl PgSubscriberDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_candidates(rows: Vec<Subscription>) -> Vec<Candidate> {
    rows.into_iter().filter_map(Candidate::from_subscription).collect()
}

#[async_trait]
impl SubscriberDirectory for PgSubscriberDirectory {
    async fn candidates(&self, masjid_id: DbId, limit: i64) -> Result<Vec<Candidate>, sqlx::Error> {
        let rows = SubscriptionRepo::list_deliverable_for_masjid(&self.pool, masjid_id, limit).await?;
        Ok(into_candidates(rows))
    }

    async fn recipient_candidates(
        &self,
        masjid_id: DbId,
        recipient: &Recipient,
        limit: i64,
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        let rows =
            SubscriptionRepo::list_deliverable_for_recipient(&self.pool, masjid_id, recipient, limit)
                .await?;
        Ok(into_candidates(rows))
    }

    async fn anonymous_candidates(
        &self,
        masjid_id: DbId,
        limit: i64,
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        let rows = SubscriptionRepo::list_deliverable_anonymous(&self.pool, masjid_id, limit).await?;
        Ok(into_candidates(rows))
    }

    async fn preferences(
        &self,
        user_ids: &[DbId],
        device_ids: &[String],
    ) -> Result<StoredPreferences, sqlx::Error> {
        let users = SettingsRepo::preferences_for_users(&self.pool, user_ids).await?;
        let devices = SettingsRepo::preferences_for_devices(&self.pool, device_ids).await?;
        Ok(StoredPreferences { users, devices })
    }

    async fn deactivate_tokens(&self, tokens: &[String]) -> Result<u64, sqlx::Error> {
        SubscriptionRepo::deactivate_by_tokens(&self.pool, tokens).await
    }
}
