//! Repository for the `subscriptions` table.

use masjid_core::recipient::Recipient;
use masjid_core::types::DbId;
use sqlx::PgPool;

use crate::models::subscription::{SubscribeOutcome, Subscription, UnsubscribeOutcome};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, masjid_id, user_id, device_id, fcm_token, category, is_active, \
                        created_at, updated_at";

/// Predicate matching rows that can receive a push right now.
const DELIVERABLE: &str = "is_active = true AND fcm_token IS NOT NULL AND btrim(fcm_token) <> ''";

/// Provides subscription registration and fan-out candidate queries.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Register (or refresh) `recipient` on `masjid_id` with `fcm_token`.
    ///
    /// One row exists per (masjid, recipient). An inactive row is reactivated
    /// and its token replaced; an active row with a different token gets the
    /// new token. An active row with the same token is left alone.
    pub async fn subscribe(
        pool: &PgPool,
        masjid_id: DbId,
        recipient: &Recipient,
        fcm_token: &str,
    ) -> Result<SubscribeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE masjid_id = $1
               AND user_id IS NOT DISTINCT FROM $2
               AND device_id IS NOT DISTINCT FROM $3
             FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, Subscription>(&query)
            .bind(masjid_id)
            .bind(recipient.user_id())
            .bind(recipient.device_id())
            .fetch_optional(&mut *tx)
            .await?;

        let outcome = match existing {
            Some(row) if row.is_active && row.fcm_token.as_deref() == Some(fcm_token) => {
                SubscribeOutcome::AlreadyActive
            }
            Some(row) => {
                let query = format!(
                    "UPDATE subscriptions SET fcm_token = $2, is_active = true, updated_at = NOW()
                     WHERE id = $1
                     RETURNING {COLUMNS}"
                );
                let updated = sqlx::query_as::<_, Subscription>(&query)
                    .bind(row.id)
                    .bind(fcm_token)
                    .fetch_one(&mut *tx)
                    .await?;
                SubscribeOutcome::Updated(updated)
            }
            None => {
                let query = format!(
                    "INSERT INTO subscriptions (masjid_id, user_id, device_id, fcm_token)
                     VALUES ($1, $2, $3, $4)
                     RETURNING {COLUMNS}"
                );
                let created = sqlx::query_as::<_, Subscription>(&query)
                    .bind(masjid_id)
                    .bind(recipient.user_id())
                    .bind(recipient.device_id())
                    .bind(fcm_token)
                    .fetch_one(&mut *tx)
                    .await?;
                SubscribeOutcome::Created(created)
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Deactivate the (masjid, recipient) subscription.
    pub async fn unsubscribe(
        pool: &PgPool,
        masjid_id: DbId,
        recipient: &Recipient,
    ) -> Result<UnsubscribeOutcome, sqlx::Error> {
        let row: Option<(DbId, bool)> = sqlx::query_as(
            "SELECT id, is_active FROM subscriptions
             WHERE masjid_id = $1
               AND user_id IS NOT DISTINCT FROM $2
               AND device_id IS NOT DISTINCT FROM $3",
        )
        .bind(masjid_id)
        .bind(recipient.user_id())
        .bind(recipient.device_id())
        .fetch_optional(pool)
        .await?;

        let Some((id, _)) = row else {
            return Ok(UnsubscribeOutcome::NotFound);
        };

        let result = sqlx::query(
            "UPDATE subscriptions SET is_active = false, updated_at = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(UnsubscribeOutcome::Deactivated)
        } else {
            Ok(UnsubscribeOutcome::AlreadyInactive)
        }
    }

    /// Every subscription row (active or not) belonging to `recipient`.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient: &Recipient,
    ) -> Result<Vec<Subscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE user_id IS NOT DISTINCT FROM $1
               AND device_id IS NOT DISTINCT FROM $2
             ORDER BY masjid_id"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(recipient.user_id())
            .bind(recipient.device_id())
            .fetch_all(pool)
            .await
    }

    /// Deliverable subscriptions of a masjid, oldest first, capped at `limit`.
    pub async fn list_deliverable_for_masjid(
        pool: &PgPool,
        masjid_id: DbId,
        limit: i64,
    ) -> Result<Vec<Subscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE masjid_id = $1 AND {DELIVERABLE}
             ORDER BY id
             LIMIT $2"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(masjid_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Deliverable subscriptions of one recipient on a masjid.
    pub async fn list_deliverable_for_recipient(
        pool: &PgPool,
        masjid_id: DbId,
        recipient: &Recipient,
        limit: i64,
    ) -> Result<Vec<Subscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE masjid_id = $1
               AND user_id IS NOT DISTINCT FROM $2
               AND device_id IS NOT DISTINCT FROM $3
               AND {DELIVERABLE}
             ORDER BY id
             LIMIT $4"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(masjid_id)
            .bind(recipient.user_id())
            .bind(recipient.device_id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Deliverable anonymous (device) subscriptions of a masjid.
    pub async fn list_deliverable_anonymous(
        pool: &PgPool,
        masjid_id: DbId,
        limit: i64,
    ) -> Result<Vec<Subscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM subscriptions
             WHERE masjid_id = $1 AND device_id IS NOT NULL AND {DELIVERABLE}
             ORDER BY id
             LIMIT $2"
        );
        sqlx::query_as::<_, Subscription>(&query)
            .bind(masjid_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Deactivate every active row carrying one of `tokens`, across masjids.
    ///
    /// Already-inactive rows are not touched, so repeating the call with the
    /// same tokens returns 0.
    pub async fn deactivate_by_tokens(pool: &PgPool, tokens: &[String]) -> Result<u64, sqlx::Error> {
        if tokens.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE subscriptions SET is_active = false, updated_at = NOW()
             WHERE fcm_token = ANY($1) AND is_active = true",
        )
        .bind(tokens)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
