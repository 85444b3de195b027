//! The fan-out engine.
//!
//! One run proceeds strictly in order: load candidates, resolve
//! preferences, filter by category, collect tokens, send in batches,
//! deactivate dead tokens. Candidate and preference queries are bounded by
//! [`FanoutConfig::query_timeout`]. Gateway and reconciliation failures are
//! logged and folded into the report; only query failures abort the run.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use masjid_core::categories::PreferenceCategory;
use masjid_core::recipient::Recipient;
use masjid_core::types::DbId;
use serde::Serialize;

use super::config::{clamp_batch_size, FanoutConfig};
use super::directory::{Candidate, SubscriberDirectory};
use super::preferences::PreferenceResolver;
use crate::push::{DeliveryFailureKind, PushGateway};

// ---------------------------------------------------------------------------
// Message and report
// ---------------------------------------------------------------------------

/// What to send, and to which masjid's subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutMessage {
    pub masjid_id: DbId,
    pub category: PreferenceCategory,
    pub title: String,
    pub body: String,
    /// String-only payload delivered alongside the notification.
    pub data: BTreeMap<String, String>,
}

impl FanoutMessage {
    pub fn new(
        masjid_id: DbId,
        category: PreferenceCategory,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            masjid_id,
            category,
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }

    /// Merge the entries of a JSON object, coercing every value to a string.
    /// Non-object values are ignored.
    pub fn with_metadata(mut self, metadata: &serde_json::Value) -> Self {
        if let Some(map) = metadata.as_object() {
            for (key, value) in map {
                self.data.insert(key.clone(), coerce_to_string(value));
            }
        }
        self
    }
}

/// Push payloads only carry strings.
pub fn coerce_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Counters for one fan-out run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    /// Unique tokens handed to the gateway.
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    /// Subscription rows deactivated by reconciliation.
    pub deactivated: u64,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// A failure that aborted a fan-out run before delivery.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Timed out loading {stage} after {after:?}")]
    Timeout { stage: &'static str, after: Duration },
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Resolves recipients and delivers push notifications.
pub struct FanoutEngine {
    directory: Arc<dyn SubscriberDirectory>,
    gateway: Arc<dyn PushGateway>,
    config: FanoutConfig,
}

impl FanoutEngine {
    pub fn new(
        directory: Arc<dyn SubscriberDirectory>,
        gateway: Arc<dyn PushGateway>,
        mut config: FanoutConfig,
    ) -> Self {
        config.batch_size = clamp_batch_size(config.batch_size);
        Self {
            directory,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Notify every eligible subscriber of `message.masjid_id`.
    pub async fn broadcast(&self, message: &FanoutMessage) -> Result<FanoutReport, FanoutError> {
        let candidates = self
            .bounded(
                "candidates",
                self.directory
                    .candidates(message.masjid_id, self.config.candidate_limit),
            )
            .await?;
        self.deliver(candidates, message).await
    }

    /// Notify the author of a question.
    ///
    /// Users are matched by id. Anonymous authors are matched by exact device
    /// id; when nothing matches and the fallback is enabled, every anonymous
    /// subscriber of the masjid is notified instead.
    pub async fn notify_question_author(
        &self,
        author: &Recipient,
        message: &FanoutMessage,
    ) -> Result<FanoutReport, FanoutError> {
        let limit = self.config.candidate_limit;
        let mut candidates = self
            .bounded(
                "recipient candidates",
                self.directory
                    .recipient_candidates(message.masjid_id, author, limit),
            )
            .await?;

        if candidates.is_empty()
            && matches!(author, Recipient::Device(_))
            && self.config.reply_anonymous_fallback
        {
            tracing::info!(
                masjid_id = message.masjid_id,
                "No subscription matches the author's device, notifying all anonymous subscribers"
            );
            candidates = self
                .bounded(
                    "anonymous candidates",
                    self.directory.anonymous_candidates(message.masjid_id, limit),
                )
                .await?;
        }

        self.deliver(candidates, message).await
    }

    async fn bounded<T, F>(&self, stage: &'static str, query: F) -> Result<T, FanoutError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let after = self.config.query_timeout;
        match tokio::time::timeout(after, query).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FanoutError::Timeout { stage, after }),
        }
    }

    async fn deliver(
        &self,
        candidates: Vec<Candidate>,
        message: &FanoutMessage,
    ) -> Result<FanoutReport, FanoutError> {
        if candidates.is_empty() {
            return Ok(FanoutReport::default());
        }

        let preferences = self
            .bounded(
                "preferences",
                PreferenceResolver::resolve(self.directory.as_ref(), &candidates),
            )
            .await?;

        let eligible = candidates.iter().filter(|c| {
            preferences
                .get(&c.recipient)
                .map_or(true, |p| p.is_enabled(message.category))
        });
        let tokens = collect_tokens(eligible);

        let mut report = FanoutReport {
            total: tokens.len(),
            ..Default::default()
        };
        let mut dead_tokens = Vec::new();

        for batch in tokens.chunks(self.config.batch_size) {
            match self
                .gateway
                .send_batch(batch, &message.title, &message.body, &message.data)
                .await
            {
                Ok(result) => {
                    report.sent += result.successful;
                    report.failed += result.failed;
                    for outcome in result.outcomes {
                        match outcome.failure_kind() {
                            Some(DeliveryFailureKind::TokenInvalid) => dead_tokens.push(outcome.token),
                            Some(DeliveryFailureKind::Transient) => {
                                tracing::warn!(
                                    masjid_id = message.masjid_id,
                                    category = %message.category,
                                    error_code = outcome.error_code.as_deref().unwrap_or(""),
                                    "Push delivery failed"
                                );
                            }
                            None => {}
                        }
                    }
                }
                Err(e) => {
                    report.failed += batch.len();
                    tracing::warn!(
                        masjid_id = message.masjid_id,
                        category = %message.category,
                        batch_size = batch.len(),
                        error = %e,
                        "Push batch failed"
                    );
                }
            }
        }

        if !dead_tokens.is_empty() {
            match self.directory.deactivate_tokens(&dead_tokens).await {
                Ok(rows) => report.deactivated = rows,
                Err(e) => {
                    tracing::error!(
                        masjid_id = message.masjid_id,
                        tokens = dead_tokens.len(),
                        error = %e,
                        "Failed to deactivate invalid push tokens"
                    );
                }
            }
        }

        Ok(report)
    }
}

/// Trimmed, non-empty, de-duplicated tokens in candidate order.
pub fn collect_tokens<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|c| c.token.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(*t))
        .map(str::to_string)
        .collect()
}
