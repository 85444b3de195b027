//! In-memory fakes for the fan-out ports.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use masjid_core::preferences::PreferenceSet;
use masjid_core::recipient::Recipient;
use masjid_core::types::DbId;
use masjid_events::fanout::{Candidate, StoredPreferences, SubscriberDirectory};
use masjid_events::push::{BatchReport, PushError, PushGateway, TokenOutcome};
use masjid_events::{FanoutConfig, FanoutEngine};

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeSubscription {
    pub id: DbId,
    pub masjid_id: DbId,
    pub recipient: Recipient,
    pub token: String,
    pub active: bool,
}

#[derive(Default)]
struct DirectoryState {
    subscriptions: Vec<FakeSubscription>,
    user_prefs: HashMap<DbId, PreferenceSet>,
    device_prefs: HashMap<String, PreferenceSet>,
    deactivate_calls: usize,
}

/// Subscriber directory held in memory.
#[derive(Default)]
pub struct FakeDirectory {
    state: Mutex<DirectoryState>,
    query_delay: Option<Duration>,
    fail_preferences: bool,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every candidate query by `delay`.
    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    /// Make the preference query fail.
    pub fn failing_preferences(mut self) -> Self {
        self.fail_preferences = true;
        self
    }

    pub fn subscribe(&self, masjid_id: DbId, recipient: Recipient, token: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.subscriptions.len() as DbId + 1;
        state.subscriptions.push(FakeSubscription {
            id,
            masjid_id,
            recipient,
            token: token.to_string(),
            active: true,
        });
        id
    }

    pub fn set_user_prefs(&self, user_id: DbId, prefs: PreferenceSet) {
        self.state.lock().unwrap().user_prefs.insert(user_id, prefs);
    }

    pub fn set_device_prefs(&self, device_id: &str, prefs: PreferenceSet) {
        self.state
            .lock()
            .unwrap()
            .device_prefs
            .insert(device_id.to_string(), prefs);
    }

    pub fn is_active(&self, subscription_id: DbId) -> bool {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .any(|s| s.id == subscription_id && s.active)
    }

    pub fn deactivate_calls(&self) -> usize {
        self.state.lock().unwrap().deactivate_calls
    }

    fn select(
        &self,
        masjid_id: DbId,
        limit: i64,
        pred: impl Fn(&FakeSubscription) -> bool,
    ) -> Vec<Candidate> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .filter(|s| s.masjid_id == masjid_id && s.active && !s.token.trim().is_empty())
            .filter(|s| pred(s))
            .take(limit as usize)
            .map(|s| Candidate {
                subscription_id: s.id,
                recipient: s.recipient.clone(),
                token: s.token.clone(),
            })
            .collect()
    }

    async fn delay(&self) {
        if let Some(d) = self.query_delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl SubscriberDirectory for FakeDirectory {
    async fn candidates(&self, masjid_id: DbId, limit: i64) -> Result<Vec<Candidate>, sqlx::Error> {
        self.delay().await;
        Ok(self.select(masjid_id, limit, |_| true))
    }

    async fn recipient_candidates(
        &self,
        masjid_id: DbId,
        recipient: &Recipient,
        limit: i64,
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        self.delay().await;
        Ok(self.select(masjid_id, limit, |s| &s.recipient == recipient))
    }

    async fn anonymous_candidates(
        &self,
        masjid_id: DbId,
        limit: i64,
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        self.delay().await;
        Ok(self.select(masjid_id, limit, |s| matches!(s.recipient, Recipient::Device(_))))
    }

    async fn preferences(
        &self,
        user_ids: &[DbId],
        device_ids: &[String],
    ) -> Result<StoredPreferences, sqlx::Error> {
        if self.fail_preferences {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let state = self.state.lock().unwrap();
        Ok(StoredPreferences {
            users: user_ids
                .iter()
                .filter_map(|id| state.user_prefs.get(id).map(|p| (*id, *p)))
                .collect(),
            devices: device_ids
                .iter()
                .filter_map(|id| state.device_prefs.get(id).map(|p| (id.clone(), *p)))
                .collect(),
        })
    }

    async fn deactivate_tokens(&self, tokens: &[String]) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.deactivate_calls += 1;
        let mut changed = 0;
        for sub in state.subscriptions.iter_mut() {
            if sub.active && tokens.contains(&sub.token) {
                sub.active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// One recorded `send_batch` call.
#[derive(Debug, Clone)]
pub struct SentBatch {
    pub tokens: Vec<String>,
    pub title: String,
    pub data: BTreeMap<String, String>,
}

/// Gateway that records calls and fails configured tokens.
#[derive(Default)]
pub struct RecordingGateway {
    batches: Mutex<Vec<SentBatch>>,
    failures: HashMap<String, String>,
    unavailable: bool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with a gateway-level error.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn failing_token(mut self, token: &str, code: &str) -> Self {
        self.failures.insert(token.to_string(), code.to_string());
        self
    }

    pub fn batches(&self) -> Vec<SentBatch> {
        self.batches.lock().unwrap().clone()
    }

    /// Every token sent, across batches, in order.
    pub fn sent_tokens(&self) -> Vec<String> {
        self.batches()
            .into_iter()
            .flat_map(|b| b.tokens)
            .collect()
    }
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        _body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<BatchReport, PushError> {
        self.batches.lock().unwrap().push(SentBatch {
            tokens: tokens.to_vec(),
            title: title.to_string(),
            data: data.clone(),
        });
        if self.unavailable {
            return Err(PushError::Unavailable("gateway down".into()));
        }
        Ok(BatchReport::from_outcomes(
            tokens
                .iter()
                .map(|t| match self.failures.get(t) {
                    Some(code) => TokenOutcome::failed(t.as_str(), code.as_str()),
                    None => TokenOutcome::sent(t.as_str()),
                })
                .collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub fn engine(
    directory: &Arc<FakeDirectory>,
    gateway: &Arc<RecordingGateway>,
    config: FanoutConfig,
) -> FanoutEngine {
    FanoutEngine::new(directory.clone(), gateway.clone(), config)
}
