//! Batch preference resolution for fan-out candidates.
//!
//! Candidates are partitioned by recipient kind and each partition is
//! loaded in one query. A recipient with no stored row resolves to
//! [`PreferenceSet::default`], which enables every category.

use std::collections::{HashMap, HashSet};

use masjid_core::preferences::PreferenceSet;
use masjid_core::recipient::Recipient;
use masjid_core::types::DbId;

use super::directory::{Candidate, StoredPreferences, SubscriberDirectory};

/// Resolves effective preferences for a candidate set.
pub struct PreferenceResolver;

impl PreferenceResolver {
    /// Load stored preferences for every distinct recipient in `candidates`.
    pub async fn resolve(
        directory: &dyn SubscriberDirectory,
        candidates: &[Candidate],
    ) -> Result<HashMap<Recipient, PreferenceSet>, sqlx::Error> {
        let (user_ids, device_ids) = partition(candidates);
        let stored = directory.preferences(&user_ids, &device_ids).await?;
        Ok(merge(candidates, stored))
    }
}

/// Distinct user ids and device ids, in first-seen order.
fn partition(candidates: &[Candidate]) -> (Vec<DbId>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut user_ids = Vec::new();
    let mut device_ids = Vec::new();
    for candidate in candidates {
        if !seen.insert(&candidate.recipient) {
            continue;
        }
        match &candidate.recipient {
            Recipient::User(id) => user_ids.push(*id),
            Recipient::Device(id) => device_ids.push(id.clone()),
        }
    }
    (user_ids, device_ids)
}

/// Every candidate's recipient mapped to its stored row, or the default.
fn merge(candidates: &[Candidate], stored: StoredPreferences) -> HashMap<Recipient, PreferenceSet> {
    let mut resolved: HashMap<Recipient, PreferenceSet> = candidates
        .iter()
        .map(|c| (c.recipient.clone(), PreferenceSet::default()))
        .collect();

    for (user_id, prefs) in stored.users {
        if let Some(slot) = resolved.get_mut(&Recipient::User(user_id)) {
            *slot = prefs;
        }
    }
    for (device_id, prefs) in stored.devices {
        if let Some(slot) = resolved.get_mut(&Recipient::Device(device_id)) {
            *slot = prefs;
        }
    }
    resolved
}
