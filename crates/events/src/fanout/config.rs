//! Fan-out tuning knobs.

use std::time::Duration;

use crate::push::MAX_BATCH_SIZE;

/// Default cap on candidate subscriptions loaded per fan-out.
const DEFAULT_CANDIDATE_LIMIT: i64 = 1000;

/// Default timeout for candidate and preference queries, in seconds.
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;

/// Configuration for [`FanoutEngine`](super::FanoutEngine).
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Upper bound on subscriptions loaded per run.
    pub candidate_limit: i64,
    /// Tokens per gateway call. Never above [`MAX_BATCH_SIZE`].
    pub batch_size: usize,
    /// Bound on each candidate/preference query.
    pub query_timeout: Duration,
    /// When a reply targets an anonymous author whose device id matches no
    /// subscription, notify every anonymous subscriber of the masjid instead.
    pub reply_anonymous_fallback: bool,
}

impl FanoutConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                          | Default |
    /// |-----------------------------------|---------|
    /// | `FANOUT_CANDIDATE_LIMIT`          | `1000`  |
    /// | `FANOUT_BATCH_SIZE`               | `500`   |
    /// | `FANOUT_QUERY_TIMEOUT_SECS`       | `5`     |
    /// | `FANOUT_REPLY_ANONYMOUS_FALLBACK` | `true`  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            candidate_limit: std::env::var("FANOUT_CANDIDATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &i64| *n > 0)
                .unwrap_or(defaults.candidate_limit),
            batch_size: clamp_batch_size(
                std::env::var("FANOUT_BATCH_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.batch_size),
            ),
            query_timeout: std::env::var("FANOUT_QUERY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.query_timeout),
            reply_anonymous_fallback: std::env::var("FANOUT_REPLY_ANONYMOUS_FALLBACK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reply_anonymous_fallback),
        }
    }
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            batch_size: MAX_BATCH_SIZE,
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            reply_anonymous_fallback: true,
        }
    }
}

/// Keep the batch size within `1..=MAX_BATCH_SIZE`.
pub fn clamp_batch_size(size: usize) -> usize {
    size.clamp(1, MAX_BATCH_SIZE)
}
