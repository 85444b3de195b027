//! Push gateway port and its implementations.
//!
//! The fan-out engine only sees [`PushGateway`]. [`FcmGateway`] talks to the
//! Firebase Cloud Messaging HTTP v1 API; [`LoggingGateway`] is used when FCM
//! is not configured and in local development.

pub mod fcm;
pub mod logging;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

pub use fcm::{FcmConfig, FcmGateway};
pub use logging::LoggingGateway;

/// Maximum number of tokens per gateway call.
pub const MAX_BATCH_SIZE: usize = 500;

/// The token is malformed.
pub const ERROR_INVALID_REGISTRATION_TOKEN: &str = "invalid-registration-token";

/// The token was valid once but the app instance is gone.
pub const ERROR_TOKEN_NOT_REGISTERED: &str = "registration-token-not-registered";

/// Error codes that mean the token will never work again.
pub const PERMANENT_TOKEN_ERRORS: &[&str] =
    &[ERROR_INVALID_REGISTRATION_TOKEN, ERROR_TOKEN_NOT_REGISTERED];

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How a single failed delivery should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryFailureKind {
    /// The token is dead; its subscriptions get deactivated.
    TokenInvalid,
    /// Anything else. Logged only.
    Transient,
}

impl DeliveryFailureKind {
    pub fn classify(error_code: Option<&str>) -> Self {
        match error_code {
            Some(code) if PERMANENT_TOKEN_ERRORS.contains(&code) => Self::TokenInvalid,
            _ => Self::Transient,
        }
    }
}

/// Outcome for one token in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOutcome {
    pub token: String,
    pub success: bool,
    pub error_code: Option<String>,
}

impl TokenOutcome {
    pub fn sent(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            success: true,
            error_code: None,
        }
    }

    pub fn failed(token: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            success: false,
            error_code: Some(error_code.into()),
        }
    }

    /// `None` for successful sends.
    pub fn failure_kind(&self) -> Option<DeliveryFailureKind> {
        if self.success {
            None
        } else {
            Some(DeliveryFailureKind::classify(self.error_code.as_deref()))
        }
    }
}

/// Per-batch delivery report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub outcomes: Vec<TokenOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<TokenOutcome>) -> Self {
        let successful = outcomes.iter().filter(|o| o.success).count();
        Self {
            total: outcomes.len(),
            successful,
            failed: outcomes.len() - successful,
            outcomes,
        }
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// A failure of the whole batch call, as opposed to a per-token failure.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway rejected our credentials or project.
    #[error("Push gateway returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Push gateway unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Sends one message to a batch of device tokens.
///
/// Implementations must return one [`TokenOutcome`] per input token. Payload
/// values are strings because the wire format allows nothing else.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<BatchReport, PushError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_two_token_codes_are_permanent() {
        assert_eq!(
            DeliveryFailureKind::classify(Some(ERROR_INVALID_REGISTRATION_TOKEN)),
            DeliveryFailureKind::TokenInvalid
        );
        assert_eq!(
            DeliveryFailureKind::classify(Some(ERROR_TOKEN_NOT_REGISTERED)),
            DeliveryFailureKind::TokenInvalid
        );
        assert_eq!(
            DeliveryFailureKind::classify(Some("quota-exceeded")),
            DeliveryFailureKind::Transient
        );
        assert_eq!(DeliveryFailureKind::classify(None), DeliveryFailureKind::Transient);
    }

    #[test]
    fn batch_report_counts_outcomes() {
        let report = BatchReport::from_outcomes(vec![
            TokenOutcome::sent("a"),
            TokenOutcome::failed("b", ERROR_TOKEN_NOT_REGISTERED),
            TokenOutcome::sent("c"),
        ]);
        assert_eq!(report.total, 3);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.outcomes[0].failure_kind(), None);
        assert_eq!(
            report.outcomes[1].failure_kind(),
            Some(DeliveryFailureKind::TokenInvalid)
        );
    }
}
