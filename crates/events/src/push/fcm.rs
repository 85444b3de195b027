//! Firebase Cloud Messaging (HTTP v1) gateway.
//!
//! FCM v1 accepts one message per request, so a batch is sent as concurrent
//! single-token requests bounded by [`FcmConfig::concurrency`]. FCM error
//! statuses are mapped onto the gateway's error-code vocabulary so the
//! fan-out engine can tell dead tokens from transient failures.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;

use super::{
    BatchReport, PushError, PushGateway, TokenOutcome, ERROR_INVALID_REGISTRATION_TOKEN,
    ERROR_TOKEN_NOT_REGISTERED,
};

/// Default FCM API origin.
const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com";

/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default number of in-flight requests per batch.
const DEFAULT_CONCURRENCY: usize = 16;

/// Error code used when the request never produced an FCM response.
const ERROR_UNAVAILABLE: &str = "unavailable";

// ---------------------------------------------------------------------------
// FcmConfig
// ---------------------------------------------------------------------------

/// Configuration for [`FcmGateway`].
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    /// OAuth2 bearer token for the FCM service account.
    pub access_token: String,
    pub endpoint: String,
    pub request_timeout: Duration,
    pub concurrency: usize,
}

impl FcmConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless both `FCM_PROJECT_ID` and `FCM_ACCESS_TOKEN` are
    /// set, signalling that pushes should go to the logging gateway.
    ///
    /// | Variable                   | Required | Default                      |
    /// |----------------------------|----------|------------------------------|
    /// | `FCM_PROJECT_ID`           | yes      |                              |
    /// | `FCM_ACCESS_TOKEN`         | yes      |                              |
    /// | `FCM_ENDPOINT`             | no       | `https://fcm.googleapis.com` |
    /// | `FCM_REQUEST_TIMEOUT_SECS` | no       | `10`                         |
    /// | `FCM_CONCURRENCY`          | no       | `16`                         |
    pub fn from_env() -> Option<Self> {
        let project_id = std::env::var("FCM_PROJECT_ID").ok()?;
        let access_token = std::env::var("FCM_ACCESS_TOKEN").ok()?;
        Some(Self {
            project_id,
            access_token,
            endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            request_timeout: Duration::from_secs(
                std::env::var("FCM_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            concurrency: std::env::var("FCM_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_CONCURRENCY),
        })
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct FcmErrorEnvelope {
    #[serde(default)]
    error: FcmErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct FcmErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct FcmErrorDetail {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// Map an FCM v1 error response onto a gateway error code.
fn error_code_for(body: &FcmErrorBody) -> String {
    let fcm_code = body
        .details
        .iter()
        .find_map(|d| d.error_code.as_deref())
        .unwrap_or(body.status.as_str());

    match fcm_code {
        "UNREGISTERED" => ERROR_TOKEN_NOT_REGISTERED.to_string(),
        // Without an FcmError detail this is a wrong project or endpoint,
        // not a dead token.
        "NOT_FOUND" | "" => ERROR_UNAVAILABLE.to_string(),
        "INVALID_ARGUMENT" if body.message.to_ascii_lowercase().contains("registration token") => {
            ERROR_INVALID_REGISTRATION_TOKEN.to_string()
        }
        other => other.to_ascii_lowercase().replace('_', "-"),
    }
}

// ---------------------------------------------------------------------------
// FcmGateway
// ---------------------------------------------------------------------------

/// Sends push messages through FCM HTTP v1.
pub struct FcmGateway {
    client: reqwest::Client,
    config: FcmConfig,
    url: String,
}

impl FcmGateway {
    pub fn new(config: FcmConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let url = config.send_url();
        Ok(Self {
            client,
            config,
            url,
        })
    }

    async fn send_one(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<TokenOutcome, PushError> {
        let payload = serde_json::json!({
            "message": {
                "token": token,
                "notification": { "title": title, "body": body },
                "data": data,
            }
        });

        let response = match self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "FCM request failed");
                return Ok(TokenOutcome::failed(token, ERROR_UNAVAILABLE));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(TokenOutcome::sent(token));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PushError::HttpStatus(status.as_u16()));
        }

        let envelope = response
            .json::<FcmErrorEnvelope>()
            .await
            .unwrap_or_default();
        Ok(TokenOutcome::failed(token, error_code_for(&envelope.error)))
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<BatchReport, PushError> {
        let sends: Vec<_> = tokens
            .iter()
            .map(|token| self.send_one(token, title, body, data))
            .collect();
        let results: Vec<Result<TokenOutcome, PushError>> = stream::iter(sends)
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            // Credential failures affect every token; surface them once.
            outcomes.push(result?);
        }
        Ok(BatchReport::from_outcomes(outcomes))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::DeliveryFailureKind;

    fn body(json: serde_json::Value) -> FcmErrorBody {
        serde_json::from_value::<FcmErrorEnvelope>(json).unwrap().error
    }

    #[test]
    fn unregistered_maps_to_not_registered() {
        let b = body(serde_json::json!({
            "error": {
                "code": 404,
                "status": "NOT_FOUND",
                "message": "Requested entity was not found.",
                "details": [{
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "UNREGISTERED"
                }]
            }
        }));
        assert_eq!(error_code_for(&b), ERROR_TOKEN_NOT_REGISTERED);
    }

    #[test]
    fn bare_not_found_status_is_transient() {
        let b = body(serde_json::json!({
            "error": {
                "code": 404,
                "status": "NOT_FOUND",
                "message": "Requested entity was not found."
            }
        }));
        assert_eq!(error_code_for(&b), ERROR_UNAVAILABLE);
        assert_eq!(
            TokenOutcome::failed("tok", error_code_for(&b)).failure_kind(),
            Some(DeliveryFailureKind::Transient)
        );
    }

    #[test]
    fn bad_token_argument_maps_to_invalid_token() {
        let b = body(serde_json::json!({
            "error": {
                "status": "INVALID_ARGUMENT",
                "message": "The registration token is not a valid FCM registration token"
            }
        }));
        assert_eq!(error_code_for(&b), ERROR_INVALID_REGISTRATION_TOKEN);
    }

    #[test]
    fn other_invalid_argument_is_not_a_token_error() {
        let b = body(serde_json::json!({
            "error": { "status": "INVALID_ARGUMENT", "message": "data must only contain string values" }
        }));
        assert_eq!(error_code_for(&b), "invalid-argument");
    }

    #[test]
    fn quota_errors_are_kebab_cased() {
        let b = body(serde_json::json!({
            "error": { "status": "RESOURCE_EXHAUSTED", "details": [{ "errorCode": "QUOTA_EXCEEDED" }] }
        }));
        assert_eq!(error_code_for(&b), "quota-exceeded");
    }

    #[test]
    fn empty_body_is_unavailable() {
        assert_eq!(error_code_for(&FcmErrorBody::default()), ERROR_UNAVAILABLE);
    }

    #[tokio::test]
    async fn empty_batch_sends_nothing() {
        let gateway = FcmGateway::new(FcmConfig {
            project_id: "masjid-prod".into(),
            access_token: "t".into(),
            endpoint: "http://127.0.0.1:9".into(),
            request_timeout: Duration::from_secs(1),
            concurrency: 4,
        })
        .unwrap();

        let report = gateway
            .send_batch(&[], "Title", "Body", &BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn send_url_trims_trailing_slash() {
        let config = FcmConfig {
            project_id: "masjid-prod".into(),
            access_token: "t".into(),
            endpoint: "https://fcm.example.com/".into(),
            request_timeout: Duration::from_secs(1),
            concurrency: 1,
        };
        assert_eq!(
            config.send_url(),
            "https://fcm.example.com/v1/projects/masjid-prod/messages:send"
        );
    }
}
