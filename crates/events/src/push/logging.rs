//! Gateway that logs instead of sending.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{BatchReport, PushError, PushGateway, TokenOutcome};

/// Reports every token as delivered and logs the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingGateway;

#[async_trait]
impl PushGateway for LoggingGateway {
    async fn send_batch(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<BatchReport, PushError> {
        tracing::info!(
            tokens = tokens.len(),
            title,
            body_len = body.len(),
            data_keys = ?data.keys().collect::<Vec<_>>(),
            "Push delivery skipped (gateway not configured)"
        );
        Ok(BatchReport::from_outcomes(
            tokens.iter().map(TokenOutcome::sent).collect(),
        ))
    }
}
