//! NATS message producer for verdicts and failures

use crate::error::ErrorResponse;
use anyhow::Result;
use async_nats::Client;
use serde::Serialize;
use tracing::debug;

/// Producer for publishing scoring results to NATS
#[derive(Clone)]
pub struct VerdictProducer {
    client: Client,
    verdict_subject: String,
    error_subject: String,
}

impl VerdictProducer {
    /// Create a new verdict producer
    pub fn new(client: Client, verdict_subject: &str, error_subject: &str) -> Self {
        Self {
            client,
            verdict_subject: verdict_subject.to_string(),
            error_subject: error_subject.to_string(),
        }
    }

    /// Publish a successful result, to the reply subject when the caller set one
    pub async fn publish_result<T: Serialize>(&self, reply: Option<&str>, result: &T) -> Result<()> {
        let subject = reply.unwrap_or(&self.verdict_subject).to_string();
        self.publish(subject, result).await
    }

    /// Publish a structured failure
    pub async fn publish_error(&self, reply: Option<&str>, error: &ErrorResponse) -> Result<()> {
        let subject = reply.unwrap_or(&self.error_subject).to_string();
        self.publish(subject, error).await
    }

    async fn publish<T: Serialize>(&self, subject: String, payload: &T) -> Result<()> {
        let bytes = serde_json::to_vec(payload)?;
        let size = bytes.len();

        self.client.publish(subject.clone(), bytes.into()).await?;

        debug!(subject = %subject, bytes = size, "Published message");
        Ok(())
    }
}
