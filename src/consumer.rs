//! NATS subscriptions for incoming scoring and ingestion requests

use crate::config::NatsConfig;
use anyhow::Result;
use async_nats::{Client, Message};
use futures::stream::{select_all, SelectAll};
use tracing::info;

/// Kind of request carried by a message, derived from its subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Contract,
    Batch,
    Ingest,
}

/// Merged stream over all request subjects
pub type RequestStream = SelectAll<async_nats::Subscriber>;

/// Maps subjects to request kinds
#[derive(Debug, Clone)]
pub struct SubjectRouter {
    contract_subject: String,
    batch_subject: String,
    ingest_subject: String,
}

impl SubjectRouter {
    pub fn new(config: &NatsConfig) -> Self {
        Self {
            contract_subject: config.contract_subject.clone(),
            batch_subject: config.batch_subject.clone(),
            ingest_subject: config.ingest_subject.clone(),
        }
    }

    /// Classify a message by the subject it arrived on
    pub fn classify(&self, message: &Message) -> Option<RequestKind> {
        self.kind_of(message.subject.as_str())
    }

    pub fn kind_of(&self, subject: &str) -> Option<RequestKind> {
        if subject == self.contract_subject {
            Some(RequestKind::Contract)
        } else if subject == self.batch_subject {
            Some(RequestKind::Batch)
        } else if subject == self.ingest_subject {
            Some(RequestKind::Ingest)
        } else {
            None
        }
    }

    pub fn subjects(&self) -> [&str; 3] {
        [
            self.contract_subject.as_str(),
            self.batch_subject.as_str(),
            self.ingest_subject.as_str(),
        ]
    }
}

/// Consumer for receiving requests from NATS
pub struct RequestConsumer {
    client: Client,
    router: SubjectRouter,
}

impl RequestConsumer {
    /// Create a new request consumer
    pub fn new(client: Client, config: &NatsConfig) -> Self {
        Self {
            client,
            router: SubjectRouter::new(config),
        }
    }

    /// Subscribe to every request subject as one merged stream
    pub async fn subscribe(&self) -> Result<RequestStream> {
        let mut subscribers = Vec::with_capacity(3);
        for subject in self.router.subjects() {
            subscribers.push(self.client.subscribe(subject.to_string()).await?);
            info!(subject = %subject, "Subscribed to request subject");
        }
        Ok(select_all(subscribers))
    }

    pub fn router(&self) -> &SubjectRouter {
        &self.router
    }
}
