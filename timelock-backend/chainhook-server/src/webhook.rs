// src/webhook.rs
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::models::WebhookAck;

#[derive(Error, Debug)]
#[error("Malformed webhook payload: {0}")]
pub struct MalformedPayloadError(#[from] serde_json::Error);

/// A chainhook delivery. The payload is kept opaque; nothing about its shape is enforced.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub payload: Value,
}

/// What can be read off a delivery without trusting its schema.
#[derive(Debug, Default, PartialEq)]
pub struct EventSummary {
    pub chainhook_uuid: Option<String>,
    pub apply_blocks: Option<usize>,
    pub rollback_blocks: Option<usize>,
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, MalformedPayloadError> {
        Ok(Self { payload: serde_json::from_slice(body)? })
    }

    pub fn summary(&self) -> EventSummary {
        let count = |key: &str| self.payload.get(key).and_then(Value::as_array).map(Vec::len);
        EventSummary {
            chainhook_uuid: self
                .payload
                .pointer("/chainhook/uuid")
                .and_then(Value::as_str)
                .map(str::to_string),
            apply_blocks: count("apply"),
            rollback_blocks: count("rollback"),
        }
    }
}

/// Downstream handling of received events.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn handle_event(&self, event: &WebhookEvent) -> anyhow::Result<()>;
}

/// Records every delivery in the log and does nothing else.
pub struct LogSink;

#[async_trait]
impl WebhookSink for LogSink {
    async fn handle_event(&self, event: &WebhookEvent) -> anyhow::Result<()> {
        let summary = event.summary();
        info!(
            chainhook = ?summary.chainhook_uuid,
            apply = ?summary.apply_blocks,
            rollback = ?summary.rollback_blocks,
            payload = %event.payload,
            "Chainhook webhook received"
        );
        Ok(())
    }
}

pub struct WebhookReceiver {
    sink: Arc<dyn WebhookSink>,
}

impl WebhookReceiver {
    pub fn new(sink: Arc<dyn WebhookSink>) -> Self {
        Self { sink }
    }

    /// Parse or fail, then acknowledge. Sink failures are logged and never change the ack.
    pub async fn receive(&self, body: &[u8]) -> Result<WebhookAck, MalformedPayloadError> {
        let event = WebhookEvent::parse(body).map_err(|e| {
            error!(error = %e, bytes = body.len(), "Webhook error");
            e
        })?;
        if let Err(e) = self.sink.handle_event(&event).await {
            error!(error = %e, "Webhook sink failed");
        }
        Ok(WebhookAck { received: true })
    }
}

impl Default for WebhookReceiver {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl WebhookSink for RecordingSink {
        async fn handle_event(&self, event: &WebhookEvent) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(event.payload.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl WebhookSink for FailingSink {
        async fn handle_event(&self, _event: &WebhookEvent) -> anyhow::Result<()> {
            anyhow::bail!("downstream offline")
        }
    }

    #[tokio::test]
    async fn well_formed_body_is_acknowledged_and_forwarded() {
        let sink = Arc::new(RecordingSink::default());
        let receiver = WebhookReceiver::new(sink.clone());

        let ack = receiver.receive(br#"{"anything": [1, 2, 3]}"#).await.unwrap();
        assert_eq!(ack, WebhookAck { received: true });
        assert_eq!(*sink.seen.lock().unwrap(), vec![json!({"anything": [1, 2, 3]})]);
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_without_reaching_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let receiver = WebhookReceiver::new(sink.clone());

        assert!(receiver.receive(b"{not json").await.is_err());
        assert!(receiver.receive(b"").await.is_err());
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_still_acknowledges() {
        let receiver = WebhookReceiver::new(Arc::new(FailingSink));
        let ack = receiver.receive(b"null").await.unwrap();
        assert!(ack.received);
    }

    #[test]
    fn summary_reads_chainhook_envelope_when_present() {
        let event = WebhookEvent {
            payload: json!({
                "apply": [{ "block_identifier": { "index": 1 } }, {}],
                "rollback": [],
                "chainhook": { "uuid": "hook-1", "predicate": {} }
            }),
        };
        assert_eq!(
            event.summary(),
            EventSummary {
                chainhook_uuid: Some("hook-1".to_string()),
                apply_blocks: Some(2),
                rollback_blocks: Some(0),
            }
        );
        assert_eq!(WebhookEvent { payload: json!(42) }.summary(), EventSummary::default());
    }
}
