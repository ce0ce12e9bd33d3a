//! Message bus seam.
//!
//! The worker channel hands decoded inbound messages to a [`MessageBus`] and
//! accepts [`OutboundMessage`]s from its host. Two buses ship with the crate:
//! [`TracingBus`] (log only) and [`MpscBus`] (forward to a host receiver).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use meshlink_core::error::{MeshError, Result};

/// One routed message delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundDelivery {
    /// Channel the message arrived on.
    pub channel: String,
    pub sender_id: String,
    pub display_name: String,
    pub content: String,
    pub attachments: Vec<String>,
    /// `msg_id`, `from_role`, `to`, `timestamp` when present.
    pub metadata: HashMap<String, String>,
}

/// Message the host wants sent through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Target id, comma list, `*`/`all`, or empty for broadcast.
    pub chat_id: String,
    pub content: String,
}

impl OutboundMessage {
    pub fn new(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn deliver(&self, msg: InboundDelivery) -> Result<()>;
}

/// Bus that only logs deliveries.
#[derive(Debug, Default)]
pub struct TracingBus;

#[async_trait]
impl MessageBus for TracingBus {
    async fn deliver(&self, msg: InboundDelivery) -> Result<()> {
        tracing::info!(
            channel = %msg.channel,
            from = %msg.sender_id,
            msg_id = msg.metadata.get("msg_id").map(String::as_str).unwrap_or(""),
            content = %msg.content,
            "inbound message"
        );
        Ok(())
    }
}

/// Bus that forwards deliveries over a bounded channel.
#[derive(Debug, Clone)]
pub struct MpscBus {
    tx: mpsc::Sender<InboundDelivery>,
}

impl MpscBus {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<InboundDelivery>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageBus for MpscBus {
    async fn deliver(&self, msg: InboundDelivery) -> Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| MeshError::Internal("bus receiver dropped".into()))
    }
}
