use std::collections::HashMap;
use std::sync::Arc;

use meshlink_core::protocol::inbound::{Inbound, RoutedMessage};
use meshlink_core::protocol::value::{opt_string, payload_to_content};
use meshlink_core::protocol::Identity;

use crate::bus::{InboundDelivery, MessageBus};
use crate::policy::SenderAllowList;

/// Outcome of dispatching one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Logged or delivered; nothing for the caller to do.
    Handled,
    /// Dropped (policy, unknown type, incomplete data).
    Dropped,
    /// Hub re-issued the identity; caller must adopt and persist it.
    IdentityIssued(Identity),
}

/// Routes inbound frames for one channel.
pub struct Dispatcher {
    channel: &'static str,
    bus: Arc<dyn MessageBus>,
    allow: SenderAllowList,
}

impl Dispatcher {
    pub fn new(channel: &'static str, bus: Arc<dyn MessageBus>, allow: SenderAllowList) -> Self {
        Self {
            channel,
            bus,
            allow,
        }
    }

    pub async fn dispatch(&self, frame: Inbound) -> Dispatched {
        match frame {
            Inbound::Pong | Inbound::HealthReportAck => {
                tracing::debug!(kind = frame.kind(), "heartbeat ack");
                Dispatched::Handled
            }
            Inbound::DeliveryAck(ack) => {
                tracing::info!(msg_id = %opt_string(ack.msg_id.as_ref()), "delivery ack");
                Dispatched::Handled
            }
            Inbound::Error(err) => {
                tracing::warn!(code = %err.code, message = %err.message, "hub error");
                Dispatched::Handled
            }
            Inbound::System(ev) => {
                tracing::warn!(
                    event = %opt_string(ev.event.as_ref()),
                    by = %opt_string(ev.by.as_ref()),
                    "system event"
                );
                Dispatched::Handled
            }
            Inbound::Message(msg) => self.route_message(msg).await,
            Inbound::AuthOk(ok) => {
                let (id, key) = ok.loose_identity();
                if id.is_empty() {
                    return Dispatched::Dropped;
                }
                match Identity::complete(id, key) {
                    Some(ident) => Dispatched::IdentityIssued(ident),
                    None => {
                        tracing::warn!("ignoring auth_ok without key");
                        Dispatched::Dropped
                    }
                }
            }
            Inbound::Hello | Inbound::Unknown(_) => {
                tracing::debug!(kind = frame.kind(), "ignoring unsupported packet type");
                Dispatched::Dropped
            }
        }
    }

    async fn route_message(&self, msg: RoutedMessage) -> Dispatched {
        let mut from_id = opt_string(msg.from_id.as_ref());
        if from_id.is_empty() {
            from_id = self.channel.to_string();
        }
        if !self.allow.is_allowed(&from_id) {
            tracing::warn!(from = %from_id, "sender not in allow_from; dropped");
            return Dispatched::Dropped;
        }

        let mut content = payload_to_content(msg.payload.as_ref());
        if content.is_empty() {
            content = "{}".to_string();
        }

        let mut metadata = HashMap::new();
        for (key, value) in [
            ("msg_id", &msg.msg_id),
            ("from_role", &msg.from_role),
            ("to", &msg.to),
            ("timestamp", &msg.timestamp),
        ] {
            let v = opt_string(value.as_ref());
            if !v.is_empty() {
                metadata.insert(key.to_string(), v);
            }
        }

        let delivery = InboundDelivery {
            channel: self.channel.to_string(),
            sender_id: from_id.clone(),
            display_name: from_id,
            content,
            attachments: Vec::new(),
            metadata,
        };
        if let Err(e) = self.bus.deliver(delivery).await {
            tracing::warn!(error = %e, "bus delivery failed");
        }
        Dispatched::Handled
    }
}
