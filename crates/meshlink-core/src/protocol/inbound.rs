//! Hub -> worker frames.
//!
//! Decoding is two-step: the frame is parsed as a JSON object and its `type`
//! read first, then the full shape is parsed for the matched variant only.
//! Unknown types decode to [`Inbound::Unknown`] rather than an error.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MeshError, Result};
use crate::protocol::value::opt_string;

/// Decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// First frame on every connection.
    Hello,
    /// Identity confirmation (handshake reply or unsolicited re-issue).
    AuthOk(AuthOkFrame),
    /// Peer-reported error (auth rejection during handshake).
    Error(PeerError),
    /// Heartbeat reply to `ping`.
    Pong,
    /// Heartbeat reply to `health_report`.
    HealthReportAck,
    /// Hub accepted a routed message.
    DeliveryAck(DeliveryAck),
    /// Routed payload from another node.
    Message(RoutedMessage),
    /// Out-of-band notice (ban, kick, ...).
    System(SystemEvent),
    /// Any other `type`; carries the type string for logging.
    Unknown(String),
}

impl Inbound {
    /// Wire `type` of this frame.
    pub fn kind(&self) -> &str {
        match self {
            Inbound::Hello => "hello",
            Inbound::AuthOk(_) => "auth_ok",
            Inbound::Error(_) => "error",
            Inbound::Pong => "pong",
            Inbound::HealthReportAck => "health_report_ack",
            Inbound::DeliveryAck(_) => "delivery_ack",
            Inbound::Message(_) => "message",
            Inbound::System(_) => "system",
            Inbound::Unknown(t) => t,
        }
    }
}

/// `auth_ok` as received. Fields stay loosely typed so that an unsolicited
/// re-issue with a numeric id is still usable; the handshake converts it
/// with [`AuthOk::try_from`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthOkFrame {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default)]
    pub reconnected: Option<Value>,
}

impl AuthOkFrame {
    /// Issued `id` and `key`, stringified.
    pub fn loose_identity(&self) -> (String, String) {
        (opt_string(self.id.as_ref()), opt_string(self.key.as_ref()))
    }
}

/// Handshake reply with every field of the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthOk {
    pub id: String,
    pub key: String,
    pub role: String,
    pub reconnected: bool,
}

impl TryFrom<AuthOkFrame> for AuthOk {
    type Error = MeshError;

    fn try_from(f: AuthOkFrame) -> Result<Self> {
        Ok(Self {
            id: strict_string("id", f.id)?,
            key: strict_string("key", f.key)?,
            role: strict_string("role", f.role)?,
            reconnected: match f.reconnected {
                None | Some(Value::Null) => false,
                Some(Value::Bool(b)) => b,
                Some(other) => return Err(wrong_type("reconnected", "a bool", &other)),
            },
        })
    }
}

fn strict_string(field: &str, v: Option<Value>) -> Result<String> {
    match v {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(wrong_type(field, "a string", &other)),
    }
}

fn wrong_type(field: &str, want: &str, got: &Value) -> MeshError {
    MeshError::Protocol(format!(
        "parse auth_ok failed: `{field}` must be {want}, got {got}"
    ))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeerError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl PeerError {
    /// Code to report for an auth rejection (`auth_failed` when absent).
    pub fn auth_code(&self) -> &str {
        if self.code.is_empty() {
            "auth_failed"
        } else {
            &self.code
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeliveryAck {
    #[serde(default)]
    pub msg_id: Option<Value>,
}

/// Routed message. Fields stay loosely typed; see [`crate::protocol::value`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoutedMessage {
    #[serde(default)]
    pub from_id: Option<Value>,
    #[serde(default)]
    pub from_role: Option<Value>,
    #[serde(default)]
    pub to: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub msg_id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemEvent {
    #[serde(default)]
    pub event: Option<Value>,
    #[serde(default)]
    pub by: Option<Value>,
}

/// Decode one text frame.
///
/// The frame must be a JSON object. A missing or null `type` decodes as
/// [`Inbound::Unknown`] with an empty type; a non-string `type` is an error.
pub fn decode_inbound(text: &str) -> Result<Inbound> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| MeshError::Protocol(format!("invalid json frame: {e}")))?;
    let obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(MeshError::Protocol(format!(
                "frame must be a json object, got {}",
                value_kind(&other)
            )))
        }
    };

    let msg_type = match obj.get("type") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(t)) => t.clone(),
        Some(other) => {
            return Err(MeshError::Protocol(format!(
                "frame type must be a string, got {}",
                value_kind(other)
            )))
        }
    };

    let body = Value::Object(obj);
    let frame = match msg_type.as_str() {
        "hello" => Inbound::Hello,
        "auth_ok" => Inbound::AuthOk(parse_body(body, "auth_ok")?),
        "error" => Inbound::Error(parse_body(body, "error")?),
        "pong" => Inbound::Pong,
        "health_report_ack" => Inbound::HealthReportAck,
        "delivery_ack" => Inbound::DeliveryAck(parse_body(body, "delivery_ack")?),
        "message" => Inbound::Message(parse_body(body, "message")?),
        "system" => Inbound::System(parse_body(body, "system")?),
        _ => Inbound::Unknown(msg_type),
    };
    Ok(frame)
}

fn parse_body<T: DeserializeOwned>(body: Value, kind: &str) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| MeshError::Protocol(format!("parse {kind} failed: {e}")))
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
