//! Frame codec between tungstenite messages and protocol frames.
//!
//! - Text (and UTF-8 binary) frames => `Frame::Data`, decoded by callers
//! - Close => `Frame::Close`
//! - Ping/Pong/raw frames => `Frame::Control` (tungstenite answers pings)

use tokio_tungstenite::tungstenite::Message;

use meshlink_core::error::{MeshError, Result};
use meshlink_core::protocol::ClientFrame;

#[derive(Debug)]
pub enum Frame {
    Data(String),
    Binary(usize),
    Control,
    Close,
}

pub fn decode(msg: Message) -> Frame {
    match msg {
        Message::Text(s) => Frame::Data(s.as_str().to_owned()),
        Message::Binary(b) => match String::from_utf8(b.to_vec()) {
            Ok(s) => Frame::Data(s),
            Err(e) => Frame::Binary(e.as_bytes().len()),
        },
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Frame::Control,
        Message::Close(_) => Frame::Close,
    }
}

pub fn encode(frame: &ClientFrame) -> Result<Message> {
    let s = serde_json::to_string(frame)
        .map_err(|e| MeshError::Internal(format!("json encode failed: {e}")))?;
    Ok(Message::Text(s.into()))
}
