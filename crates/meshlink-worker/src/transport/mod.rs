//! Transport layer (WebSocket client).
//!
//! Exposes the frame codec, the single-slot connection handle shared by the
//! session loops, and the dial -> hello -> auth -> auth_ok handshake engine.

pub mod codec;
pub mod conn;
pub mod handshake;

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Client WebSocket stream as returned by `connect_async`.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub use conn::{ConnSlot, Connection};
pub use handshake::HandshakeTimeouts;
