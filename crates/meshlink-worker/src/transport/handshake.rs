//! Handshake engine: dial -> await hello -> send auth -> await auth_ok.
//!
//! Steps run strictly in order on one stream. Any failure closes the stream
//! and is returned to the caller; nothing here retries. The hello wait and
//! the auth_ok wait are each bounded once by the auth window (frames that
//! arrive during the auth_ok wait do not re-arm it).

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use meshlink_core::error::{MeshError, Result};
use meshlink_core::protocol::inbound::{decode_inbound, AuthOk, Inbound};
use meshlink_core::protocol::ClientFrame;

use crate::transport::codec::{self, Frame};
use crate::transport::WsStream;

/// Handshake deadlines.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeTimeouts {
    /// TCP + WebSocket upgrade.
    pub dial: Duration,
    /// Wait for `hello`, and separately for `auth_ok`/`error`.
    pub auth_window: Duration,
}

impl Default for HandshakeTimeouts {
    fn default() -> Self {
        Self {
            dial: Duration::from_secs(10),
            auth_window: Duration::from_secs(15),
        }
    }
}

/// Dial `address` and authenticate with `auth`.
pub async fn authenticate(
    address: &str,
    auth: &ClientFrame,
    timeouts: &HandshakeTimeouts,
) -> Result<(WsStream, AuthOk)> {
    let mut ws = dial(address, timeouts.dial).await?;
    let ok = run_handshake(&mut ws, auth, timeouts.auth_window).await?;
    Ok((ws, ok))
}

pub async fn dial(address: &str, limit: Duration) -> Result<WsStream> {
    match timeout(limit, connect_async(address)).await {
        Ok(Ok((ws, _resp))) => Ok(ws),
        Ok(Err(e)) => Err(MeshError::Dial(format!("dial worker ws failed: {e}"))),
        Err(_) => Err(MeshError::Dial(format!(
            "dial worker ws timed out after {}s",
            limit.as_secs()
        ))),
    }
}

/// Hello / auth / auth_ok on an already open stream. Closes the stream on
/// failure.
pub async fn run_handshake<S>(ws: &mut S, auth: &ClientFrame, window: Duration) -> Result<AuthOk>
where
    S: Stream<Item = std::result::Result<Message, WsError>>
        + Sink<Message, Error = WsError>
        + Unpin,
{
    let res = async {
        await_hello(ws, window).await?;
        let msg = codec::encode(auth)?;
        ws.send(msg)
            .await
            .map_err(|e| MeshError::Handshake(format!("send auth failed: {e}")))?;
        await_auth_ok(ws, window).await
    }
    .await;

    if res.is_err() {
        let _ = timeout(Duration::from_secs(1), ws.close()).await;
    }
    res
}

/// Read exactly one data frame; it must be `hello`.
pub async fn await_hello<St>(ws: &mut St, window: Duration) -> Result<()>
where
    St: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    let text = match timeout(window, next_data(ws)).await {
        Ok(r) => r.map_err(|e| MeshError::Handshake(format!("waiting hello failed: {e}")))?,
        Err(_) => return Err(MeshError::Handshake("timed out waiting for hello".into())),
    };

    match decode_inbound(&text) {
        Ok(Inbound::Hello) => Ok(()),
        Ok(other) => Err(MeshError::Handshake(format!(
            "expected hello, got {:?}",
            other.kind()
        ))),
        Err(e) => Err(MeshError::Handshake(format!("hello is not valid json: {e}"))),
    }
}

/// Read until `auth_ok` or `error`, ignoring anything else, within one
/// overall deadline.
pub async fn await_auth_ok<St>(ws: &mut St, window: Duration) -> Result<AuthOk>
where
    St: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    let wait = async {
        loop {
            let text = next_data(ws)
                .await
                .map_err(|e| MeshError::Handshake(format!("waiting auth_ok failed: {e}")))?;

            let frame = decode_inbound(&text)
                .map_err(|e| MeshError::Handshake(format!("auth response invalid: {e}")))?;
            match frame {
                Inbound::AuthOk(frame) => {
                    let ok = AuthOk::try_from(frame)
                        .map_err(|e| MeshError::Handshake(e.to_string()))?;
                    if ok.id.is_empty() || ok.key.is_empty() {
                        return Err(MeshError::Protocol("auth_ok missing id/key".into()));
                    }
                    return Ok(ok);
                }
                Inbound::Error(err) => {
                    return Err(MeshError::AuthRejected {
                        code: err.auth_code().to_string(),
                        message: err.message,
                    });
                }
                other => {
                    tracing::debug!(kind = other.kind(), "ignoring packet during auth window");
                }
            }
        }
    };

    match timeout(window, wait).await {
        Ok(res) => res,
        Err(_) => Err(MeshError::Handshake("timed out waiting for auth_ok".into())),
    }
}

/// Next text payload, skipping control frames.
async fn next_data<St>(ws: &mut St) -> std::result::Result<String, String>
where
    St: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(msg)) => match codec::decode(msg) {
                Frame::Data(text) => return Ok(text),
                Frame::Binary(len) => return Err(format!("unexpected binary frame ({len} bytes)")),
                Frame::Control => continue,
                Frame::Close => return Err("connection closed by peer".into()),
            },
            Some(Err(e)) => return Err(e.to_string()),
            None => return Err("connection closed".into()),
        }
    }
}
