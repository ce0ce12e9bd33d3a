use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

use crate::channel::state::ChannelState;
use crate::transport::codec::{self, Frame};
use crate::transport::Connection;

/// Read and dispatch frames for one connection until it fails, is closed
/// locally, or the session is cancelled. A dispatch in progress is abandoned
/// on cancel or local close.
///
/// On failure the loop clears the shared slot only if it still holds this
/// connection. It never reconnects.
pub(crate) async fn read_loop<St>(
    state: Arc<ChannelState>,
    conn: Arc<Connection>,
    mut stream: St,
    cancel: CancellationToken,
) where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let reason = loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            _ = conn.closed() => break "connection closed locally".to_string(),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(msg)) => match codec::decode(msg) {
                // Delivery may block on a slow bus; it must not outlive
                // the session or the connection.
                Frame::Data(text) => tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = conn.closed() => break "connection closed locally".to_string(),
                    _ = state.handle_text(&text) => {}
                },
                Frame::Binary(len) => tracing::debug!(len, "ignoring non-utf8 binary frame"),
                Frame::Control => {}
                Frame::Close => break "connection closed by peer".to_string(),
            },
            Some(Err(e)) => break e.to_string(),
            None => break "connection closed".to_string(),
        }
    };

    if cancel.is_cancelled() {
        return;
    }
    if conn.is_closed() {
        tracing::debug!(reason = %reason, "read loop ended");
    } else {
        tracing::warn!(error = %reason, "read loop ended");
    }

    if state.conn.clear_if_current(&conn).await {
        conn.close().await;
    }
}
