//! Live connection and the single-slot handle shared by the session loops.
//!
//! Ownership rules:
//! - The slot is read concurrently (`Send`, ping loop) and written
//!   exclusively (handshake commit, read-loop clear, `Stop`).
//! - Connections are compared by `Arc` identity, never by value, so a stale
//!   read loop cannot clear a connection a newer handshake installed.
//! - Connections are closed outside the slot lock.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{Sink, SinkExt};
use tokio::sync::{Mutex, RwLock};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;

use meshlink_core::error::{MeshError, Result};
use meshlink_core::protocol::ClientFrame;

use crate::transport::codec;

/// Upper bound for sending a close frame on shutdown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Write half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Authenticated connection (write half). The read half is owned by the
/// connection's read loop.
pub struct Connection {
    id: u64,
    /// Write lock: the transport allows one writer at a time.
    sink: Mutex<FrameSink>,
    closed: CancellationToken,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new<S>(sink: S) -> Self
    where
        S: Sink<Message, Error = WsError> + Send + 'static,
    {
        Self {
            id: NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed),
            sink: Mutex::new(Box::pin(sink)),
            closed: CancellationToken::new(),
        }
    }

    /// Process-unique id, for logs.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once [`Connection::close`] has been called.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    pub async fn send_frame(&self, frame: &ClientFrame) -> Result<()> {
        if self.is_closed() {
            return Err(MeshError::NotConnected);
        }
        let msg = codec::encode(frame)?;
        let mut sink = self.sink.lock().await;
        sink.send(msg)
            .await
            .map_err(|e| MeshError::Write(e.to_string()))
    }

    /// Close once; later calls are no-ops. The read loop for this
    /// connection observes the close and exits.
    pub async fn close(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();
        let _ = timeout(CLOSE_TIMEOUT, async {
            let mut sink = self.sink.lock().await;
            let _ = sink.close().await;
        })
        .await;
    }
}

/// Single-slot holder for the current connection.
#[derive(Default)]
pub struct ConnSlot {
    inner: RwLock<Option<Arc<Connection>>>,
}

impl ConnSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Arc<Connection>> {
        self.inner.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Install `conn` unless `session` was already cancelled.
    ///
    /// Returns the displaced connection (for the caller to close), or gives
    /// `conn` back when refused.
    pub async fn replace_unless_cancelled(
        &self,
        conn: Arc<Connection>,
        session: &CancellationToken,
    ) -> std::result::Result<Option<Arc<Connection>>, Arc<Connection>> {
        let mut slot = self.inner.write().await;
        if session.is_cancelled() {
            return Err(conn);
        }
        Ok(slot.replace(conn))
    }

    /// Clear the slot if it still holds `conn`. Returns whether it did.
    pub async fn clear_if_current(&self, conn: &Arc<Connection>) -> bool {
        let mut slot = self.inner.write().await;
        match slot.as_ref() {
            Some(cur) if Arc::ptr_eq(cur, conn) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub async fn take(&self) -> Option<Arc<Connection>> {
        self.inner.write().await.take()
    }
}
