//! Session loops and their shared lifecycle.
//!
//! A [`Session`] is created by `start` and torn down by `stop`. It owns one
//! cancellation token and one task tracker; every background activity (read
//! loop per connection, ping loop, reconnect loop) is spawned on the tracker
//! and selects on the token, so nothing outlives `stop`.

pub(crate) mod heartbeat;
pub(crate) mod reader;
pub(crate) mod reconnect;

use std::future::Future;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use meshlink_core::error::{MeshError, Result};
use meshlink_core::protocol::Identity;

use crate::channel::state::ChannelState;
use crate::transport::{handshake, Connection};

/// Cancellation signal plus supervised task set for one started channel.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: CancellationToken,
    tasks: TaskTracker,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(fut);
    }

    /// Wait for all spawned tasks, at most `grace`. Returns `false` on timeout.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tasks.close();
        timeout(grace, self.tasks.wait()).await.is_ok()
    }
}

/// One full handshake followed by commit:
/// install the connection (closing any previous one), adopt and persist the
/// issued identity, then start the connection's read loop.
pub(crate) async fn connect_and_authenticate(
    state: &Arc<ChannelState>,
    session: &Session,
) -> Result<()> {
    let auth = state.auth_frame().await;
    let (ws, ok) = handshake::authenticate(&state.cfg.address, &auth, &state.timeouts).await?;

    let (sink, stream) = ws.split();
    let conn = Arc::new(Connection::new(sink));

    match state.conn.replace_unless_cancelled(conn.clone(), session.token()).await {
        Ok(Some(prev)) => prev.close().await,
        Ok(None) => {}
        Err(conn) => {
            conn.close().await;
            return Err(MeshError::NotRunning);
        }
    }

    if let Some(ident) = Identity::complete(ok.id.as_str(), ok.key.as_str()) {
        state.adopt_identity(ident).await;
    }

    tracing::info!(
        id = %ok.id,
        role = %ok.role,
        reconnected = ok.reconnected,
        conn_id = conn.id(),
        "authenticated to worker ws"
    );

    let span = tracing::info_span!("worker_ws", conn_id = conn.id());
    session.spawn(
        reader::read_loop(state.clone(), conn, stream, session.token().clone()).instrument(span),
    );
    Ok(())
}
