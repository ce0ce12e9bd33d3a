//! Worker channel façade.
//!
//! `start` validates config, runs one synchronous handshake, then hands off
//! to the background loops; `stop` cancels them and drops the connection;
//! `send` routes one outbound message onto the current connection.

pub(crate) mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;

use meshlink_core::error::{MeshError, Result};
use meshlink_core::protocol::outbound::RoutedSend;
use meshlink_core::protocol::{build_payload, resolve_target, ClientFrame, Identity, MsgIdGen};

use crate::bus::{MessageBus, OutboundMessage};
use crate::config::WorkerWsConfig;
use crate::dispatch::Dispatcher;
use crate::identity::IdentityStore;
use crate::policy::SenderAllowList;
use crate::session::{self, heartbeat, reconnect, Session};
use crate::transport::{ConnSlot, HandshakeTimeouts};

use state::ChannelState;

/// Channel name; also the fallback sender id for anonymous messages.
pub const CHANNEL_NAME: &str = "worker_ws";
/// Client name announced in `auth.meta.client` and used as msg_id prefix.
pub const CLIENT_NAME: &str = "meshlink";

/// How long `stop` waits for background tasks to wind down.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Host-facing channel contract.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    async fn send(&self, msg: OutboundMessage) -> Result<()>;
    fn is_running(&self) -> bool;
}

/// Persistent, authenticated connection to a supervisor hub.
pub struct WorkerChannel {
    state: Arc<ChannelState>,
}

impl WorkerChannel {
    pub fn new(cfg: WorkerWsConfig, bus: Arc<dyn MessageBus>) -> Self {
        Self::with_timeouts(cfg, bus, HandshakeTimeouts::default())
    }

    /// Like [`WorkerChannel::new`] with explicit handshake deadlines.
    pub fn with_timeouts(
        cfg: WorkerWsConfig,
        bus: Arc<dyn MessageBus>,
        timeouts: HandshakeTimeouts,
    ) -> Self {
        let store = IdentityStore::from_config(&cfg.identity_file);
        let identity = match store.load() {
            Ok(ident) => ident,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %store.path().display(),
                    "failed to load identity"
                );
                None
            }
        };
        let dispatcher = Dispatcher::new(
            CHANNEL_NAME,
            bus,
            SenderAllowList::new(&cfg.allow_from),
        );

        Self {
            state: Arc::new(ChannelState {
                cfg,
                timeouts,
                store,
                identity: RwLock::new(identity),
                conn: ConnSlot::new(),
                dispatcher,
                running: AtomicBool::new(false),
                session: Mutex::new(None),
                msg_ids: MsgIdGen::new(CLIENT_NAME),
            }),
        }
    }

    pub fn config(&self) -> &WorkerWsConfig {
        &self.state.cfg
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    pub async fn is_connected(&self) -> bool {
        self.state.conn.is_connected().await
    }

    /// Identity currently held (loaded from disk or issued by the hub).
    pub async fn identity(&self) -> Option<Identity> {
        self.state.identity.read().await.clone()
    }

    /// The `auth` frame the next handshake would send.
    pub async fn auth_frame(&self) -> ClientFrame {
        self.state.auth_frame().await
    }

    pub async fn start(&self) -> Result<()> {
        let st = &self.state;
        st.cfg.validate()?;

        let session = {
            let mut slot = st.session.lock().await;
            if slot.is_some() {
                tracing::debug!("worker ws channel already started");
                return Ok(());
            }
            let s = Session::new();
            *slot = Some(s.clone());
            s
        };

        let reconnect_every = st.cfg.reconnect_interval();
        if let Err(e) = session::connect_and_authenticate(st, &session).await {
            if reconnect_every.is_none() {
                self.abort_start(&session).await;
                return Err(e);
            }
            tracing::warn!(
                error = %e,
                code = e.code().as_str(),
                "initial connect/auth failed; reconnect loop will retry"
            );
        }

        if let Some(every) = reconnect_every {
            session.spawn(reconnect::reconnect_loop(st.clone(), session.clone(), every));
        }
        session.spawn(heartbeat::ping_loop(
            st.clone(),
            session.token().clone(),
            st.cfg.ping_interval(),
        ));

        {
            // `stop` cancels under this lock, so the check and the flag flip
            // cannot interleave with it.
            let _slot = st.session.lock().await;
            if session.is_cancelled() {
                return Err(MeshError::NotRunning);
            }
            st.running.store(true, Ordering::SeqCst);
        }

        tracing::info!(
            address = %st.cfg.address,
            role = %st.cfg.role,
            name = %st.cfg.name,
            tags = ?st.cfg.clean_tags(),
            "worker ws channel started"
        );
        Ok(())
    }

    /// Idempotent.
    pub async fn stop(&self) -> Result<()> {
        let st = &self.state;
        let session = {
            let mut slot = st.session.lock().await;
            st.running.store(false, Ordering::SeqCst);
            let s = slot.take();
            if let Some(s) = &s {
                s.cancel();
            }
            s
        };

        if let Some(conn) = st.conn.take().await {
            conn.close().await;
        }

        if let Some(s) = session {
            if !s.shutdown(STOP_GRACE).await {
                tracing::warn!("background tasks still running after stop grace period");
            }
            tracing::info!("worker ws channel stopped");
        }
        Ok(())
    }

    pub async fn send(&self, msg: OutboundMessage) -> Result<()> {
        if !self.is_running() {
            return Err(MeshError::NotRunning);
        }

        let frame = ClientFrame::Message(RoutedSend {
            to: resolve_target(&msg.chat_id),
            payload: build_payload(&msg.content),
            msg_id: self.state.msg_ids.next_id(),
        });

        let conn = self
            .state
            .conn
            .current()
            .await
            .ok_or(MeshError::NotConnected)?;
        conn.send_frame(&frame).await
    }

    /// Undo a failed `start`: drop the session if it is still ours.
    async fn abort_start(&self, session: &Session) {
        {
            let mut slot = self.state.session.lock().await;
            if !session.is_cancelled() {
                *slot = None;
            }
        }
        session.cancel();
        let _ = session.shutdown(STOP_GRACE).await;
    }
}

impl Drop for WorkerChannel {
    fn drop(&mut self) {
        // Background tasks hold their own `Arc` of the state; cancelling lets
        // them exit instead of running detached.
        if let Ok(mut slot) = self.state.session.try_lock() {
            if let Some(s) = slot.take() {
                s.cancel();
            }
        }
    }
}

#[async_trait]
impl Channel for WorkerChannel {
    fn name(&self) -> &'static str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<()> {
        WorkerChannel::start(self).await
    }

    async fn stop(&self) -> Result<()> {
        WorkerChannel::stop(self).await
    }

    async fn send(&self, msg: OutboundMessage) -> Result<()> {
        WorkerChannel::send(self, msg).await
    }

    fn is_running(&self) -> bool {
        WorkerChannel::is_running(self)
    }
}
