//! State shared by the façade and the session loops.

use std::sync::atomic::AtomicBool;

use tokio::sync::{Mutex, RwLock};

use meshlink_core::protocol::inbound::decode_inbound;
use meshlink_core::protocol::outbound::{unix_millis, AuthMeta, AuthRequest};
use meshlink_core::protocol::{ClientFrame, Identity, MsgIdGen};

use crate::config::WorkerWsConfig;
use crate::dispatch::{Dispatched, Dispatcher};
use crate::identity::IdentityStore;
use crate::session::Session;
use crate::transport::{ConnSlot, HandshakeTimeouts};

use super::CLIENT_NAME;

pub(crate) struct ChannelState {
    pub(crate) cfg: WorkerWsConfig,
    pub(crate) timeouts: HandshakeTimeouts,
    pub(crate) store: IdentityStore,
    /// Always `None` or a complete identity.
    pub(crate) identity: RwLock<Option<Identity>>,
    pub(crate) conn: ConnSlot,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) running: AtomicBool,
    /// Present between `start` and `stop`.
    pub(crate) session: Mutex<Option<Session>>,
    pub(crate) msg_ids: MsgIdGen,
}

impl ChannelState {
    /// `auth` frame for the next handshake. Name and tags are always resent;
    /// `identity` is attached only when one is held.
    pub(crate) async fn auth_frame(&self) -> ClientFrame {
        let identity = self.identity.read().await.clone();
        ClientFrame::Auth(AuthRequest {
            role: self.cfg.role.clone(),
            name: self.cfg.name.clone(),
            tags: self.cfg.clean_tags(),
            meta: AuthMeta {
                client: CLIENT_NAME.to_string(),
                timestamp: unix_millis(),
            },
            authkey: self.cfg.authkey().map(str::to_string),
            identity,
        })
    }

    /// Replace the held identity and persist it (best-effort).
    pub(crate) async fn adopt_identity(&self, ident: Identity) {
        *self.identity.write().await = Some(ident.clone());
        if let Err(e) = self.store.save(&ident) {
            tracing::warn!(
                error = %e,
                path = %self.store.path().display(),
                "failed to persist identity"
            );
        }
    }

    /// Decode and dispatch one inbound text frame.
    pub(crate) async fn handle_text(&self, text: &str) {
        let frame = match decode_inbound(text) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring invalid json packet");
                return;
            }
        };

        if let Dispatched::IdentityIssued(ident) = self.dispatcher.dispatch(frame).await {
            tracing::info!(id = %ident.id, "hub re-issued identity");
            self.adopt_identity(ident).await;
        }
    }
}
