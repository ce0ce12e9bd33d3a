//! In-process supervisor hub for end-to-end tests.
//!
//! Every accepted WebSocket is surfaced as a [`HubConn`]; the test drives
//! the protocol by hand (hello, auth_ok, routed messages, close).

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct HubState {
    conns: mpsc::UnboundedSender<HubConn>,
}

enum HubOut {
    Text(String),
    Close,
}

/// Server side of one worker connection.
pub struct HubConn {
    outbound: mpsc::UnboundedSender<HubOut>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl HubConn {
    pub fn send_json(&self, v: Value) {
        self.outbound.send(HubOut::Text(v.to_string())).unwrap();
    }

    pub fn send_raw(&self, text: &str) {
        self.outbound.send(HubOut::Text(text.to_string())).unwrap();
    }

    pub async fn recv_json(&mut self) -> Value {
        self.recv_json_within(RECV_TIMEOUT).await
    }

    pub async fn recv_json_within(&mut self, limit: Duration) -> Value {
        let text = timeout(limit, self.inbound.recv())
            .await
            .expect("timed out waiting for worker frame")
            .expect("worker connection closed");
        serde_json::from_str(&text).unwrap()
    }

    /// Next frame of type `ty`, skipping pings.
    pub async fn recv_type(&mut self, ty: &str) -> Value {
        loop {
            let v = self.recv_json().await;
            match v["type"].as_str() {
                Some(t) if t == ty => return v,
                Some("ping") => continue,
                other => panic!("expected {ty}, got {other:?}: {v}"),
            }
        }
    }

    /// Resolves once the worker side has gone away.
    pub async fn wait_closed(&mut self) {
        let res = timeout(RECV_TIMEOUT, async {
            while self.inbound.recv().await.is_some() {}
        })
        .await;
        assert!(res.is_ok(), "worker connection still open");
    }

    pub fn close(&self) {
        let _ = self.outbound.send(HubOut::Close);
    }
}

pub struct MockHub {
    addr: SocketAddr,
    conns: mpsc::UnboundedReceiver<HubConn>,
}

impl MockHub {
    pub async fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new()
            .route("/v1/ws", get(upgrade))
            .with_state(HubState { conns: tx });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, conns: rx }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/v1/ws", self.addr)
    }

    pub async fn accept(&mut self) -> HubConn {
        self.accept_within(RECV_TIMEOUT).await
    }

    pub async fn accept_within(&mut self, limit: Duration) -> HubConn {
        timeout(limit, self.conns.recv())
            .await
            .expect("timed out waiting for worker to connect")
            .expect("hub stopped")
    }

    /// Accept, send hello, and read the worker's auth frame.
    pub async fn accept_auth(&mut self) -> (HubConn, Value) {
        let mut conn = self.accept().await;
        conn.send_json(serde_json::json!({"type": "hello"}));
        let auth = conn.recv_type("auth").await;
        (conn, auth)
    }
}

async fn upgrade(State(hub): State<HubState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_conn(hub, socket))
}

async fn serve_conn(hub: HubState, socket: WebSocket) {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    if hub
        .conns
        .send(HubConn {
            outbound: out_tx,
            inbound: in_rx,
        })
        .is_err()
    {
        return;
    }

    let (mut ws_tx, mut ws_rx) = socket.split();
    loop {
        tokio::select! {
            out = out_rx.recv() => match out {
                Some(HubOut::Text(t)) => {
                    if ws_tx.send(Message::Text(t.into())).await.is_err() {
                        break;
                    }
                }
                Some(HubOut::Close) | None => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Text(t))) => {
                    let _ = in_tx.send(t.to_string());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
