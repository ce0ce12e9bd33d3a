//! Handshake engine against an in-memory scripted peer.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Sink, Stream};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use meshlink_core::protocol::ClientFrame;
use meshlink_worker::transport::handshake::{await_auth_ok, await_hello, run_handshake};

const WINDOW: Duration = Duration::from_millis(200);

/// Yields queued frames, then stays pending forever. Records writes.
#[derive(Default)]
struct Scripted {
    inbound: VecDeque<Message>,
    sent: Vec<Message>,
    closed: bool,
}

impl Scripted {
    fn with(frames: &[Value]) -> Self {
        let mut s = Self::default();
        for f in frames {
            s.inbound.push_back(Message::Text(f.to_string().into()));
        }
        s
    }

    fn push(mut self, msg: Message) -> Self {
        self.inbound.push_back(msg);
        self
    }

    fn sent_json(&self) -> Vec<Value> {
        self.sent
            .iter()
            .map(|m| match m {
                Message::Text(t) => serde_json::from_str(t.as_str()).unwrap(),
                other => panic!("unexpected frame {other:?}"),
            })
            .collect()
    }
}

impl Stream for Scripted {
    type Item = Result<Message, WsError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().inbound.pop_front() {
            Some(m) => Poll::Ready(Some(Ok(m))),
            None => Poll::Pending,
        }
    }
}

impl Sink<Message> for Scripted {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), WsError> {
        self.get_mut().sent.push(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        self.get_mut().closed = true;
        Poll::Ready(Ok(()))
    }
}

fn auth() -> ClientFrame {
    ClientFrame::Ping
}

#[tokio::test]
async fn hello_skips_control_frames() {
    let mut peer = Scripted::default()
        .push(Message::Ping(Default::default()))
        .push(Message::Text(json!({"type": "hello"}).to_string().into()));
    await_hello(&mut peer, WINDOW).await.unwrap();
}

#[tokio::test]
async fn hello_must_be_first_data_frame() {
    let mut peer = Scripted::with(&[json!({"type": "pong"}), json!({"type": "hello"})]);
    let err = await_hello(&mut peer, WINDOW).await.unwrap_err();
    assert_eq!(err.code().as_str(), "HANDSHAKE");

    let mut peer = Scripted::default().push(Message::Text("nope".to_string().into()));
    let err = await_hello(&mut peer, WINDOW).await.unwrap_err();
    assert_eq!(err.code().as_str(), "HANDSHAKE");
}

#[tokio::test]
async fn hello_times_out() {
    let mut peer = Scripted::default();
    let err = await_hello(&mut peer, WINDOW).await.unwrap_err();
    assert_eq!(err.code().as_str(), "HANDSHAKE");
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn hello_fails_when_peer_closes() {
    let mut peer = Scripted::default().push(Message::Close(None));
    let err = await_hello(&mut peer, WINDOW).await.unwrap_err();
    assert_eq!(err.code().as_str(), "HANDSHAKE");
}

#[tokio::test]
async fn auth_ok_wait_ignores_unrelated_frames() {
    let mut peer = Scripted::with(&[
        json!({"type": "pong"}),
        json!({"type": "message", "from_id": "boss-1", "payload": "early"}),
        json!({"type": "roster"}),
        json!({
            "type": "auth_ok",
            "id": "w1",
            "key": "k1",
            "role": "employee",
            "reconnected": true
        }),
    ]);
    let ok = await_auth_ok(&mut peer, WINDOW).await.unwrap();
    assert_eq!(ok.id, "w1");
    assert_eq!(ok.key, "k1");
    assert_eq!(ok.role, "employee");
    assert!(ok.reconnected);
}

#[tokio::test]
async fn auth_error_defaults_code() {
    let mut peer = Scripted::with(&[json!({"type": "error", "message": "bad authkey"})]);
    match await_auth_ok(&mut peer, WINDOW).await.unwrap_err() {
        meshlink_core::MeshError::AuthRejected { code, message } => {
            assert_eq!(code, "auth_failed");
            assert_eq!(message, "bad authkey");
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut peer = Scripted::with(&[json!({"type": "error", "code": "banned", "message": "no"})]);
    match await_auth_ok(&mut peer, WINDOW).await.unwrap_err() {
        meshlink_core::MeshError::AuthRejected { code, .. } => assert_eq!(code, "banned"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn auth_ok_requires_id_and_key() {
    let mut peer = Scripted::with(&[json!({"type": "auth_ok", "id": "w1"})]);
    let err = await_auth_ok(&mut peer, WINDOW).await.unwrap_err();
    assert_eq!(err.code().as_str(), "PROTOCOL");
}

#[tokio::test]
async fn handshake_auth_ok_is_strictly_typed() {
    let mut peer = Scripted::with(&[json!({"type": "auth_ok", "id": 42, "key": "k1"})]);
    let err = await_auth_ok(&mut peer, WINDOW).await.unwrap_err();
    assert_eq!(err.code().as_str(), "HANDSHAKE");
}

#[tokio::test]
async fn hello_must_be_an_object() {
    let mut peer = Scripted::with(&[json!(["hello"])]);
    let err = await_hello(&mut peer, WINDOW).await.unwrap_err();
    assert_eq!(err.code().as_str(), "HANDSHAKE");
}

#[tokio::test]
async fn auth_ok_window_is_not_rearmed_by_traffic() {
    let mut peer = Scripted::with(&[json!({"type": "pong"}), json!({"type": "pong"})]);
    let err = await_auth_ok(&mut peer, WINDOW).await.unwrap_err();
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn full_handshake_sends_auth_after_hello() {
    let mut peer = Scripted::with(&[
        json!({"type": "hello"}),
        json!({"type": "auth_ok", "id": "w1", "key": "k1"}),
    ]);
    let ok = run_handshake(&mut peer, &auth(), WINDOW).await.unwrap();
    assert_eq!(ok.id, "w1");
    assert_eq!(peer.sent_json(), vec![json!({"type": "ping"})]);
    assert!(!peer.closed);
}

#[tokio::test]
async fn failed_handshake_closes_stream() {
    let mut peer = Scripted::with(&[json!({"type": "auth_ok", "id": "w1", "key": "k1"})]);
    run_handshake(&mut peer, &auth(), WINDOW).await.unwrap_err();
    assert!(peer.sent.is_empty());
    assert!(peer.closed);
}
