//! Outbound frame shaping: target resolution, payload coercion, frame layout.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;

use serde_json::json;

use meshlink_core::protocol::outbound::{
    build_payload, resolve_target, AuthMeta, AuthRequest, ClientFrame, MsgIdGen, RoutedSend, Target,
};
use meshlink_core::protocol::Identity;

fn one(s: &str) -> Target {
    Target::One(s.to_string())
}

#[test]
fn resolve_target_cases() {
    assert_eq!(resolve_target(""), one("*"));
    assert_eq!(resolve_target("   "), one("*"));
    assert_eq!(resolve_target("*"), one("*"));
    assert_eq!(resolve_target("all"), one("all"));
    assert_eq!(resolve_target("ALL"), one("ALL"));
    assert_eq!(resolve_target("a"), one("a"));
    assert_eq!(resolve_target(" boss-1 "), one("boss-1"));
    assert_eq!(
        resolve_target("a,b"),
        Target::Many(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(
        resolve_target("a, ,b"),
        Target::Many(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(resolve_target("a,"), one("a"));
    assert_eq!(resolve_target(",,"), one(",,"));
}

#[test]
fn target_serializes_as_scalar_or_array() {
    assert_eq!(serde_json::to_value(one("peer-2")).unwrap(), json!("peer-2"));
    assert_eq!(
        serde_json::to_value(resolve_target("a,b")).unwrap(),
        json!(["a", "b"])
    );
}

#[test]
fn build_payload_cases() {
    assert_eq!(build_payload(r#"{"task":"analyze"}"#), json!({"task": "analyze"}));
    assert_eq!(build_payload("hello"), json!({"content": "hello"}));
    assert_eq!(build_payload(""), json!({"content": ""}));
    assert_eq!(build_payload("  hi  "), json!({"content": "hi"}));
    assert_eq!(build_payload("[1,2]"), json!([1, 2]));
    assert_eq!(build_payload("{broken"), json!({"content": "{broken"}));
}

#[test]
fn frames_carry_type_tag() {
    assert_eq!(serde_json::to_value(ClientFrame::Ping).unwrap(), json!({"type": "ping"}));

    let msg = ClientFrame::Message(RoutedSend {
        to: one("peer-2"),
        payload: build_payload("hi"),
        msg_id: "meshlink-1".into(),
    });
    assert_eq!(
        serde_json::to_value(msg).unwrap(),
        json!({
            "type": "message",
            "to": "peer-2",
            "payload": {"content": "hi"},
            "msg_id": "meshlink-1"
        })
    );
}

#[test]
fn auth_omits_optional_fields() {
    let auth = AuthRequest {
        role: "employee".into(),
        name: "Researcher-1".into(),
        tags: vec!["research".into()],
        meta: AuthMeta { client: "meshlink".into(), timestamp: 1 },
        authkey: None,
        identity: None,
    };
    let v = serde_json::to_value(ClientFrame::Auth(auth.clone())).unwrap();
    assert_eq!(v["type"], "auth");
    assert!(v.get("authkey").is_none());
    assert!(v.get("identity").is_none());

    let with_identity = AuthRequest {
        authkey: Some("shared".into()),
        identity: Identity::complete("e1", "k1"),
        ..auth
    };
    let v = serde_json::to_value(ClientFrame::Auth(with_identity)).unwrap();
    assert_eq!(v["authkey"], "shared");
    assert_eq!(v["identity"], json!({"id": "e1", "key": "k1"}));
}

#[test]
fn msg_ids_are_unique_and_prefixed() {
    let ids = MsgIdGen::new("meshlink");
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        let id = ids.next_id();
        assert!(id.starts_with("meshlink-"));
        assert!(seen.insert(id));
    }
}

#[test]
fn partial_identity_is_rejected() {
    assert!(Identity::complete("e1", "").is_none());
    assert!(Identity::complete("", "k1").is_none());
    assert!(Identity::complete("e1", "k1").unwrap().is_complete());
}
