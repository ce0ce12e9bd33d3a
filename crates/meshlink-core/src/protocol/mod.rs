//! Worker/hub wire protocol (JSON over WebSocket text frames).
//!
//! - `inbound`: hub -> worker frames, decoded as a closed set of variants
//!   keyed by the `type` field. Unknown types are a valid variant.
//! - `outbound`: worker -> hub frames (`auth`, `ping`, `message`) and the
//!   helpers that shape a routed message (target, payload, msg_id).
//! - `identity`: the `{id, key}` pair issued by the hub.
//! - `value`: loose-typed field stringification and payload rendering.
//!
//! Decoding never panics: malformed input comes back as `MeshError`.

pub mod identity;
pub mod inbound;
pub mod outbound;
pub mod value;

pub use identity::Identity;
pub use inbound::{decode_inbound, AuthOk, AuthOkFrame, Inbound};
pub use outbound::{build_payload, resolve_target, ClientFrame, MsgIdGen, Target};
