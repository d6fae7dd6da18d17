//! WebSocket message types for the live push stream.
//!
//! `GET /users/{user_id}/ws` upgrades to a WebSocket connection and
//! pushes [`WsServerMessage`] JSON frames.
//!
//! # Protocol
//!
//! 1. Any notifications queued while the user was offline are flushed,
//!    in arrival order, immediately after the upgrade.
//! 2. Subsequent [`WsServerMessage::Notification`] frames are sent as
//!    lifecycle events reach the user.
//! 3. The server pings on a fixed interval; a connection that misses a
//!    pong is closed as stale.
//! 4. Opening a second connection for the same user closes the first
//!    with [`WsCloseCode::REPLACED`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notifications::NotificationPayload;

/// Server-to-client WebSocket message.
///
/// Serialized as an internally-tagged JSON object so the client can
/// dispatch on the `"type"` field:
///
/// ```json
/// {"type":"notification","event_id":"...","payload":{"kind":"cancellation", ...}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    /// A seance lifecycle notification addressed to this user.
    Notification {
        /// Identifier of the lifecycle event; identical across all
        /// recipients of the same event.
        event_id: Uuid,
        payload: NotificationPayload,
    },
}

/// Well-known WebSocket close codes used by the push stream.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct WsCloseCode;

impl WsCloseCode {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;

    /// An unexpected server-side error prevented the connection from
    /// continuing.
    pub const INTERNAL_ERROR: u16 = 1011;

    /// A newer connection for the same user replaced this one.
    pub const REPLACED: u16 = 4001;

    /// The connection stopped answering pings.
    pub const STALE: u16 = 4002;
}
