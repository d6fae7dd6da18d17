//! Live push channel: per-user connection registry with offline queues.
//!
//! The registry maps a user to at most one live connection. Messages for
//! a disconnected user accumulate in a per-user queue and are flushed, in
//! arrival order, when the user registers again. A second registration
//! for the same user detaches the first connection (its receiver closes,
//! and the owning socket task shuts the socket).
//!
//! The registry is process-local; the WebSocket handler in the server
//! crate owns socket I/O and liveness pings, and calls in here on
//! register/disconnect.

use std::collections::HashMap;
use std::sync::Arc;

use otb_sdk::objects::WsServerMessage;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::entities::UserId;

/// How a push message left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDelivery {
    /// Handed to a live connection.
    Sent,
    /// Appended to the user's offline queue.
    Queued,
}

/// A registered connection: the receiver the socket task drains, plus
/// the id it must present when deregistering.
pub struct Registration {
    pub connection_id: u64,
    pub receiver: mpsc::UnboundedReceiver<WsServerMessage>,
}

struct LiveConnection {
    connection_id: u64,
    sender: mpsc::UnboundedSender<WsServerMessage>,
}

#[derive(Default)]
struct UserSlot {
    connection: Option<LiveConnection>,
    queue: Vec<WsServerMessage>,
}

struct RegistryInner {
    next_connection_id: u64,
    slots: HashMap<UserId, UserSlot>,
}

/// Connection registry for the live push channel.
pub struct PushRegistry {
    inner: Mutex<RegistryInner>,
}

impl PushRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(RegistryInner {
                next_connection_id: 0,
                slots: HashMap::new(),
            }),
        })
    }

    /// Register a live connection for the user.
    ///
    /// Any queued messages are flushed into the new connection in
    /// arrival order. An existing connection for the same user is
    /// detached: its receiver closes, which the owning socket task
    /// observes as end-of-stream.
    pub async fn register(&self, user_id: UserId) -> Registration {
        let mut inner = self.inner.lock().await;

        inner.next_connection_id += 1;
        let connection_id = inner.next_connection_id;

        let (sender, receiver) = mpsc::unbounded_channel();
        let slot = inner.slots.entry(user_id).or_default();

        if let Some(old) = slot.connection.take() {
            debug!(
                user_id,
                old_connection = old.connection_id,
                new_connection = connection_id,
                "replacing live connection"
            );
            // Dropping the sender closes the old receiver.
        }

        let flushed = slot.queue.len();
        for message in slot.queue.drain(..) {
            // The receiver was created two lines up; this cannot fail.
            let _ = sender.send(message);
        }
        if flushed > 0 {
            debug!(user_id, flushed, "flushed offline queue");
        }

        slot.connection = Some(LiveConnection {
            connection_id,
            sender,
        });

        Registration {
            connection_id,
            receiver,
        }
    }

    /// Detach a connection.
    ///
    /// The connection id guards against a stale socket task detaching a
    /// replacement connection that registered after it.
    pub async fn disconnect(&self, user_id: UserId, connection_id: u64) {
        let mut inner = self.inner.lock().await;
        if let Some(slot) = inner.slots.get_mut(&user_id) {
            if slot
                .connection
                .as_ref()
                .is_some_and(|c| c.connection_id == connection_id)
            {
                slot.connection = None;
                debug!(user_id, connection_id, "connection detached");
            }
        }
    }

    /// Deliver a message to the user, or queue it for their next
    /// connection.
    pub async fn send_to_user(&self, user_id: UserId, message: WsServerMessage) -> PushDelivery {
        let mut inner = self.inner.lock().await;
        let slot = inner.slots.entry(user_id).or_default();

        if let Some(connection) = &slot.connection {
            match connection.sender.send(message) {
                Ok(()) => return PushDelivery::Sent,
                Err(mpsc::error::SendError(message)) => {
                    // Socket task died without deregistering; fall back
                    // to the queue.
                    slot.connection = None;
                    slot.queue.push(message);
                    return PushDelivery::Queued;
                }
            }
        }

        slot.queue.push(message);
        PushDelivery::Queued
    }

    /// Whether the user currently has a live connection.
    pub async fn is_connected(&self, user_id: UserId) -> bool {
        let inner = self.inner.lock().await;
        inner
            .slots
            .get(&user_id)
            .is_some_and(|slot| slot.connection.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otb_sdk::objects::NotificationPayload;
    use time::macros::datetime;
    use uuid::Uuid;

    fn message(title: &str) -> WsServerMessage {
        WsServerMessage::Notification {
            event_id: Uuid::new_v4(),
            payload: NotificationPayload::Cancellation {
                show_title: title.into(),
                theatre_name: "Globe".into(),
                starts_at: datetime!(2026-03-01 19:00),
            },
        }
    }

    fn title_of(message: &WsServerMessage) -> String {
        let WsServerMessage::Notification { payload, .. } = message;
        match payload {
            NotificationPayload::Cancellation { show_title, .. } => show_title.clone(),
            _ => String::new(),
        }
    }

    #[tokio::test]
    async fn test_send_reaches_live_connection() {
        let registry = PushRegistry::new();
        let mut registration = registry.register(7).await;

        let delivery = registry.send_to_user(7, message("Hamlet")).await;
        assert_eq!(delivery, PushDelivery::Sent);

        let received = registration.receiver.recv().await;
        assert!(received.is_some());
    }

    #[tokio::test]
    async fn test_offline_messages_flush_in_arrival_order() {
        let registry = PushRegistry::new();

        assert_eq!(
            registry.send_to_user(7, message("first")).await,
            PushDelivery::Queued
        );
        assert_eq!(
            registry.send_to_user(7, message("second")).await,
            PushDelivery::Queued
        );

        let mut registration = registry.register(7).await;
        let first = registration.receiver.recv().await;
        let second = registration.receiver.recv().await;

        assert_eq!(first.as_ref().map(title_of), Some("first".into()));
        assert_eq!(second.as_ref().map(title_of), Some("second".into()));
    }

    #[tokio::test]
    async fn test_second_registration_replaces_first() {
        let registry = PushRegistry::new();
        let mut old = registry.register(7).await;
        let mut new = registry.register(7).await;

        // Old connection's stream ends.
        assert!(old.receiver.recv().await.is_none());

        // Messages go to the replacement.
        registry.send_to_user(7, message("Hamlet")).await;
        assert!(new.receiver.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_stale_disconnect_leaves_replacement_attached() {
        let registry = PushRegistry::new();
        let old = registry.register(7).await;
        let _new = registry.register(7).await;

        // The replaced task deregisters late; the new connection stays.
        registry.disconnect(7, old.connection_id).await;
        assert!(registry.is_connected(7).await);

        assert_eq!(
            registry.send_to_user(7, message("Hamlet")).await,
            PushDelivery::Sent
        );
    }

    #[tokio::test]
    async fn test_dead_receiver_falls_back_to_queue() {
        let registry = PushRegistry::new();
        let registration = registry.register(7).await;
        drop(registration.receiver);

        assert_eq!(
            registry.send_to_user(7, message("Hamlet")).await,
            PushDelivery::Queued
        );
        assert!(!registry.is_connected(7).await);

        // The queued message survives until the next registration.
        let mut reconnected = registry.register(7).await;
        assert!(reconnected.receiver.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_disconnect_then_send_queues() {
        let registry = PushRegistry::new();
        let registration = registry.register(7).await;
        registry.disconnect(7, registration.connection_id).await;

        assert_eq!(
            registry.send_to_user(7, message("Hamlet")).await,
            PushDelivery::Queued
        );
    }
}
