//! Notification dispatcher.
//!
//! Receives lifecycle events from the command handlers and fans each one
//! out to its audience over two independent channels: the live push
//! registry and the async messaging channel. Per (event, user):
//!
//! 1. Skip if the dedup ledger already records the pair.
//! 2. Attempt both channels; neither blocks the other, and the external
//!    channel is time-bounded so a stalled provider cannot stall the
//!    dispatcher.
//! 3. Record the pair after any successful attempt.
//!
//! Channel failures are logged here and retried by nobody; the push
//! channel's offline queue and the provider's own semantics are the only
//! redelivery mechanisms.

use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use otb_sdk::objects::WsServerMessage;

use crate::entities::notification_record::NotificationRecord;
use crate::entities::UserId;
use crate::events::{Audience, LifecycleEvent, LifecycleEventReceiver};
use crate::messaging::{MessagingChannel, MessagingOutcome};
use crate::push::{PushDelivery, PushRegistry};

/// Upper bound on one external delivery attempt.
pub const DELIVERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// NotificationDispatcher fans lifecycle events out to affected users.
pub struct NotificationDispatcher {
    pool: PgPool,
    registry: Arc<PushRegistry>,
    messaging: MessagingChannel,
    event_rx: LifecycleEventReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl NotificationDispatcher {
    pub fn new(
        pool: PgPool,
        registry: Arc<PushRegistry>,
        messaging: MessagingChannel,
        event_rx: LifecycleEventReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pool,
            registry,
            messaging,
            event_rx,
            shutdown_rx,
        }
    }

    /// Run the NotificationDispatcher until shutdown is signaled.
    pub async fn run(mut self) {
        info!("NotificationDispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("NotificationDispatcher received shutdown signal");
                        break;
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.dispatch(event).await {
                        error!(error = %e, "failed to dispatch lifecycle event");
                    }
                }

                else => {
                    info!("lifecycle event channel closed");
                    break;
                }
            }
        }

        info!("NotificationDispatcher shutdown complete");
    }

    /// Fan one event out to its audience.
    async fn dispatch(&self, event: LifecycleEvent) -> Result<(), sqlx::Error> {
        let (targets, push_eligible) = match &event.audience {
            Audience::Users(ids) => (ids.clone(), true),
            // Broadcasts go out on the messaging channel only: there is
            // no ticket-holder relationship to push over.
            Audience::Subscribers => (self.messaging.subscriber_ids().await?, false),
        };

        debug!(
            event_id = %event.event_id,
            kind = event.change.kind(),
            targets = targets.len(),
            "dispatching lifecycle event"
        );

        for user_id in targets {
            if let Err(e) = self.dispatch_to_user(&event, user_id, push_eligible).await {
                // One user's failure must not starve the rest of the
                // audience.
                error!(
                    event_id = %event.event_id,
                    user_id,
                    error = %e,
                    "dispatch to user failed"
                );
            }
        }

        Ok(())
    }

    async fn dispatch_to_user(
        &self,
        event: &LifecycleEvent,
        user_id: UserId,
        push_eligible: bool,
    ) -> Result<(), sqlx::Error> {
        if NotificationRecord::exists(&self.pool, event.event_id, user_id).await? {
            debug!(event_id = %event.event_id, user_id, "already dispatched, skipping");
            return Ok(());
        }

        let payload = event.change.payload();
        let mut delivered = false;

        if push_eligible {
            let frame = WsServerMessage::Notification {
                event_id: event.event_id,
                payload: payload.clone(),
            };
            // Queued counts as success: the queue guarantees flush on
            // the user's next connection.
            match self.registry.send_to_user(user_id, frame).await {
                PushDelivery::Sent | PushDelivery::Queued => delivered = true,
            }
        }

        let text = payload.to_text();
        match timeout(DELIVERY_TIMEOUT, self.messaging.deliver(user_id, &text)).await {
            Ok(Ok(MessagingOutcome::Delivered)) => delivered = true,
            Ok(Ok(MessagingOutcome::NoIdentity | MessagingOutcome::Failed)) => {}
            Ok(Err(e)) => {
                warn!(
                    event_id = %event.event_id,
                    user_id,
                    error = %e,
                    "messaging channel lookup failed"
                );
            }
            Err(_) => {
                warn!(
                    event_id = %event.event_id,
                    user_id,
                    "messaging delivery timed out"
                );
            }
        }

        if delivered {
            NotificationRecord::record(&self.pool, event.event_id, user_id).await?;
        }

        Ok(())
    }
}
