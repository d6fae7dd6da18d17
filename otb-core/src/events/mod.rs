//! Event plumbing between lifecycle commands and notification delivery.
//!
//! # Event Flow
//!
//! 1. A manager command (cancel / update / add) computes its affected
//!    user set, applies the state change, and emits a [`LifecycleEvent`].
//! 2. The `NotificationDispatcher` receives the event and fans it out to
//!    the live push channel and the async messaging channel, deduplicating
//!    per (event, user).
//!
//! Commands never await delivery: sending on the channel is the whole of
//! their notification obligation.

pub mod channels;
pub mod types;

pub use channels::{
    lifecycle_event_channel, LifecycleEventReceiver, LifecycleEventSender, DEFAULT_CHANNEL_BUFFER,
};
pub use types::{Audience, LifecycleEvent, SeanceChange};
