//! Event channel factory and handles.

use super::types::LifecycleEvent;
use tokio::sync::mpsc;

/// Default buffer size for the lifecycle event channel.
///
/// Enough to absorb a burst of manager actions while keeping memory
/// bounded; a full buffer back-pressures the emitting command briefly
/// rather than dropping events.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for lifecycle events.
pub type LifecycleEventSender = mpsc::Sender<LifecycleEvent>;
/// Receiver handle for lifecycle events.
pub type LifecycleEventReceiver = mpsc::Receiver<LifecycleEvent>;

/// Create the lifecycle event channel.
///
/// Returns a (sender, receiver) pair; the sender is cloned into every
/// command service, the receiver is owned by the dispatcher.
pub fn lifecycle_event_channel() -> (LifecycleEventSender, LifecycleEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
