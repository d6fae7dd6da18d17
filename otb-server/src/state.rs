//! Application state shared across all request handlers.

use otb_core::booking::BookingService;
use otb_core::lifecycle::LifecycleService;
use otb_core::push::PushRegistry;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (services hold pool
/// clones, the registry is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Seat booking service.
    pub booking: BookingService,
    /// Manager lifecycle commands.
    pub lifecycle: LifecycleService,
    /// Live push connection registry.
    pub push: Arc<PushRegistry>,
    /// Interval between liveness pings on push connections.
    pub ping_interval: std::time::Duration,
}

impl AppState {
    pub fn new(
        booking: BookingService,
        lifecycle: LifecycleService,
        push: Arc<PushRegistry>,
        ping_interval: std::time::Duration,
    ) -> Self {
        Self {
            booking,
            lifecycle,
            push,
            ping_interval,
        }
    }
}
