//! Lifecycle event types.

use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::entities::UserId;
use otb_sdk::objects::NotificationPayload;

/// Who a lifecycle event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// The affected user set computed by the command that emitted the
    /// event (ticket holders at the moment of the command).
    Users(Vec<UserId>),
    /// Every user subscribed to announcements on the messaging channel.
    /// Resolved at dispatch time; premiere announcements use this since
    /// no tickets exist yet.
    Subscribers,
}

/// What changed about a seance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeanceChange {
    Cancellation {
        show_title: String,
        theatre_name: String,
        starts_at: PrimitiveDateTime,
    },
    Reschedule {
        show_title: String,
        old_starts_at: PrimitiveDateTime,
        new_starts_at: PrimitiveDateTime,
    },
    ShowChange {
        old_show_title: String,
        new_show_title: String,
        starts_at: PrimitiveDateTime,
    },
    Premiere {
        show_title: String,
        theatre_name: String,
        starts_at: PrimitiveDateTime,
    },
}

impl SeanceChange {
    /// The wire payload delivered on both channels.
    pub fn payload(&self) -> NotificationPayload {
        match self {
            SeanceChange::Cancellation {
                show_title,
                theatre_name,
                starts_at,
            } => NotificationPayload::Cancellation {
                show_title: show_title.clone(),
                theatre_name: theatre_name.clone(),
                starts_at: *starts_at,
            },
            SeanceChange::Reschedule {
                show_title,
                old_starts_at,
                new_starts_at,
            } => NotificationPayload::Reschedule {
                show_title: show_title.clone(),
                old_starts_at: *old_starts_at,
                new_starts_at: *new_starts_at,
            },
            SeanceChange::ShowChange {
                old_show_title,
                new_show_title,
                starts_at,
            } => NotificationPayload::ShowChange {
                old_show_title: old_show_title.clone(),
                new_show_title: new_show_title.clone(),
                starts_at: *starts_at,
            },
            SeanceChange::Premiere {
                show_title,
                theatre_name,
                starts_at,
            } => NotificationPayload::Premiere {
                show_title: show_title.clone(),
                theatre_name: theatre_name.clone(),
                starts_at: *starts_at,
            },
        }
    }

    /// Short tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SeanceChange::Cancellation { .. } => "cancellation",
            SeanceChange::Reschedule { .. } => "reschedule",
            SeanceChange::ShowChange { .. } => "show_change",
            SeanceChange::Premiere { .. } => "premiere",
        }
    }
}

/// One notifiable change to a seance, addressed to an audience.
///
/// The `event_id` is minted once by the emitting command and shared by
/// every recipient; the dedup ledger keys on (event_id, user), so a
/// re-dispatched event skips users it already reached.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub event_id: Uuid,
    pub audience: Audience,
    pub change: SeanceChange,
}

impl LifecycleEvent {
    pub fn new(audience: Audience, change: SeanceChange) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            audience,
            change,
        }
    }
}
