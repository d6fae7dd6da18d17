//! Notification payloads for seance lifecycle events.
//!
//! The same payload is pushed as JSON over the WebSocket stream and
//! rendered to plain text for the messenger channel, so both delivery
//! paths agree on what happened.
//!
//! Serialized as an internally-tagged JSON object:
//!
//! ```json
//! {"kind":"cancellation","show_title":"Hamlet","theatre_name":"Globe","starts_at":"2026-03-01 19:00:00"}
//! ```

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Human-facing date/time rendering for notification text.
const WHEN_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// What happened to a seance, from the ticket holder's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// The seance was cancelled outright.
    Cancellation {
        show_title: String,
        theatre_name: String,
        starts_at: PrimitiveDateTime,
    },

    /// The seance was moved to a different time.
    Reschedule {
        show_title: String,
        old_starts_at: PrimitiveDateTime,
        new_starts_at: PrimitiveDateTime,
    },

    /// A different show will be performed in the same slot.
    ShowChange {
        old_show_title: String,
        new_show_title: String,
        starts_at: PrimitiveDateTime,
    },

    /// First-ever seance of a show was scheduled.
    Premiere {
        show_title: String,
        theatre_name: String,
        starts_at: PrimitiveDateTime,
    },
}

impl NotificationPayload {
    /// Render the payload as a plain-text message for the messenger channel.
    pub fn to_text(&self) -> String {
        match self {
            NotificationPayload::Cancellation {
                show_title,
                theatre_name,
                starts_at,
            } => format!(
                "The performance of \"{show_title}\" at {theatre_name} on {} has been cancelled.",
                render_when(*starts_at)
            ),
            NotificationPayload::Reschedule {
                show_title,
                old_starts_at,
                new_starts_at,
            } => format!(
                "The performance of \"{show_title}\" has been moved from {} to {}.",
                render_when(*old_starts_at),
                render_when(*new_starts_at)
            ),
            NotificationPayload::ShowChange {
                old_show_title,
                new_show_title,
                starts_at,
            } => format!(
                "The performance on {} has changed: \"{new_show_title}\" will be staged instead of \"{old_show_title}\".",
                render_when(*starts_at)
            ),
            NotificationPayload::Premiere {
                show_title,
                theatre_name,
                starts_at,
            } => format!(
                "Premiere: \"{show_title}\" opens at {theatre_name} on {}.",
                render_when(*starts_at)
            ),
        }
    }
}

fn render_when(when: PrimitiveDateTime) -> String {
    when.format(WHEN_FORMAT).unwrap_or_else(|_| when.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_cancellation_text() {
        let payload = NotificationPayload::Cancellation {
            show_title: "Hamlet".into(),
            theatre_name: "Globe".into(),
            starts_at: datetime!(2026-03-01 19:00),
        };
        assert_eq!(
            payload.to_text(),
            "The performance of \"Hamlet\" at Globe on 2026-03-01 19:00 has been cancelled."
        );
    }

    #[test]
    fn test_reschedule_text_carries_both_times() {
        let payload = NotificationPayload::Reschedule {
            show_title: "Hamlet".into(),
            old_starts_at: datetime!(2026-03-01 19:00),
            new_starts_at: datetime!(2026-03-08 18:30),
        };
        let text = payload.to_text();
        assert!(text.contains("2026-03-01 19:00"));
        assert!(text.contains("2026-03-08 18:30"));
    }

    #[test]
    fn test_serde_tag_shape() {
        let payload = NotificationPayload::Premiere {
            show_title: "Faust".into(),
            theatre_name: "Mariinsky".into(),
            starts_at: datetime!(2026-05-20 20:00),
        };
        let json = serde_json::to_value(&payload).expect("serializes");
        assert_eq!(json["kind"], "premiere");
        assert_eq!(json["show_title"], "Faust");
    }
}
