//! Seance request/response bodies for the manager API.

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

/// Lifecycle state of a seance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeanceStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// A seance as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeanceResponse {
    pub seance_id: i64,
    pub theatre_id: i64,
    pub show_id: i64,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub status: SeanceStatus,
}

/// `POST /seances` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSeanceRequest {
    pub manager_id: i64,
    pub theatre_id: i64,
    pub show_id: i64,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
}

/// `PUT /seances/{seance_id}` request body.
///
/// Carries the full new shape of the seance; the server works out which
/// notifications follow from the delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSeanceRequest {
    pub manager_id: i64,
    pub theatre_id: i64,
    pub show_id: i64,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub status: SeanceStatus,
}

/// `PUT /seances/{seance_id}/cancel` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSeanceRequest {
    pub manager_id: i64,
}
