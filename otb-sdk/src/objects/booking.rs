//! Booking request/response bodies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Active,
    Inactive,
}

/// Whether the ticket's seat is claimed.
///
/// Kept separate from [`TicketStatus`] so a completed seance leaves the
/// seat claim in place as a historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatOccupancy {
    Occupied,
    Free,
}

/// `POST /seances/{seance_id}/seats/{seat_id}/book` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSeatRequest {
    pub user_id: i64,
}

/// A booked ticket as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket_id: i64,
    pub seance_id: i64,
    pub seat_id: i64,
    pub user_id: i64,
    pub status: TicketStatus,
    pub seat_status: SeatOccupancy,
    pub total_price: Decimal,
    /// Unix timestamp (UTC) of the purchase.
    pub purchased_at: i64,
}

/// `GET /seances/{seance_id}/seats` response: seats with a live claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupiedSeatsResponse {
    pub seance_id: i64,
    pub seat_ids: Vec<i64>,
}
