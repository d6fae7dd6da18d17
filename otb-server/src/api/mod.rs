//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `POST /seances/{seance_id}/seats/{seat_id}/book` – book a seat
//! - `GET  /seances/{seance_id}/seats`                – occupied seat ids
//! - `POST /seances`                                  – schedule a seance
//! - `PUT  /seances/{seance_id}`                      – update a seance
//! - `PUT  /seances/{seance_id}/cancel`               – cancel a seance
//! - `GET  /users/{user_id}/ws`                       – live push stream
//!
//! Authentication lives in front of this service; manager and user ids
//! arrive as trusted request fields.

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use otb_core::booking::BookingError;
use otb_core::entities::seance::Seance;
use otb_core::entities::ticket::Ticket;
use otb_core::lifecycle::CommandError;
use otb_sdk::objects::{SeanceResponse, TicketResponse};

use crate::state::AppState;

mod booking;
mod manager;
mod ws;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/seances/{seance_id}/seats/{seat_id}/book",
            post(booking::book_seat),
        )
        .route("/seances/{seance_id}/seats", get(booking::occupied_seats))
        .route("/seances", post(manager::add_seance))
        .route("/seances/{seance_id}", put(manager::update_seance))
        .route("/seances/{seance_id}/cancel", put(manager::cancel_seance))
        .route("/users/{user_id}/ws", get(ws::user_push_ws))
}

/// Convert a `Ticket` (DB model) into a `TicketResponse` (API model).
fn to_ticket_response(ticket: &Ticket) -> TicketResponse {
    TicketResponse {
        ticket_id: ticket.id,
        seance_id: ticket.seance_id,
        seat_id: ticket.seat_id,
        user_id: ticket.user_id,
        status: ticket.status.into(),
        seat_status: ticket.seat_status.into(),
        total_price: ticket.total_price,
        purchased_at: ticket.purchased_at.assume_utc().unix_timestamp(),
    }
}

/// Convert a `Seance` (DB model) into a `SeanceResponse` (API model).
fn to_seance_response(seance: &Seance) -> SeanceResponse {
    SeanceResponse {
        seance_id: seance.id,
        theatre_id: seance.theatre_id,
        show_id: seance.show_id,
        starts_at: seance.starts_at,
        ends_at: seance.ends_at,
        status: seance.status.into(),
    }
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors surfaced by API handlers.
#[derive(Debug)]
enum ApiError {
    Booking(BookingError),
    Command(CommandError),
}

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        Self::Booking(e)
    }
}

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Booking(e) => booking_status(e),
            ApiError::Command(e) => command_status(e),
        };
        (status, message).into_response()
    }
}

fn booking_status(e: BookingError) -> (StatusCode, String) {
    match e {
        BookingError::Database(ref inner) => {
            tracing::error!(error = %inner, "booking database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
            )
        }
        BookingError::SeanceNotFound(_)
        | BookingError::SeatNotFound(_)
        | BookingError::ShowNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        BookingError::SeanceNotBookable(_) => (StatusCode::CONFLICT, e.to_string()),
        BookingError::SeatTaken { .. } => (StatusCode::CONFLICT, e.to_string()),
    }
}

fn command_status(e: CommandError) -> (StatusCode, String) {
    match e {
        CommandError::Database(ref inner) => {
            tracing::error!(error = %inner, "lifecycle command database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
            )
        }
        CommandError::SeanceNotFound(_)
        | CommandError::TheatreNotFound(_)
        | CommandError::ShowNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        CommandError::Forbidden { .. } => (StatusCode::FORBIDDEN, e.to_string()),
        CommandError::Schedule(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        CommandError::Overlapping(_) | CommandError::NotScheduled(_) => {
            (StatusCode::CONFLICT, e.to_string())
        }
    }
}
