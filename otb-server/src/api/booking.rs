use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use otb_sdk::objects::{BookSeatRequest, OccupiedSeatsResponse};

use super::{ApiError, to_ticket_response};
use crate::state::AppState;

/// `POST /seances/{seance_id}/seats/{seat_id}/book` — book a seat.
///
/// Exactly one of any number of concurrent requests for the same seat
/// wins; the rest receive `409 Conflict` naming the row and seat.
pub(super) async fn book_seat(
    state: State<AppState>,
    Path((seance_id, seat_id)): Path<(i64, i64)>,
    Json(body): Json<BookSeatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = state
        .booking
        .book_seat(seance_id, seat_id, body.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(to_ticket_response(&ticket))))
}

/// `GET /seances/{seance_id}/seats` — ids of seats with a live claim.
pub(super) async fn occupied_seats(
    state: State<AppState>,
    Path(seance_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let seat_ids = state.booking.occupied_seats(seance_id).await?;

    Ok(Json(OccupiedSeatsResponse {
        seance_id,
        seat_ids,
    }))
}
