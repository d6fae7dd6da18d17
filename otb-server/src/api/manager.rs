use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use otb_core::lifecycle::{AddSeance, UpdateSeance};
use otb_sdk::objects::{AddSeanceRequest, CancelSeanceRequest, UpdateSeanceRequest};

use super::{ApiError, to_seance_response};
use crate::state::AppState;

/// `POST /seances` — schedule a new seance.
///
/// The first seance of a show triggers a premiere announcement to the
/// messaging channel's subscribers.
pub(super) async fn add_seance(
    state: State<AppState>,
    Json(body): Json<AddSeanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let seance = state
        .lifecycle
        .add_seance(AddSeance {
            manager_id: body.manager_id,
            theatre_id: body.theatre_id,
            show_id: body.show_id,
            starts_at: body.starts_at,
            ends_at: body.ends_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(to_seance_response(&seance))))
}

/// `PUT /seances/{seance_id}` — update a scheduled seance.
///
/// Ticket holders are notified of a moved start time and of a swapped
/// show; each independently of the other.
pub(super) async fn update_seance(
    state: State<AppState>,
    Path(seance_id): Path<i64>,
    Json(body): Json<UpdateSeanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let seance = state
        .lifecycle
        .update_seance(UpdateSeance {
            seance_id,
            manager_id: body.manager_id,
            theatre_id: body.theatre_id,
            show_id: body.show_id,
            starts_at: body.starts_at,
            ends_at: body.ends_at,
            status: body.status.into(),
        })
        .await?;

    Ok(Json(to_seance_response(&seance)))
}

/// `PUT /seances/{seance_id}/cancel` — cancel a scheduled seance.
///
/// Every holder of an active ticket is notified once.
pub(super) async fn cancel_seance(
    state: State<AppState>,
    Path(seance_id): Path<i64>,
    Json(body): Json<CancelSeanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let seance = state
        .lifecycle
        .cancel_seance(seance_id, body.manager_id)
        .await?;

    Ok(Json(to_seance_response(&seance)))
}
