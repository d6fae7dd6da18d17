use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tokio::time::MissedTickBehavior;

use otb_sdk::objects::WsCloseCode;

use crate::state::AppState;

/// `GET /users/{user_id}/ws` — live push notification stream.
///
/// Registers the connection with the push registry, which flushes any
/// messages queued while the user was offline, then relays events as
/// they arrive. Opening a second connection for the same user closes
/// this one with [`WsCloseCode::REPLACED`].
pub(super) async fn user_push_ws(
    state: State<AppState>,
    Path(user_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_push_socket(socket, app_state, user_id))
}

/// Background task that drives a single push connection.
///
/// Three things race in the loop:
/// - frames from the registry, forwarded to the socket;
/// - a liveness ticker that pings and closes stale connections;
/// - client frames, of which only pong and close matter.
async fn handle_push_socket(mut socket: WebSocket, state: AppState, user_id: i64) {
    let mut registration = state.push.register(user_id).await;
    let connection_id = registration.connection_id;

    tracing::debug!(user_id, connection_id, "push connection registered");

    let mut ping_timer = tokio::time::interval(state.ping_interval);
    ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first
    // ping goes out a full interval after connect.
    ping_timer.tick().await;

    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            maybe_frame = registration.receiver.recv() => {
                match maybe_frame {
                    Some(frame) => {
                        if send_json(&mut socket, &frame).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // A newer connection took over this user's slot.
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: WsCloseCode::REPLACED,
                                reason: "connection replaced".into(),
                            })))
                            .await;
                        // The replacement owns the slot; nothing to detach.
                        return;
                    }
                }
            }

            _ = ping_timer.tick() => {
                if awaiting_pong {
                    tracing::debug!(user_id, connection_id, "push connection stale, closing");
                    let _ = socket
                        .send(Message::Close(Some(CloseFrame {
                            code: WsCloseCode::STALE,
                            reason: "ping timeout".into(),
                        })))
                        .await;
                    break;
                }
                if socket.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
                awaiting_pong = true;
            }

            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Pong(_))) => {
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => {
                        break;
                    }
                }
            }
        }
    }

    state.push.disconnect(user_id, connection_id).await;
    tracing::debug!(user_id, connection_id, "push connection closed");
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
