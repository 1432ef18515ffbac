//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ChannelId, Coordinate, Place, RideId, RideStatus, Role},
    infrastructure::dto::websocket::{
        ActiveRideRequestsMessage, ClientMessage, ConnectionSuccessMessage, CoordinateDto,
        DriverLocationUpdatedMessage, MessageType, NewRideRequestMessage,
        RideAcceptConfirmedMessage, RideAcceptErrorMessage, RideAcceptedMessage,
        RideCancelledMessage, RideCompletedMessage, RideRequestClosedMessage,
        RideRequestConfirmedMessage, RideRequestDto, StatusUpdatedMessage,
    },
    ui::{auth::Identity, state::AppState},
};
use noriba_shared::time::get_utc_timestamp;

use serde::Deserialize;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Verify the identity assertion before accepting the upgrade
    let identity = match state.identity_verifier.verify(&query.token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Rejected WebSocket connection: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // Use ConnectSessionUseCase to handle connection
    // (register is called inside the UseCase)
    let (channel_id, _connected_at) = state
        .connect_session_usecase
        .execute(identity.party_id.clone(), identity.role, tx.clone())
        .await;

    tracing::info!(
        "Party '{}' ({}) connected on channel '{}'",
        identity.party_id.as_str(),
        identity.role.as_str(),
        channel_id.as_str()
    );
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity, rx, tx, channel_id)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: messages addressed to this
/// party (via rx channel) are sent to this connection's WebSocket.
///
/// # Arguments
///
/// * `rx` - Channel receiver for messages addressed to this connection
/// * `sender` - WebSocket sink to send messages to this connection
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this connection
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    identity: Identity,
    rx: mpsc::UnboundedReceiver<String>,
    tx: mpsc::UnboundedSender<String>,
    channel_id: ChannelId,
) {
    let (mut sender, mut receiver) = socket.split();
    let party_id_str = identity.party_id.as_str().to_string();

    // Send connection greeting to the newly connected party
    {
        let success_msg = ConnectionSuccessMessage {
            r#type: MessageType::ConnectionSuccess,
            status: "connected".to_string(),
            party_id: party_id_str.clone(),
            role: identity.role.as_str().to_string(),
        };

        let success_json = serde_json::to_string(&success_msg).unwrap();
        if let Err(e) = sender.send(Message::Text(success_json.into())).await {
            tracing::error!(
                "Failed to send connection greeting to '{}': {}",
                party_id_str,
                e
            );
            state.disconnect_session_usecase.execute(&channel_id).await;
            return;
        }
    }

    // Back-fill the open marketplace for a driver joining mid-stream
    if identity.role == Role::Driver {
        match state.list_active_requests_usecase.execute().await {
            Ok(pending) => {
                let requests: Vec<RideRequestDto> =
                    pending.iter().map(RideRequestDto::from).collect();
                let count = requests.len();
                let backfill_msg = ActiveRideRequestsMessage {
                    r#type: MessageType::ActiveRideRequests,
                    requests,
                };

                let backfill_json = serde_json::to_string(&backfill_msg).unwrap();
                if let Err(e) = sender.send(Message::Text(backfill_json.into())).await {
                    tracing::error!("Failed to send back-fill to '{}': {}", party_id_str, e);
                    state.disconnect_session_usecase.execute(&channel_id).await;
                    return;
                }
                tracing::info!(
                    "Sent {} active ride request(s) to driver '{}'",
                    count,
                    party_id_str
                );
            }
            Err(e) => {
                tracing::error!("Failed to list active ride requests: {}", e);
            }
        }
    }

    let identity_clone = identity.clone();
    let state_clone = state.clone();

    // Spawn a task to receive messages from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // Parse the incoming message into the typed union
                    let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(msg) => msg,
                        Err(e) => {
                            tracing::warn!("Rejected unparseable message: {}", e);
                            continue;
                        }
                    };

                    handle_client_message(&state_clone, &identity_clone, &tx, client_msg).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Party '{}' requested close",
                        identity_clone.party_id.as_str()
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to receive messages addressed to this party and push them out
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Use DisconnectSessionUseCase to handle disconnection.
    // Ride request state is untouched; an in-flight ride survives the drop.
    state.disconnect_session_usecase.execute(&channel_id).await;
    tracing::info!(
        "Party '{}' disconnected, channel '{}' removed",
        party_id_str,
        channel_id.as_str()
    );
}

/// Dispatch one parsed client message.
///
/// `identity` is the verified connection identity; any party id a payload
/// might have tried to smuggle in was already dropped during parsing.
/// `ack_tx` feeds this connection's own pusher loop for acks and errors.
async fn handle_client_message(
    state: &Arc<AppState>,
    identity: &Identity,
    ack_tx: &mpsc::UnboundedSender<String>,
    message: ClientMessage,
) {
    match message {
        ClientMessage::UserRideRequest {
            user_name,
            user_phone,
            pickup_location,
            drop_location,
            distance,
            fare,
        } => {
            if identity.role != Role::User {
                tracing::warn!(
                    "Ignoring ride request from non-user party '{}'",
                    identity.party_id.as_str()
                );
                send_ride_request_confirmed(ack_tx, Err("Only users can request rides"));
                return;
            }

            // Boundary validation: DTO -> Domain Model
            let places = Place::try_from(pickup_location)
                .and_then(|pickup| Place::try_from(drop_location).map(|drop| (pickup, drop)));
            let (pickup, drop) = match places {
                Ok(places) => places,
                Err(e) => {
                    tracing::warn!("Invalid ride request location: {}", e);
                    send_ride_request_confirmed(ack_tx, Err("Invalid pickup or drop location"));
                    return;
                }
            };

            match state
                .submit_request_usecase
                .execute(
                    identity.party_id.clone(),
                    user_name,
                    user_phone,
                    pickup,
                    drop,
                    distance,
                    fare,
                )
                .await
            {
                Ok(ride) => {
                    let new_ride_msg = NewRideRequestMessage {
                        r#type: MessageType::NewRideRequest,
                        request: RideRequestDto::from(&ride),
                    };
                    let new_ride_json = serde_json::to_string(&new_ride_msg).unwrap();
                    let delivered = state
                        .submit_request_usecase
                        .broadcast_to_drivers(&new_ride_json)
                        .await;
                    tracing::info!(
                        "Broadcasted ride request '{}' to {} driver channel(s)",
                        ride.id.as_str(),
                        delivered
                    );
                    send_ride_request_confirmed(ack_tx, Ok(ride.id.as_str()));
                }
                Err(e) => {
                    tracing::error!("Failed to submit ride request: {}", e);
                    send_ride_request_confirmed(ack_tx, Err("Failed to create ride request"));
                }
            }
        }
        ClientMessage::DriverAcceptRide {
            ride_id,
            driver_name,
            driver_phone,
            driver_rating,
            vehicle_make,
            vehicle_model,
            license_plate,
        } => {
            if identity.role != Role::Driver {
                tracing::warn!(
                    "Ignoring accept attempt from non-driver party '{}'",
                    identity.party_id.as_str()
                );
                send_json(
                    ack_tx,
                    &RideAcceptErrorMessage {
                        r#type: MessageType::RideAcceptError,
                        message: "Only drivers can accept rides".to_string(),
                    },
                );
                return;
            }

            let ride_id = RideId::from_string(ride_id);
            match state
                .accept_request_usecase
                .execute(ride_id.clone(), identity.party_id.clone())
                .await
            {
                Ok(ride) => {
                    // Winner path: tell the user, close the offer for everyone else
                    let accepted_msg = RideAcceptedMessage {
                        r#type: MessageType::RideAccepted,
                        ride_id: ride.id.as_str().to_string(),
                        driver_id: identity.party_id.as_str().to_string(),
                        driver_name,
                        driver_phone,
                        driver_rating,
                        vehicle_make,
                        vehicle_model,
                        license_plate,
                        timestamp: get_utc_timestamp(),
                    };
                    let accepted_json = serde_json::to_string(&accepted_msg).unwrap();
                    state
                        .accept_request_usecase
                        .notify_user(&ride, &accepted_json)
                        .await;

                    let closed_msg = RideRequestClosedMessage {
                        r#type: MessageType::RideRequestClosed,
                        ride_id: ride.id.as_str().to_string(),
                    };
                    let closed_json = serde_json::to_string(&closed_msg).unwrap();
                    state
                        .accept_request_usecase
                        .notify_drivers_closed(&closed_json)
                        .await;

                    send_json(
                        ack_tx,
                        &RideAcceptConfirmedMessage {
                            r#type: MessageType::RideAcceptConfirmed,
                            success: true,
                            ride_id: ride.id.as_str().to_string(),
                        },
                    );
                }
                Err(e) => {
                    // Losing a race is the expected outcome for all but one driver
                    tracing::info!(
                        "Driver '{}' could not accept ride '{}': {}",
                        identity.party_id.as_str(),
                        ride_id.as_str(),
                        e
                    );
                    send_json(
                        ack_tx,
                        &RideAcceptErrorMessage {
                            r#type: MessageType::RideAcceptError,
                            message: e.driver_message().to_string(),
                        },
                    );
                }
            }
        }
        ClientMessage::UpdateDriverLocation { ride_id, location } => {
            if identity.role != Role::Driver {
                tracing::warn!(
                    "Ignoring location report from non-driver party '{}'",
                    identity.party_id.as_str()
                );
                return;
            }

            let coordinate = match Coordinate::try_from(location) {
                Ok(coordinate) => coordinate,
                Err(e) => {
                    tracing::warn!("Rejected location report: {}", e);
                    return;
                }
            };

            let ride_id = ride_id.map(RideId::from_string);
            let relay_json = match &ride_id {
                Some(rid) => serde_json::to_string(&DriverLocationUpdatedMessage {
                    r#type: MessageType::DriverLocationUpdated,
                    ride_id: rid.as_str().to_string(),
                    location: CoordinateDto::from(coordinate),
                    timestamp: get_utc_timestamp(),
                })
                .unwrap(),
                None => String::new(),
            };

            state
                .report_location_usecase
                .execute(&identity.party_id, coordinate, ride_id, &relay_json)
                .await;
        }
        ClientMessage::UpdateRideStatus {
            ride_id,
            status,
            reason,
        } => {
            let target = match status.as_str() {
                "completed" => RideStatus::Completed,
                "cancelled" => RideStatus::Cancelled,
                other => {
                    tracing::warn!("Rejected unsupported status target '{}'", other);
                    send_json(
                        ack_tx,
                        &StatusUpdatedMessage {
                            r#type: MessageType::StatusUpdated,
                            success: false,
                        },
                    );
                    return;
                }
            };

            let ride_id = RideId::from_string(ride_id);
            match state
                .update_ride_status_usecase
                .execute(ride_id, &identity.party_id, target, reason.clone())
                .await
            {
                Ok(ride) => {
                    let notify_json = match target {
                        RideStatus::Completed => serde_json::to_string(&RideCompletedMessage {
                            r#type: MessageType::RideCompleted,
                            ride_id: ride.id.as_str().to_string(),
                            timestamp: get_utc_timestamp(),
                        })
                        .unwrap(),
                        _ => serde_json::to_string(&RideCancelledMessage {
                            r#type: MessageType::RideCancelled,
                            ride_id: ride.id.as_str().to_string(),
                            reason,
                            timestamp: get_utc_timestamp(),
                        })
                        .unwrap(),
                    };
                    state
                        .update_ride_status_usecase
                        .notify_parties(&ride, &notify_json)
                        .await;

                    // Withdraw the offer from driver UIs if it was still open
                    if target == RideStatus::Cancelled && ride.driver_id.is_none() {
                        let closed_json = serde_json::to_string(&RideRequestClosedMessage {
                            r#type: MessageType::RideRequestClosed,
                            ride_id: ride.id.as_str().to_string(),
                        })
                        .unwrap();
                        state
                            .accept_request_usecase
                            .notify_drivers_closed(&closed_json)
                            .await;
                    }

                    send_json(
                        ack_tx,
                        &StatusUpdatedMessage {
                            r#type: MessageType::StatusUpdated,
                            success: true,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to update ride status: {}", e);
                    send_json(
                        ack_tx,
                        &StatusUpdatedMessage {
                            r#type: MessageType::StatusUpdated,
                            success: false,
                        },
                    );
                }
            }
        }
        ClientMessage::UpdateDriverStatus {
            is_online,
            location,
        } => {
            if identity.role != Role::Driver {
                tracing::warn!(
                    "Ignoring status update from non-driver party '{}'",
                    identity.party_id.as_str()
                );
                return;
            }

            let coordinate = match location.map(Coordinate::try_from).transpose() {
                Ok(coordinate) => coordinate,
                Err(e) => {
                    tracing::warn!("Rejected status update location: {}", e);
                    send_json(
                        ack_tx,
                        &StatusUpdatedMessage {
                            r#type: MessageType::StatusUpdated,
                            success: false,
                        },
                    );
                    return;
                }
            };

            let success = state
                .update_driver_status_usecase
                .execute(&identity.party_id, is_online, coordinate)
                .await
                .is_ok();
            send_json(
                ack_tx,
                &StatusUpdatedMessage {
                    r#type: MessageType::StatusUpdated,
                    success,
                },
            );
        }
    }
}

fn send_ride_request_confirmed(
    ack_tx: &mpsc::UnboundedSender<String>,
    result: Result<&str, &str>,
) {
    let msg = match result {
        Ok(ride_id) => RideRequestConfirmedMessage {
            r#type: MessageType::RideRequestConfirmed,
            success: true,
            ride_id: Some(ride_id.to_string()),
            error: None,
        },
        Err(error) => RideRequestConfirmedMessage {
            r#type: MessageType::RideRequestConfirmed,
            success: false,
            ride_id: None,
            error: Some(error.to_string()),
        },
    };
    send_json(ack_tx, &msg);
}

fn send_json<T: serde::Serialize>(ack_tx: &mpsc::UnboundedSender<String>, message: &T) {
    let json = serde_json::to_string(message).unwrap();
    // The pusher loop may already be gone on a racing disconnect
    let _ = ack_tx.send(json);
}
