//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use noriba_server::infrastructure::dto::websocket::{
    ActiveRideRequestsMessage, DriverLocationUpdatedMessage, NewRideRequestMessage,
    RideAcceptConfirmedMessage, RideAcceptErrorMessage, RideAcceptedMessage, RideCancelledMessage,
    RideCompletedMessage, RideRequestClosedMessage, RideRequestConfirmedMessage,
    StatusUpdatedMessage,
};

use crate::{
    command,
    domain::{Profile, Role},
    error::ClientError,
};

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

/// Run the WebSocket client session
pub async fn run_client_session(
    url: &str,
    token: &str,
    role: Role,
    profile: &Profile,
) -> Result<(), Box<dyn std::error::Error>> {
    // Construct URL with the identity token as query parameter
    let url = format!("{}?token={}", url, token);

    let (ws_stream, response) = match connect_async(&url).await {
        Ok(result) => result,
        Err(e) => {
            // Check if it's an HTTP error response
            let error_msg = e.to_string();

            // Check for HTTP 401 Unauthorized
            if error_msg.contains("401") || error_msg.contains("Unauthorized") {
                return Err(Box::new(ClientError::AuthRejected(token.to_string())));
            }

            return Err(Box::new(ClientError::ConnectionError(error_msg)));
        }
    };

    // Check HTTP status code from response
    if response.status().as_u16() == 401 {
        return Err(Box::new(ClientError::AuthRejected(token.to_string())));
    }

    tracing::info!("Connected to dispatch server!");
    let party_id = token.split_once(':').map(|(_, id)| id).unwrap_or(token);
    println!(
        "\nYou are '{}' ({}). Type 'help' for commands. Press Ctrl+C to exit.\n",
        party_id,
        role.as_str()
    );

    let (mut write, mut read) = ws_stream.split();

    // Clone party_id for read task
    let party_id_for_read = party_id.to_string();

    // Spawn a task to handle incoming messages
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let formatted = render_server_message(&text);
                    print!("{}", formatted);
                    redisplay_prompt(&party_id_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let party_id_for_prompt = party_id.to_string();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", party_id_for_prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to parse commands and send them to the server
    let profile = profile.clone();
    let party_id_for_write = party_id.to_string();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let parsed = match command::parse(role, &line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    redisplay_prompt(&party_id_for_write);
                    continue;
                }
            };

            let Some(message) = command::into_message(parsed, &profile) else {
                println!("{}", command::usage(role));
                redisplay_prompt(&party_id_for_write);
                continue;
            };

            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}

/// Render one server event for the terminal
///
/// Dispatches on the `type` tag; unknown or malformed events fall back
/// to raw display rather than being dropped.
fn render_server_message(text: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return MessageFormatter::format_raw_message(text);
    };
    let Some(event) = value.get("type").and_then(|t| t.as_str()) else {
        return MessageFormatter::format_raw_message(text);
    };

    match event {
        "connectionSuccess" => {
            let party_id = value.get("partyId").and_then(|v| v.as_str()).unwrap_or("?");
            let role = value.get("role").and_then(|v| v.as_str()).unwrap_or("?");
            MessageFormatter::format_connection_success(party_id, role)
        }
        "newRideRequest" => match serde_json::from_str::<NewRideRequestMessage>(text) {
            Ok(msg) => MessageFormatter::format_new_ride_request(&msg.request),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "activeRideRequests" => match serde_json::from_str::<ActiveRideRequestsMessage>(text) {
            Ok(msg) => MessageFormatter::format_active_requests(&msg.requests),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "rideRequestConfirmed" => match serde_json::from_str::<RideRequestConfirmedMessage>(text) {
            Ok(msg) => MessageFormatter::format_request_confirmed(
                msg.success,
                msg.ride_id.as_deref(),
                msg.error.as_deref(),
            ),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "rideAccepted" => match serde_json::from_str::<RideAcceptedMessage>(text) {
            Ok(msg) => MessageFormatter::format_ride_accepted(&msg),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "rideAcceptConfirmed" => match serde_json::from_str::<RideAcceptConfirmedMessage>(text) {
            Ok(msg) => MessageFormatter::format_accept_confirmed(&msg.ride_id),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "rideAcceptError" => match serde_json::from_str::<RideAcceptErrorMessage>(text) {
            Ok(msg) => MessageFormatter::format_accept_error(&msg.message),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "rideRequestClosed" => match serde_json::from_str::<RideRequestClosedMessage>(text) {
            Ok(msg) => MessageFormatter::format_request_closed(&msg.ride_id),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "driverLocationUpdated" => {
            match serde_json::from_str::<DriverLocationUpdatedMessage>(text) {
                Ok(msg) => MessageFormatter::format_location_update(
                    &msg.ride_id,
                    msg.location.lat,
                    msg.location.lng,
                    msg.timestamp,
                ),
                Err(_) => MessageFormatter::format_raw_message(text),
            }
        }
        "rideCompleted" => match serde_json::from_str::<RideCompletedMessage>(text) {
            Ok(msg) => MessageFormatter::format_ride_completed(&msg.ride_id, msg.timestamp),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "rideCancelled" => match serde_json::from_str::<RideCancelledMessage>(text) {
            Ok(msg) => MessageFormatter::format_ride_cancelled(
                &msg.ride_id,
                msg.reason.as_deref(),
                msg.timestamp,
            ),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        "statusUpdated" => match serde_json::from_str::<StatusUpdatedMessage>(text) {
            Ok(msg) => MessageFormatter::format_status_updated(msg.success),
            Err(_) => MessageFormatter::format_raw_message(text),
        },
        _ => MessageFormatter::format_raw_message(text),
    }
}
