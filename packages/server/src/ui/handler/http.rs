//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
};

use crate::{
    domain::{Place, RideId, RideStatus},
    infrastructure::dto::{
        http::{
            ActiveRidesResponse, ApiStatusResponse, CancelRideBody, SubmitRideBody,
            SubmitRideResponse,
        },
        websocket::{
            MessageType, NewRideRequestMessage, RideCancelledMessage, RideRequestClosedMessage,
            RideRequestDto,
        },
    },
    ui::{auth::Identity, state::AppState},
    usecase::StatusUpdateError,
};
use noriba_shared::time::get_utc_timestamp;

/// Extract and verify the bearer token from the Authorization header
async fn verify_bearer(state: &AppState, headers: &HeaderMap) -> Result<Identity, StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    state
        .identity_verifier
        .verify(token)
        .await
        .map_err(|e| {
            tracing::warn!("Rejected HTTP request: {}", e);
            StatusCode::UNAUTHORIZED
        })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the list of open (pending) ride requests
pub async fn get_active_rides(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActiveRidesResponse>, StatusCode> {
    let pending = state
        .list_active_requests_usecase
        .execute()
        .await
        .map_err(|e| {
            tracing::error!("Failed to list active ride requests: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // Domain Model から DTO への変換
    let requests: Vec<RideRequestDto> = pending.iter().map(RideRequestDto::from).collect();
    Ok(Json(ActiveRidesResponse {
        success: true,
        count: requests.len(),
        requests,
    }))
}

/// Submit a ride request over REST (fallback for clients without a socket)
pub async fn submit_ride(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SubmitRideBody>,
) -> Result<(StatusCode, Json<SubmitRideResponse>), StatusCode> {
    let identity = verify_bearer(&state, &headers).await?;

    // Boundary validation: DTO -> Domain Model
    let pickup = Place::try_from(body.pickup_location).map_err(|_| StatusCode::BAD_REQUEST)?;
    let drop = Place::try_from(body.drop_location).map_err(|_| StatusCode::BAD_REQUEST)?;

    let ride = state
        .submit_request_usecase
        .execute(
            identity.party_id,
            body.user_name,
            body.user_phone,
            pickup,
            drop,
            body.distance,
            body.fare,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to submit ride request: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // Fan the new request out to connected drivers, same as the socket path
    let new_ride_msg = NewRideRequestMessage {
        r#type: MessageType::NewRideRequest,
        request: RideRequestDto::from(&ride),
    };
    let new_ride_json = serde_json::to_string(&new_ride_msg).unwrap();
    state
        .submit_request_usecase
        .broadcast_to_drivers(&new_ride_json)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRideResponse {
            success: true,
            ride_id: ride.id.as_str().to_string(),
            message: "Ride request created".to_string(),
        }),
    ))
}

/// Cancel a ride request over REST
pub async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    Path(ride_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CancelRideBody>,
) -> Result<Json<ApiStatusResponse>, StatusCode> {
    let identity = verify_bearer(&state, &headers).await?;

    let ride_id = RideId::from_string(ride_id);
    let ride = match state
        .update_ride_status_usecase
        .execute(
            ride_id,
            &identity.party_id,
            RideStatus::Cancelled,
            body.reason.clone(),
        )
        .await
    {
        Ok(ride) => ride,
        Err(StatusUpdateError::NotFound(_)) => return Err(StatusCode::NOT_FOUND),
        Err(StatusUpdateError::Unauthorized(_)) => return Err(StatusCode::FORBIDDEN),
        Err(StatusUpdateError::InvalidTransition { .. }) => return Err(StatusCode::CONFLICT),
        Err(e) => {
            tracing::error!("Failed to cancel ride request: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let cancelled_msg = RideCancelledMessage {
        r#type: MessageType::RideCancelled,
        ride_id: ride.id.as_str().to_string(),
        reason: body.reason,
        timestamp: get_utc_timestamp(),
    };
    let cancelled_json = serde_json::to_string(&cancelled_msg).unwrap();
    state
        .update_ride_status_usecase
        .notify_parties(&ride, &cancelled_json)
        .await;

    // Withdraw the offer from driver UIs if it was still open
    if ride.driver_id.is_none() {
        let closed_msg = RideRequestClosedMessage {
            r#type: MessageType::RideRequestClosed,
            ride_id: ride.id.as_str().to_string(),
        };
        let closed_json = serde_json::to_string(&closed_msg).unwrap();
        state
            .accept_request_usecase
            .notify_drivers_closed(&closed_json)
            .await;
    }

    Ok(Json(ApiStatusResponse {
        success: true,
        message: "Ride request cancelled".to_string(),
    }))
}

/// Debug endpoint to dump all ride requests (for testing purposes)
pub async fn debug_rides(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RideRequestDto>>, StatusCode> {
    let rides = state.ride_request_repository.list_all().await.map_err(|e| {
        tracing::error!("Failed to dump ride requests: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let dtos: Vec<RideRequestDto> = rides.iter().map(RideRequestDto::from).collect();
    Ok(Json(dtos))
}
