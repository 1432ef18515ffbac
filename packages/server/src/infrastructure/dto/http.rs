//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::{PlaceDto, RideRequestDto};

/// `POST /api/rides` request body (REST fallback for ride submission)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRideBody {
    pub user_name: String,
    pub user_phone: String,
    pub pickup_location: PlaceDto,
    pub drop_location: PlaceDto,
    pub distance: f64,
    pub fare: f64,
}

/// `POST /api/rides` response body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRideResponse {
    pub success: bool,
    pub ride_id: String,
    pub message: String,
}

/// `GET /api/rides/active` response body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRidesResponse {
    pub success: bool,
    pub count: usize,
    pub requests: Vec<RideRequestDto>,
}

/// `POST /api/rides/{ride_id}/cancel` request body
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRideBody {
    pub reason: Option<String>,
}

/// Generic success/error response body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatusResponse {
    pub success: bool,
    pub message: String,
}
