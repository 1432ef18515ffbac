//! WebSocket message DTOs.
//!
//! The wire contract is a closed set of typed schemas, one per event name.
//! Inbound traffic is parsed into [`ClientMessage`]; anything that does not
//! match the union is rejected at the boundary and never reaches the
//! dispatcher. Outbound messages carry a `type` tag via [`MessageType`].
//!
//! Event names are the contract other clients must match:
//! `connectionSuccess`, `newRideRequest`, `activeRideRequests`,
//! `rideRequestConfirmed`, `rideAccepted`, `rideAcceptConfirmed`,
//! `rideAcceptError`, `rideRequestClosed`, `rideCompleted`,
//! `rideCancelled`, `driverLocationUpdated`, `statusUpdated`.

use serde::{Deserialize, Serialize};

/// Outbound message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "connectionSuccess")]
    ConnectionSuccess,
    #[serde(rename = "newRideRequest")]
    NewRideRequest,
    #[serde(rename = "activeRideRequests")]
    ActiveRideRequests,
    #[serde(rename = "rideRequestConfirmed")]
    RideRequestConfirmed,
    #[serde(rename = "rideAccepted")]
    RideAccepted,
    #[serde(rename = "rideAcceptConfirmed")]
    RideAcceptConfirmed,
    #[serde(rename = "rideAcceptError")]
    RideAcceptError,
    #[serde(rename = "rideRequestClosed")]
    RideRequestClosed,
    #[serde(rename = "rideCompleted")]
    RideCompleted,
    #[serde(rename = "rideCancelled")]
    RideCancelled,
    #[serde(rename = "driverLocationUpdated")]
    DriverLocationUpdated,
    #[serde(rename = "statusUpdated")]
    StatusUpdated,
}

/// 緯度経度の DTO
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateDto {
    pub lat: f64,
    pub lng: f64,
}

/// 地点（住所ラベル + 座標）の DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDto {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// 配車リクエストのスナップショット DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestDto {
    pub ride_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_phone: String,
    pub pickup_location: PlaceDto,
    pub drop_location: PlaceDto,
    pub distance: f64,
    pub fare: f64,
    pub status: String,
    pub driver_id: Option<String>,
    pub created_at: i64,
    pub accepted_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancellation_reason: Option<String>,
}

// ========================================
// Inbound: closed union of client events
// ========================================

/// クライアントから届くメッセージの閉じた型付きユニオン
///
/// 当事者 ID（user_id / driver_id）は意図的にペイロードに含めない。
/// 送信者の identity は接続時に検証済みのものをハンドラが保持しており、
/// ペイロード中の自己申告は信用しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// ユーザーによる配車リクエスト送信
    #[serde(rename_all = "camelCase")]
    UserRideRequest {
        user_name: String,
        user_phone: String,
        pickup_location: PlaceDto,
        drop_location: PlaceDto,
        distance: f64,
        fare: f64,
    },
    /// ドライバーによる受諾試行
    #[serde(rename_all = "camelCase")]
    DriverAcceptRide {
        ride_id: String,
        driver_name: String,
        driver_phone: String,
        driver_rating: Option<f64>,
        vehicle_make: Option<String>,
        vehicle_model: Option<String>,
        license_plate: Option<String>,
    },
    /// ドライバーの位置情報レポート（配車に紐づかない場合は ride_id なし）
    #[serde(rename_all = "camelCase")]
    UpdateDriverLocation {
        ride_id: Option<String>,
        location: CoordinateDto,
    },
    /// 配車の完了・キャンセル
    #[serde(rename_all = "camelCase")]
    UpdateRideStatus {
        ride_id: String,
        status: String,
        reason: Option<String>,
    },
    /// ドライバーのオンライン状態更新
    #[serde(rename_all = "camelCase")]
    UpdateDriverStatus {
        is_online: bool,
        location: Option<CoordinateDto>,
    },
}

// ========================================
// Outbound messages
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSuccessMessage {
    pub r#type: MessageType,
    pub status: String,
    pub party_id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRideRequestMessage {
    pub r#type: MessageType,
    #[serde(flatten)]
    pub request: RideRequestDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRideRequestsMessage {
    pub r#type: MessageType,
    pub requests: Vec<RideRequestDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestConfirmedMessage {
    pub r#type: MessageType,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideAcceptedMessage {
    pub r#type: MessageType,
    pub ride_id: String,
    pub driver_id: String,
    pub driver_name: String,
    pub driver_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideAcceptConfirmedMessage {
    pub r#type: MessageType,
    pub success: bool,
    pub ride_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideAcceptErrorMessage {
    pub r#type: MessageType,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestClosedMessage {
    pub r#type: MessageType,
    pub ride_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideCompletedMessage {
    pub r#type: MessageType,
    pub ride_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideCancelledMessage {
    pub r#type: MessageType,
    pub ride_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocationUpdatedMessage {
    pub r#type: MessageType,
    pub ride_id: String,
    pub location: CoordinateDto,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatedMessage {
    pub r#type: MessageType,
    pub success: bool,
}
