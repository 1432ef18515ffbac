//! Server state and connection management.

use std::sync::Arc;

use crate::usecase::{
    AcceptRequestUseCase, ConnectSessionUseCase, DisconnectSessionUseCase,
    ListActiveRequestsUseCase, ReportLocationUseCase, SubmitRequestUseCase,
    UpdateDriverStatusUseCase, UpdateRideStatusUseCase,
};

use super::auth::IdentityVerifier;
use crate::domain::RideRequestRepository;

/// Shared application state
pub struct AppState {
    /// SubmitRequestUseCase（配車リクエスト送信のユースケース）
    pub submit_request_usecase: Arc<SubmitRequestUseCase>,
    /// AcceptRequestUseCase（受諾試行のユースケース）
    pub accept_request_usecase: Arc<AcceptRequestUseCase>,
    /// UpdateRideStatusUseCase（完了・キャンセル遷移のユースケース）
    pub update_ride_status_usecase: Arc<UpdateRideStatusUseCase>,
    /// ReportLocationUseCase（位置記録・中継のユースケース）
    pub report_location_usecase: Arc<ReportLocationUseCase>,
    /// ListActiveRequestsUseCase（アクティブ一覧取得のユースケース）
    pub list_active_requests_usecase: Arc<ListActiveRequestsUseCase>,
    /// ConnectSessionUseCase（セッション開始のユースケース）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション終了のユースケース）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// UpdateDriverStatusUseCase（ドライバー状態更新のユースケース）
    pub update_driver_status_usecase: Arc<UpdateDriverStatusUseCase>,
    /// IdentityVerifier（接続境界での identity 検証）
    pub identity_verifier: Arc<dyn IdentityVerifier>,
    /// Repository（デバッグエンドポイント用の直接参照）
    pub ride_request_repository: Arc<dyn RideRequestRepository>,
}
