//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    domain::RideRequestRepository,
    usecase::{
        AcceptRequestUseCase, ConnectSessionUseCase, DisconnectSessionUseCase,
        ListActiveRequestsUseCase, ReportLocationUseCase, SubmitRequestUseCase,
        UpdateDriverStatusUseCase, UpdateRideStatusUseCase,
    },
};

use super::{
    auth::IdentityVerifier,
    handler::{
        cancel_ride, debug_rides, get_active_rides, health_check, submit_ride, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Ride dispatch server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     submit_request_usecase,
///     accept_request_usecase,
///     // ...
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// SubmitRequestUseCase（配車リクエスト送信のユースケース）
    submit_request_usecase: Arc<SubmitRequestUseCase>,
    /// AcceptRequestUseCase（受諾試行のユースケース）
    accept_request_usecase: Arc<AcceptRequestUseCase>,
    /// UpdateRideStatusUseCase（完了・キャンセル遷移のユースケース）
    update_ride_status_usecase: Arc<UpdateRideStatusUseCase>,
    /// ReportLocationUseCase（位置記録・中継のユースケース）
    report_location_usecase: Arc<ReportLocationUseCase>,
    /// ListActiveRequestsUseCase（アクティブ一覧取得のユースケース）
    list_active_requests_usecase: Arc<ListActiveRequestsUseCase>,
    /// ConnectSessionUseCase（セッション開始のユースケース）
    connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション終了のユースケース）
    disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// UpdateDriverStatusUseCase（ドライバー状態更新のユースケース）
    update_driver_status_usecase: Arc<UpdateDriverStatusUseCase>,
    /// IdentityVerifier（接続境界での identity 検証）
    identity_verifier: Arc<dyn IdentityVerifier>,
    /// Repository（デバッグエンドポイント用の直接参照）
    ride_request_repository: Arc<dyn RideRequestRepository>,
}

impl Server {
    /// Create a new Server instance
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        submit_request_usecase: Arc<SubmitRequestUseCase>,
        accept_request_usecase: Arc<AcceptRequestUseCase>,
        update_ride_status_usecase: Arc<UpdateRideStatusUseCase>,
        report_location_usecase: Arc<ReportLocationUseCase>,
        list_active_requests_usecase: Arc<ListActiveRequestsUseCase>,
        connect_session_usecase: Arc<ConnectSessionUseCase>,
        disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
        update_driver_status_usecase: Arc<UpdateDriverStatusUseCase>,
        identity_verifier: Arc<dyn IdentityVerifier>,
        ride_request_repository: Arc<dyn RideRequestRepository>,
    ) -> Self {
        Self {
            submit_request_usecase,
            accept_request_usecase,
            update_ride_status_usecase,
            report_location_usecase,
            list_active_requests_usecase,
            connect_session_usecase,
            disconnect_session_usecase,
            update_driver_status_usecase,
            identity_verifier,
            ride_request_repository,
        }
    }

    /// Run the ride dispatch server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            submit_request_usecase: self.submit_request_usecase,
            accept_request_usecase: self.accept_request_usecase,
            update_ride_status_usecase: self.update_ride_status_usecase,
            report_location_usecase: self.report_location_usecase,
            list_active_requests_usecase: self.list_active_requests_usecase,
            connect_session_usecase: self.connect_session_usecase,
            disconnect_session_usecase: self.disconnect_session_usecase,
            update_driver_status_usecase: self.update_driver_status_usecase,
            identity_verifier: self.identity_verifier,
            ride_request_repository: self.ride_request_repository,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rides", post(submit_ride))
            .route("/api/rides/active", get(get_active_rides))
            .route("/api/rides/{ride_id}/cancel", post(cancel_ride))
            .route("/debug/rides", get(debug_rides))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Ride dispatch server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
