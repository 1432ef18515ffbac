//! Ride dispatch server with live driver fan-out.
//!
//! Receives ride requests from users, broadcasts them to connected drivers,
//! arbitrates concurrent accepts, and relays driver locations.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin noriba-server
//! cargo run --bin noriba-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use noriba_server::{
    infrastructure::{
        registry::WebSocketConnectionRegistry,
        repository::{InMemoryDriverRepository, InMemoryRideRequestRepository},
    },
    ui::{DevTokenVerifier, Server},
    usecase::{
        AcceptRequestUseCase, ConnectSessionUseCase, DisconnectSessionUseCase,
        ListActiveRequestsUseCase, ReportLocationUseCase, SubmitRequestUseCase,
        UpdateDriverStatusUseCase, UpdateRideStatusUseCase,
    },
};
use noriba_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Ride dispatch server with live driver fan-out", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. ConnectionRegistry
    // 3. UseCases
    // 4. Server

    // 1. Create Repositories (in-memory database)
    let ride_request_repository = Arc::new(InMemoryRideRequestRepository::new());
    let driver_repository = Arc::new(InMemoryDriverRepository::new());

    // 2. Create ConnectionRegistry (WebSocket implementation)
    let registry = Arc::new(WebSocketConnectionRegistry::new());
    let clock = Arc::new(SystemClock);

    // 3. Create UseCases
    let submit_request_usecase = Arc::new(SubmitRequestUseCase::new(
        ride_request_repository.clone(),
        registry.clone(),
        clock.clone(),
    ));
    let accept_request_usecase = Arc::new(AcceptRequestUseCase::new(
        ride_request_repository.clone(),
        registry.clone(),
        clock.clone(),
    ));
    let update_ride_status_usecase = Arc::new(UpdateRideStatusUseCase::new(
        ride_request_repository.clone(),
        registry.clone(),
        clock.clone(),
    ));
    let report_location_usecase = Arc::new(ReportLocationUseCase::new(
        ride_request_repository.clone(),
        driver_repository.clone(),
        registry.clone(),
        clock.clone(),
    ));
    let list_active_requests_usecase = Arc::new(ListActiveRequestsUseCase::new(
        ride_request_repository.clone(),
    ));
    let connect_session_usecase =
        Arc::new(ConnectSessionUseCase::new(registry.clone(), clock.clone()));
    let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(registry.clone()));
    let update_driver_status_usecase = Arc::new(UpdateDriverStatusUseCase::new(
        driver_repository.clone(),
        clock.clone(),
    ));

    // 4. Create and run the server
    let server = Server::new(
        submit_request_usecase,
        accept_request_usecase,
        update_ride_status_usecase,
        report_location_usecase,
        list_active_requests_usecase,
        connect_session_usecase,
        disconnect_session_usecase,
        update_driver_status_usecase,
        Arc::new(DevTokenVerifier::new()),
        ride_request_repository,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
