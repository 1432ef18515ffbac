//! CLI client for the Noriba ride dispatch service.
//!
//! Connects to the dispatch server as a user or a driver, depending on the
//! role half of the identity token. Users request and cancel rides; drivers
//! accept rides, report locations, and complete them.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//! Rejected tokens exit immediately.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin noriba-client -- --token user:alice --name Alice --phone 080-0000-0001
//! cargo run --bin noriba-client -- -t driver:bob -n Bob -P 080-0000-0002
//! ```

use clap::Parser;

use noriba_client::{Profile, domain::parse_role_from_token, run_client};
use noriba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "CLI client for the Noriba ride dispatch service", long_about = None)]
struct Args {
    /// Identity token in the form <role>:<party_id> (e.g. user:alice)
    #[arg(short = 't', long)]
    token: String,

    /// Display name sent with requests and accepts
    #[arg(short = 'n', long)]
    name: String,

    /// Contact phone sent with requests and accepts
    #[arg(short = 'P', long)]
    phone: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let Some(role) = parse_role_from_token(&args.token) else {
        eprintln!("Token must look like 'user:<id>' or 'driver:<id>'");
        std::process::exit(1);
    };

    let profile = Profile {
        name: args.name,
        phone: args.phone,
    };

    // Run the client
    if let Err(e) = run_client(args.url, args.token, role, profile).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
