use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tidoo_server::config::ServerConfig;
use tidoo_server::web::{AppState, create_router};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "tidoo_server=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let addr = config.bind_addr;
    info!(?config, "Starting itinerary planner");

    let state = AppState::new(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");
    info!("  GET  /health               - Health check");
    info!("  GET  /api/places/search    - Search places");
    info!("  GET  /api/itinerary        - Active itinerary");
    info!("  POST /api/itinerary/optimize - Optimize the route");
    info!("  PUT  /api/settings/api-key - Configure the Google Maps API key");

    axum::serve(listener, app).await?;
    Ok(())
}
