use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rover_uplink::common::AppState;
use rover_uplink::config::Config;
use rover_uplink::device::DeviceClient;
use rover_uplink::exclusivity::ShareBus;
use rover_uplink::feed;
use rover_uplink::geo::FixedPositionSource;
use rover_uplink::presenter::{Presenter, TracingPresenter};
use rover_uplink::session::{SessionController, SessionSettings};
use rover_uplink::sink::SinkClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rover_uplink=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rover-uplink...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        deployment = ?config.deployment,
        device = %config.device_base_url,
        sink = %config.sink_base_url,
        "Configuration loaded"
    );

    // Create clients
    let device_client = DeviceClient::new(&config);
    if device_client.is_mixed_content_blocked() {
        tracing::warn!("Device endpoint is mixed-content blocked; cycles will run without sensor readings");
    }
    let sink_client = SinkClient::new(&config);
    tracing::info!("Device and sink clients initialized");

    let settings = SessionSettings::from_config(&config);
    let geo = Arc::new(FixedPositionSource::from_coordinates(
        config.geo_latitude,
        config.geo_longitude,
    ));
    let presenter: Arc<dyn Presenter> = Arc::new(TracingPresenter);

    let state = AppState::new(config, device_client, sink_client);

    // Best-effort: restore the device's view of the sharing state.
    match state.device_client.status().await {
        Ok(status) => {
            tracing::info!(uploads_enabled = status.uploads_enabled, "Device status restored");
        }
        Err(e) => tracing::debug!(error = %e, "Device status unavailable"),
    }

    let bus = ShareBus::default();
    let controller = SessionController::new(
        Arc::clone(&state.device_client),
        Arc::clone(&state.sink_client),
        geo,
        Arc::clone(&presenter),
        settings,
        Some(&bus),
    );

    // Spawn the latest-entry refresh task (fire-and-forget, non-blocking)
    tokio::spawn(feed::run_feed_refresh(state.clone(), presenter));

    controller.start()?;

    shutdown_signal().await;
    controller.stop(Some("Shutting down."));

    tracing::info!("Shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
