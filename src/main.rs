use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use worksheet_engine::api::{AppState, create_router};
use worksheet_engine::config::ConfigLoader;
use worksheet_engine::notify::BroadcastPublisher;

const CONFIG_DIR_VAR: &str = "WORKSHEET_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = "./config/default";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_dir = std::env::var(CONFIG_DIR_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?;
    info!(
        config_dir = %config_dir,
        utc_offset = %config.utc_offset(),
        "Configuration loaded"
    );

    let publisher = Arc::new(BroadcastPublisher::new(config.settings().event_buffer));
    let mut events = publisher.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(
                    group_id = %event.group_id,
                    date = %event.date,
                    change = ?event.change,
                    affected_workers = event.affected_workers,
                    "worksheet:updated"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let state = AppState::in_memory(&config, publisher);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.settings().listen_addr).await?;
    info!(addr = %config.settings().listen_addr, "Worksheet engine listening");
    axum::serve(listener, app).await?;
    Ok(())
}
