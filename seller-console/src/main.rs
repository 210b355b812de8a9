use dotenvy::dotenv;
use seller_console::config::get_configuration;
use seller_console::startup::build_router;
use seller_console::AppState;
use service_core::observability::{init_tracing, install_recorder};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    let observability = &configuration.observability;
    init_tracing(
        "seller-console",
        &observability.log_level,
        observability.otlp_endpoint.as_deref(),
    );
    let metrics = install_recorder();

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    info!(
        backend = %configuration.backend.base_url,
        socket = %configuration.backend.socket_origin(),
        "Backend endpoints configured"
    );

    let state = AppState::new(configuration, metrics)
        .map_err(|e| anyhow::anyhow!("Failed to initialise application state: {}", e))?;
    let realtime = &state.settings.realtime;
    state
        .channels
        .clone()
        .spawn_reaper(realtime.sweep_interval(), realtime.idle_timeout());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting seller-console on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
