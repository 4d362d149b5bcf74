use std::net::SocketAddr;

use finapp_server::{build_router, telemetry, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    telemetry::init_tracing(config.log_format);

    tracing::info!(
        address = %config.server_address(),
        database = %config.database_path.display(),
        enforce_scope = config.enforce_scope,
        feeds = config.feeds_enabled,
        "starting FinApp server"
    );

    let pool = finapp_storage::create_db(
        &config.database_path,
        config.busy_timeout(),
        config.max_connections,
    )
    .await?;
    tokio::fs::create_dir_all(&config.attachments_dir).await?;

    let addr: SocketAddr = config.server_address().parse()?;
    let app = build_router(AppState::new(pool, config)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
}
