use std::sync::Arc;

use anyhow::Context;
use duplex_backend_api::services::upload::DiskUploader;
use duplex_backend_api::{build_router, AppState};
use duplex_backend_runtime::{shutdown_signal, telemetry, BackendServices};
use duplex_config::load as load_config;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing()?;

    info!("starting duplex backend");

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config).await?;

    let uploader = Arc::new(DiskUploader::new(&config.uploads));
    let state = AppState::new(
        services.db_pool.clone(),
        services.authenticator.clone(),
        uploader,
    );

    // Attachments stored by the disk uploader are served straight from the
    // upload directory.
    let app = build_router(state)
        .nest_service(&config.uploads.base_url, ServeDir::new(&config.uploads.dir));

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}
