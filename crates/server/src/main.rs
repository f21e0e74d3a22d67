use anyhow::{Context, Result};
use fontpush_remote::{DriveClient, FontFetcher};
use fontpush_server::{build_router, AppState, ServerConfig, UploadDir};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env().context("Invalid configuration")?;

    let fonts = FontFetcher::new(&config.catalog_url, config.fetch_timeout)
        .context("Failed to build font catalog client")?;
    let drive = DriveClient::new(config.credentials.clone())
        .context("Failed to load service account credentials")?;
    log::info!("Uploading to Drive as {}", drive.client_email());

    let state = AppState::new(
        UploadDir::new(&config.upload_dir),
        Arc::new(fonts),
        Arc::new(drive),
    )
    .with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    log::info!("Listening on http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutting down");
}
