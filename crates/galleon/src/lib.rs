use anyhow::Context;
use cli::{Command, GalleonArgs};
use galleon_api_types::storage::SharedStorage;
use galleon_index::{BatchIndexer, RevisionsIndexApi};
use galleon_storage::fs::FsStorageProvider;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::fs::read_to_string;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

pub mod cli;
mod config;

pub async fn run(args: GalleonArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Serve { config } => serve(&config).await,
        Command::Reindex { root, package } => reindex(&root, package.as_deref()).await,
    }
}

async fn serve(config_path: &Path) -> anyhow::Result<()> {
    let config: config::Config = serde_yaml::from_str(
        &read_to_string(config_path)
            .context("Failed to read config file from disk, is it present?")?,
    )
    .context("Failed to deserialize config file, please make sure its in the right format")?;

    let config::Config { service, storage } = config;

    PrometheusBuilder::new()
        .with_http_listener(service.metrics_address)
        .set_buckets(&[
            100e-6, 500e-6, 1e-3, 5e-3, 1e-2, 5e-2, 1e-1, 2e-1, 3e-1, 4e-1, 5e-1, 6e-1, 7e-1, 8e-1,
            9e-1, 1.0, 5.0, 10.0,
        ])
        .context("Failed to set buckets for prometheus")?
        .install()
        .context("Failed to install prometheus exporter")?;

    let addr = service.address;

    let storage = storage
        .into_provider()
        .context("Failed to open the repository store")?;

    let router = galleon_server::router(service, storage);

    tracing::info!(?addr, "Starting galleon instance");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Galleon server exited with error")?;

    tracing::info!("Completed graceful shutdown");

    Ok(())
}

async fn reindex(root: &Path, package: Option<&str>) -> anyhow::Result<()> {
    let root = std::fs::canonicalize(root).context("Failed to resolve the store root")?;
    let storage: SharedStorage = Arc::new(FsStorageProvider::new(root.clone())?);

    match package {
        Some(pkg) => {
            RevisionsIndexApi::new(storage, pkg)
                .full_index_update()
                .await?;
            tracing::info!(package = pkg, "package indexes rebuilt");
        }
        None => {
            let updated = BatchIndexer::new(storage).update_all().await?;
            tracing::info!(packages = updated.len(), "repository indexes rebuilt");
        }
    }
    println!("{}", root.display());

    Ok(())
}

// Based on: https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal;

        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    terminate.await;

    tracing::info!("SIGTERM received, beginning graceful shutdown");
}
