mod cli;

use crate::cli::Cli;
use clap::Parser;
use keyspan_core::Context;
use keyspan_gateway::{App, AppState};
use keyspan_shortener::build_service;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    keyspan_telemetry::init(cli.node.log_format)?;

    let span = info_span!("node", name = %cli.node.node_name);
    run(cli).instrument(span).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!(
        coordinator = %cli.node.coordinator,
        storage = %cli.node.storage,
        cache = %cli.node.cache,
        generator = %cli.node.generator,
        "starting gateway"
    );

    let root = Context::new();
    let service = build_service(&cli.node, &root, true).await?;
    let state = AppState::new(Arc::new(service), cli.base_url)
        .with_root(root.clone())
        .with_request_timeout(Duration::from_secs(cli.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(cli.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "starting gateway server");

    let draining = CancellationToken::new();
    let watcher = tokio::spawn(
        watch_shutdown(
            draining.clone(),
            root,
            Duration::from_secs(cli.shutdown_timeout_secs),
        )
        .in_current_span(),
    );

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(draining.cancelled_owned())
        .await?;

    watcher.abort();
    info!("gateway stopped");
    Ok(())
}

/// Stops accepting connections on a signal, then cancels whatever is still
/// running once `grace` has passed.
async fn watch_shutdown(draining: CancellationToken, root: Context, grace: Duration) {
    shutdown_signal().await;
    info!(?grace, "shutdown requested, draining connections");
    draining.cancel();

    tokio::time::sleep(grace).await;
    warn!("grace period elapsed, cancelling in-flight requests");
    root.cancel();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
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
}
