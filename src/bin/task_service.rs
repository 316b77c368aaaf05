//! Task service binary
//!
//! Serves the task HTTP API and runs the user event consumer until Ctrl-C or
//! SIGTERM.

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use task_service::bootstrap::TaskServiceRuntime;
use task_service::config::ServiceConfig;
use task_service::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = ServiceConfig::from_env().context("failed to load configuration")?;
    let port = config.port;

    let mut runtime = TaskServiceRuntime::start(config)
        .await
        .context("failed to start task service")?;

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %address, "Task service listening");

    let served = axum::serve(listener, runtime.router())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    runtime.shutdown().await;
    served.context("HTTP server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
    info!("Shutdown signal received");
}
