use tracing::info;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::ctrl_c;

/// Platform-specific signal handling implementation
#[cfg(unix)]
pub async fn wait_for_signal() {
    // Handle SIGTERM (sent by orchestrators when the service is terminating)
    let mut sigterm =
        signal(SignalKind::terminate()).expect("Failed to create SIGTERM signal handler");
    // Handle SIGINT (Ctrl+C)
    let mut sigint =
        signal(SignalKind::interrupt()).expect("Failed to create SIGINT signal handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
pub async fn wait_for_signal() {
    let mut ctrl_c = ctrl_c().expect("Failed to create Ctrl+C signal handler");
    ctrl_c.recv().await;
    info!("Received Ctrl+C, initiating graceful shutdown");
}
