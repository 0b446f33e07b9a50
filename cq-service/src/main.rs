use cq_service::config::CqConfig;
use cq_service::startup::Application;
use service_core::observability::init_tracing;
use tokio::signal;

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = CqConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::io::Error::other(format!("Configuration error: {e}"))
    })?;

    init_tracing(&config.service_name, &config.log_level);

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {e}"))
    })?;

    tokio::select! {
        result = application.run_until_stopped() => result,
        _ = shutdown_signal() => Ok(()),
    }
}
