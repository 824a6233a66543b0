use medibook::api::server::start_notification_service;
use medibook::config::{NotificationConfig, APP_VERSION};

#[tokio::main]
async fn main() {
    medibook::init_tracing();
    tracing::info!("Notification service starting v{APP_VERSION}");

    let config = NotificationConfig::from_env();
    let mut server = match start_notification_service(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start notification service: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr, "Notification service running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
}
