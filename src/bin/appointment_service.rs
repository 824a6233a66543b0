use medibook::api::server::start_appointment_service;
use medibook::config::{AppointmentConfig, APP_VERSION};

#[tokio::main]
async fn main() {
    medibook::init_tracing();
    tracing::info!("Appointment service starting v{APP_VERSION}");

    let config = AppointmentConfig::from_env();
    let mut server = match start_appointment_service(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start appointment service: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr, "Appointment service running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
}
