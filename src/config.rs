use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "medibook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,medibook=debug"
}

/// Get the application data directory (~/.medibook/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(".medibook")
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_port(default: u16) -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Runtime configuration for the appointment service.
#[derive(Debug, Clone)]
pub struct AppointmentConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub auth_service_url: String,
    pub notification_service_url: String,
    pub frontend_origin: String,
}

impl AppointmentConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_port(3002),
            db_path: env::var("APPOINTMENT_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| app_data_dir().join("appointments.db")),
            jwt_secret: env_or("JWT_SECRET", "dev-secret"),
            auth_service_url: env_or("AUTH_SERVICE_URL", "http://localhost:3001"),
            notification_service_url: env_or(
                "NOTIFICATION_SERVICE_URL",
                "http://localhost:3003",
            ),
            frontend_origin: env_or("FRONTEND_URL", "http://localhost:3000"),
        }
    }
}

/// Runtime configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub frontend_origin: String,
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_port(3003),
            db_path: env::var("NOTIFICATION_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| app_data_dir().join("notifications.db")),
            frontend_origin: env_or("FRONTEND_URL", "http://localhost:3000"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with(".medibook"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
