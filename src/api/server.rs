//! Service lifecycle — bind, serve, shut down.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. Both binaries and the end-to-end tests start services this
//! way; `port = 0` binds an ephemeral port.

use std::net::SocketAddr;
use std::path::Path;

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::api::router::{appointment_router, notification_router};
use crate::config::{AppointmentConfig, NotificationConfig};
use crate::db::sqlite::{open_appointment_database, open_notification_database};
use crate::db::DatabaseError;

/// Handle to a running service. Dropping the handle leaves the server
/// running; call `shutdown()` to stop it.
pub struct ServiceServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ServiceServer {
    /// Shut down the server gracefully. Safe to call twice.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Server shutdown signal sent");
        }
    }
}

/// Start the appointment service on the configured port.
pub async fn start_appointment_service(
    config: &AppointmentConfig,
) -> Result<ServiceServer, String> {
    prepare_database(&config.db_path, open_appointment_database)?;
    serve(appointment_router(config), config.port, "Appointment service").await
}

/// Start the notification service on the configured port.
pub async fn start_notification_service(
    config: &NotificationConfig,
) -> Result<ServiceServer, String> {
    prepare_database(&config.db_path, open_notification_database)?;
    serve(notification_router(config), config.port, "Notification service").await
}

/// Create the data directory and run migrations before accepting traffic,
/// so a broken database fails startup instead of the first request.
fn prepare_database(
    path: &Path,
    open: fn(&Path) -> Result<Connection, DatabaseError>,
) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Cannot create data directory {}: {e}", parent.display()))?;
    }
    open(path).map_err(|e| format!("Cannot open database {}: {e}", path.display()))?;
    Ok(())
}

async fn serve(
    app: axum::Router,
    port: u16,
    service: &'static str,
) -> Result<ServiceServer, String> {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))
        .await
        .map_err(|e| format!("Failed to bind {service} on port {port}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get {service} address: {e}"))?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("{service} received shutdown signal");
        };

        tracing::info!(%addr, "{service} started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("{service} error: {e}");
        }

        tracing::info!("{service} stopped");
    });

    Ok(ServiceServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

// ═══════════════════════════════════════════════════════════
// End-to-end pipeline tests — both services live over HTTP
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::identity::issue_token;

    const SECRET: &str = "test-secret";

    /// Both services running against temp databases, the appointment
    /// service wired to the notification service's real ingest endpoint.
    struct TestPlatform {
        appointment: ServiceServer,
        notification: ServiceServer,
        client: reqwest::Client,
        _dir: tempfile::TempDir,
    }

    impl TestPlatform {
        async fn start() -> Self {
            let dir = tempfile::tempdir().unwrap();

            let notification = start_notification_service(&NotificationConfig {
                port: 0,
                db_path: dir.path().join("notifications.db"),
                frontend_origin: "http://localhost:3000".into(),
            })
            .await
            .expect("notification service should start");

            let appointment = start_appointment_service(&AppointmentConfig {
                port: 0,
                db_path: dir.path().join("appointments.db"),
                jwt_secret: SECRET.into(),
                // No identity provider in the loop: name enrichment
                // degrades to the placeholder.
                auth_service_url: "http://127.0.0.1:9".into(),
                notification_service_url: format!(
                    "http://127.0.0.1:{}",
                    notification.addr.port()
                ),
                frontend_origin: "http://localhost:3000".into(),
            })
            .await
            .expect("appointment service should start");

            Self {
                appointment,
                notification,
                client: reqwest::Client::new(),
                _dir: dir,
            }
        }

        fn appointment_url(&self, path: &str) -> String {
            format!("http://127.0.0.1:{}{path}", self.appointment.addr.port())
        }

        fn notification_url(&self, path: &str) -> String {
            format!("http://127.0.0.1:{}{path}", self.notification.addr.port())
        }

        async fn create_appointment(&self, token: &str) -> serde_json::Value {
            let resp = self
                .client
                .post(self.appointment_url("/api/appointments"))
                .bearer_auth(token)
                .json(&json!({
                    "doctorId": "d1",
                    "doctorName": "House",
                    "appointmentDate": "2025-03-01",
                    "appointmentTime": "10:00",
                    "reason": "checkup",
                }))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
            resp.json().await.unwrap()
        }

        /// Poll a recipient's feed until at least `min` notifications
        /// arrive (delivery and ingestion are both asynchronous).
        async fn wait_for_notifications(
            &self,
            recipient_id: &str,
            recipient_type: &str,
            min: usize,
        ) -> Vec<serde_json::Value> {
            for _ in 0..80 {
                let body: serde_json::Value = self
                    .client
                    .get(self.notification_url(&format!(
                        "/api/notifications/{recipient_id}/{recipient_type}"
                    )))
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                let list = body["notifications"].as_array().unwrap().clone();
                if list.len() >= min {
                    return list;
                }
                tokio::time::sleep(std::time::Duration::from_millis(25)).await;
            }
            panic!("feed of {recipient_id}/{recipient_type} never reached {min} notifications");
        }

        async fn unread_count(&self, recipient_id: &str, recipient_type: &str) -> i64 {
            let body: serde_json::Value = self
                .client
                .get(self.notification_url(&format!(
                    "/api/notifications/{recipient_id}/{recipient_type}/unread-count"
                )))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            body["unreadCount"].as_i64().unwrap()
        }

        fn stop(&mut self) {
            self.appointment.shutdown();
            self.notification.shutdown();
        }
    }

    fn patient_token() -> String {
        issue_token("p1", "pat@example.com", "patient", SECRET)
    }

    fn doctor_token() -> String {
        issue_token("d1", "house@example.com", "doctor", SECRET)
    }

    #[tokio::test]
    async fn health_endpoints_respond() {
        let mut platform = TestPlatform::start().await;

        let resp = reqwest::get(platform.appointment_url("/health")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["service"], "Appointment Service");
        assert_eq!(body["dbConnected"], true);

        let resp = reqwest::get(platform.notification_url("/health")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["service"], "Notification Service");

        platform.stop();
    }

    #[tokio::test]
    async fn unauthenticated_appointment_requests_are_rejected() {
        let mut platform = TestPlatform::start().await;

        let resp = reqwest::get(platform.appointment_url("/api/appointments"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        platform.stop();
    }

    #[tokio::test]
    async fn created_appointment_notifies_the_doctor() {
        let mut platform = TestPlatform::start().await;

        let created = platform.create_appointment(&patient_token()).await;
        assert_eq!(created["appointment"]["status"], "pending");

        let feed = platform.wait_for_notifications("d1", "doctor", 1).await;
        assert_eq!(
            feed[0]["message"],
            "New appointment request from Patient on 2025-03-01 at 10:00"
        );
        assert_eq!(feed[0]["eventType"], "appointment.created");
        assert_eq!(feed[0]["recipientType"], "doctor");
        assert_eq!(feed[0]["read"], false);
        assert_eq!(platform.unread_count("d1", "doctor").await, 1);

        // The patient got nothing out of their own request.
        assert_eq!(platform.unread_count("p1", "patient").await, 0);

        platform.stop();
    }

    #[tokio::test]
    async fn approval_notifies_the_patient_and_mark_read_clears_it() {
        let mut platform = TestPlatform::start().await;

        let created = platform.create_appointment(&patient_token()).await;
        let id = created["appointment"]["id"].as_str().unwrap();

        let resp = platform
            .client
            .patch(platform.appointment_url(&format!("/api/appointments/{id}/status")))
            .bearer_auth(doctor_token())
            .json(&json!({"status": "approved", "notes": "bring ID"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["appointment"]["status"], "approved");
        assert_eq!(body["appointment"]["notes"], "bring ID");

        let feed = platform.wait_for_notifications("p1", "patient", 1).await;
        assert_eq!(
            feed[0]["message"],
            "Your appointment with Dr. House has been approved!"
        );
        assert_eq!(platform.unread_count("p1", "patient").await, 1);

        // Mark read is idempotent and drops the unread count.
        let notification_id = feed[0]["id"].as_str().unwrap();
        for _ in 0..2 {
            let resp = platform
                .client
                .patch(platform.notification_url(&format!(
                    "/api/notifications/{notification_id}/read"
                )))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::OK);
        }
        assert_eq!(platform.unread_count("p1", "patient").await, 0);

        platform.stop();
    }

    #[tokio::test]
    async fn concurrent_decisions_have_exactly_one_winner() {
        let mut platform = TestPlatform::start().await;

        let created = platform.create_appointment(&patient_token()).await;
        let id = created["appointment"]["id"].as_str().unwrap().to_string();

        let decide = |status: &'static str| {
            let client = platform.client.clone();
            let url = platform.appointment_url(&format!("/api/appointments/{id}/status"));
            async move {
                client
                    .patch(url)
                    .bearer_auth(doctor_token())
                    .json(&json!({"status": status}))
                    .send()
                    .await
                    .unwrap()
                    .status()
            }
        };

        let (approve, reject) = tokio::join!(decide("approved"), decide("rejected"));
        let statuses = [approve, reject];

        let wins = statuses
            .iter()
            .filter(|s| **s == reqwest::StatusCode::OK)
            .count();
        let conflicts = statuses
            .iter()
            .filter(|s| **s == reqwest::StatusCode::CONFLICT)
            .count();
        assert_eq!(wins, 1, "exactly one decision must win, got {statuses:?}");
        assert_eq!(conflicts, 1, "the loser must observe a conflict, got {statuses:?}");

        // Any further decision stays rejected.
        let late = decide("rejected").await;
        assert_eq!(late, reqwest::StatusCode::CONFLICT);

        platform.stop();
    }

    #[tokio::test]
    async fn cancel_flow_notifies_the_doctor_once() {
        let mut platform = TestPlatform::start().await;

        let created = platform.create_appointment(&patient_token()).await;
        let id = created["appointment"]["id"].as_str().unwrap();

        let resp = platform
            .client
            .patch(platform.appointment_url(&format!("/api/appointments/{id}/cancel")))
            .bearer_auth(patient_token())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        // Retry fails instead of double-cancelling.
        let resp = platform
            .client
            .patch(platform.appointment_url(&format!("/api/appointments/{id}/cancel")))
            .bearer_auth(patient_token())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        // created + cancelled, newest first.
        let feed = platform.wait_for_notifications("d1", "doctor", 2).await;
        assert_eq!(
            feed[0]["message"],
            "Appointment with Patient has been cancelled."
        );
        assert_eq!(feed[0]["eventType"], "appointment.cancelled");

        platform.stop();
    }

    #[tokio::test]
    async fn unknown_event_type_is_swallowed_by_ingest() {
        let mut platform = TestPlatform::start().await;

        let resp = platform
            .client
            .post(platform.notification_url("/api/events"))
            .json(&json!({
                "eventType": "appointment.rescheduled",
                "data": {"doctorId": "d1"},
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(platform.unread_count("d1", "doctor").await, 0);

        platform.stop();
    }

    #[tokio::test]
    async fn cleanup_reports_deleted_count() {
        let mut platform = TestPlatform::start().await;

        platform.create_appointment(&patient_token()).await;
        platform.wait_for_notifications("d1", "doctor", 1).await;

        // Fresh notifications are inside the retention horizon.
        let resp = platform
            .client
            .delete(platform.notification_url("/api/notifications/cleanup"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["deletedCount"], 0);
        assert_eq!(platform.unread_count("d1", "doctor").await, 1);

        platform.stop();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut platform = TestPlatform::start().await;
        platform.stop();
        platform.stop();
    }
}
