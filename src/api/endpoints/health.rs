//! Service health probes.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::{AppointmentContext, NotificationContext};
use crate::config::APP_VERSION;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub db_connected: bool,
    pub version: &'static str,
}

/// `GET /health` — appointment service probe.
pub async fn appointment(State(ctx): State<AppointmentContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        service: "Appointment Service",
        db_connected: ctx.open_db().is_ok(),
        version: APP_VERSION,
    })
}

/// `GET /health` — notification service probe.
pub async fn notification(State(ctx): State<NotificationContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        service: "Notification Service",
        db_connected: ctx.open_db().is_ok(),
        version: APP_VERSION,
    })
}
