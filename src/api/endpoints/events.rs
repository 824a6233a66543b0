//! Event ingest — the notification service's side of the cross-service
//! handoff.
//!
//! The publisher is acknowledged as soon as the envelope passes shape
//! validation; classification and persistence run after the response on
//! a spawned task. Failures there are logged only — by then the origin
//! has already been told 200 and can only observe them as an absent
//! notification.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::now_utc;
use crate::api::error::ApiError;
use crate::api::types::NotificationContext;
use crate::db::repository::insert_notification;
use crate::events::classify_event;
use crate::models::Notification;

/// Incoming envelope. The envelope's `timestamp` field is accepted but
/// ignored: the ledger stamps records with its own clock.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub message: &'static str,
}

/// `POST /api/events` — receive an event envelope.
pub async fn ingest(
    State(ctx): State<NotificationContext>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    if body.event_type.trim().is_empty() || body.data.is_null() {
        return Err(ApiError::Validation("Invalid event data".into()));
    }

    tokio::spawn(async move {
        process_event(&ctx, &body.event_type, &body.data);
    });

    Ok(Json(IngestResponse {
        message: "Event received",
    }))
}

/// Classify one event and persist the derived notification.
///
/// Unknown event tags and malformed payloads are dropped inside
/// `classify_event`; storage failures are logged here.
pub(crate) fn process_event(
    ctx: &NotificationContext,
    event_type: &str,
    data: &serde_json::Value,
) {
    let Some(draft) = classify_event(event_type, data) else {
        return;
    };

    let notification = Notification {
        id: Uuid::new_v4(),
        event_type: draft.event_type.as_str().to_string(),
        message: draft.message,
        recipient_type: draft.recipient_type,
        recipient_id: draft.recipient_id,
        payload: data.clone(),
        read: false,
        created_at: now_utc(),
    };

    let stored = ctx
        .open_db()
        .and_then(|conn| insert_notification(&conn, &notification).map_err(ApiError::from));

    match stored {
        Ok(()) => tracing::info!(
            event = event_type,
            recipient = %notification.recipient_id,
            "Notification stored"
        ),
        Err(e) => tracing::error!(event = event_type, "Failed to store notification: {e}"),
    }
}
