//! Notification ledger endpoints.
//!
//! - `GET /api/notifications/:recipientId/:recipientType` — list, paginated
//! - `PATCH /api/notifications/:id/read` — mark read (idempotent)
//! - `GET /api/notifications/:recipientId/:recipientType/unread-count`
//! - `DELETE /api/notifications/cleanup` — retention sweep

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::now_utc;
use crate::api::error::ApiError;
use crate::api::types::NotificationContext;
use crate::db::repository::{
    list_notifications, mark_notification_read, sweep_notifications, unread_count,
};
use crate::models::enums::Role;
use crate::models::Notification;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub message: &'static str,
    pub deleted_count: usize,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn parse_recipient_type(raw: &str) -> Result<Role, ApiError> {
    Role::from_str(raw).map_err(|_| ApiError::Validation("Invalid recipient type".into()))
}

/// `GET /api/notifications/:recipientId/:recipientType` — a recipient's
/// notifications, newest first.
pub async fn list(
    State(ctx): State<NotificationContext>,
    Path((recipient_id, recipient_type)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let recipient_type = parse_recipient_type(&recipient_type)?;
    let limit = query.limit.unwrap_or(50).max(0);
    let skip = query.skip.unwrap_or(0).max(0);

    let conn = ctx.open_db()?;
    let notifications = list_notifications(&conn, &recipient_id, recipient_type, limit, skip)?;

    Ok(Json(NotificationsResponse { notifications }))
}

/// `PATCH /api/notifications/:id/read` — mark one notification read.
///
/// Marking an already-read notification again is a no-op success; only a
/// record that does not exist yields 404. Malformed ids read as 404 too,
/// matching what an unknown id looks like.
pub async fn mark_read(
    State(ctx): State<NotificationContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound("Notification not found".into()))?;

    let conn = ctx.open_db()?;
    if !mark_notification_read(&conn, &id)? {
        return Err(ApiError::NotFound("Notification not found".into()));
    }

    Ok(Json(MessageResponse {
        message: "Notification marked as read",
    }))
}

/// `GET /api/notifications/:recipientId/:recipientType/unread-count`
pub async fn unread(
    State(ctx): State<NotificationContext>,
    Path((recipient_id, recipient_type)): Path<(String, String)>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let recipient_type = parse_recipient_type(&recipient_type)?;

    let conn = ctx.open_db()?;
    let unread_count = unread_count(&conn, &recipient_id, recipient_type)?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

/// `DELETE /api/notifications/cleanup` — delete read notifications older
/// than the retention horizon.
pub async fn cleanup(
    State(ctx): State<NotificationContext>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let deleted_count = sweep_notifications(&conn, now_utc())?;

    tracing::info!(deleted_count, "Notification retention sweep completed");

    Ok(Json(CleanupResponse {
        message: "Cleanup completed",
        deleted_count,
    }))
}
