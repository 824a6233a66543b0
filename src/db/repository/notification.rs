use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::appointment::TIMESTAMP_FORMAT;
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::Notification;

/// Read notifications older than this are eligible for the retention sweep.
pub const RETENTION_DAYS: i64 = 30;

pub fn insert_notification(
    conn: &Connection,
    notification: &Notification,
) -> Result<(), DatabaseError> {
    let payload_json = serde_json::to_string(&notification.payload)
        .unwrap_or_else(|_| "{}".to_string());

    conn.execute(
        "INSERT INTO notifications
         (id, event_type, message, recipient_type, recipient_id, payload, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            notification.id.to_string(),
            notification.event_type,
            notification.message,
            notification.recipient_type.as_str(),
            notification.recipient_id,
            payload_json,
            notification.read as i32,
            notification.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// A recipient's notifications, newest first, paginated via limit/skip.
pub fn list_notifications(
    conn: &Connection,
    recipient_id: &str,
    recipient_type: Role,
    limit: i64,
    skip: i64,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, message, recipient_type, recipient_id, payload, read, created_at
         FROM notifications
         WHERE recipient_id = ?1 AND recipient_type = ?2
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?3 OFFSET ?4",
    )?;

    let rows = stmt.query_map(
        params![recipient_id, recipient_type.as_str(), limit, skip],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i32>(6)?,
                row.get::<_, String>(7)?,
            ))
        },
    )?;

    let mut notifications = Vec::new();
    for row in rows {
        let (id, event_type, message, recipient_type, recipient_id, payload, read, created_at) =
            row?;
        notifications.push(Notification {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            event_type,
            message,
            recipient_type: Role::from_str(&recipient_type)?,
            recipient_id,
            payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::Null),
            read: read != 0,
            created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT)
                .map_err(|e| DatabaseError::ConstraintViolation(format!("Invalid timestamp: {e}")))?,
        });
    }
    Ok(notifications)
}

/// Mark a notification read. Returns `false` when no such record exists.
/// Marking an already-read notification again is a no-op success.
pub fn mark_notification_read(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let matched = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(matched > 0)
}

/// Count of unread notifications addressed to the recipient.
pub fn unread_count(
    conn: &Connection,
    recipient_id: &str,
    recipient_type: Role,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM notifications
         WHERE recipient_id = ?1 AND recipient_type = ?2 AND read = 0",
        params![recipient_id, recipient_type.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Delete notifications that are read AND older than the retention horizon.
/// Unread rows are never touched, regardless of age. Returns the count
/// deleted; running twice (or concurrently with ingestion) is safe.
pub fn sweep_notifications(
    conn: &Connection,
    now: NaiveDateTime,
) -> Result<usize, DatabaseError> {
    let cutoff = now - Duration::days(RETENTION_DAYS);
    let deleted = conn.execute(
        "DELETE FROM notifications WHERE read = 1 AND created_at < ?1",
        params![cutoff.format(TIMESTAMP_FORMAT).to_string()],
    )?;
    Ok(deleted)
}
