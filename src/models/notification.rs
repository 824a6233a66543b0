use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;

/// A persisted notification derived from one appointment event.
///
/// Created only by the ingest path, mutated only by mark-read, deleted
/// only by the retention sweep. `payload` keeps the original event data
/// for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub event_type: String,
    pub message: String,
    pub recipient_type: Role,
    pub recipient_id: String,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: NaiveDateTime,
}
