use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::enums::EventType;
use crate::models::Appointment;

/// The message passed from the appointment service to the notification
/// service on every committed state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_type: EventType,
    pub data: AppointmentEventData,
    pub timestamp: DateTime<Utc>,
}

/// Event payload: a snapshot of the appointment at transition time,
/// retained verbatim in the notification ledger for audit.
///
/// Creation events carry the scheduling fields; decision events carry
/// status and notes; cancellation carries neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentEventData {
    pub appointment_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AppointmentEventData {
    fn base(appt: &Appointment) -> Self {
        Self {
            appointment_id: appt.id.to_string(),
            patient_id: appt.patient_id.clone(),
            patient_name: appt.patient_name.clone(),
            doctor_id: appt.doctor_id.clone(),
            doctor_name: appt.doctor_name.clone(),
            appointment_date: None,
            appointment_time: None,
            reason: None,
            status: None,
            notes: None,
        }
    }

    /// Payload for `appointment.created`.
    pub fn created(appt: &Appointment) -> Self {
        Self {
            appointment_date: Some(appt.appointment_date.clone()),
            appointment_time: Some(appt.appointment_time.clone()),
            reason: Some(appt.reason.clone()),
            ..Self::base(appt)
        }
    }

    /// Payload for a doctor decision (approved / rejected / completed).
    pub fn decided(appt: &Appointment) -> Self {
        Self {
            status: Some(appt.status.as_str().to_string()),
            notes: appt.notes.clone(),
            ..Self::base(appt)
        }
    }

    /// Payload for `appointment.cancelled`.
    pub fn cancelled(appt: &Appointment) -> Self {
        Self::base(appt)
    }
}
