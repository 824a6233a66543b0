//! Event classification — the fixed lookup from event tag to a
//! human-readable message and its recipient.

use std::str::FromStr;

use crate::events::envelope::AppointmentEventData;
use crate::models::enums::{EventType, Role};

/// The derived notification content for one event: message text plus the
/// (role, identity) pair it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub event_type: EventType,
    pub message: String,
    pub recipient_type: Role,
    pub recipient_id: String,
}

/// Classify a raw event into a notification draft.
///
/// Returns `None` for unknown event tags and for payloads that do not
/// parse as appointment event data — both are logged and dropped, no
/// error surfaces back to the publisher.
pub fn classify_event(event_type: &str, data: &serde_json::Value) -> Option<NotificationDraft> {
    let Ok(event_type) = EventType::from_str(event_type) else {
        tracing::warn!(event_type, "Unknown event type, discarding");
        return None;
    };

    let data: AppointmentEventData = match serde_json::from_value(data.clone()) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(
                event_type = event_type.as_str(),
                "Malformed event payload, discarding: {e}"
            );
            return None;
        }
    };

    let (message, recipient_type, recipient_id) = match event_type {
        EventType::Created => (
            format!(
                "New appointment request from {} on {} at {}",
                data.patient_name,
                data.appointment_date.as_deref().unwrap_or(""),
                data.appointment_time.as_deref().unwrap_or(""),
            ),
            Role::Doctor,
            data.doctor_id,
        ),
        EventType::Approved => (
            format!(
                "Your appointment with Dr. {} has been approved!",
                data.doctor_name
            ),
            Role::Patient,
            data.patient_id,
        ),
        EventType::Rejected => (
            format!(
                "Your appointment with Dr. {} has been rejected. {}",
                data.doctor_name,
                data.notes.as_deref().unwrap_or(""),
            ),
            Role::Patient,
            data.patient_id,
        ),
        EventType::Completed => (
            format!(
                "Your appointment with Dr. {} has been marked as completed.",
                data.doctor_name
            ),
            Role::Patient,
            data.patient_id,
        ),
        EventType::Cancelled => (
            format!("Appointment with {} has been cancelled.", data.patient_name),
            Role::Doctor,
            data.doctor_id,
        ),
    };

    Some(NotificationDraft {
        event_type,
        message,
        recipient_type,
        recipient_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "appointmentId": "a1",
            "patientId": "p1",
            "patientName": "Pat Doe",
            "doctorId": "d1",
            "doctorName": "House",
            "appointmentDate": "2025-03-01",
            "appointmentTime": "10:00",
            "reason": "checkup",
        })
    }

    #[test]
    fn created_targets_the_doctor() {
        let draft = classify_event("appointment.created", &payload()).unwrap();
        assert_eq!(
            draft.message,
            "New appointment request from Pat Doe on 2025-03-01 at 10:00"
        );
        assert_eq!(draft.recipient_type, Role::Doctor);
        assert_eq!(draft.recipient_id, "d1");
        assert_eq!(draft.event_type, EventType::Created);
    }

    #[test]
    fn approved_targets_the_patient() {
        let draft = classify_event("appointment.approved", &payload()).unwrap();
        assert_eq!(
            draft.message,
            "Your appointment with Dr. House has been approved!"
        );
        assert_eq!(draft.recipient_type, Role::Patient);
        assert_eq!(draft.recipient_id, "p1");
    }

    #[test]
    fn rejected_appends_notes() {
        let mut data = payload();
        data["notes"] = serde_json::json!("slot unavailable");

        let draft = classify_event("appointment.rejected", &data).unwrap();
        assert_eq!(
            draft.message,
            "Your appointment with Dr. House has been rejected. slot unavailable"
        );
        assert_eq!(draft.recipient_type, Role::Patient);
        assert_eq!(draft.recipient_id, "p1");
    }

    #[test]
    fn completed_targets_the_patient() {
        let draft = classify_event("appointment.completed", &payload()).unwrap();
        assert_eq!(
            draft.message,
            "Your appointment with Dr. House has been marked as completed."
        );
        assert_eq!(draft.recipient_type, Role::Patient);
        assert_eq!(draft.recipient_id, "p1");
    }

    #[test]
    fn cancelled_targets_the_doctor() {
        let draft = classify_event("appointment.cancelled", &payload()).unwrap();
        assert_eq!(draft.message, "Appointment with Pat Doe has been cancelled.");
        assert_eq!(draft.recipient_type, Role::Doctor);
        assert_eq!(draft.recipient_id, "d1");
    }

    #[test]
    fn unknown_event_type_is_discarded() {
        assert!(classify_event("appointment.rescheduled", &payload()).is_none());
        assert!(classify_event("", &payload()).is_none());
    }

    #[test]
    fn malformed_payload_is_discarded() {
        let data = serde_json::json!({ "unexpected": true });
        assert!(classify_event("appointment.created", &data).is_none());
    }
}
