//! Fire-and-forget event delivery to the notification service.

use std::time::Duration;

use chrono::Utc;

use crate::events::envelope::{AppointmentEventData, EventEnvelope};
use crate::identity::UPSTREAM_TIMEOUT_SECS;
use crate::models::enums::EventType;

/// Publishes event envelopes to the notification service's ingest
/// endpoint. Cheap to clone; the inner `reqwest::Client` is shared.
#[derive(Clone)]
pub struct EventPublisher {
    client: reqwest::Client,
    events_url: String,
}

impl EventPublisher {
    pub fn new(notification_service_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            events_url: format!(
                "{}/api/events",
                notification_service_url.trim_end_matches('/')
            ),
        }
    }

    /// Emit an event without blocking the caller.
    ///
    /// Delivery runs on a spawned task with a bounded timeout, after the
    /// triggering mutation has already committed. Failures are logged and
    /// swallowed: the mutation is never rolled back, so the pipeline is
    /// at-most-once — a notification can be silently lost when the ingest
    /// endpoint is unreachable. Callers must not depend on notifications
    /// for correctness.
    pub fn emit(&self, event_type: EventType, data: AppointmentEventData) {
        let envelope = EventEnvelope {
            event_type,
            data,
            timestamp: Utc::now(),
        };
        let client = self.client.clone();
        let url = self.events_url.clone();

        tokio::spawn(async move {
            match deliver(&client, &url, &envelope).await {
                Ok(()) => {
                    tracing::info!(event = envelope.event_type.as_str(), "Event emitted");
                }
                Err(e) => {
                    tracing::warn!(
                        event = envelope.event_type.as_str(),
                        "Event delivery failed, dropping: {e}"
                    );
                }
            }
        });
    }
}

async fn deliver(
    client: &reqwest::Client,
    url: &str,
    envelope: &EventEnvelope,
) -> Result<(), reqwest::Error> {
    client
        .post(url)
        .json(envelope)
        .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::AppointmentStatus;
    use crate::models::Appointment;
    use uuid::Uuid;

    fn sample_data() -> AppointmentEventData {
        let appt = Appointment {
            id: Uuid::new_v4(),
            patient_id: "p1".into(),
            doctor_id: "d1".into(),
            patient_name: "Pat Doe".into(),
            doctor_name: "Dr. House".into(),
            appointment_date: "2025-03-01".into(),
            appointment_time: "10:00".into(),
            reason: "checkup".into(),
            status: AppointmentStatus::Pending,
            notes: None,
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: chrono::Utc::now().naive_utc(),
        };
        AppointmentEventData::created(&appt)
    }

    #[tokio::test]
    async fn emit_to_unreachable_ingest_does_not_fail_the_caller() {
        // Nothing listens on this port; the spawned delivery must swallow
        // the error without surfacing anywhere.
        let publisher = EventPublisher::new("http://127.0.0.1:9");
        publisher.emit(EventType::Created, sample_data());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn deliver_reports_connection_errors() {
        let client = reqwest::Client::new();
        let envelope = EventEnvelope {
            event_type: EventType::Created,
            data: sample_data(),
            timestamp: Utc::now(),
        };
        let result = deliver(&client, "http://127.0.0.1:9/api/events", &envelope).await;
        assert!(result.is_err());
    }

    #[test]
    fn events_url_is_normalized() {
        let p = EventPublisher::new("http://localhost:3003/");
        assert_eq!(p.events_url, "http://localhost:3003/api/events");
    }
}
