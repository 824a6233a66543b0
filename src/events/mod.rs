//! Cross-service event pipeline.
//!
//! Every committed appointment state change becomes an envelope delivered
//! to the notification service, which classifies it into a persisted,
//! per-recipient notification. Delivery is at-most-once and best-effort
//! by design: no queue, no retry, failures logged and dropped.

pub mod classify;
pub mod envelope;
pub mod publisher;

pub use classify::{classify_event, NotificationDraft};
pub use envelope::{AppointmentEventData, EventEnvelope};
pub use publisher::EventPublisher;
