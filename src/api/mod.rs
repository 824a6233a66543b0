//! HTTP surface of the platform's two services.
//!
//! The appointment service owns the appointment state machine; the
//! notification service owns the notification ledger and the event
//! ingest endpoint. Both are composable axum `Router`s served by the
//! lifecycle helpers in `server`.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::{appointment_router, notification_router};
pub use server::{start_appointment_service, start_notification_service, ServiceServer};
pub use types::{AppointmentContext, AuthUser, NotificationContext};
