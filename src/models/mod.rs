pub mod appointment;
pub mod enums;
pub mod notification;

pub use appointment::Appointment;
pub use enums::{AppointmentStatus, EventType, Role};
pub use notification::Notification;
