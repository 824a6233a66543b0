//! Repository layer — entity-scoped database operations.
//!
//! Free functions over `&Connection`, one sub-module per record collection.
//! All public functions are re-exported here.

pub mod appointment;
pub mod notification;

pub use appointment::*;
pub use notification::*;
