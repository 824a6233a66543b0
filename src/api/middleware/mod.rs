//! API middleware.
//!
//! The appointment service wraps every data route in `auth::require_auth`;
//! the notification service exposes its surface unauthenticated, matching
//! the platform's service boundaries (its callers are the other services
//! and the polling web client).

pub mod auth;
