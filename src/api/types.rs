//! Shared state and auth types for the two service routers.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::config::{AppointmentConfig, NotificationConfig};
use crate::db::sqlite::{open_appointment_database, open_notification_database};
use crate::events::EventPublisher;
use crate::identity::IdentityClient;
use crate::models::enums::Role;

// ═══════════════════════════════════════════════════════════
// Service contexts — shared state for routers and middleware
// ═══════════════════════════════════════════════════════════

/// Shared context for the appointment service routes and middleware.
#[derive(Clone)]
pub struct AppointmentContext {
    db_path: Arc<PathBuf>,
    pub jwt_secret: Arc<String>,
    pub identity: IdentityClient,
    pub publisher: EventPublisher,
}

impl AppointmentContext {
    pub fn new(config: &AppointmentConfig) -> Self {
        Self {
            db_path: Arc::new(config.db_path.clone()),
            jwt_secret: Arc::new(config.jwt_secret.clone()),
            identity: IdentityClient::new(&config.auth_service_url),
            publisher: EventPublisher::new(&config.notification_service_url),
        }
    }

    /// Open a connection to the appointment store. Handlers open per
    /// request; conditional updates stay atomic across connections.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        open_appointment_database(&self.db_path).map_err(ApiError::from)
    }
}

/// Shared context for the notification service routes.
#[derive(Clone)]
pub struct NotificationContext {
    db_path: Arc<PathBuf>,
}

impl NotificationContext {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            db_path: Arc::new(config.db_path.clone()),
        }
    }

    pub fn open_db(&self) -> Result<Connection, ApiError> {
        open_notification_database(&self.db_path).map_err(ApiError::from)
    }
}

// ═══════════════════════════════════════════════════════════
// Auth context — injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions by the auth
/// middleware after successful token verification.
///
/// The raw token is kept so handlers can forward the caller's credential
/// to the identity provider (display-name enrichment).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub token: String,
}

impl AuthUser {
    /// The caller's role as a known variant. Roles outside the closed
    /// set are a capability failure, not a credential failure.
    pub fn role(&self) -> Result<Role, ApiError> {
        Role::from_str(&self.role).map_err(|_| ApiError::Forbidden)
    }

    /// Capability check performed once at the entry of each operation.
    pub fn require_role(&self, required: Role) -> Result<(), ApiError> {
        if self.role()? == required {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}
