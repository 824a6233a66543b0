//! Service routers.
//!
//! Each service is a composable `Router`: data routes nested under
//! `/api`, an unauthenticated `/health` probe at the root, and CORS
//! restricted to the configured frontend origin.
//!
//! The appointment router wraps every data route in the auth middleware
//! (`Extension<AppointmentContext>` injected as the outermost layer so
//! the middleware can reach it); the notification router is
//! unauthenticated, matching the platform's service boundaries.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::{AppointmentContext, NotificationContext};
use crate::config::{AppointmentConfig, NotificationConfig};

/// Build the appointment service router.
pub fn appointment_router(config: &AppointmentConfig) -> Router {
    let ctx = AppointmentContext::new(config);

    // Routes with state — .with_state() converts Router<AppointmentContext>
    // → Router<()> so the from_fn middleware layers are compatible.
    let protected = Router::new()
        .route(
            "/appointments",
            post(endpoints::appointments::create).get(endpoints::appointments::list),
        )
        .route("/appointments/:id", get(endpoints::appointments::detail))
        .route(
            "/appointments/:id/status",
            patch(endpoints::appointments::update_status),
        )
        .route(
            "/appointments/:id/cancel",
            patch(endpoints::appointments::cancel),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let health = Router::new()
        .route("/health", get(endpoints::health::appointment))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .merge(health)
        .layer(cors(&config.frontend_origin))
}

/// Build the notification service router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7), and
/// the `/notifications` routes share the `:id` name for their second
/// segment — matchit requires one param name per position.
pub fn notification_router(config: &NotificationConfig) -> Router {
    let ctx = NotificationContext::new(config);

    let api = Router::new()
        .route("/events", post(endpoints::events::ingest))
        .route(
            "/notifications/cleanup",
            delete(endpoints::notifications::cleanup),
        )
        .route(
            "/notifications/:id/read",
            patch(endpoints::notifications::mark_read),
        )
        .route(
            "/notifications/:id/:recipient_type",
            get(endpoints::notifications::list),
        )
        .route(
            "/notifications/:id/:recipient_type/unread-count",
            get(endpoints::notifications::unread),
        )
        .with_state(ctx.clone());

    let health = Router::new()
        .route("/health", get(endpoints::health::notification))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(cors(&config.frontend_origin))
}

fn cors(frontend_origin: &str) -> CorsLayer {
    let origin = frontend_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true)
}
