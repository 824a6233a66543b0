//! Bearer/cookie token authentication middleware.
//!
//! Extracts the identity provider's JWT from `Authorization: Bearer` or
//! the `token` cookie, verifies it, and injects `AuthUser` into request
//! extensions for downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{AppointmentContext, AuthUser};
use crate::identity;

/// Require a valid identity assertion on the request.
///
/// Accesses `AppointmentContext` from request extensions (injected by the
/// Extension layer). Missing and invalid credentials are both 401.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: AppointmentContext = req
        .extensions()
        .get::<AppointmentContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = extract_token(&req).ok_or(ApiError::Unauthorized)?;

    let claims =
        identity::verify_token(&token, &ctx.jwt_secret).map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser {
        id: claims.user_id,
        email: claims.email,
        role: claims.role,
        token,
    });

    Ok(next.run(req).await)
}

/// Token from `Authorization: Bearer <jwt>` or the `token=` cookie.
fn extract_token(req: &Request<axum::body::Body>) -> Option<String> {
    if let Some(bearer) = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(bearer.to_string());
    }

    req.headers()
        .get("Cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                pair.trim().strip_prefix("token=").map(|v| v.to_string())
            })
        })
}
