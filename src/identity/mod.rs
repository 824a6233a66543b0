//! Identity provider boundary.
//!
//! The identity provider is an external collaborator: it registers users
//! and issues HS256 JWTs. This module only verifies those assertions and
//! queries `/api/auth/me` to enrich a patient's display name at
//! appointment creation.

use std::time::Duration;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Enrichment and delivery calls share one upstream deadline.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 5;

/// Display name used when the identity provider cannot be reached.
pub const NAME_PLACEHOLDER: &str = "Patient";

/// Claims carried by the identity provider's signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
}

/// Verify a token signature + expiry and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Client for the identity provider's `/api/auth/me` endpoint.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    me_url: String,
}

impl IdentityClient {
    pub fn new(auth_service_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            me_url: format!("{}/api/auth/me", auth_service_url.trim_end_matches('/')),
        }
    }

    /// Resolve the caller's display name from the identity provider.
    ///
    /// Returns `None` on any failure (timeout, network error, non-2xx,
    /// malformed body) — callers fall back to [`NAME_PLACEHOLDER`] so that
    /// appointment creation never fails merely because enrichment did.
    pub async fn fetch_full_name(&self, token: &str) -> Option<String> {
        match self.try_fetch(token).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!("Identity lookup failed, using placeholder name: {e}");
                None
            }
        }
    }

    async fn try_fetch(&self, token: &str) -> Result<String, reqwest::Error> {
        #[derive(Deserialize)]
        struct MeBody {
            user: MeUser,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct MeUser {
            full_name: String,
        }

        let body: MeBody = self
            .client
            .get(&self.me_url)
            .header(reqwest::header::COOKIE, format!("token={token}"))
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.user.full_name)
    }
}

/// Mint a token the way the identity provider does. Test support only —
/// token issuance is the provider's job, not this platform's.
#[cfg(test)]
pub fn issue_token(user_id: &str, email: &str, role: &str, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        user_id: user_id.into(),
        email: email.into(),
        role: role.into(),
        exp: (chrono::Utc::now() + chrono::Duration::days(7)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding cannot fail with HS256")
}
