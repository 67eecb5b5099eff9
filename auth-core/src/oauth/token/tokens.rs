//! OAuth token response types.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Lifetime assumed when a token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

/// Upper bound on a provider-reported lifetime (ten years).
pub const MAX_EXPIRES_IN_SECONDS: i64 = 10 * 365 * 24 * 3600;

/// Token endpoint response for an authorization-code or refresh-token grant.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, rename = "expires_in")]
    pub expires_in_seconds: Option<i64>,
    #[serde(default)]
    pub scope: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// When the access token expires, measured from `issued_at`.
    ///
    /// `expires_in` comes from the provider, so it is clamped to
    /// `0..=MAX_EXPIRES_IN_SECONDS`; a negative value means already expired.
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        let seconds = self
            .expires_in_seconds
            .unwrap_or(DEFAULT_EXPIRES_IN_SECONDS)
            .clamp(0, MAX_EXPIRES_IN_SECONDS);
        Duration::try_seconds(seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// The refresh token, treating an empty string as absent.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

// Token material never reaches logs.
impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .field("scope", &self.scope)
            .finish()
    }
}
