//! CSRF state encoding and validation for OAuth flows.
//!
//! The state value is self-describing: the provider name and issue time are
//! serialized to JSON and base64url-encoded, so nothing has to be kept in
//! process memory between the redirect and the callback.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ProviderKind;
use crate::error::{Error, ErrorKind, OAuthErrorKind};

/// Contents of an encoded state value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateToken {
    pub provider_name: String,
    pub issued_at: DateTime<Utc>,
    /// Where to send the browser once the flow completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    /// Local owner identity when a signed-in user is connecting an account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl StateToken {
    /// Create a state token for `provider_name` issued now.
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            issued_at: Utc::now(),
            return_url: None,
            owner: None,
        }
    }

    pub fn with_return_url(mut self, return_url: Option<String>) -> Self {
        self.return_url = return_url;
        self
    }

    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    /// Serialize to JSON and base64url-encode.
    pub fn encode(&self) -> String {
        // Serializing a struct of strings and a timestamp cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a state value produced by [`StateToken::encode`].
    pub fn decode(encoded: &str) -> Result<Self, Error> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded.trim()).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::DecodeError),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::OAuth(OAuthErrorKind::DecodeError),
        })
    }

    /// The well-known provider named by this state, if any.
    pub fn provider(&self) -> Option<ProviderKind> {
        ProviderKind::from_name(&self.provider_name)
    }
}

/// Encodes and validates state values.
///
/// A state value is accepted only for a known provider and only while its
/// issue time lies within `now ± window`.
#[derive(Debug, Clone)]
pub struct StateCodec {
    window: Duration,
}

impl StateCodec {
    /// Create a codec with the default validity window of 2 hours.
    pub fn new() -> Self {
        Self {
            window: Duration::hours(2),
        }
    }

    /// Create a codec with a custom validity window.
    pub fn with_window(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Encode a fresh state value for `provider_name`.
    pub fn encode(
        &self,
        provider_name: &str,
        return_url: Option<String>,
        owner: Option<String>,
    ) -> String {
        StateToken::new(provider_name)
            .with_return_url(return_url)
            .with_owner(owner)
            .encode()
    }

    /// Decode a state value without validating it.
    pub fn decode(&self, encoded: &str) -> Result<StateToken, Error> {
        StateToken::decode(encoded)
    }

    /// Decode and validate a state value, returning its contents if valid.
    pub fn check(&self, encoded: &str) -> Option<StateToken> {
        let token = match self.decode(encoded) {
            Ok(token) => token,
            Err(e) => {
                debug!("Rejecting undecodable OAuth state: {}", e);
                return None;
            }
        };

        if token.provider().is_none() {
            debug!(
                "Rejecting OAuth state for unknown provider {}",
                token.provider_name
            );
            return None;
        }

        let age = Utc::now() - token.issued_at;
        if age > self.window || age < -self.window {
            debug!("Rejecting OAuth state issued at {}", token.issued_at);
            return None;
        }

        Some(token)
    }

    /// Validate a state value. Never errors: anything invalid is `false`.
    pub fn validate(&self, encoded: &str) -> bool {
        self.check(encoded).is_some()
    }
}

impl Default for StateCodec {
    fn default() -> Self {
        Self::new()
    }
}
