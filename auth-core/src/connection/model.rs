use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::oauth::token::TokenResponse;

/// Stored tokens for one (owner, provider) pair.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: Uuid,
    /// Local identity the connection belongs to.
    pub owner: String,
    /// Lowercased provider name.
    pub provider_name: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub token_type: String,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Incremented on every write; guards concurrent updates.
    pub version: i32,
}

impl Connection {
    /// A new, not yet persisted connection at version 1.
    pub fn new(
        owner: &str,
        provider_name: &str,
        tokens: &TokenResponse,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            provider_name: canonical_provider(provider_name),
            access_token: SecretString::from(tokens.access_token.clone()),
            refresh_token: tokens
                .refresh_token()
                .map(|t| SecretString::from(t.to_string())),
            token_type: tokens.token_type.clone(),
            scope: tokens.scope.clone(),
            issued_at,
            expires_at: tokens.expires_at(issued_at),
            version: 1,
        }
    }

    /// Overwrite tokens, scope and timestamps in place.
    ///
    /// A response without a refresh token keeps the current one.
    pub fn with_tokens(mut self, tokens: &TokenResponse, issued_at: DateTime<Utc>) -> Self {
        self.access_token = SecretString::from(tokens.access_token.clone());
        if let Some(refresh_token) = tokens.refresh_token() {
            self.refresh_token = Some(SecretString::from(refresh_token.to_string()));
        }
        self.token_type = tokens.token_type.clone();
        if !tokens.scope.is_empty() {
            self.scope = tokens.scope.clone();
        }
        self.issued_at = issued_at;
        self.expires_at = tokens.expires_at(issued_at);
        self
    }

    /// The refresh token, treating an empty value as absent.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.is_empty())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expired from the instant `expires_at` is reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub(crate) fn canonical_provider(name: &str) -> String {
    name.trim().to_lowercase()
}
