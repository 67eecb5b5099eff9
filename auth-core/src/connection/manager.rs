//! Connection manager with optimistic concurrency.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::model::canonical_provider;
use super::{Connection, Storage};
use crate::error::{token_error, Error, TokenErrorKind};
use crate::oauth::token::TokenResponse;
use crate::oauth::TokenClient;
use crate::providers::ProviderConfig;

/// Coordinates connection writes on top of a [`Storage`] backend.
///
/// There are no locks: every write after the first is a compare-and-swap on
/// the connection's version, so a lost race surfaces as
/// `StorageErrorKind::VersionConflict` and the caller decides whether to retry.
pub struct Manager<S: Storage> {
    storage: S,
}

impl<S: Storage> Manager<S> {
    /// Create a new connection manager with the given storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Create or overwrite the connection for `owner` and `provider_name`.
    pub async fn upsert(
        &self,
        owner: &str,
        provider_name: &str,
        tokens: &TokenResponse,
    ) -> Result<Connection, Error> {
        self.upsert_at(owner, provider_name, tokens, Utc::now())
            .await
    }

    /// [`Manager::upsert`] with an explicit time the tokens were obtained.
    pub async fn upsert_at(
        &self,
        owner: &str,
        provider_name: &str,
        tokens: &TokenResponse,
        issued_at: DateTime<Utc>,
    ) -> Result<Connection, Error> {
        let provider_name = canonical_provider(provider_name);

        let connection = match self.storage.get(owner, &provider_name).await? {
            Some(existing) => {
                let expected_version = existing.version;
                self.storage
                    .update(existing.with_tokens(tokens, issued_at), expected_version)
                    .await?
            }
            None => {
                self.storage
                    .insert(Connection::new(owner, &provider_name, tokens, issued_at))
                    .await?
            }
        };

        debug!(
            "Stored {} connection {} at version {}",
            provider_name, connection.id, connection.version
        );
        Ok(connection)
    }

    /// The stored connection, whether or not its access token has expired.
    pub async fn get_active(
        &self,
        owner: &str,
        provider_name: &str,
    ) -> Result<Option<Connection>, Error> {
        self.storage
            .get(owner, &canonical_provider(provider_name))
            .await
    }

    pub fn is_expired(&self, connection: &Connection) -> bool {
        connection.is_expired()
    }

    /// Exchange the connection's refresh token for new tokens.
    ///
    /// Fails with `NoRefreshToken` without contacting the provider when the
    /// refresh token is absent or empty. The write is a compare-and-swap
    /// against `connection.version`.
    pub async fn refresh(
        &self,
        client: &TokenClient,
        config: &ProviderConfig,
        connection: &Connection,
    ) -> Result<Connection, Error> {
        let refresh_token = connection.refresh_token().ok_or_else(|| {
            warn!(
                "Cannot refresh {} connection {}: no refresh token",
                connection.provider_name, connection.id
            );
            token_error(TokenErrorKind::NoRefreshToken, "No refresh token available")
        })?;

        let issued_at = Utc::now();
        let tokens = client.refresh(config, refresh_token).await?;

        let refreshed = self
            .storage
            .update(
                connection.clone().with_tokens(&tokens, issued_at),
                connection.version,
            )
            .await?;

        info!(
            "Refreshed {} connection {}",
            refreshed.provider_name, refreshed.id
        );
        Ok(refreshed)
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<Connection>, Error> {
        self.storage.list(owner).await
    }

    /// Delete the connection for `owner` and `provider_name`.
    pub async fn disconnect(&self, owner: &str, provider_name: &str) -> Result<(), Error> {
        let provider_name = canonical_provider(provider_name);
        if self.storage.delete(owner, &provider_name).await? {
            info!("Disconnected {} for owner {}", provider_name, owner);
            Ok(())
        } else {
            Err(token_error(
                TokenErrorKind::NotFound,
                "No connection found for provider",
            ))
        }
    }
}
