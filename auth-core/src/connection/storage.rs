//! Persistence seam for connections.

use async_trait::async_trait;

use super::Connection;
use crate::error::Error;

/// Trait for storing and retrieving connections.
///
/// Connections are keyed by `(owner, provider_name)` with the provider name
/// already lowercased. Writes after the first go through [`Storage::update`],
/// which must be a compare-and-swap on `version`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Retrieve the connection for an owner and provider.
    ///
    /// # Returns
    ///
    /// `Some(Connection)` if found, `None` if not found.
    async fn get(&self, owner: &str, provider_name: &str) -> Result<Option<Connection>, Error>;

    /// All connections belonging to `owner`, ordered by provider name.
    async fn list(&self, owner: &str) -> Result<Vec<Connection>, Error>;

    /// Persist a new connection.
    ///
    /// Fails with `StorageErrorKind::VersionConflict` if a connection for the
    /// same owner and provider already exists.
    async fn insert(&self, connection: Connection) -> Result<Connection, Error>;

    /// Overwrite a connection if its stored version still equals `expected_version`.
    ///
    /// The stored version becomes `expected_version + 1`.
    ///
    /// # Returns
    ///
    /// The stored connection, `StorageErrorKind::VersionConflict` if another
    /// writer got there first, or `StorageErrorKind::NotFound` if it was deleted.
    async fn update(&self, connection: Connection, expected_version: i32)
        -> Result<Connection, Error>;

    /// Delete the connection for an owner and provider.
    ///
    /// # Returns
    ///
    /// `true` if a connection was deleted.
    async fn delete(&self, owner: &str, provider_name: &str) -> Result<bool, Error>;
}
