//! Database-backed connection storage with optional encryption at rest.
//!
//! Implements `auth_core::connection::Storage` on top of the `oauth_connections`
//! table. When a [`Cipher`] is configured, token columns hold AES-256-GCM
//! ciphertext and are decrypted on read.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::*;
use sea_orm::DatabaseConnection;
use secrecy::{ExposeSecret, SecretString};

use auth_core::{
    connection::{Connection, Storage},
    error::{storage_error, Error, ErrorKind, StorageErrorKind},
    oauth::token::encryption::Cipher,
};
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use entity_api::oauth_connection;

use crate::{oauth_connections::Model, provider::Provider, Id};

/// Connection storage over the `oauth_connections` table.
///
/// Owners are user ids in their string form.
#[derive(Clone)]
pub struct DbConnectionStorage {
    db: Arc<DatabaseConnection>,
    cipher: Option<Cipher>,
}

impl DbConnectionStorage {
    pub fn new(db: Arc<DatabaseConnection>, cipher: Option<Cipher>) -> Self {
        if cipher.is_none() {
            warn!("No encryption key configured, OAuth tokens are stored in plaintext");
        }
        Self { db, cipher }
    }

    fn seal(&self, plaintext: &str) -> Result<String, Error> {
        match &self.cipher {
            Some(cipher) => cipher.encrypt(plaintext),
            None => Ok(plaintext.to_string()),
        }
    }

    fn open(&self, stored: &str) -> Result<String, Error> {
        match &self.cipher {
            Some(cipher) => cipher.decrypt(stored),
            None => Ok(stored.to_string()),
        }
    }

    fn to_model(&self, connection: Connection) -> Result<Model, Error> {
        let user_id = parse_owner(&connection.owner)?;
        let provider = parse_provider(&connection.provider_name)?;
        let now = Utc::now();

        Ok(Model {
            id: connection.id,
            user_id,
            provider,
            access_token: self.seal(connection.access_token.expose_secret())?,
            refresh_token: connection
                .refresh_token
                .as_ref()
                .map(|token| self.seal(token.expose_secret()))
                .transpose()?,
            token_type: connection.token_type,
            scope: connection.scope,
            issued_at: connection.issued_at.into(),
            expires_at: connection.expires_at.into(),
            version: connection.version,
            created_at: now.into(),
            updated_at: now.into(),
        })
    }

    fn from_model(&self, model: Model) -> Result<Connection, Error> {
        Ok(Connection {
            id: model.id,
            owner: model.user_id.to_string(),
            provider_name: model.provider.to_string(),
            access_token: SecretString::from(self.open(&model.access_token)?),
            refresh_token: model
                .refresh_token
                .as_deref()
                .map(|token| self.open(token).map(SecretString::from))
                .transpose()?,
            token_type: model.token_type,
            scope: model.scope,
            issued_at: DateTime::<Utc>::from(model.issued_at),
            expires_at: DateTime::<Utc>::from(model.expires_at),
            version: model.version,
        })
    }
}

fn parse_owner(owner: &str) -> Result<Id, Error> {
    Id::parse_str(owner).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Storage(StorageErrorKind::Database),
    })
}

fn parse_provider(provider_name: &str) -> Result<Provider, Error> {
    Provider::from_name(provider_name).ok_or_else(|| {
        storage_error(
            StorageErrorKind::Database,
            &format!("no stored provider named {provider_name}"),
        )
    })
}

fn storage_err(err: EntityApiError) -> Error {
    let kind = match err.error_kind {
        EntityApiErrorKind::RecordNotUpdated | EntityApiErrorKind::RecordAlreadyExists => {
            StorageErrorKind::VersionConflict
        }
        EntityApiErrorKind::RecordNotFound => StorageErrorKind::NotFound,
        _ => StorageErrorKind::Database,
    };
    Error {
        source: Some(Box::new(err)),
        error_kind: ErrorKind::Storage(kind),
    }
}

#[async_trait]
impl Storage for DbConnectionStorage {
    async fn get(&self, owner: &str, provider_name: &str) -> Result<Option<Connection>, Error> {
        let user_id = parse_owner(owner)?;
        let provider = parse_provider(provider_name)?;

        oauth_connection::find_by_user_and_provider(self.db.as_ref(), user_id, provider)
            .await
            .map_err(storage_err)?
            .map(|model| self.from_model(model))
            .transpose()
    }

    async fn list(&self, owner: &str) -> Result<Vec<Connection>, Error> {
        let user_id = parse_owner(owner)?;

        let mut connections = oauth_connection::find_by_user(self.db.as_ref(), user_id)
            .await
            .map_err(storage_err)?
            .into_iter()
            .map(|model| self.from_model(model))
            .collect::<Result<Vec<_>, _>>()?;
        connections.sort_by(|a, b| a.provider_name.cmp(&b.provider_name));
        Ok(connections)
    }

    async fn insert(&self, connection: Connection) -> Result<Connection, Error> {
        let model = self.to_model(connection)?;
        let created = oauth_connection::create(self.db.as_ref(), model)
            .await
            .map_err(storage_err)?;
        self.from_model(created)
    }

    async fn update(
        &self,
        connection: Connection,
        expected_version: i32,
    ) -> Result<Connection, Error> {
        let model = self.to_model(connection)?;
        let updated = oauth_connection::update_versioned(self.db.as_ref(), model, expected_version)
            .await
            .map_err(storage_err)?;
        self.from_model(updated)
    }

    async fn delete(&self, owner: &str, provider_name: &str) -> Result<bool, Error> {
        let user_id = parse_owner(owner)?;
        let provider = parse_provider(provider_name)?;

        oauth_connection::delete_by_user_and_provider(self.db.as_ref(), user_id, provider)
            .await
            .map_err(storage_err)
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn connection(owner: Id) -> Connection {
        let now = Utc::now();
        Connection {
            id: Id::new_v4(),
            owner: owner.to_string(),
            provider_name: "github".to_string(),
            access_token: SecretString::from("gho_access".to_string()),
            refresh_token: Some(SecretString::from("ghr_refresh".to_string())),
            token_type: "bearer".to_string(),
            scope: "read:user".to_string(),
            issued_at: now,
            expires_at: now + Duration::hours(8),
            version: 1,
        }
    }

    #[test]
    fn test_tokens_are_encrypted_in_the_model() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let cipher = Cipher::from_hex(KEY).unwrap();
        let storage = DbConnectionStorage::new(db, Some(cipher.clone()));

        let model = storage.to_model(connection(Id::new_v4())).unwrap();
        assert_ne!(model.access_token, "gho_access");
        assert_eq!(cipher.decrypt(&model.access_token).unwrap(), "gho_access");
        assert_eq!(model.provider, Provider::Github);

        let back = storage.from_model(model).unwrap();
        assert_eq!(back.refresh_token(), Some("ghr_refresh"));
    }

    #[test]
    fn test_owner_must_be_a_user_id() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let storage = DbConnectionStorage::new(db, None);

        let mut bad = connection(Id::new_v4());
        bad.owner = "not-a-uuid".to_string();
        let err = storage.to_model(bad).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Storage(StorageErrorKind::Database)
        );
    }

    #[tokio::test]
    async fn test_get_decrypts_stored_tokens() {
        let cipher = Cipher::from_hex(KEY).unwrap();
        let owner = Id::new_v4();
        let plain = DbConnectionStorage::new(
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            Some(cipher.clone()),
        );
        let stored = plain.to_model(connection(owner)).unwrap();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results(vec![vec![stored]])
                .into_connection(),
        );
        let storage = DbConnectionStorage::new(db, Some(cipher));

        let found = storage
            .get(&owner.to_string(), "github")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.access_token.expose_secret(), "gho_access");
        assert_eq!(found.owner, owner.to_string());
    }

    #[tokio::test]
    async fn test_stale_update_is_a_version_conflict() {
        let owner = Id::new_v4();
        let current = {
            let storage = DbConnectionStorage::new(
                Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
                None,
            );
            storage.to_model(connection(owner)).unwrap()
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
                .append_query_results(vec![vec![current]])
                .into_connection(),
        );
        let storage = DbConnectionStorage::new(db, None);

        let err = storage.update(connection(owner), 0).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Storage(StorageErrorKind::VersionConflict)
        );
    }
}
