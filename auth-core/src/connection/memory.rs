//! In-process [`Storage`] backed by a concurrent map.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{Connection, Storage};
use crate::error::{storage_error, Error, StorageErrorKind};

type Key = (String, String);

/// Connection storage for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    connections: DashMap<Key, Connection>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(owner: &str, provider_name: &str) -> Key {
        (owner.to_string(), provider_name.to_string())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, owner: &str, provider_name: &str) -> Result<Option<Connection>, Error> {
        Ok(self
            .connections
            .get(&Self::key(owner, provider_name))
            .map(|entry| entry.value().clone()))
    }

    async fn list(&self, owner: &str) -> Result<Vec<Connection>, Error> {
        let mut connections: Vec<Connection> = self
            .connections
            .iter()
            .filter(|entry| entry.key().0 == owner)
            .map(|entry| entry.value().clone())
            .collect();
        connections.sort_by(|a, b| a.provider_name.cmp(&b.provider_name));
        Ok(connections)
    }

    async fn insert(&self, connection: Connection) -> Result<Connection, Error> {
        match self
            .connections
            .entry(Self::key(&connection.owner, &connection.provider_name))
        {
            Entry::Occupied(_) => Err(storage_error(
                StorageErrorKind::VersionConflict,
                "connection already exists",
            )),
            Entry::Vacant(vacant) => {
                vacant.insert(connection.clone());
                Ok(connection)
            }
        }
    }

    async fn update(
        &self,
        mut connection: Connection,
        expected_version: i32,
    ) -> Result<Connection, Error> {
        let key = Self::key(&connection.owner, &connection.provider_name);
        let mut stored = self
            .connections
            .get_mut(&key)
            .ok_or_else(|| storage_error(StorageErrorKind::NotFound, "connection not found"))?;

        if stored.version != expected_version {
            return Err(storage_error(
                StorageErrorKind::VersionConflict,
                "connection was modified concurrently",
            ));
        }

        connection.version = expected_version + 1;
        *stored = connection.clone();
        Ok(connection)
    }

    async fn delete(&self, owner: &str, provider_name: &str) -> Result<bool, Error> {
        Ok(self
            .connections
            .remove(&Self::key(owner, provider_name))
            .is_some())
    }
}
