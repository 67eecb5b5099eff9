//! This module re-exports various items from the `entity_api` and `auth_core` crates.
//!
//! Consumers of the `domain` crate do not need to depend on `entity_api`
//! directly. The `auth_core` types that cross into `web` (connections,
//! principals, signed tokens) are re-exported for the same reason.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{oauth_connections, provider, user_roles, users, Id};

pub use auth_core::bearer::SignedToken;
pub use auth_core::connection::Connection;
pub use auth_core::oauth::{AuthorizationRequest, SessionPrincipal};

pub mod auth;
pub mod connection_storage;
pub mod error;
pub mod oauth_connection;
pub mod provider_registry;
pub mod user;
