//! Database queries over the AuthMate entities.
//!
//! Every function takes the connection explicitly so callers can run them
//! inside a transaction.

pub use entity::{oauth_connections, provider, user_roles, users, Id};

pub mod error;
pub mod oauth_connection;
pub mod user;
pub mod user_role;
