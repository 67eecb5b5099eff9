use uuid::Uuid;

pub mod oauth_connections;
pub mod provider;
pub mod user_roles;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
