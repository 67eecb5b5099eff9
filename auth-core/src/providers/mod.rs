//! OAuth provider configuration and the registry that resolves it by name.

mod config;
mod registry;

pub use config::{preset, ProviderConfig, ProviderSettings};
pub use registry::Registry;
