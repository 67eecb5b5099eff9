//! Loads the OAuth provider registry at startup.

use std::fs;
use std::path::Path;

use auth_core::oauth::ProviderKind;
use auth_core::providers::{preset, ProviderConfig, ProviderSettings, Registry};
use log::*;
use secrecy::SecretString;
use service::config::Config;

use crate::error::{DomainErrorKind, Error, InternalErrorKind};

/// Build the registry from the providers file and the Google shortcut settings.
pub fn from_config(config: &Config) -> Result<Registry, Error> {
    load(
        config.oauth_providers_file().map(|p| p.as_path()),
        config.google_credentials(),
    )
}

/// Build a registry from an optional JSON providers file plus optional Google
/// credentials `(client_id, client_secret, redirect_uri)`.
///
/// A Google entry in the file wins over the credentials.
pub fn load(
    providers_file: Option<&Path>,
    google: Option<(String, String, String)>,
) -> Result<Registry, Error> {
    let configs = match providers_file {
        Some(path) => read_providers_file(path)?,
        None => Vec::new(),
    };

    let mut registry = Registry::from_configs(configs)?;

    if let Some((client_id, client_secret, redirect_uri)) = google {
        if registry.resolve(ProviderKind::Google.as_str()).is_ok() {
            debug!("Google is configured in the providers file, ignoring Google credentials");
        } else {
            registry.register(preset(
                ProviderKind::Google,
                client_id,
                SecretString::from(client_secret),
                redirect_uri,
            ));
        }
    }

    if registry.is_empty() {
        warn!("No OAuth providers configured, sign-in is unavailable");
    } else {
        info!("Configured OAuth providers: {}", registry.names().join(", "));
    }

    Ok(registry)
}

fn read_providers_file(path: &Path) -> Result<Vec<ProviderConfig>, Error> {
    let contents = fs::read_to_string(path).map_err(|e| {
        error!("Failed to read OAuth providers file {}: {e}", path.display());
        config_error(Box::new(e))
    })?;

    let settings: Vec<ProviderSettings> = serde_json::from_str(&contents).map_err(|e| {
        error!("Failed to parse OAuth providers file {}: {e}", path.display());
        config_error(Box::new(e))
    })?;

    settings
        .into_iter()
        .map(|s| s.into_config().map_err(Error::from))
        .collect()
}

fn config_error(source: Box<dyn std::error::Error + Send + Sync>) -> Error {
    Error {
        source: Some(source),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    }
}
