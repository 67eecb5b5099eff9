//! Long-lived authentication services built once at startup.

use std::sync::Arc;

use auth_core::bearer::{BearerConfig, Issuer};
use auth_core::connection::Manager;
use auth_core::http::HttpClientBuilder;
use auth_core::oauth::token::encryption::Cipher;
use auth_core::oauth::{Orchestrator, StateCodec, TokenClient};
use chrono::Duration;
use log::*;
use sea_orm::DatabaseConnection;
use secrecy::SecretString;
use service::config::Config;

use crate::connection_storage::DbConnectionStorage;
use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::provider_registry;

/// Everything the sign-in, connect and connection flows need.
pub struct Services {
    pub(crate) db: Arc<DatabaseConnection>,
    pub(crate) orchestrator: Orchestrator,
    pub(crate) issuer: Issuer,
    pub(crate) connections: Manager<DbConnectionStorage>,
    pub(crate) allowed_origins: Vec<String>,
}

impl Services {
    pub fn new(
        db: Arc<DatabaseConnection>,
        orchestrator: Orchestrator,
        issuer: Issuer,
        cipher: Option<Cipher>,
        allowed_origins: Vec<String>,
    ) -> Self {
        let connections = Manager::new(DbConnectionStorage::new(Arc::clone(&db), cipher));
        Self {
            db,
            orchestrator,
            issuer,
            connections,
            allowed_origins,
        }
    }

    pub fn from_config(config: &Config, db: Arc<DatabaseConnection>) -> Result<Self, Error> {
        let registry = provider_registry::from_config(config)?;

        let http_client = HttpClientBuilder::new()
            .with_timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .with_connect_timeout(std::time::Duration::from_secs(
                config.http_connect_timeout_secs,
            ))
            .build()
            .map_err(|e| {
                error!("Failed to build OAuth HTTP client: {e}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
                }
            })?;

        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            StateCodec::with_window(minutes(
                config.state_window_minutes,
                "STATE_WINDOW_MINUTES",
            )?),
            TokenClient::with_client(http_client),
        );

        let cipher = config
            .encryption_key()
            .map(|key| Cipher::from_hex(&key))
            .transpose()
            .map_err(|e| {
                error!("Invalid ENCRYPTION_KEY: {e}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
                }
            })?;

        Ok(Self::new(
            db,
            orchestrator,
            build_issuer(config)?,
            cipher,
            config.allowed_origins.clone(),
        ))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}

/// The bearer token issuer. Production refuses to start without a signing key.
pub fn build_issuer(config: &Config) -> Result<Issuer, Error> {
    let duration = minutes(
        config.bearer_token_duration_minutes,
        "BEARER_TOKEN_DURATION_MINUTES",
    )?;

    match config.bearer_signing_key() {
        Some(key) => Ok(Issuer::new(
            BearerConfig::new(
                SecretString::from(key),
                config.bearer_issuer(),
                config.bearer_audience(),
            )
            .with_default_duration(duration),
        )),
        None if config.is_production() => {
            error!("BEARER_SIGNING_KEY must be set in production");
            Err(Error::new(
                DomainErrorKind::Internal(InternalErrorKind::Config),
                "missing bearer signing key",
            ))
        }
        None => Ok(Issuer::with_generated_key(
            config.bearer_issuer(),
            config.bearer_audience(),
            duration,
        )),
    }
}

/// A positive, representable number of minutes from config.
fn minutes(value: i64, setting: &str) -> Result<Duration, Error> {
    Duration::try_minutes(value)
        .filter(|duration| *duration > Duration::zero() && *duration <= Duration::days(3650))
        .ok_or_else(|| {
            error!("{setting} must be between 1 minute and 10 years, got {value}");
            Error::new(
                DomainErrorKind::Internal(InternalErrorKind::Config),
                &format!("invalid {setting}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["authmate"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_out_of_range_minutes_are_a_config_error() {
        for value in [0, -5, i64::MAX] {
            let err = minutes(value, "STATE_WINDOW_MINUTES").unwrap_err();
            assert_eq!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::Config)
            );
        }
        assert_eq!(minutes(120, "STATE_WINDOW_MINUTES").unwrap(), Duration::hours(2));
    }

    #[test]
    fn test_absurd_token_duration_fails_issuer_build() {
        let config = config(&[
            "--bearer-signing-key",
            "a-signing-key-that-is-long-enough",
            "--bearer-token-duration-minutes",
            "9223372036854775807",
        ]);
        let err = build_issuer(&config).err().unwrap();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[test]
    fn test_production_requires_a_signing_key() {
        let config = config(&["--runtime-env", "production"]);
        assert!(build_issuer(&config).is_err());

        let config = self::config(&[
            "--runtime-env",
            "production",
            "--bearer-signing-key",
            "a-signing-key-that-is-long-enough",
        ]);
        assert!(build_issuer(&config).is_ok());
    }
}
