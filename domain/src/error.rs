//! Error types for the `domain` layer.
use auth_core::error::{
    BearerErrorKind, ErrorKind as AuthCoreErrorKind, OAuthErrorKind, ProviderErrorKind,
    StorageErrorKind, TokenErrorKind,
};
use auth_core::Error as AuthCoreError;
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. `web` depends on
/// `domain` only and maps the `error_kind`s to HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Auth(AuthErrorKind),
    Config,
    Other(String),
}

/// Entity errors reduced to what the `domain` layer cares about.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    /// A concurrent writer changed the record first.
    Conflict,
    DbTransaction,
    Other(String),
}

/// Failures of the sign-in and connection flows that the caller caused.
#[derive(Debug, PartialEq)]
pub enum AuthErrorKind {
    /// State parameter missing, undecodable, expired or for an unknown provider.
    InvalidState,
    UnknownProvider,
    /// Bearer token missing, expired, tampered with or malformed.
    Unauthenticated,
    NoRefreshToken,
    /// A return URL outside the allowed origins.
    InvalidReturnUrl,
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    /// A provider endpoint answered with this non-success status.
    Upstream(u16),
    Other(String),
}

impl Error {
    pub(crate) fn new(error_kind: DomainErrorKind, message: &str) -> Self {
        Error {
            source: Some(message.to_string().into()),
            error_kind,
        }
    }

    pub(crate) fn auth(kind: AuthErrorKind, message: &str) -> Self {
        Self::new(DomainErrorKind::Internal(InternalErrorKind::Auth(kind)), message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {:?}", self.error_kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::InvalidQueryTerm => EntityErrorKind::Invalid,
            EntityApiErrorKind::RecordNotUpdated | EntityApiErrorKind::RecordAlreadyExists => {
                EntityErrorKind::Conflict
            }
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            EntityApiErrorKind::Other => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

// And here from `auth_core`.
impl From<AuthCoreError> for Error {
    fn from(err: AuthCoreError) -> Self {
        let error_kind = match &err.error_kind {
            AuthCoreErrorKind::Provider(ProviderErrorKind::UnknownProvider) => {
                DomainErrorKind::Internal(InternalErrorKind::Auth(AuthErrorKind::UnknownProvider))
            }
            AuthCoreErrorKind::Provider(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            AuthCoreErrorKind::OAuth(OAuthErrorKind::InvalidState | OAuthErrorKind::DecodeError) => {
                DomainErrorKind::Internal(InternalErrorKind::Auth(AuthErrorKind::InvalidState))
            }
            AuthCoreErrorKind::OAuth(
                OAuthErrorKind::TokenExchangeFailed(status)
                | OAuthErrorKind::ProfileFetchFailed(status),
            ) => DomainErrorKind::External(ExternalErrorKind::Upstream(*status)),
            AuthCoreErrorKind::OAuth(OAuthErrorKind::InvalidResponse) => DomainErrorKind::External(
                ExternalErrorKind::Other("Invalid provider response".to_string()),
            ),
            AuthCoreErrorKind::Token(TokenErrorKind::NoRefreshToken) => {
                DomainErrorKind::Internal(InternalErrorKind::Auth(AuthErrorKind::NoRefreshToken))
            }
            AuthCoreErrorKind::Token(TokenErrorKind::NotFound)
            | AuthCoreErrorKind::Storage(StorageErrorKind::NotFound) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
            }
            AuthCoreErrorKind::Bearer(BearerErrorKind::SigningFailed) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Failed to sign bearer token".to_string()),
            ),
            AuthCoreErrorKind::Bearer(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Auth(AuthErrorKind::Unauthenticated))
            }
            AuthCoreErrorKind::Storage(StorageErrorKind::VersionConflict) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
            }
            AuthCoreErrorKind::Storage(StorageErrorKind::Database) => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::DbTransaction))
            }
            AuthCoreErrorKind::Storage(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
            AuthCoreErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_core::error::{bearer_error, oauth_error, storage_error};

    #[test]
    fn test_invalid_state_and_decode_error_both_become_invalid_state() {
        for kind in [OAuthErrorKind::InvalidState, OAuthErrorKind::DecodeError] {
            let err: Error = oauth_error(kind, "bad state").into();
            assert_eq!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::Auth(AuthErrorKind::InvalidState))
            );
        }
    }

    #[test]
    fn test_upstream_status_is_kept() {
        let err: Error = oauth_error(OAuthErrorKind::TokenExchangeFailed(400), "bad code").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Upstream(400))
        );
    }

    #[test]
    fn test_version_conflict_becomes_entity_conflict() {
        let err: Error = storage_error(StorageErrorKind::VersionConflict, "stale").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
        );

        let err: Error = EntityApiError {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotUpdated,
        }
        .into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
        );
    }

    #[test]
    fn test_bearer_errors_are_unauthenticated_except_signing() {
        let expired: Error = bearer_error(BearerErrorKind::ExpiredToken, "expired").into();
        assert_eq!(
            expired.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Auth(AuthErrorKind::Unauthenticated))
        );

        let signing: Error = bearer_error(BearerErrorKind::SigningFailed, "no key").into();
        assert!(matches!(
            signing.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Other(_))
        ));
    }
}
