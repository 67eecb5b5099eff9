//! Error types for the `auth-core` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for auth-core crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in auth-core.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Provider(ProviderErrorKind),
    OAuth(OAuthErrorKind),
    Token(TokenErrorKind),
    Bearer(BearerErrorKind),
    Storage(StorageErrorKind),
    Http(HttpErrorKind),
}

/// Errors from the provider registry.
#[derive(Debug, PartialEq)]
pub enum ProviderErrorKind {
    UnknownProvider,
    /// Two configurations share a name (case-insensitive) at load time.
    DuplicateProvider,
    InvalidConfig,
}

/// Errors from the authorization-code flow.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// State value malformed, for an unrecognized provider, or outside its validity window.
    InvalidState,
    /// State value is not base64 or not JSON matching the state schema.
    DecodeError,
    /// Token endpoint answered with a non-success status.
    TokenExchangeFailed(u16),
    /// User-info endpoint answered with a non-success status.
    ProfileFetchFailed(u16),
    InvalidResponse,
}

/// Errors from connection lifecycle operations.
#[derive(Debug, PartialEq)]
pub enum TokenErrorKind {
    NoRefreshToken,
    NotFound,
}

/// Errors from bearer session tokens.
#[derive(Debug, PartialEq)]
pub enum BearerErrorKind {
    ExpiredToken,
    InvalidSignature,
    /// Well signed, but the issuer, audience or not-before claim does not match.
    InvalidClaims,
    Malformed,
    SigningFailed,
}

/// Errors from connection storage operations.
#[derive(Debug, PartialEq)]
pub enum StorageErrorKind {
    NotFound,
    /// The stored version moved on since it was read.
    VersionConflict,
    EncryptionFailed,
    DecryptionFailed,
    Database,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Timeout,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Provider(kind) => write!(f, "Provider error: {:?}", kind),
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind),
            ErrorKind::Token(kind) => write!(f, "Token error: {:?}", kind),
            ErrorKind::Bearer(kind) => write!(f, "Bearer token error: {:?}", kind),
            ErrorKind::Storage(kind) => write!(f, "Storage error: {:?}", kind),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_timeout() {
            ErrorKind::Http(HttpErrorKind::Timeout)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as JwtErrorKind;

        let kind = match err.kind() {
            JwtErrorKind::ExpiredSignature => BearerErrorKind::ExpiredToken,
            JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
                BearerErrorKind::InvalidSignature
            }
            JwtErrorKind::InvalidIssuer
            | JwtErrorKind::InvalidAudience
            | JwtErrorKind::ImmatureSignature => BearerErrorKind::InvalidClaims,
            _ => BearerErrorKind::Malformed,
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Bearer(kind),
        }
    }
}

/// Helper function to create provider registry errors.
pub fn provider_error(kind: ProviderErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Provider(kind),
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create token errors.
pub fn token_error(kind: TokenErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Token(kind),
    }
}

/// Helper function to create bearer token errors.
pub fn bearer_error(kind: BearerErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Bearer(kind),
    }
}

/// Helper function to create storage errors.
pub fn storage_error(kind: StorageErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Storage(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = oauth_error(OAuthErrorKind::TokenExchangeFailed(400), "bad code");
        assert_eq!(err.to_string(), "OAuth error: TokenExchangeFailed(400)");
    }

    #[test]
    fn test_source_is_preserved() {
        let err = storage_error(StorageErrorKind::VersionConflict, "version 3 expected");
        let source = StdError::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("version 3 expected"));
    }
}
