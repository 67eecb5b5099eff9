use std::error::Error as StdError;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use domain::error::{
    AuthErrorKind, DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind,
    InternalErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Domain(DomainError),
    Web(WebErrorKind),
}

/// Failures detected by `web` itself before reaching `domain`.
#[derive(Debug, PartialEq)]
pub enum WebErrorKind {
    Input,
    /// Missing or unparsable `Authorization` header.
    Auth,
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    // List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Error::Web(WebErrorKind::Input) => StatusCode::BAD_REQUEST,
            Error::Web(WebErrorKind::Auth) => StatusCode::UNAUTHORIZED,
            Error::Domain(err) => match &err.error_kind {
                DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                    InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                        EntityErrorKind::NotFound => StatusCode::NOT_FOUND,
                        EntityErrorKind::Invalid => StatusCode::BAD_REQUEST,
                        EntityErrorKind::Conflict => StatusCode::CONFLICT,
                        EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => {
                            StatusCode::INTERNAL_SERVER_ERROR
                        }
                    },
                    InternalErrorKind::Auth(auth_error_kind) => match auth_error_kind {
                        AuthErrorKind::InvalidState
                        | AuthErrorKind::NoRefreshToken
                        | AuthErrorKind::InvalidReturnUrl => StatusCode::BAD_REQUEST,
                        AuthErrorKind::UnknownProvider => StatusCode::NOT_FOUND,
                        AuthErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                    },
                    InternalErrorKind::Config | InternalErrorKind::Other(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                },
                DomainErrorKind::External(external_error_kind) => match external_error_kind {
                    ExternalErrorKind::Network
                    | ExternalErrorKind::Upstream(_)
                    | ExternalErrorKind::Other(_) => StatusCode::BAD_GATEWAY,
                },
            },
        }
    }

    /// Short code put on the failure redirect of a browser flow. Never
    /// carries provider responses or token material.
    pub(crate) fn redirect_code(&self) -> &'static str {
        match self {
            Error::Web(WebErrorKind::Input) => "invalid_request",
            Error::Web(WebErrorKind::Auth) => "unauthorized",
            Error::Domain(err) => match &err.error_kind {
                DomainErrorKind::Internal(InternalErrorKind::Auth(kind)) => match kind {
                    AuthErrorKind::InvalidState => "invalid_state",
                    AuthErrorKind::UnknownProvider => "unknown_provider",
                    AuthErrorKind::Unauthenticated => "unauthorized",
                    AuthErrorKind::NoRefreshToken | AuthErrorKind::InvalidReturnUrl => {
                        "invalid_request"
                    }
                },
                DomainErrorKind::External(_) => "provider_error",
                DomainErrorKind::Internal(_) => "server_error",
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            debug!("Request rejected with {status}: {self}");
        }

        let body = status.canonical_reason().unwrap_or("ERROR").to_uppercase();
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self::Domain(err.into())
    }
}
