use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use domain::{users, SessionPrincipal};
use log::*;

use crate::error::{Error, WebErrorKind};
use crate::AppState;

/// The caller named by the request's bearer token.
pub(crate) struct AuthenticatedUser {
    pub principal: SessionPrincipal,
    pub user: users::Model,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Error;

    // Validates the `Authorization: Bearer` token and loads the user it names.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            trace!("Request without a bearer token");
            Error::Web(WebErrorKind::Auth)
        })?;

        let (principal, user) =
            domain::user::authenticate(state.db_conn_ref(), state.auth.issuer(), token).await?;

        Ok(AuthenticatedUser { principal, user })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}
