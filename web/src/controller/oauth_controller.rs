//! Controller for the browser legs of the OAuth flows.
//!
//! Every endpoint here answers with a redirect. The callback never renders an
//! error body: failures send the browser to the configured failure URL with a
//! generic `error` code.

use crate::error::{Error, WebErrorKind};
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::oauth::{CallbackParams, StartParams};
use crate::AppState;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use domain::oauth_connection::{self as OAuthApi, CallbackOutcome};
use log::*;

/// GET start signing in with a provider
#[utoipa::path(
    get,
    path = "/oauth/{provider}/login",
    params(
        ("provider" = String, Path, description = "Provider name, case-insensitive"),
        StartParams,
    ),
    responses(
        (status = 307, description = "Redirect to the provider's consent page"),
        (status = 400, description = "Return URL outside the allowed origins"),
        (status = 404, description = "Provider not configured"),
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<StartParams>,
) -> Result<impl IntoResponse, Error> {
    let request = OAuthApi::sign_in_url(&app_state.auth, &provider, params.return_url)?;

    info!("Redirecting to {provider} for sign-in");
    Ok(Redirect::temporary(&request.url))
}

/// GET start connecting a provider account to the signed-in user
#[utoipa::path(
    get,
    path = "/oauth/{provider}/connect",
    params(
        ("provider" = String, Path, description = "Provider name, case-insensitive"),
        StartParams,
    ),
    responses(
        (status = 307, description = "Redirect to the provider's consent page"),
        (status = 400, description = "Return URL outside the allowed origins"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Provider not configured"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn connect(
    AuthenticatedUser { principal, user }: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<StartParams>,
) -> Result<impl IntoResponse, Error> {
    let request =
        OAuthApi::connect_url(&app_state.auth, &principal, &provider, params.return_url)?;

    info!("Redirecting user {} to {provider} to connect", user.id);
    Ok(Redirect::temporary(&request.url))
}

/// GET the provider's redirect back to us
#[utoipa::path(
    get,
    path = "/oauth/{provider}/callback",
    params(
        ("provider" = String, Path, description = "Provider name, case-insensitive"),
        CallbackParams,
    ),
    responses(
        (status = 303, description = "Redirect to the return URL, with `#token=` after a sign-in, or to the failure URL with `?error=`"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let config = app_state.config();

    if let Some(error) = &params.error {
        warn!("{provider} returned an authorization error: {error}");
        return Redirect::to(&with_query(
            config.oauth_failure_redirect_uri(),
            "error",
            "access_denied",
        ));
    }

    let (Some(code), Some(state)) = (params.code.as_deref(), params.state.as_deref()) else {
        warn!("{provider} callback without code or state");
        let err = Error::Web(WebErrorKind::Input);
        return Redirect::to(&with_query(
            config.oauth_failure_redirect_uri(),
            "error",
            err.redirect_code(),
        ));
    };

    match OAuthApi::complete_callback(&app_state.auth, &provider, code, state).await {
        Ok(outcome) => {
            let base = outcome
                .return_url()
                .unwrap_or(config.oauth_success_redirect_uri());
            let base = base.split('#').next().unwrap_or(base);
            match &outcome {
                CallbackOutcome::SignedIn { token, .. } => {
                    Redirect::to(&format!("{base}#token={}", token.token))
                }
                CallbackOutcome::Connected { .. } => Redirect::to(base),
            }
        }
        Err(err) => {
            let err = Error::from(err);
            warn!("{provider} callback failed: {err}");
            Redirect::to(&with_query(
                config.oauth_failure_redirect_uri(),
                "error",
                err.redirect_code(),
            ))
        }
    }
}

/// Append `key=value` to `url`. Values are fixed ASCII codes and need no escaping.
fn with_query(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{key}={value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_picks_separator() {
        assert_eq!(
            with_query("https://app.example.com/auth/failure", "error", "invalid_state"),
            "https://app.example.com/auth/failure?error=invalid_state"
        );
        assert_eq!(
            with_query("https://app.example.com/auth?lang=en", "error", "provider_error"),
            "https://app.example.com/auth?lang=en&error=provider_error"
        );
    }
}
