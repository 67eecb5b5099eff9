//! HTTP calls against a provider's token and user-info endpoints.

use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::token::TokenResponse;
use super::{map_profile, SessionPrincipal};
use crate::error::{oauth_error, Error, ErrorKind, OAuthErrorKind};
use crate::http::HttpClientBuilder;
use crate::providers::ProviderConfig;

/// Form body for exchanging an authorization code.
#[derive(Serialize)]
struct CodeExchangeForm<'a> {
    grant_type: &'static str,
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

/// Form body for a refresh-token grant.
#[derive(Serialize)]
struct RefreshForm<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

/// Client for the server-to-server legs of the OAuth flow.
#[derive(Clone)]
pub struct TokenClient {
    http_client: reqwest::Client,
}

impl TokenClient {
    /// Create a client with the default timeouts.
    pub fn new() -> Result<Self, Error> {
        Ok(Self::with_client(HttpClientBuilder::new().build()?))
    }

    /// Create a client around a preconfigured `reqwest::Client`.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        config: &ProviderConfig,
        code: &str,
    ) -> Result<TokenResponse, Error> {
        debug!("Exchanging {} OAuth code for tokens", config.name);

        let form = CodeExchangeForm {
            grant_type: "authorization_code",
            code,
            client_id: &config.client_id,
            client_secret: config.client_secret.expose_secret(),
            redirect_uri: &config.redirect_uri,
        };

        let tokens = self.post_token_form(config, &form).await?;
        info!("Successfully exchanged {} OAuth code for tokens", config.name);
        Ok(tokens)
    }

    /// Obtain new tokens with a refresh token.
    pub async fn refresh(
        &self,
        config: &ProviderConfig,
        refresh_token: &str,
    ) -> Result<TokenResponse, Error> {
        debug!("Refreshing {} access token", config.name);

        let form = RefreshForm {
            grant_type: "refresh_token",
            refresh_token,
            client_id: &config.client_id,
            client_secret: config.client_secret.expose_secret(),
            redirect_uri: &config.redirect_uri,
        };

        let tokens = self.post_token_form(config, &form).await?;
        info!("Successfully refreshed {} access token", config.name);
        Ok(tokens)
    }

    /// Fetch the user profile with an access token.
    pub async fn fetch_profile(
        &self,
        config: &ProviderConfig,
        access_token: &str,
    ) -> Result<SessionPrincipal, Error> {
        let response = self
            .http_client
            .get(&config.user_info_endpoint)
            .header(ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to fetch {} user info: {:?}", config.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("{} user info error ({}): {}", config.name, status, error_text);
            return Err(oauth_error(
                OAuthErrorKind::ProfileFetchFailed(status.as_u16()),
                &error_text,
            ));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            warn!("Failed to parse {} user info: {:?}", config.name, e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })?;

        map_profile(&config.name, &body)
    }

    async fn post_token_form<F: Serialize>(
        &self,
        config: &ProviderConfig,
        form: &F,
    ) -> Result<TokenResponse, Error> {
        let response = self
            .http_client
            .post(&config.token_endpoint)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .inspect_err(|e| warn!("Failed to reach {} token endpoint: {:?}", config.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("{} token endpoint error ({}): {}", config.name, status, error_text);
            return Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed(status.as_u16()),
                &error_text,
            ));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse {} token response: {:?}", config.name, e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })
    }
}
