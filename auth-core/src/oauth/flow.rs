//! Authorization-code flow orchestration.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use super::token::TokenResponse;
use super::{AuthorizationRequest, SessionPrincipal, StateCodec, StateToken, TokenClient};
use crate::error::{oauth_error, provider_error, Error, OAuthErrorKind, ProviderErrorKind};
use crate::providers::{ProviderConfig, Registry};

/// Hook invoked inline once the profile has been fetched.
///
/// Lets the caller enrich the principal (e.g. with locally assigned roles)
/// before the flow completes.
#[async_trait]
pub trait CallbackHook: Send + Sync {
    async fn on_profile(
        &self,
        principal: &mut SessionPrincipal,
        tokens: &TokenResponse,
    ) -> Result<(), Error>;
}

/// Hook that leaves the principal untouched.
pub struct NoopHook;

#[async_trait]
impl CallbackHook for NoopHook {
    async fn on_profile(
        &self,
        _principal: &mut SessionPrincipal,
        _tokens: &TokenResponse,
    ) -> Result<(), Error> {
        Ok(())
    }
}

/// Outcome of a callback whose code exchange succeeded.
///
/// `profile` may still be an error: the tokens remain valid and should be
/// persisted so the user does not have to re-authorize.
#[derive(Debug)]
pub struct Callback {
    pub state: StateToken,
    pub provider: ProviderConfig,
    pub tokens: TokenResponse,
    /// When the tokens were obtained.
    pub issued_at: DateTime<Utc>,
    pub profile: Result<SessionPrincipal, Error>,
}

impl Callback {
    pub fn principal(&self) -> Option<&SessionPrincipal> {
        self.profile.as_ref().ok()
    }
}

/// Drives the authorization-code flow for every registered provider.
///
/// Holds no per-flow state: everything the callback needs round-trips
/// through the encoded state parameter.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<Registry>,
    codec: StateCodec,
    client: TokenClient,
}

impl Orchestrator {
    pub fn new(registry: Arc<Registry>, codec: StateCodec, client: TokenClient) -> Self {
        Self {
            registry,
            codec,
            client,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn codec(&self) -> &StateCodec {
        &self.codec
    }

    pub fn client(&self) -> &TokenClient {
        &self.client
    }

    /// Build the URL to redirect the browser to.
    ///
    /// # Arguments
    ///
    /// * `provider_name` - Provider to sign in with (case-insensitive)
    /// * `return_url` - Where to send the browser once the flow completes
    /// * `owner` - Local owner identity when connecting an account to a signed-in user
    pub fn build_authorization_url(
        &self,
        provider_name: &str,
        return_url: Option<String>,
        owner: Option<String>,
    ) -> Result<AuthorizationRequest, Error> {
        let config = self.registry.resolve(provider_name)?;
        let kind = config.kind().ok_or_else(|| {
            provider_error(
                ProviderErrorKind::UnknownProvider,
                &format!("{} is not a supported sign-in provider", config.name),
            )
        })?;

        let state = self.codec.encode(kind.as_str(), return_url, owner);

        let mut url = Url::parse(&config.authorization_endpoint).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: crate::ErrorKind::Provider(ProviderErrorKind::InvalidConfig),
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("scope", &config.scopes.join(" "))
            .append_pair("state", &state);

        debug!("Built {} authorization URL", config.name);

        Ok(AuthorizationRequest {
            url: url.to_string(),
            state,
        })
    }

    /// Handle the provider's redirect back to us.
    ///
    /// Fails with `InvalidState` before any upstream call if the state does not
    /// validate. Once the code has been exchanged the call succeeds, carrying
    /// the profile result (and the hook's outcome) alongside the tokens.
    pub async fn handle_callback<H>(
        &self,
        code: &str,
        state: &str,
        hook: &H,
    ) -> Result<Callback, Error>
    where
        H: CallbackHook + ?Sized,
    {
        let state = self.codec.check(state).ok_or_else(|| {
            warn!("Rejecting OAuth callback with invalid state");
            oauth_error(OAuthErrorKind::InvalidState, "state failed validation")
        })?;

        let provider = self.registry.resolve(&state.provider_name)?.clone();

        let issued_at = Utc::now();
        let tokens = self.client.exchange_code(&provider, code).await?;

        let profile = match self.fetch_profile(&provider, &tokens.access_token).await {
            Ok(mut principal) => match hook.on_profile(&mut principal, &tokens).await {
                Ok(()) => Ok(principal),
                Err(e) => {
                    warn!("OAuth callback hook failed for {}: {}", provider.name, e);
                    Err(e)
                }
            },
            Err(e) => {
                warn!(
                    "Profile fetch failed for {}, keeping exchanged tokens: {}",
                    provider.name, e
                );
                Err(e)
            }
        };

        info!("Completed {} OAuth callback", provider.name);

        Ok(Callback {
            state,
            provider,
            tokens,
            issued_at,
            profile,
        })
    }

    /// Fetch the user profile for an access token.
    pub async fn fetch_profile(
        &self,
        config: &ProviderConfig,
        access_token: &str,
    ) -> Result<SessionPrincipal, Error> {
        self.client.fetch_profile(config, access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Manager, MemoryStorage};
    use crate::oauth::ProviderKind;
    use crate::providers::preset;
    use crate::ErrorKind;
    use chrono::Duration;
    use secrecy::{ExposeSecret, SecretString};

    fn orchestrator(server: &mockito::Server) -> Orchestrator {
        let mut google = preset(
            ProviderKind::Google,
            "google-client".to_string(),
            SecretString::from("google-secret".to_string()),
            "https://app.example.com/oauth/google/callback".to_string(),
        );
        google.token_endpoint = format!("{}/token", server.url());
        google.user_info_endpoint = format!("{}/userinfo", server.url());

        let mut registry = Registry::new();
        registry.register(google);

        Orchestrator::new(
            Arc::new(registry),
            StateCodec::new(),
            TokenClient::new().unwrap(),
        )
    }

    async fn stub_token_endpoint(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"T1","expires_in":3600,"token_type":"Bearer"}"#)
            .create_async()
            .await
    }

    async fn stub_userinfo(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("GET", "/userinfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sub":"42","name":"Ada","email":"ada@example.com"}"#)
            .create_async()
            .await
    }

    struct GrantRole(&'static str);

    #[async_trait]
    impl CallbackHook for GrantRole {
        async fn on_profile(
            &self,
            principal: &mut SessionPrincipal,
            _tokens: &TokenResponse,
        ) -> Result<(), Error> {
            principal.roles.insert(self.0.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_build_authorization_url() {
        let server = mockito::Server::new_async().await;
        let orchestrator = orchestrator(&server);

        let request = orchestrator
            .build_authorization_url("GOOGLE", Some("/home".to_string()), None)
            .unwrap();

        let url = Url::parse(&request.url).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let pairs: std::collections::HashMap<String, String> =
            url.query_pairs().into_owned().collect();
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "google-client");
        assert_eq!(
            pairs["redirect_uri"],
            "https://app.example.com/oauth/google/callback"
        );
        assert_eq!(pairs["scope"], "openid email profile");
        assert_eq!(pairs["state"], request.state);

        let state = orchestrator.codec().check(&request.state).unwrap();
        assert_eq!(state.provider_name, "google");
        assert_eq!(state.return_url.as_deref(), Some("/home"));
    }

    #[tokio::test]
    async fn test_build_authorization_url_unknown_provider() {
        let server = mockito::Server::new_async().await;
        let err = orchestrator(&server)
            .build_authorization_url("unknown", None, None)
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Provider(ProviderErrorKind::UnknownProvider)
        );
    }

    #[tokio::test]
    async fn test_callback_exchanges_code_and_persists_connection() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = stub_token_endpoint(&mut server).await;
        stub_userinfo(&mut server).await;
        let orchestrator = orchestrator(&server);

        let state = StateToken::new("Google").encode();
        let callback = orchestrator
            .handle_callback("abc123", &state, &GrantRole("user"))
            .await
            .unwrap();
        token_mock.assert_async().await;

        let principal = callback.principal().unwrap();
        assert_eq!(principal.provider_key, "42");
        assert!(principal.has_role("user"));

        let manager = Manager::new(MemoryStorage::new());
        let connection = manager
            .upsert("owner-1", &callback.provider.name, &callback.tokens)
            .await
            .unwrap();

        assert_eq!(connection.access_token.expose_secret(), "T1");
        let expected = Utc::now() + Duration::seconds(3600);
        assert!((connection.expires_at - expected).num_seconds().abs() <= 5);
    }

    #[tokio::test]
    async fn test_invalid_state_aborts_before_exchange() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .expect(0)
            .create_async()
            .await;
        let orchestrator = orchestrator(&server);

        let stale = StateToken {
            issued_at: Utc::now() - Duration::hours(3),
            ..StateToken::new("google")
        }
        .encode();

        for state in [stale.as_str(), "garbage"] {
            let err = orchestrator
                .handle_callback("abc123", state, &NoopHook)
                .await
                .unwrap_err();
            assert_eq!(err.error_kind, ErrorKind::OAuth(OAuthErrorKind::InvalidState));
        }
        token_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_exchange_failure_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;
        let orchestrator = orchestrator(&server);

        let err = orchestrator
            .handle_callback("abc123", &StateToken::new("google").encode(), &NoopHook)
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed(400))
        );
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_tokens() {
        let mut server = mockito::Server::new_async().await;
        stub_token_endpoint(&mut server).await;
        server
            .mock("GET", "/userinfo")
            .with_status(500)
            .create_async()
            .await;
        let orchestrator = orchestrator(&server);

        let callback = orchestrator
            .handle_callback("abc123", &StateToken::new("google").encode(), &NoopHook)
            .await
            .unwrap();

        assert_eq!(callback.tokens.access_token, "T1");
        assert_eq!(
            callback.profile.unwrap_err().error_kind,
            ErrorKind::OAuth(OAuthErrorKind::ProfileFetchFailed(500))
        );
    }
}
