//! Provider endpoint configuration and well-known presets.

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{provider_error, Error, ProviderErrorKind};
use crate::oauth::ProviderKind;

/// Endpoint and client configuration for one OAuth provider.
///
/// Immutable once loaded into the [`Registry`](super::Registry).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, matched case-insensitively.
    pub name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_info_endpoint: String,
    pub redirect_uri: String,
    /// Requested scopes, in order. Space-joined on the authorization URL.
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    /// The well-known provider this configuration belongs to, if any.
    pub fn kind(&self) -> Option<ProviderKind> {
        ProviderKind::from_name(&self.name)
    }
}

/// Provider settings as they appear in a settings file.
///
/// Endpoints and scopes may be omitted for well-known providers, in which case
/// the preset values are used.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    #[serde(default)]
    pub authorization_endpoint: Option<String>,
    #[serde(default)]
    pub token_endpoint: Option<String>,
    #[serde(default)]
    pub user_info_endpoint: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

impl ProviderSettings {
    /// Resolve the settings into a complete provider configuration.
    pub fn into_config(self) -> Result<ProviderConfig, Error> {
        let base = ProviderKind::from_name(&self.name).map(|kind| {
            preset(
                kind,
                self.client_id.clone(),
                self.client_secret.clone(),
                self.redirect_uri.clone(),
            )
        });

        let missing = |field: &str| {
            provider_error(
                ProviderErrorKind::InvalidConfig,
                &format!("provider {} is missing {}", self.name, field),
            )
        };

        let authorization_endpoint = match (self.authorization_endpoint, &base) {
            (Some(url), _) => url,
            (None, Some(base)) => base.authorization_endpoint.clone(),
            (None, None) => return Err(missing("authorization_endpoint")),
        };
        let token_endpoint = match (self.token_endpoint, &base) {
            (Some(url), _) => url,
            (None, Some(base)) => base.token_endpoint.clone(),
            (None, None) => return Err(missing("token_endpoint")),
        };
        let user_info_endpoint = match (self.user_info_endpoint, &base) {
            (Some(url), _) => url,
            (None, Some(base)) => base.user_info_endpoint.clone(),
            (None, None) => return Err(missing("user_info_endpoint")),
        };
        let scopes = match (self.scopes, &base) {
            (Some(scopes), _) => scopes,
            (None, Some(base)) => base.scopes.clone(),
            (None, None) => Vec::new(),
        };

        Ok(ProviderConfig {
            name: self.name,
            client_id: self.client_id,
            client_secret: self.client_secret,
            authorization_endpoint,
            token_endpoint,
            user_info_endpoint,
            redirect_uri: self.redirect_uri,
            scopes,
        })
    }
}

/// Get the preset configuration for a well-known provider.
///
/// # Arguments
///
/// * `kind` - The provider
/// * `client_id` - OAuth client ID issued by the provider
/// * `client_secret` - OAuth client secret issued by the provider
/// * `redirect_uri` - Callback URL registered with the provider
pub fn preset(
    kind: ProviderKind,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
) -> ProviderConfig {
    let (authorization_endpoint, token_endpoint, user_info_endpoint, scopes): (
        &str,
        &str,
        &str,
        &[&str],
    ) = match kind {
        ProviderKind::Google => (
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
            "https://www.googleapis.com/oauth2/v3/userinfo",
            &["openid", "email", "profile"],
        ),
        ProviderKind::Facebook => (
            "https://www.facebook.com/v19.0/dialog/oauth",
            "https://graph.facebook.com/v19.0/oauth/access_token",
            "https://graph.facebook.com/me?fields=id,name,email,picture",
            &["email", "public_profile"],
        ),
        ProviderKind::Microsoft => (
            "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            "https://graph.microsoft.com/v1.0/me",
            &["openid", "email", "profile", "offline_access", "User.Read"],
        ),
        ProviderKind::Twitter => (
            "https://twitter.com/i/oauth2/authorize",
            "https://api.twitter.com/2/oauth2/token",
            "https://api.twitter.com/2/users/me?user.fields=profile_image_url",
            &["users.read", "tweet.read", "offline.access"],
        ),
        ProviderKind::Github => (
            "https://github.com/login/oauth/authorize",
            "https://github.com/login/oauth/access_token",
            "https://api.github.com/user",
            &["read:user", "user:email"],
        ),
        ProviderKind::Reddit => (
            "https://www.reddit.com/api/v1/authorize",
            "https://www.reddit.com/api/v1/access_token",
            "https://oauth.reddit.com/api/v1/me",
            &["identity"],
        ),
        ProviderKind::Amazon => (
            "https://www.amazon.com/ap/oa",
            "https://api.amazon.com/auth/o2/token",
            "https://api.amazon.com/user/profile",
            &["profile"],
        ),
    };

    ProviderConfig {
        name: kind.as_str().to_string(),
        client_id,
        client_secret,
        authorization_endpoint: authorization_endpoint.to_string(),
        token_endpoint: token_endpoint.to_string(),
        user_info_endpoint: user_info_endpoint.to_string(),
        redirect_uri,
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("shh".to_string())
    }

    #[test]
    fn test_google_preset() {
        let config = preset(
            ProviderKind::Google,
            "client".to_string(),
            secret(),
            "https://app.example.com/oauth/google/callback".to_string(),
        );
        assert_eq!(config.name, "google");
        assert_eq!(config.token_endpoint, "https://oauth2.googleapis.com/token");
        assert_eq!(config.scopes, vec!["openid", "email", "profile"]);
        assert_eq!(config.kind(), Some(ProviderKind::Google));
    }

    #[test]
    fn test_settings_fill_in_preset_endpoints() {
        let settings: ProviderSettings = serde_json::from_str(
            r#"{
                "name": "GitHub",
                "client_id": "id",
                "client_secret": "secret",
                "redirect_uri": "https://app.example.com/cb",
                "scopes": ["read:user"]
            }"#,
        )
        .unwrap();

        let config = settings.into_config().unwrap();
        assert_eq!(config.name, "GitHub");
        assert_eq!(config.authorization_endpoint, "https://github.com/login/oauth/authorize");
        assert_eq!(config.scopes, vec!["read:user"]);
    }

    #[test]
    fn test_settings_for_custom_provider_require_endpoints() {
        let settings: ProviderSettings = serde_json::from_str(
            r#"{
                "name": "acme",
                "client_id": "id",
                "client_secret": "secret",
                "redirect_uri": "https://app.example.com/cb"
            }"#,
        )
        .unwrap();

        let err = settings.into_config().unwrap_err();
        assert_eq!(
            err.error_kind,
            crate::ErrorKind::Provider(ProviderErrorKind::InvalidConfig)
        );
    }
}
