//! Well-known providers and the types exchanged with them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Known OAuth providers. A state value naming anything else never validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
    Facebook,
    Microsoft,
    Twitter,
    Github,
    Reddit,
    Amazon,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 7] = [
        ProviderKind::Google,
        ProviderKind::Facebook,
        ProviderKind::Microsoft,
        ProviderKind::Twitter,
        ProviderKind::Github,
        ProviderKind::Reddit,
        ProviderKind::Amazon,
    ];

    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Facebook => "facebook",
            ProviderKind::Microsoft => "microsoft",
            ProviderKind::Twitter => "twitter",
            ProviderKind::Github => "github",
            ProviderKind::Reddit => "reddit",
            ProviderKind::Amazon => "amazon",
        }
    }

    /// Look up a provider by name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization request with URL and the state value embedded in it.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to redirect the user to.
    pub url: String,
    /// Encoded CSRF state parameter.
    pub state: String,
}

/// Identity derived from a provider's user-info response plus locally
/// assigned roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrincipal {
    /// Provider's unique user identifier.
    pub provider_key: String,
    /// Provider name, lower case (e.g. "google").
    pub provider_type: String,
    pub display_name: String,
    pub email: Option<String>,
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl SessionPrincipal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_ignores_case() {
        assert_eq!(ProviderKind::from_name("Google"), Some(ProviderKind::Google));
        assert_eq!(ProviderKind::from_name("GITHUB"), Some(ProviderKind::Github));
        assert_eq!(ProviderKind::from_name(" reddit "), Some(ProviderKind::Reddit));
        assert_eq!(ProviderKind::from_name("zoom"), None);
    }

    #[test]
    fn test_as_str_round_trips_through_from_name() {
        for kind in ProviderKind::ALL {
            assert_eq!(ProviderKind::from_name(kind.as_str()), Some(kind));
        }
    }
}
