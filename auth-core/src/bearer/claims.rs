//! Claims carried by a bearer session token.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::oauth::SessionPrincipal;

/// Registered claims plus the principal's profile and roles.
///
/// Timestamps are seconds since the Unix epoch.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub(crate) iss: String,
    pub(crate) aud: String,
    /// The principal's provider key.
    pub(crate) sub: String,
    pub(crate) iat: i64,
    pub(crate) nbf: i64,
    pub(crate) exp: i64,
    pub(crate) provider: String,
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) picture: Option<String>,
    #[serde(default)]
    pub(crate) roles: BTreeSet<String>,
}

impl SessionClaims {
    pub(crate) fn into_principal(self) -> SessionPrincipal {
        SessionPrincipal {
            provider_key: self.sub,
            provider_type: self.provider,
            display_name: self.name,
            email: self.email,
            profile_picture_url: self.picture,
            roles: self.roles,
        }
    }
}
