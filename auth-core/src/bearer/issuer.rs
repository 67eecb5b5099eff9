use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

use super::claims::SessionClaims;
use crate::error::{bearer_error, BearerErrorKind, Error, ErrorKind};
use crate::oauth::SessionPrincipal;

pub const DEFAULT_TOKEN_DURATION_MINUTES: i64 = 30;

/// Settings for an [`Issuer`].
#[derive(Debug, Clone)]
pub struct BearerConfig {
    pub signing_key: SecretString,
    pub issuer: String,
    pub audience: String,
    pub default_duration: Duration,
}

impl BearerConfig {
    pub fn new(signing_key: SecretString, issuer: &str, audience: &str) -> Self {
        Self {
            signing_key,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            default_duration: Duration::minutes(DEFAULT_TOKEN_DURATION_MINUTES),
        }
    }

    pub fn with_default_duration(mut self, default_duration: Duration) -> Self {
        self.default_duration = default_duration;
        self
    }
}

/// A freshly signed bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct SignedToken {
    pub token: String,
    /// Subject of the token, for accessing it without decoding the JWT.
    pub sub: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 session tokens.
#[derive(Clone)]
pub struct Issuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    default_duration: Duration,
}

impl Issuer {
    pub fn new(config: BearerConfig) -> Self {
        let secret = config.signing_key.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: config.issuer,
            audience: config.audience,
            default_duration: config.default_duration,
        }
    }

    /// Create an issuer with a random 256-bit signing key.
    ///
    /// Tokens it signs stop validating once the process restarts.
    pub fn with_generated_key(issuer: &str, audience: &str, default_duration: Duration) -> Self {
        warn!("No bearer signing key configured, generating an ephemeral key");
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(
            BearerConfig::new(SecretString::from(hex::encode(key)), issuer, audience)
                .with_default_duration(default_duration),
        )
    }

    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    /// Sign a token for `principal`, valid for `duration` or the default duration.
    pub fn issue(
        &self,
        principal: &SessionPrincipal,
        duration: Option<Duration>,
    ) -> Result<SignedToken, Error> {
        self.sign(principal, duration.unwrap_or(self.default_duration), &self.audience)
    }

    /// Sign an owner assertion for an account-connection flow.
    ///
    /// It only names the principal's identity and is scoped to its own
    /// audience, so [`Issuer::validate`] never accepts it as a session.
    pub fn issue_owner_assertion(
        &self,
        principal: &SessionPrincipal,
        duration: Duration,
    ) -> Result<SignedToken, Error> {
        let identity = SessionPrincipal {
            provider_key: principal.provider_key.clone(),
            provider_type: principal.provider_type.clone(),
            display_name: String::new(),
            email: None,
            profile_picture_url: None,
            roles: Default::default(),
        };
        self.sign(&identity, duration, &self.owner_audience())
    }

    /// Verify signature, issuer, audience and lifetime, with no leeway.
    pub fn validate(&self, token: &str) -> Result<SessionPrincipal, Error> {
        self.verify(token, &self.audience)
    }

    /// Verify an owner assertion from [`Issuer::issue_owner_assertion`].
    pub fn validate_owner_assertion(&self, token: &str) -> Result<SessionPrincipal, Error> {
        self.verify(token, &self.owner_audience())
    }

    fn owner_audience(&self) -> String {
        format!("{}:connect", self.audience)
    }

    fn sign(
        &self,
        principal: &SessionPrincipal,
        duration: Duration,
        audience: &str,
    ) -> Result<SignedToken, Error> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(duration).ok_or_else(|| {
            bearer_error(BearerErrorKind::SigningFailed, "token lifetime out of range")
        })?;

        let claims = SessionClaims {
            iss: self.issuer.clone(),
            aud: audience.to_string(),
            sub: principal.provider_key.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            provider: principal.provider_type.clone(),
            name: principal.display_name.clone(),
            email: principal.email.clone(),
            picture: principal.profile_picture_url.clone(),
            roles: principal.roles.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                warn!("Failed to sign bearer token: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::Bearer(BearerErrorKind::SigningFailed),
                }
            })?;

        debug!(
            "Issued {audience} token for {} principal expiring at {}",
            principal.provider_type, expires_at
        );

        Ok(SignedToken {
            token,
            sub: claims.sub,
            expires_at,
        })
    }

    fn verify(&self, token: &str, audience: &str) -> Result<SessionPrincipal, Error> {
        if token.trim().is_empty() {
            return Err(bearer_error(BearerErrorKind::Malformed, "empty bearer token"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[audience]);

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims.into_principal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn issuer_with_key(key: &str) -> Issuer {
        Issuer::new(BearerConfig::new(
            SecretString::from(key.to_string()),
            "authmate",
            "authmate-clients",
        ))
    }

    fn principal() -> SessionPrincipal {
        SessionPrincipal {
            provider_key: "42".to_string(),
            provider_type: "google".to_string(),
            display_name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            profile_picture_url: None,
            roles: BTreeSet::from(["user".to_string(), "admin".to_string()]),
        }
    }

    #[test]
    fn test_issue_then_validate() {
        let issuer = issuer_with_key("a-signing-key-that-is-long-enough");
        let signed = issuer.issue(&principal(), None).unwrap();

        assert_eq!(signed.sub, "42");
        let remaining = signed.expires_at - Utc::now();
        assert!(remaining <= Duration::minutes(30));
        assert!(remaining > Duration::minutes(29));

        assert_eq!(issuer.validate(&signed.token).unwrap(), principal());
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer_with_key("a-signing-key-that-is-long-enough");
        let signed = issuer
            .issue(&principal(), Some(Duration::seconds(-5)))
            .unwrap();

        let err = issuer.validate(&signed.token).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Bearer(BearerErrorKind::ExpiredToken));
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let signed = issuer_with_key("first-signing-key-0123456789abcdef")
            .issue(&principal(), None)
            .unwrap();

        let err = issuer_with_key("other-signing-key-0123456789abcdef")
            .validate(&signed.token)
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Bearer(BearerErrorKind::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let signed = issuer_with_key("shared-key-0123456789abcdef")
            .issue(&principal(), None)
            .unwrap();
        let other = Issuer::new(BearerConfig::new(
            SecretString::from("shared-key-0123456789abcdef".to_string()),
            "authmate",
            "someone-else",
        ));

        let err = other.validate(&signed.token).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Bearer(BearerErrorKind::InvalidClaims));
    }

    #[test]
    fn test_owner_assertion_is_not_a_session() {
        let issuer = issuer_with_key("a-signing-key-that-is-long-enough");
        let assertion = issuer
            .issue_owner_assertion(&principal(), Duration::minutes(120))
            .unwrap();

        let err = issuer.validate(&assertion.token).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Bearer(BearerErrorKind::InvalidClaims));

        let owner = issuer.validate_owner_assertion(&assertion.token).unwrap();
        assert_eq!(owner.provider_key, "42");
        assert_eq!(owner.provider_type, "google");
        assert!(owner.roles.is_empty());
        assert_eq!(owner.email, None);

        let session = issuer.issue(&principal(), None).unwrap();
        assert!(issuer.validate_owner_assertion(&session.token).is_err());
    }

    #[test]
    fn test_malformed_input() {
        let issuer = issuer_with_key("a-signing-key-that-is-long-enough");
        for token in ["", "garbage", "a.b.c", "not base64.at all.!!"] {
            let err = issuer.validate(token).unwrap_err();
            assert_eq!(err.error_kind, ErrorKind::Bearer(BearerErrorKind::Malformed));
        }
    }

    #[test]
    fn test_generated_keys_differ() {
        let first = Issuer::with_generated_key("authmate", "clients", Duration::minutes(5));
        let second = Issuer::with_generated_key("authmate", "clients", Duration::minutes(5));

        let signed = first.issue(&principal(), None).unwrap();
        assert!(first.validate(&signed.token).is_ok());
        assert!(second.validate(&signed.token).is_err());
        assert_eq!(first.default_duration(), Duration::minutes(5));
    }
}
