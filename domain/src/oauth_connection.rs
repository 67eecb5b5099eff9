//! Sign-in and account connection flows, and the connection operations a
//! signed-in user can run against their stored tokens.

use auth_core::bearer::SignedToken;
use auth_core::connection::Connection;
use auth_core::oauth::{AuthorizationRequest, CallbackHook, NoopHook, SessionPrincipal};
use log::*;

use crate::auth::Services;
use crate::error::{AuthErrorKind, DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::user::{self, RoleHook};
use crate::{users, Id};

/// How a completed callback ended.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// A new session: the browser gets `token`.
    SignedIn {
        token: SignedToken,
        user: users::Model,
        connection: Connection,
        return_url: Option<String>,
    },
    /// A signed-in user linked another provider account.
    Connected {
        connection: Connection,
        return_url: Option<String>,
    },
}

impl CallbackOutcome {
    pub fn return_url(&self) -> Option<&str> {
        match self {
            CallbackOutcome::SignedIn { return_url, .. }
            | CallbackOutcome::Connected { return_url, .. } => return_url.as_deref(),
        }
    }
}

/// Whether `return_url` may receive the browser after a flow.
///
/// Same-site absolute paths are allowed, as is anything under one of the
/// allowed origins.
pub fn is_allowed_return_url(return_url: &str, allowed_origins: &[String]) -> bool {
    if return_url.starts_with('/') {
        return !return_url.starts_with("//") && !return_url.starts_with("/\\");
    }

    allowed_origins.iter().any(|origin| {
        let origin = origin.trim_end_matches('/');
        match return_url.strip_prefix(origin) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
            None => false,
        }
    })
}

fn check_return_url(services: &Services, return_url: &Option<String>) -> Result<(), Error> {
    match return_url {
        Some(url) if !is_allowed_return_url(url, &services.allowed_origins) => {
            warn!("Rejecting return URL outside the allowed origins: {url}");
            Err(Error::auth(
                AuthErrorKind::InvalidReturnUrl,
                "return URL is not allowed",
            ))
        }
        _ => Ok(()),
    }
}

/// Authorization URL for signing in with `provider_name`.
pub fn sign_in_url(
    services: &Services,
    provider_name: &str,
    return_url: Option<String>,
) -> Result<AuthorizationRequest, Error> {
    check_return_url(services, &return_url)?;
    Ok(services
        .orchestrator
        .build_authorization_url(provider_name, return_url, None)?)
}

/// Authorization URL for linking `provider_name` to the signed-in `principal`.
///
/// The state carries a signed owner assertion rather than a bare user id, so
/// a forged state cannot attach tokens to someone else. The assertion is only
/// good for finishing this flow and is never accepted as a session token.
pub fn connect_url(
    services: &Services,
    principal: &SessionPrincipal,
    provider_name: &str,
    return_url: Option<String>,
) -> Result<AuthorizationRequest, Error> {
    check_return_url(services, &return_url)?;
    let owner = services
        .issuer
        .issue_owner_assertion(principal, services.orchestrator.codec().window())?;
    Ok(services.orchestrator.build_authorization_url(
        provider_name,
        return_url,
        Some(owner.token),
    )?)
}

/// Finish a flow from the provider's redirect.
///
/// Sign-in upserts the user, stores the connection under the user's id and
/// issues a bearer token. Connect stores the connection under the owner named
/// in the state, even when the profile fetch failed.
pub async fn complete_callback(
    services: &Services,
    provider_name: &str,
    code: &str,
    state: &str,
) -> Result<CallbackOutcome, Error> {
    let checked = services.orchestrator.codec().check(state);
    if let Some(token) = &checked {
        if !token.provider_name.eq_ignore_ascii_case(provider_name.trim()) {
            warn!(
                "Rejecting {} callback carrying state for {}",
                provider_name, token.provider_name
            );
            return Err(Error::auth(
                AuthErrorKind::InvalidState,
                "state was issued for another provider",
            ));
        }
    }
    let owner_assertion = checked.and_then(|token| token.owner);

    let owner = match &owner_assertion {
        Some(assertion) => {
            let owner = authenticate_owner(services, assertion)
                .await
                .inspect_err(|e| warn!("Rejecting connect callback with a bad owner: {e}"))?;
            Some(owner)
        }
        None => None,
    };

    let hook: Box<dyn CallbackHook> = match owner {
        Some(_) => Box::new(NoopHook),
        None => Box::new(RoleHook::new(services.db.clone())),
    };

    let callback = services
        .orchestrator
        .handle_callback(code, state, hook.as_ref())
        .await?;

    let return_url = callback
        .state
        .return_url
        .clone()
        .filter(|url| is_allowed_return_url(url, &services.allowed_origins));

    match owner {
        Some(owner) => {
            if let Err(e) = &callback.profile {
                warn!(
                    "Storing {} connection for user {} without a profile: {e}",
                    callback.provider.name, owner.id
                );
            }
            let connection = services
                .connections
                .upsert_at(
                    &owner.id.to_string(),
                    &callback.provider.name,
                    &callback.tokens,
                    callback.issued_at,
                )
                .await?;
            info!(
                "User {} connected {}",
                owner.id, connection.provider_name
            );
            Ok(CallbackOutcome::Connected {
                connection,
                return_url,
            })
        }
        None => {
            let principal = callback.profile?;
            let user = user::find_by_principal(services.db(), &principal).await?;
            let connection = services
                .connections
                .upsert_at(
                    &user.id.to_string(),
                    &callback.provider.name,
                    &callback.tokens,
                    callback.issued_at,
                )
                .await?;
            let token = services.issuer.issue(&principal, None)?;
            info!("User {} signed in with {}", user.id, connection.provider_name);
            Ok(CallbackOutcome::SignedIn {
                token,
                user,
                connection,
                return_url,
            })
        }
    }
}

async fn authenticate_owner(services: &Services, assertion: &str) -> Result<users::Model, Error> {
    let principal = services.issuer.validate_owner_assertion(assertion)?;
    user::find_by_principal(services.db(), &principal).await
}

/// The signed-in user's connections, ordered by provider name.
pub async fn list(services: &Services, user_id: Id) -> Result<Vec<Connection>, Error> {
    Ok(services.connections.list(&user_id.to_string()).await?)
}

pub async fn find(services: &Services, user_id: Id, provider_name: &str) -> Result<Connection, Error> {
    services
        .connections
        .get_active(&user_id.to_string(), provider_name)
        .await?
        .ok_or_else(|| {
            Error::new(
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound)),
                "no connection for provider",
            )
        })
}

/// Exchange the stored refresh token for new tokens.
pub async fn refresh(
    services: &Services,
    user_id: Id,
    provider_name: &str,
) -> Result<Connection, Error> {
    let config = services.orchestrator.registry().resolve(provider_name)?;
    let connection = find(services, user_id, provider_name).await?;
    Ok(services
        .connections
        .refresh(services.orchestrator.client(), config, &connection)
        .await?)
}

pub async fn disconnect(services: &Services, user_id: Id, provider_name: &str) -> Result<(), Error> {
    Ok(services
        .connections
        .disconnect(&user_id.to_string(), provider_name)
        .await?)
}
