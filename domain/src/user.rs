//! Local users behind provider identities.

use std::sync::Arc;

use async_trait::async_trait;
use auth_core::bearer::Issuer;
use auth_core::oauth::token::TokenResponse;
use auth_core::oauth::{CallbackHook, SessionPrincipal};
use entity_api::{user, user_role};
use log::*;
use sea_orm::DatabaseConnection;

use crate::error::{AuthErrorKind, Error};
use crate::{provider::Provider, user_roles, users};

pub use entity_api::user::Profile;

/// Create the user for `principal` on first sign-in or refresh its profile on
/// later ones. Returns the user and its role names.
pub async fn upsert_from_principal(
    db: &DatabaseConnection,
    principal: &SessionPrincipal,
) -> Result<(users::Model, Vec<String>), Error> {
    let provider = provider_of(principal)?;
    let profile = Profile {
        display_name: principal.display_name.clone(),
        email: principal.email.clone(),
        profile_picture_url: principal.profile_picture_url.clone(),
    };

    match user::find_by_provider_key(db, provider, &principal.provider_key).await? {
        Some(existing) => {
            let updated = user::update_profile(db, existing, profile).await?;
            let roles = role_names(user_role::find_by_user_id(db, updated.id).await?);
            Ok((updated, roles))
        }
        None => {
            let (created, roles) =
                user::create_with_default_role(db, provider, &principal.provider_key, profile)
                    .await?;
            info!("Created user {} for {} sign-in", created.id, provider);
            Ok((created, role_names(roles)))
        }
    }
}

/// The user a bearer principal belongs to.
pub async fn find_by_principal(
    db: &DatabaseConnection,
    principal: &SessionPrincipal,
) -> Result<users::Model, Error> {
    let provider = provider_of(principal)?;
    user::find_by_provider_key(db, provider, &principal.provider_key)
        .await?
        .ok_or_else(|| {
            warn!("Bearer token names a {provider} user that no longer exists");
            Error::auth(AuthErrorKind::Unauthenticated, "user no longer exists")
        })
}

/// Validate a bearer token and load the user it names.
pub async fn authenticate(
    db: &DatabaseConnection,
    issuer: &Issuer,
    token: &str,
) -> Result<(SessionPrincipal, users::Model), Error> {
    let principal = issuer.validate(token)?;
    let user = find_by_principal(db, &principal).await?;
    Ok((principal, user))
}

fn provider_of(principal: &SessionPrincipal) -> Result<Provider, Error> {
    Provider::from_name(&principal.provider_type).ok_or_else(|| {
        Error::auth(
            AuthErrorKind::UnknownProvider,
            &format!("no stored provider named {}", principal.provider_type),
        )
    })
}

fn role_names(roles: Vec<user_roles::Model>) -> Vec<String> {
    roles.into_iter().map(|r| r.role).collect()
}

/// Callback hook that upserts the local user and copies its roles onto the
/// principal, so the issued bearer token carries them.
pub struct RoleHook {
    db: Arc<DatabaseConnection>,
}

impl RoleHook {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CallbackHook for RoleHook {
    async fn on_profile(
        &self,
        principal: &mut SessionPrincipal,
        _tokens: &TokenResponse,
    ) -> Result<(), auth_core::Error> {
        let (user, roles) = upsert_from_principal(&self.db, principal)
            .await
            .map_err(|e| {
                warn!("Failed to upsert user for {} sign-in: {e}", principal.provider_type);
                auth_core::error::storage_error(
                    auth_core::error::StorageErrorKind::Database,
                    &e.to_string(),
                )
            })?;

        debug!("User {} signed in with roles {:?}", user.id, roles);
        principal.roles = roles.into_iter().collect();
        Ok(())
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use crate::Id;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeSet;

    fn principal() -> SessionPrincipal {
        SessionPrincipal {
            provider_key: "108234".to_string(),
            provider_type: "google".to_string(),
            display_name: "Ada Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            profile_picture_url: None,
            roles: BTreeSet::new(),
        }
    }

    fn user_model() -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Id::new_v4(),
            provider: Provider::Google,
            provider_key: "108234".to_string(),
            display_name: "Ada".to_string(),
            email: None,
            profile_picture_url: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn role(user_id: Id, name: &str) -> user_roles::Model {
        user_roles::Model {
            id: Id::new_v4(),
            user_id,
            role: name.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_user_with_default_role() -> Result<(), Error> {
        let user = user_model();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<users::Model, Vec<users::Model>, _>(vec![vec![]])
            .append_query_results(vec![vec![user.clone()]])
            .append_query_results(vec![vec![role(user.id, user_roles::DEFAULT_ROLE)]])
            .into_connection();

        let (created, roles) = upsert_from_principal(&db, &principal()).await?;
        assert_eq!(created.id, user.id);
        assert_eq!(roles, vec!["user".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_returning_user_keeps_assigned_roles() -> Result<(), Error> {
        let user = user_model();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user.clone()]])
            .append_query_results(vec![vec![user.clone()]])
            .append_query_results(vec![vec![role(user.id, "admin"), role(user.id, "user")]])
            .into_connection();

        let (_, roles) = upsert_from_principal(&db, &principal()).await?;
        assert_eq!(roles, vec!["admin".to_string(), "user".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_role_hook_copies_roles_onto_principal() {
        let user = user_model();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user.clone()]])
            .append_query_results(vec![vec![user.clone()]])
            .append_query_results(vec![vec![role(user.id, "admin")]])
            .into_connection();
        let hook = RoleHook::new(Arc::new(db));
        let tokens: TokenResponse =
            serde_json::from_str(r#"{"access_token": "ya29.a0"}"#).unwrap();

        let mut principal = principal();
        hook.on_profile(&mut principal, &tokens).await.unwrap();
        assert!(principal.has_role("admin"));
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthenticated() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<users::Model, Vec<users::Model>, _>(vec![vec![]])
            .into_connection();

        let err = find_by_principal(&db, &principal()).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Auth(AuthErrorKind::Unauthenticated))
        );
    }
}
