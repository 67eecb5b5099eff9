use super::error::Error;
use chrono::Utc;
use entity::provider::Provider;
use entity::user_roles::{self, DEFAULT_ROLE};
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Unchanged, ConnectionTrait, Set, TransactionTrait,
};

/// Profile fields refreshed from the provider on every sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub display_name: String,
    pub email: Option<String>,
    pub profile_picture_url: Option<String>,
}

pub async fn find_by_provider_key(
    db: &impl ConnectionTrait,
    provider: Provider,
    provider_key: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Provider.eq(provider))
        .filter(Column::ProviderKey.eq(provider_key))
        .one(db)
        .await?)
}

/// Inserts a user together with the default role, in one transaction.
pub async fn create_with_default_role(
    db: &impl TransactionTrait,
    provider: Provider,
    provider_key: &str,
    profile: Profile,
) -> Result<(Model, Vec<user_roles::Model>), Error> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let user = ActiveModel {
        id: Set(Id::new_v4()),
        provider: Set(provider),
        provider_key: Set(provider_key.to_string()),
        display_name: Set(profile.display_name),
        email: Set(profile.email),
        profile_picture_url: Set(profile.profile_picture_url),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let role = user_roles::ActiveModel {
        id: Set(Id::new_v4()),
        user_id: Set(user.id),
        role: Set(DEFAULT_ROLE.to_string()),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!("Created {} user {}", provider, user.id);
    Ok((user, vec![role]))
}

pub async fn update_profile(
    db: &impl ConnectionTrait,
    user: Model,
    profile: Profile,
) -> Result<Model, Error> {
    let active_model = ActiveModel {
        id: Unchanged(user.id),
        provider: Unchanged(user.provider),
        provider_key: Unchanged(user.provider_key),
        display_name: Set(profile.display_name),
        email: Set(profile.email),
        profile_picture_url: Set(profile.profile_picture_url),
        created_at: Unchanged(user.created_at),
        updated_at: Set(Utc::now().into()),
    };

    Ok(active_model.update(db).await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_user() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            provider: Provider::Github,
            provider_key: "583231".to_string(),
            display_name: "octocat".to_string(),
            email: None,
            profile_picture_url: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn profile() -> Profile {
        Profile {
            display_name: "The Octocat".to_string(),
            email: Some("octocat@github.com".to_string()),
            profile_picture_url: None,
        }
    }

    #[tokio::test]
    async fn find_by_provider_key_returns_model_when_found() -> Result<(), Error> {
        let user = test_user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user.clone()]])
            .into_connection();

        let found = find_by_provider_key(&db, Provider::Github, "583231").await?;
        assert_eq!(found, Some(user));
        Ok(())
    }

    #[tokio::test]
    async fn create_with_default_role_inserts_user_and_role() -> Result<(), Error> {
        let user = test_user();
        let role = user_roles::Model {
            id: Id::new_v4(),
            user_id: user.id,
            role: DEFAULT_ROLE.to_string(),
            created_at: user.created_at,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user.clone()]])
            .append_query_results(vec![vec![role.clone()]])
            .into_connection();

        let (created, roles) =
            create_with_default_role(&db, Provider::Github, "583231", profile()).await?;

        assert_eq!(created.id, user.id);
        assert_eq!(roles, vec![role]);
        Ok(())
    }

    #[tokio::test]
    async fn update_profile_returns_updated_model() -> Result<(), Error> {
        let user = test_user();
        let mut updated = user.clone();
        updated.display_name = "The Octocat".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![updated.clone()]])
            .into_connection();

        let result = update_profile(&db, user, profile()).await?;
        assert_eq!(result.display_name, "The Octocat");
        Ok(())
    }
}
