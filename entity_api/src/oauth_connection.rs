use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::oauth_connections::{ActiveModel, Column, Entity, Model};
use entity::provider::Provider;
use entity::Id;
use log::debug;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait};

/// Creates a new OAuth connection record
pub async fn create(db: &impl ConnectionTrait, model: Model) -> Result<Model, Error> {
    debug!(
        "Creating OAuth connection for user_id: {}, provider: {}",
        model.user_id, model.provider
    );

    let now = Utc::now();

    let active_model = ActiveModel {
        id: Set(model.id),
        user_id: Set(model.user_id),
        provider: Set(model.provider),
        access_token: Set(model.access_token),
        refresh_token: Set(model.refresh_token),
        token_type: Set(model.token_type),
        scope: Set(model.scope),
        issued_at: Set(model.issued_at),
        expires_at: Set(model.expires_at),
        version: Set(model.version),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Finds an OAuth connection by user ID and provider (unique pair)
pub async fn find_by_user_and_provider(
    db: &impl ConnectionTrait,
    user_id: Id,
    provider: Provider,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Provider.eq(provider))
        .one(db)
        .await?)
}

/// All connections belonging to a user
pub async fn find_by_user(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .all(db)
        .await?)
}

/// Overwrites the token columns of a connection whose stored version equals
/// `expected_version`, bumping the version by one.
///
/// Returns `RecordNotUpdated` when the version moved on and `RecordNotFound`
/// when the row is gone.
pub async fn update_versioned(
    db: &impl ConnectionTrait,
    model: Model,
    expected_version: i32,
) -> Result<Model, Error> {
    debug!(
        "Updating OAuth connection {} at version {expected_version}",
        model.id
    );

    let active_model = ActiveModel {
        access_token: Set(model.access_token),
        refresh_token: Set(model.refresh_token),
        token_type: Set(model.token_type),
        scope: Set(model.scope),
        issued_at: Set(model.issued_at),
        expires_at: Set(model.expires_at),
        version: Set(expected_version + 1),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let updated = Entity::update_many()
        .set(active_model)
        .filter(Column::Id.eq(model.id))
        .filter(Column::Version.eq(expected_version))
        .exec_with_returning(db)
        .await?;

    match updated.into_iter().next() {
        Some(updated) => Ok(updated),
        None => match Entity::find_by_id(model.id).one(db).await? {
            Some(_) => Err(Error::new(EntityApiErrorKind::RecordNotUpdated)),
            None => Err(Error::new(EntityApiErrorKind::RecordNotFound)),
        },
    }
}

/// Deletes the connection for a user and provider (disconnect).
///
/// Returns whether a row was deleted.
pub async fn delete_by_user_and_provider(
    db: &impl ConnectionTrait,
    user_id: Id,
    provider: Provider,
) -> Result<bool, Error> {
    let result = Entity::delete_many()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Provider.eq(provider))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_model() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            provider: Provider::Google,
            access_token: "access-token".to_string(),
            refresh_token: Some("refresh-token".to_string()),
            token_type: "Bearer".to_string(),
            scope: "openid email".to_string(),
            issued_at: now.into(),
            expires_at: (now + chrono::Duration::hours(1)).into(),
            version: 1,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn create_returns_a_new_oauth_connection() -> Result<(), Error> {
        let model = test_model();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = create(&db, model.clone()).await?;

        assert_eq!(result.user_id, model.user_id);
        assert_eq!(result.provider, Provider::Google);

        Ok(())
    }

    #[tokio::test]
    async fn find_by_user_and_provider_returns_none_when_not_found() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = find_by_user_and_provider(&db, Id::new_v4(), Provider::Google).await?;
        assert!(result.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn update_versioned_bumps_version() -> Result<(), Error> {
        let model = test_model();
        let mut updated = model.clone();
        updated.access_token = "new-access-token".to_string();
        updated.version = 2;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![updated.clone()]])
            .into_connection();

        let result = update_versioned(&db, updated.clone(), 1).await?;

        assert_eq!(result.access_token, "new-access-token");
        assert_eq!(result.version, 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_versioned_reports_stale_version() {
        let model = test_model();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // UPDATE ... RETURNING matched no row
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            // the row still exists
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = update_versioned(&db, model, 0).await;
        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotUpdated
        );
    }

    #[tokio::test]
    async fn update_versioned_reports_missing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = update_versioned(&db, test_model(), 1).await;
        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn delete_by_user_and_provider_reports_whether_deleted() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let user_id = Id::new_v4();
        assert!(delete_by_user_and_provider(&db, user_id, Provider::Google).await?);
        assert!(!delete_by_user_and_provider(&db, user_id, Provider::Google).await?);
        Ok(())
    }
}
