use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TYPE authmate.provider AS ENUM \
             ('google', 'facebook', 'microsoft', 'twitter', 'github', 'reddit', 'amazon')",
        )
        .await?;

        // One local account per provider identity.
        db.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS authmate.users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                provider authmate.provider NOT NULL,
                provider_key VARCHAR(255) NOT NULL,
                display_name VARCHAR(255) NOT NULL,
                email VARCHAR(255),
                profile_picture_url TEXT,

                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                UNIQUE(provider, provider_key)
            )
        "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS authmate.user_roles (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES authmate.users(id) ON DELETE CASCADE,
                role VARCHAR(64) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                UNIQUE(user_id, role)
            )
        "#,
        )
        .await?;

        // Tokens are encrypted at the application layer when a key is configured.
        // Row existence = connected; deletion = disconnected.
        db.execute_unprepared(
            r#"
            CREATE TABLE IF NOT EXISTS authmate.oauth_connections (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES authmate.users(id) ON DELETE CASCADE,
                provider authmate.provider NOT NULL,

                access_token TEXT NOT NULL,
                refresh_token TEXT,
                token_type VARCHAR(50) NOT NULL DEFAULT 'Bearer',
                scope TEXT NOT NULL DEFAULT '',
                issued_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                version INTEGER NOT NULL DEFAULT 1,

                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                UNIQUE(user_id, provider)
            )
        "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TABLE IF EXISTS authmate.oauth_connections")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS authmate.user_roles")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS authmate.users")
            .await?;
        db.execute_unprepared("DROP TYPE IF EXISTS authmate.provider")
            .await?;

        Ok(())
    }
}
