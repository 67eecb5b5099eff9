use log::*;
use migration::{Migrator, MigratorTrait};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    Logger::init_logger(&config)?;

    info!("Starting AuthMate...");

    let db = Arc::new(service::init_database(&config).await.inspect_err(|e| {
        error!("Failed to establish database connection: {e}");
    })?);

    Migrator::up(db.as_ref(), None).await.inspect_err(|e| {
        error!("Failed to apply database migrations: {e}");
    })?;

    let auth = domain::auth::Services::from_config(&config, Arc::clone(&db))?;
    let app_state = web::AppState::new(service::AppState::new(config, &db), auth);

    web::init_server(app_state).await?;

    Ok(())
}
