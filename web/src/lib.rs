use axum::http::{header, HeaderValue, Method};
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use error::{Error, Result};

mod controller;
mod error;
mod extractors;
mod params;
mod response;
pub mod router;

/// Router state: infrastructure from `service` plus the long-lived auth services.
#[derive(Clone)]
pub struct AppState {
    pub service: service::AppState,
    pub auth: Arc<domain::auth::Services>,
}

impl AppState {
    pub fn new(service: service::AppState, auth: domain::auth::Services) -> Self {
        Self {
            service,
            auth: Arc::new(auth),
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service.config
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config().clone();
    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let server_url = format!("{host}:{}", config.port);

    info!(
        "Server starting... listening for connections on http://{server_url} ({} environment)",
        config.runtime_env()
    );

    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    let app = router::define_routes(app_state).layer(cors_layer(&config));

    axum::serve(listener, app).await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(origins)
}
