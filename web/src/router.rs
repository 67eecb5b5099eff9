use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

use crate::controller::{
    connection_controller, health_check_controller, oauth_controller, session_controller,
};
use crate::response::{connection::ConnectionView, session::SessionView};

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "AuthMate API"
        ),
        paths(
            health_check_controller::health_check,
            oauth_controller::login,
            oauth_controller::connect,
            oauth_controller::callback,
            session_controller::read,
            connection_controller::index,
            connection_controller::read,
            connection_controller::refresh,
            connection_controller::delete,
        ),
        components(
            schemas(
                ConnectionView,
                SessionView,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "authmate", description = "OAuth sign-in and account connections")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Bearer session tokens are issued by the OAuth callback and sent back in the
// Authorization header.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from the OAuth callback redirect"))
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(oauth_routes(app_state.clone()))
        .merge(session_routes(app_state.clone()))
        .merge(connection_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/oauth/{provider}/login", get(oauth_controller::login))
        // bearer-protected through the AuthenticatedUser extractor
        .route("/oauth/{provider}/connect", get(oauth_controller::connect))
        .route("/oauth/{provider}/callback", get(oauth_controller::callback))
        .with_state(app_state)
}

fn session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/session", get(session_controller::read))
        .with_state(app_state)
}

fn connection_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/connections", get(connection_controller::index))
        .route(
            "/connections/{provider}",
            get(connection_controller::read).delete(connection_controller::delete),
        )
        .route(
            "/connections/{provider}/refresh",
            post(connection_controller::refresh),
        )
        .with_state(app_state)
}
