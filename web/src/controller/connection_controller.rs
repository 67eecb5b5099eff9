use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::response::connection::ConnectionView;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::oauth_connection as ConnectionApi;
use log::*;

/// GET all of the caller's connections
#[utoipa::path(
    get,
    path = "/connections",
    responses(
        (status = 200, description = "Connections ordered by provider", body = [ConnectionView]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all connections for user {}", user.id);

    let connections = ConnectionApi::list(&app_state.auth, user.id).await?;
    let views: Vec<ConnectionView> = connections.iter().map(ConnectionView::from).collect();

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), views)))
}

/// GET the caller's connection to a provider
#[utoipa::path(
    get,
    path = "/connections/{provider}",
    params(
        ("provider" = String, Path, description = "Provider name, case-insensitive"),
    ),
    responses(
        (status = 200, description = "The connection", body = ConnectionView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No connection to this provider"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET {provider} connection for user {}", user.id);

    let connection = ConnectionApi::find(&app_state.auth, user.id, &provider).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        ConnectionView::from(&connection),
    )))
}

/// POST exchange the stored refresh token for new tokens
#[utoipa::path(
    post,
    path = "/connections/{provider}/refresh",
    params(
        ("provider" = String, Path, description = "Provider name, case-insensitive"),
    ),
    responses(
        (status = 200, description = "Tokens refreshed", body = ConnectionView),
        (status = 400, description = "The connection has no refresh token"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No connection to this provider"),
        (status = 409, description = "The connection changed concurrently"),
        (status = 502, description = "The provider rejected the refresh"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn refresh(
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, Error> {
    info!("POST refresh {provider} connection for user {}", user.id);

    let connection = ConnectionApi::refresh(&app_state.auth, user.id, &provider).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        ConnectionView::from(&connection),
    )))
}

/// DELETE the caller's connection to a provider
#[utoipa::path(
    delete,
    path = "/connections/{provider}",
    params(
        ("provider" = String, Path, description = "Provider name, case-insensitive"),
    ),
    responses(
        (status = 204, description = "Disconnected"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No connection to this provider"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, Error> {
    info!("DELETE {provider} connection for user {}", user.id);

    ConnectionApi::disconnect(&app_state.auth, user.id, &provider).await?;

    Ok(StatusCode::NO_CONTENT)
}
