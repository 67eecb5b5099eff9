use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::response::session::SessionView;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::*;

/// GET the identity behind the request's bearer token
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Bearer token is valid", body = SessionView),
        (status = 401, description = "Missing, expired or invalid bearer token"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser { principal, user }: AuthenticatedUser,
) -> impl IntoResponse {
    debug!("GET session for user {}", user.id);

    Json(ApiResponse::new(
        StatusCode::OK.into(),
        SessionView::new(&user, principal),
    ))
}
