use domain::{users, Id, SessionPrincipal};
use serde::Serialize;
use utoipa::ToSchema;

/// The caller's identity as carried by their bearer token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    #[schema(value_type = Uuid)]
    pub user_id: Id,
    pub provider_type: String,
    pub provider_key: String,
    pub display_name: String,
    pub email: Option<String>,
    pub profile_picture_url: Option<String>,
    pub roles: Vec<String>,
}

impl SessionView {
    pub fn new(user: &users::Model, principal: SessionPrincipal) -> Self {
        Self {
            user_id: user.id,
            provider_type: principal.provider_type,
            provider_key: principal.provider_key,
            display_name: principal.display_name,
            email: principal.email,
            profile_picture_url: principal.profile_picture_url,
            roles: principal.roles.into_iter().collect(),
        }
    }
}
