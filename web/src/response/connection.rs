use chrono::{DateTime, Utc};
use domain::{Connection, Id};
use serde::Serialize;
use utoipa::ToSchema;

/// A stored connection as shown to its owner.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConnectionView {
    #[schema(value_type = Uuid)]
    pub id: Id,
    pub provider: String,
    pub token_type: String,
    pub scope: String,
    #[schema(value_type = String, format = DateTime)]
    pub issued_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
    /// Whether the connection can be refreshed without the user.
    pub refreshable: bool,
    pub version: i32,
}

impl From<&Connection> for ConnectionView {
    fn from(connection: &Connection) -> Self {
        Self {
            id: connection.id,
            provider: connection.provider_name.clone(),
            token_type: connection.token_type.clone(),
            scope: connection.scope.clone(),
            issued_at: connection.issued_at,
            expires_at: connection.expires_at,
            expired: connection.is_expired(),
            refreshable: connection.refresh_token().is_some(),
            version: connection.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::Connection;

    #[test]
    fn test_view_never_serializes_tokens() {
        let now = Utc::now();
        let connection = Connection {
            id: Id::new_v4(),
            owner: Id::new_v4().to_string(),
            provider_name: "google".to_string(),
            access_token: "ya29.secret-access".to_string().into(),
            refresh_token: Some("1//secret-refresh".to_string().into()),
            token_type: "Bearer".to_string(),
            scope: "openid email".to_string(),
            issued_at: now - Duration::hours(2),
            expires_at: now - Duration::hours(1),
            version: 3,
        };

        let view = ConnectionView::from(&connection);
        let json = serde_json::to_string(&view).unwrap();

        assert!(!json.contains("secret"));
        assert!(view.expired);
        assert!(view.refreshable);
        assert_eq!(view.provider, "google");
    }
}
