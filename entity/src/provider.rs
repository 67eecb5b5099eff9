use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OAuth providers a user can sign in with or connect.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    Deserialize,
    Serialize,
    DeriveActiveEnum,
    Default,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "provider")]
pub enum Provider {
    #[sea_orm(string_value = "google")]
    #[default]
    Google,
    #[sea_orm(string_value = "facebook")]
    Facebook,
    #[sea_orm(string_value = "microsoft")]
    Microsoft,
    #[sea_orm(string_value = "twitter")]
    Twitter,
    #[sea_orm(string_value = "github")]
    Github,
    #[sea_orm(string_value = "reddit")]
    Reddit,
    #[sea_orm(string_value = "amazon")]
    Amazon,
}

impl Provider {
    /// Look up a provider by name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::iter().find(|provider| provider.to_string().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Facebook => write!(f, "facebook"),
            Self::Microsoft => write!(f, "microsoft"),
            Self::Twitter => write!(f, "twitter"),
            Self::Github => write!(f, "github"),
            Self::Reddit => write!(f, "reddit"),
            Self::Amazon => write!(f, "amazon"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Provider::from_name("GitHub"), Some(Provider::Github));
        assert_eq!(Provider::from_name(" amazon "), Some(Provider::Amazon));
        assert_eq!(Provider::from_name("myspace"), None);
    }

    #[test]
    fn test_display_matches_stored_value() {
        for provider in Provider::iter() {
            assert_eq!(provider.to_string(), provider.to_value());
        }
    }
}
