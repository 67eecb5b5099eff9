//! Mapping of provider-specific user-info responses onto [`SessionPrincipal`].

use std::collections::BTreeSet;

use serde_json::Value;

use super::{ProviderKind, SessionPrincipal};
use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Read a string at `path`, accepting numbers (GitHub ids are numeric).
fn string_at(body: &Value, path: &[&str]) -> Option<String> {
    let value = path.iter().try_fold(body, |value, key| value.get(key))?;
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_of(body: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| string_at(body, path))
}

/// Map a user-info JSON body into a principal with no roles assigned.
///
/// Providers outside the well-known set are read using the OpenID Connect
/// standard claims (`sub`, `name`, `email`, `picture`).
pub fn map_profile(provider_name: &str, body: &Value) -> Result<SessionPrincipal, Error> {
    let kind = ProviderKind::from_name(provider_name);

    let (key, name, email, picture) = match kind {
        Some(ProviderKind::Google) => (
            first_of(body, &[&["sub"], &["id"]]),
            string_at(body, &["name"]),
            string_at(body, &["email"]),
            string_at(body, &["picture"]),
        ),
        Some(ProviderKind::Facebook) => (
            string_at(body, &["id"]),
            string_at(body, &["name"]),
            string_at(body, &["email"]),
            string_at(body, &["picture", "data", "url"]),
        ),
        Some(ProviderKind::Microsoft) => (
            string_at(body, &["id"]),
            string_at(body, &["displayName"]),
            first_of(body, &[&["mail"], &["userPrincipalName"]]),
            None,
        ),
        Some(ProviderKind::Twitter) => (
            string_at(body, &["data", "id"]),
            first_of(body, &[&["data", "name"], &["data", "username"]]),
            None,
            string_at(body, &["data", "profile_image_url"]),
        ),
        Some(ProviderKind::Github) => (
            string_at(body, &["id"]),
            first_of(body, &[&["name"], &["login"]]),
            string_at(body, &["email"]),
            string_at(body, &["avatar_url"]),
        ),
        Some(ProviderKind::Reddit) => (
            string_at(body, &["id"]),
            string_at(body, &["name"]),
            None,
            string_at(body, &["icon_img"]),
        ),
        Some(ProviderKind::Amazon) => (
            string_at(body, &["user_id"]),
            string_at(body, &["name"]),
            string_at(body, &["email"]),
            None,
        ),
        None => (
            first_of(body, &[&["sub"], &["id"]]),
            first_of(body, &[&["name"], &["preferred_username"]]),
            string_at(body, &["email"]),
            string_at(body, &["picture"]),
        ),
    };

    let provider_key = key.ok_or_else(|| {
        oauth_error(
            OAuthErrorKind::InvalidResponse,
            &format!("{} user info has no user identifier", provider_name),
        )
    })?;

    let display_name = name
        .or_else(|| email.clone())
        .unwrap_or_else(|| provider_key.clone());

    Ok(SessionPrincipal {
        provider_key,
        provider_type: kind
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|| provider_name.to_lowercase()),
        display_name,
        email,
        profile_picture_url: picture,
        roles: BTreeSet::new(),
    })
}
