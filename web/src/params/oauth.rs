use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct StartParams {
    /// Where to send the browser once the flow completes. A path on this
    /// site or a URL under one of the allowed origins.
    pub(crate) return_url: Option<String>,
}

/// What the provider appends to the redirect URI.
///
/// `code` and `state` are missing when the user denied consent, in which case
/// `error` is set.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct CallbackParams {
    pub(crate) code: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) error: Option<String>,
}
