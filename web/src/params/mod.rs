//! Typed query parameters for endpoint inputs.
//!
//! Deserializing into these types rejects malformed input before any
//! application logic runs.

pub(crate) mod oauth;
