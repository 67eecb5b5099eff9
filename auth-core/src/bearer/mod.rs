//! Signed, time-bound bearer session tokens (HS256 JWTs).
//!
//! A token carries the whole [`SessionPrincipal`](crate::oauth::SessionPrincipal),
//! so validating one needs no database lookup.

mod claims;
mod issuer;

pub use issuer::{BearerConfig, Issuer, SignedToken, DEFAULT_TOKEN_DURATION_MINUTES};
