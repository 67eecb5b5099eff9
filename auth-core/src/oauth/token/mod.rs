//! OAuth token responses and at-rest encryption.

pub mod encryption;
mod tokens;

pub use tokens::TokenResponse;
