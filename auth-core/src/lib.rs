//! # auth-core
//!
//! Framework-agnostic core of AuthMate's OAuth sign-in and account connection:
//! - CSRF state encoding and validation for the authorization-code flow
//! - OAuth provider registry with well-known provider presets
//! - Authorization-code flow orchestration (redirect URL, code exchange, profile fetch)
//! - Connection lifecycle (upsert with optimistic concurrency, expiry, refresh)
//! - Signed bearer session tokens
//! - HTTP client building with explicit timeouts
//!
//! ## Architecture
//!
//! Nothing in this crate knows about a web framework or a database:
//! - `domain` plugs a sea-orm backed [`connection::Storage`] into the [`connection::Manager`]
//! - `web` drives the [`oauth::Orchestrator`] from its controllers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_core::{
//!     bearer::Issuer,
//!     connection::{Manager, MemoryStorage},
//!     oauth::{Orchestrator, StateCodec},
//!     providers::Registry,
//! };
//! ```

pub mod bearer;
pub mod connection;
pub mod error;
pub mod http;
pub mod oauth;
pub mod providers;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
