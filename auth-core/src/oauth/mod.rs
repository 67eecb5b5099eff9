//! OAuth 2.0 authorization-code flow.
//!
//! The orchestrator builds the redirect URL, validates the returned state,
//! exchanges the code and fetches the user profile. Every upstream failure is
//! returned as a typed error; nothing is retried.

mod client;
mod flow;
mod profile;
mod provider;
mod state;

pub mod token;

pub use client::TokenClient;
pub use flow::{Callback, CallbackHook, NoopHook, Orchestrator};
pub use profile::map_profile;
pub use provider::{AuthorizationRequest, ProviderKind, SessionPrincipal};
pub use state::{StateCodec, StateToken};
