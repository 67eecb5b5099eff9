//! HTTP client building for upstream OAuth calls.

mod client;

pub use client::{HttpClientBuilder, HttpClientConfig};
