//! HTTP client builder for token and user-info endpoints.

use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Total request timeout for one upstream call.
    pub timeout: Duration,
    /// Timeout for establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("authmate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for the HTTP client used by the OAuth flow.
///
/// Upstream calls are never retried automatically. A failed exchange or
/// profile fetch surfaces to the caller, who decides whether to restart the
/// flow.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = connect_timeout;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout)
            .connect_timeout(self.config.connect_timeout)
            .user_agent(self.config.user_agent)
            .build()
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.config.timeout, Duration::from_secs(10));
        assert_eq!(builder.config.connect_timeout, Duration::from_secs(5));
        assert!(builder.config.user_agent.starts_with("authmate/"));
    }

    #[test]
    fn test_builder_with_timeout() {
        let builder = HttpClientBuilder::new().with_timeout(Duration::from_secs(3));
        assert_eq!(builder.config.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_build_client() {
        let result = HttpClientBuilder::new().build();
        assert!(result.is_ok());
    }
}
