//! Case-insensitive registry of provider configurations.

use std::collections::HashMap;

use tracing::debug;

use super::ProviderConfig;
use crate::error::{provider_error, Error, ProviderErrorKind};

/// Holds one [`ProviderConfig`] per provider name.
///
/// Names are compared case-insensitively: `"GOOGLE"` and `"google"` resolve to
/// the same entry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    providers: HashMap<String, ProviderConfig>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration loaded at startup.
    ///
    /// Two entries whose names differ only by case are a configuration error.
    pub fn from_configs(configs: Vec<ProviderConfig>) -> Result<Self, Error> {
        let mut registry = Self::new();
        for config in configs {
            let key = Self::key(&config.name);
            if registry.providers.contains_key(&key) {
                return Err(provider_error(
                    ProviderErrorKind::DuplicateProvider,
                    &format!("provider {} is configured more than once", config.name),
                ));
            }
            registry.providers.insert(key, config);
        }
        Ok(registry)
    }

    /// Insert a configuration, replacing any existing one with the same name.
    pub fn register(&mut self, config: ProviderConfig) {
        debug!("Registering OAuth provider {}", config.name);
        self.providers.insert(Self::key(&config.name), config);
    }

    /// Resolve a provider configuration by name.
    pub fn resolve(&self, name: &str) -> Result<&ProviderConfig, Error> {
        self.providers.get(&Self::key(name)).ok_or_else(|| {
            provider_error(
                ProviderErrorKind::UnknownProvider,
                &format!("no OAuth provider named {}", name),
            )
        })
    }

    /// Configured provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.values().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::ProviderKind;
    use crate::providers::preset;
    use crate::ErrorKind;
    use secrecy::SecretString;

    fn google(client_id: &str) -> ProviderConfig {
        preset(
            ProviderKind::Google,
            client_id.to_string(),
            SecretString::from("secret".to_string()),
            "https://app.example.com/oauth/google/callback".to_string(),
        )
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let mut registry = Registry::new();
        registry.register(google("client-1"));

        let upper = registry.resolve("GOOGLE").unwrap();
        let lower = registry.resolve("google").unwrap();
        assert_eq!(upper.client_id, "client-1");
        assert_eq!(lower.client_id, upper.client_id);
        assert_eq!(lower.token_endpoint, upper.token_endpoint);
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let registry = Registry::new();
        let err = registry.resolve("unknown").unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Provider(ProviderErrorKind::UnknownProvider)
        );
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = Registry::new();
        registry.register(google("client-1"));
        let mut replacement = google("client-2");
        replacement.name = "Google".to_string();
        registry.register(replacement);

        assert_eq!(registry.names(), vec!["Google".to_string()]);
        assert_eq!(registry.resolve("google").unwrap().client_id, "client-2");
    }

    #[test]
    fn test_from_configs_rejects_duplicates() {
        let mut second = google("client-2");
        second.name = "Google".to_string();

        let err = Registry::from_configs(vec![google("client-1"), second]).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Provider(ProviderErrorKind::DuplicateProvider)
        );
    }
}
