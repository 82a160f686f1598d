//! Programmatic configuration builder for integration tests

use conduit_config::{LlmConfig, LlmProviderConfig, LlmProviderType};
use conduit_llm::LlmClient;
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: LlmConfig,
}

impl ConfigBuilder {
    /// Create a builder with no providers
    pub fn new() -> Self {
        Self {
            config: LlmConfig::default(),
        }
    }

    /// Add a provider pointed at a mock backend
    pub fn with_provider(mut self, name: &str, provider_type: LlmProviderType, base_url: &str) -> Self {
        self.config.providers.insert(
            name.to_owned(),
            LlmProviderConfig {
                provider_type,
                api_key: Some(SecretString::from("test-key".to_owned())),
                base_url: Some(base_url.parse().expect("valid URL")),
                timeout: None,
            },
        );
        self
    }

    /// Drop the API key of a provider
    pub fn without_api_key(mut self, name: &str) -> Self {
        if let Some(provider) = self.config.providers.get_mut(name) {
            provider.api_key = None;
        }
        self
    }

    /// Set the global request timeout
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.timeout = Some(timeout.to_owned());
        self
    }

    /// Build a client for the configuration
    pub fn client(self) -> LlmClient {
        LlmClient::from_config(&self.config).expect("valid client configuration")
    }
}
