use std::path::Path;

use crate::Config;
use crate::llm::parse_duration;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(
            path = %path.display(),
            providers = config.llm.providers.len(),
            "loaded configuration"
        );

        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if variable expansion, parsing or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured, a timeout does not
    /// parse, or a base URL is not HTTP(S)
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.providers.is_empty() {
            anyhow::bail!("at least one LLM provider must be configured");
        }

        if let Some(timeout) = &self.llm.timeout {
            parse_duration(timeout).map_err(|e| anyhow::anyhow!("llm.timeout: {e}"))?;
        }

        for (name, provider) in &self.llm.providers {
            if let Some(timeout) = &provider.timeout {
                parse_duration(timeout).map_err(|e| anyhow::anyhow!("provider '{name}': {e}"))?;
            }

            if let Some(base_url) = &provider.base_url
                && !matches!(base_url.scheme(), "http" | "https")
            {
                anyhow::bail!("provider '{name}' base_url must use http or https, got '{}'", base_url.scheme());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::ExposeSecret;

    use crate::{Config, LlmProviderType};

    #[test]
    fn parses_all_provider_types() {
        let config = Config::from_toml_str(
            r#"
            [llm.providers.openai]
            type = "openai"
            api_key = "sk-openai"

            [llm.providers.gemini]
            type = "gemini"
            api_key = "g-key"

            [llm.providers.deepseek]
            type = "deepseek"
            base_url = "https://api.deepseek.com"
            "#,
        )
        .unwrap();

        let types: Vec<_> = config.llm.providers.values().map(|p| p.provider_type).collect();
        assert_eq!(
            types,
            vec![LlmProviderType::Openai, LlmProviderType::Gemini, LlmProviderType::Deepseek]
        );
        assert_eq!(
            config.llm.providers["openai"].api_key.as_ref().unwrap().expose_secret(),
            "sk-openai"
        );
    }

    #[test]
    fn providers_keep_file_order() {
        let config = Config::from_toml_str(
            r#"
            [llm.providers.zeta]
            type = "openai"

            [llm.providers.alpha]
            type = "gemini"

            [llm.providers.mid]
            type = "deepseek"
            "#,
        )
        .unwrap();

        let names: Vec<_> = config.llm.providers.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn api_key_comes_from_environment() {
        temp_env::with_var("CONDUIT_GEMINI_KEY", Some("from-env"), || {
            let config = Config::from_toml_str(
                r#"
                [llm.providers.gemini]
                type = "gemini"
                api_key = "{{ env.CONDUIT_GEMINI_KEY }}"
                "#,
            )
            .unwrap();

            let key = config.llm.providers["gemini"].api_key.as_ref().unwrap();
            assert_eq!(key.expose_secret(), "from-env");
        });
    }

    #[test]
    fn empty_config_is_rejected() {
        let err = Config::from_toml_str("").unwrap_err();
        assert!(err.to_string().contains("at least one LLM provider"));
    }

    #[test]
    fn unknown_provider_type_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            [llm.providers.mystery]
            type = "mystery"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            [llm.providers.openai]
            type = "openai"
            timeout = "soon"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("provider 'openai'"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            [llm.providers.openai]
            type = "openai"
            base_url = "ftp://example.com"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn provider_timeout_overrides_global() {
        let config = Config::from_toml_str(
            r#"
            [llm]
            timeout = "30s"

            [llm.providers.fast]
            type = "openai"
            timeout = "5s"

            [llm.providers.slow]
            type = "gemini"
            "#,
        )
        .unwrap();

        let fast = &config.llm.providers["fast"];
        let slow = &config.llm.providers["slow"];
        assert_eq!(config.llm.timeout_for(fast), Some(Duration::from_secs(5)));
        assert_eq!(config.llm.timeout_for(slow), Some(Duration::from_secs(30)));
    }
}
