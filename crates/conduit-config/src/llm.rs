use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Top-level LLM configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Default request timeout applied to every provider (e.g. "30s", "2m")
    #[serde(default)]
    pub timeout: Option<String>,
    /// LLM provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, LlmProviderConfig>,
}

impl LlmConfig {
    /// Resolve the effective timeout for a provider
    ///
    /// A provider-level timeout wins over the global one. Durations are
    /// validated at load time, so unparseable values are treated as unset.
    pub fn timeout_for(&self, provider: &LlmProviderConfig) -> Option<Duration> {
        provider
            .timeout
            .as_deref()
            .or(self.timeout.as_deref())
            .and_then(|raw| parse_duration(raw).ok())
    }
}

/// Configuration for a single LLM provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmProviderConfig {
    /// Provider protocol type
    #[serde(rename = "type")]
    pub provider_type: LlmProviderType,
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Request timeout override (e.g. "45s")
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Supported LLM provider protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderType {
    /// OpenAI chat completions API
    Openai,
    /// Google Gemini `generateContent` API
    Gemini,
    /// DeepSeek, an OpenAI-compatible API
    Deepseek,
}

impl LlmProviderType {
    /// Registry slug for this provider type
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Gemini => "gemini",
            Self::Deepseek => "deepseek",
        }
    }
}

/// Parse a human-readable duration such as "30s" or "1m30s"
pub(crate) fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid duration '{raw}': {e}"))
}
