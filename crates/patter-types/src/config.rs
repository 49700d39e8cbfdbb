//! Engine configuration types for Patter.
//!
//! `EngineConfig` represents the top-level `patter.toml` that controls the
//! model connection, provider resolution, and search dispatch. All fields
//! have sensible defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Patter engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Model API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent to the completion API.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of an OpenAI-compatible completion API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the env var holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Extra attempts for transient model failures.
    #[serde(default = "default_model_retries")]
    pub max_retries: u32,
    /// Base backoff between model retries in milliseconds.
    #[serde(default = "default_model_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "PATTER_MODEL_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_model_retries() -> u32 {
    2
}

fn default_model_backoff_ms() -> u64 {
    250
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: None,
            max_retries: default_model_retries(),
            retry_backoff_ms: default_model_backoff_ms(),
        }
    }
}

/// Commerce provider resolution and caching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// TTL for cached provider handles in seconds.
    #[serde(default = "default_provider_cache_ttl_secs")]
    pub provider_cache_ttl_secs: u64,
    /// Extra attempts per detector after the first failure.
    #[serde(default = "default_detector_retries")]
    pub detector_retries: u32,
    /// Base backoff for detector retries in milliseconds (doubles per attempt).
    #[serde(default = "default_detector_backoff_ms")]
    pub detector_backoff_ms: u64,
}

fn default_provider_cache_ttl_secs() -> u64 {
    60
}

fn default_detector_retries() -> u32 {
    2
}

fn default_detector_backoff_ms() -> u64 {
    100
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_cache_ttl_secs: default_provider_cache_ttl_secs(),
            detector_retries: default_detector_retries(),
            detector_backoff_ms: default_detector_backoff_ms(),
        }
    }
}

/// Search dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// TTL for cached domain-id lookups in seconds.
    #[serde(default = "default_domain_cache_ttl_secs")]
    pub domain_cache_ttl_secs: u64,
    /// Minimum cosine similarity for semantic hits.
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f64,
    /// Maximum results returned by any stage.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_domain_cache_ttl_secs() -> u64 {
    300
}

fn default_semantic_threshold() -> f64 {
    0.2
}

fn default_search_limit() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            domain_cache_ttl_secs: default_domain_cache_ttl_secs(),
            semantic_threshold: default_semantic_threshold(),
            search_limit: default_search_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.model.max_tokens, 1024);
        assert_eq!(config.model.max_retries, 2);
        assert_eq!(config.resolver.provider_cache_ttl_secs, 60);
        assert_eq!(config.resolver.detector_retries, 2);
        assert_eq!(config.resolver.detector_backoff_ms, 100);
        assert_eq!(config.search.domain_cache_ttl_secs, 300);
        assert!((config.search.semantic_threshold - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.search.search_limit, 10);
    }

    #[test]
    fn test_engine_config_deserialize_empty_toml() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.api_key_env, "PATTER_MODEL_API_KEY");
    }

    #[test]
    fn test_engine_config_deserialize_with_values() {
        let toml_str = r#"
[model]
model = "gpt-4o"
base_url = "https://llm.internal.example.com/v1"
max_tokens = 2048

[resolver]
provider_cache_ttl_secs = 120

[search]
semantic_threshold = 0.35
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.resolver.provider_cache_ttl_secs, 120);
        assert!((config.search.semantic_threshold - 0.35).abs() < f64::EPSILON);
        // Untouched sections keep their defaults.
        assert_eq!(config.resolver.detector_retries, 2);
        assert_eq!(config.search.search_limit, 10);
    }

    #[test]
    fn test_engine_config_serde_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model.model, config.model.model);
        assert_eq!(
            parsed.resolver.provider_cache_ttl_secs,
            config.resolver.provider_cache_ttl_secs
        );
    }
}
