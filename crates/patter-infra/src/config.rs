//! Engine configuration loader for Patter.
//!
//! Reads `patter.toml` from the data directory and deserializes it into
//! [`EngineConfig`]. Falls back to defaults when the file is missing or
//! malformed; a broken config file must never keep the engine from starting.

use std::path::Path;

use patter_types::config::EngineConfig;

/// Load engine configuration from `{data_dir}/patter.toml`.
///
/// - If the file does not exist, returns [`EngineConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_engine_config(data_dir: &Path) -> EngineConfig {
    let config_path = data_dir.join("patter.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no patter.toml at {}, using defaults", config_path.display());
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return EngineConfig::default();
        }
    };

    match toml::from_str::<EngineConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_engine_config(tmp.path()).await;
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.search.search_limit, 10);
        assert_eq!(config.resolver.provider_cache_ttl_secs, 60);
    }

    #[tokio::test]
    async fn valid_toml_is_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("patter.toml"),
            r#"
[model]
model = "gpt-4o"
max_tokens = 2048

[search]
semantic_threshold = 0.35
"#,
        )
        .await
        .unwrap();

        let config = load_engine_config(tmp.path()).await;
        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.model.max_tokens, 2048);
        assert_eq!(config.search.semantic_threshold, 0.35);
        // Untouched sections keep their defaults.
        assert_eq!(config.search.search_limit, 10);
        assert_eq!(config.model.max_retries, 2);
    }

    #[tokio::test]
    async fn malformed_toml_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("patter.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_engine_config(tmp.path()).await;
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.max_tokens, 1024);
    }
}
