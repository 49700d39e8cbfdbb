//! Tenant configuration source backed by TOML files.
//!
//! One file per tenant under `{data_dir}/tenants/`, named after the
//! normalized domain (e.g. `shop.example.com.toml`). A missing file means
//! the tenant is unknown; a malformed file is an error, because silently
//! defaulting would change which integrations a tenant appears to have.

use std::path::PathBuf;

use patter_core::store::TenantConfigSource;
use patter_types::error::ConfigError;
use patter_types::tenant::TenantConfig;
use tracing::debug;

/// Reads `TenantConfig` from `{data_dir}/tenants/{domain}.toml`.
pub struct TomlTenantSource {
    tenants_dir: PathBuf,
}

impl TomlTenantSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            tenants_dir: data_dir.into().join("tenants"),
        }
    }
}

impl TenantConfigSource for TomlTenantSource {
    async fn load(&self, domain: &str) -> Result<Option<TenantConfig>, ConfigError> {
        // Domains become file names; anything that could escape the tenants
        // directory is treated as unknown.
        if domain.contains(['/', '\\']) || domain.contains("..") {
            return Ok(None);
        }

        let path = self.tenants_dir.join(format!("{domain}.toml"));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(domain, "no tenant config file");
                return Ok(None);
            }
            Err(err) => return Err(ConfigError::Io(err.to_string())),
        };

        let config = toml::from_str::<TenantConfig>(&content)
            .map_err(|err| ConfigError::Parse(format!("{}: {err}", path.display())))?;
        Ok(Some(config))
    }
}
