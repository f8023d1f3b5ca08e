use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// Client configuration.
///
/// Loaded from a TOML file via [`ClientConfig::load`], or constructed
/// programmatically with [`ClientConfig::default`] and struct update.
/// The API token is usually supplied through the `DC_API_TOKEN`
/// environment variable rather than the config file.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URI of the API, with a trailing slash.
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    /// Bearer token for authenticated requests. `None` for anonymous use.
    #[serde(default)]
    pub token: Option<String>,
    /// User-Agent sent on anonymous asset and storage requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retry attempts after the first failure, for transient errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            token: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_uri() -> String {
    "https://api.www.documentcloud.org/api/".to_string()
}
fn default_user_agent() -> String {
    "rust-documentcloud".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    5
}

impl ClientConfig {
    /// Load configuration from a TOML file, then apply environment
    /// overrides (`DC_API_TOKEN`).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config: ClientConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.apply_env();
        Ok(config)
    }

    /// Construct a default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("DC_API_TOKEN") {
            if !token.is_empty() {
                self.token = Some(token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_uri, "https://api.www.documentcloud.org/api/");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 5);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_load_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_uri = \"https://dc.example.com/api/\"").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.base_uri, "https://dc.example.com/api/");
        assert_eq!(config.user_agent, "rust-documentcloud");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = ClientConfig::load(Path::new("/nonexistent/dc.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
