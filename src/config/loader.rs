//! Configuration loader
//!
//! Loads and validates the handshake configuration from an optional YAML file.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;
use url::Url;

use super::HandshakeConfig;

/// Env var naming the YAML configuration file
pub const CONFIG_PATH_ENV: &str = "HANDSHAKE_CONFIG";
/// Env var overriding the disclosure statement
pub const DISCLOSURE_ENV: &str = "HANDSHAKE_DISCLOSURE";

pub struct ConfigLoader {
    path: Option<PathBuf>,
    disclosure_override: Option<String>,
}

impl ConfigLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            disclosure_override: None,
        }
    }

    /// Create loader from HANDSHAKE_CONFIG / HANDSHAKE_DISCLOSURE env vars
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut loader = Self::new(path);
        loader.disclosure_override = std::env::var(DISCLOSURE_ENV).ok();
        loader
    }

    /// Read the configuration from `path` instead
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replace the configured disclosure statement
    pub fn with_disclosure(mut self, disclosure: impl Into<String>) -> Self {
        self.disclosure_override = Some(disclosure.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the configuration
    ///
    /// Without a file the built-in defaults are used. Sections missing from
    /// the file keep their defaults.
    pub fn load(&self) -> Result<HandshakeConfig> {
        let mut config = match &self.path {
            Some(path) => {
                info!("Loading handshake configuration from {}", path.display());
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => {
                info!("No configuration file given, using built-in defaults");
                HandshakeConfig::default()
            }
        };

        if let Some(disclosure) = &self.disclosure_override {
            config.disclosure = disclosure.clone();
        }

        validate(&config)?;
        Ok(config)
    }

    /// Parse YAML content, falling back to defaults for absent sections
    pub fn parse(content: &str) -> Result<HandshakeConfig> {
        if content.trim().is_empty() {
            return Ok(HandshakeConfig::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Check the invariants steps rely on
pub fn validate(config: &HandshakeConfig) -> Result<()> {
    for (step, endpoint) in config.endpoints.iter() {
        let url = Url::parse(endpoint)
            .with_context(|| format!("Invalid {} endpoint '{}'", step, endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("{} endpoint '{}' must use http or https", step, endpoint);
        }
    }

    for (label, value) in [
        ("success_url", &config.success_url),
        ("fail_url", &config.fail_url),
    ] {
        Url::parse(value).with_context(|| format!("Invalid {} '{}'", label, value))?;
    }

    if config.disclosure.trim().is_empty() {
        return Err(anyhow!("Disclosure statement must not be empty"));
    }
    if config.form.success_code.trim().is_empty() {
        return Err(anyhow!("form.success_code must not be empty"));
    }
    if config.http.timeout_secs == 0 {
        return Err(anyhow!("http.timeout_secs must be greater than zero"));
    }
    if config.confirmation.affirmatives.iter().all(|a| a.trim().is_empty()) {
        return Err(anyhow!(
            "confirmation.affirmatives needs at least one non-empty answer"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::IdentityCheckPolicy;

    #[test]
    fn test_defaults_without_file() {
        let config = ConfigLoader::new(None).load().unwrap();
        assert_eq!(config, HandshakeConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
endpoints:
  status: "https://staging.example.com/api/status"
identity_policy: strict
confirmation:
  timeout_secs: 90
"#;
        let config = ConfigLoader::parse(yaml).unwrap();
        assert_eq!(config.endpoints.status, "https://staging.example.com/api/status");
        assert_eq!(config.endpoints.exchange, "https://sa.inicis.com/auth");
        assert_eq!(config.identity_policy, IdentityCheckPolicy::Strict);
        assert_eq!(config.confirmation.timeout_secs, Some(90));
        assert!(!config.confirmation.affirmatives.is_empty());
        assert_eq!(config.form.success_code, "0000");
    }

    #[test]
    fn test_example_config_is_valid() {
        let config =
            ConfigLoader::parse(include_str!("../../config/handshake.example.yaml")).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.endpoints, crate::config::Endpoints::default());
        assert_eq!(config.confirmation.timeout_secs, Some(180));
        assert_eq!(config.headers.confirm, HandshakeConfig::default().headers.confirm);
    }

    #[test]
    fn test_load_from_file_with_disclosure_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logo_path: /img/logo.png").unwrap();

        let config = ConfigLoader::new(Some(file.path().to_path_buf()))
            .with_disclosure("I agree to sign.")
            .load()
            .unwrap();
        assert_eq!(config.logo_path, "/img/logo.png");
        assert_eq!(config.disclosure, "I agree to sign.");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(Some(dir.path().join("absent.yaml")));
        let err = loader.load().unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let mut config = HandshakeConfig::default();
        config.endpoints.confirm = "ftp://kssa.inicis.com/progress".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("must use http or https"));
    }

    #[test]
    fn test_rejects_blank_disclosure() {
        let err = ConfigLoader::new(None)
            .with_disclosure("   ")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("Disclosure"));
    }
}
