//! Client settings: inference endpoint, request timeout and sample images.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://maowi-neuroscan-api.hf.space/predict";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

pub const ENV_ENDPOINT: &str = "NEUROSCAN_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "NEUROSCAN_TIMEOUT_SECS";
pub const ENV_SAMPLE_DIR: &str = "NEUROSCAN_SAMPLE_DIR";

/// Name of the settings file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "neuroscan.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// URL that receives `POST {"image": [...]}`.
    pub endpoint: String,
    /// Upper bound for one prediction round trip, in seconds.
    pub timeout_secs: f64,
    /// Directory of scans used for sample batches instead of the built-in ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            sample_dir: None,
        }
    }
}

impl ClientConfig {
    /// Defaults, then `path` if it exists, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("cannot write config {}", path.display()))?;
        tracing::info!("saved settings to {}", path.display());
        Ok(())
    }

    /// Apply `NEUROSCAN_*` values looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} is not a number: {raw:?}"))?;
        }
        if let Some(dir) = lookup(ENV_SAMPLE_DIR).filter(|d| !d.trim().is_empty()) {
            self.sample_dir = Some(PathBuf::from(dir));
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            anyhow::bail!("endpoint must not be empty");
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            anyhow::bail!("endpoint must be an http(s) URL: {}", self.endpoint);
        }
        if !(self.timeout_secs.is_finite() && self.timeout_secs > 0.0) {
            anyhow::bail!("timeout must be a positive number of seconds");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn defaults_use_a_thirty_second_timeout() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_toml_keeps_defaults() -> Result<()> {
        let config = ClientConfig::from_toml_str("endpoint = \"http://localhost:5000/predict\"")?;
        assert_eq!(config.endpoint, "http://localhost:5000/predict");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ClientConfig::from_toml_str("timeout_secs = 0").is_err());
        assert!(ClientConfig::from_toml_str("timeout_secs = -3.0").is_err());
        assert!(ClientConfig::from_toml_str("endpoint = \"ftp://host\"").is_err());
        assert!(ClientConfig::from_toml_str("endpoint = 5").is_err());
    }

    #[test]
    fn overrides_win_over_file_values() -> Result<()> {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ENDPOINT, "http://10.0.0.2/predict"),
            (ENV_TIMEOUT_SECS, " 12.5 "),
            (ENV_SAMPLE_DIR, "/srv/scans"),
        ]);
        let mut config = ClientConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()))?;
        assert_eq!(config.endpoint, "http://10.0.0.2/predict");
        assert_eq!(config.timeout(), Duration::from_millis(12_500));
        assert_eq!(config.sample_dir, Some(PathBuf::from("/srv/scans")));
        Ok(())
    }

    #[test]
    fn bad_timeout_override_is_an_error() {
        let mut config = ClientConfig::default();
        let result =
            config.apply_overrides(|key| (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn save_then_load_from_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = ClientConfig {
            endpoint: "http://127.0.0.1:5000/predict".into(),
            timeout_secs: 5.0,
            sample_dir: Some(dir.path().join("samples")),
        };
        config.save(&path)?;
        assert_eq!(ClientConfig::from_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn sample_dir_is_optional_in_toml() -> Result<()> {
        let config = ClientConfig::from_toml_str("sample_dir = \"scans\"")?;
        assert_eq!(config.sample_dir, Some(PathBuf::from("scans")));

        let raw = toml::to_string_pretty(&ClientConfig::default())?;
        assert!(!raw.contains("sample_dir"));
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = ClientConfig::load(Some(&dir.path().join("absent.toml")))?;
        if std::env::var_os(ENV_ENDPOINT).is_none() {
            assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        }
        Ok(())
    }
}
