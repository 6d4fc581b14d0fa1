//! Runtime configuration
//!
//! Read from a TOML file; the backend URL and anon key may also come from
//! `JOURNAL_SUPABASE_URL` / `JOURNAL_SUPABASE_ANON_KEY`, which win over the
//! file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::api::client::clamp_timeout;
use crate::api::{Backoff, RetryPolicy};
use crate::view::Locale;

pub const DEFAULT_CONFIG_FILE: &str = "journal.toml";
pub const URL_ENV: &str = "JOURNAL_SUPABASE_URL";
pub const ANON_KEY_ENV: &str = "JOURNAL_SUPABASE_ANON_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("backend URL is not configured (set [backend].url or JOURNAL_SUPABASE_URL)")]
    MissingUrl,
    #[error("backend anon key is not configured (set [backend].anon_key or JOURNAL_SUPABASE_ANON_KEY)")]
    MissingAnonKey,
    #[error("invalid backend URL '{0}'")]
    InvalidUrl(String),
    #[error("no data directory available, set [app].data_dir")]
    NoDataDir,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_step_ms() -> u64 {
    1000
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

impl NetworkConfig {
    /// Per-attempt timeout, clamped to 10–15 s
    pub fn timeout(&self) -> Duration {
        clamp_timeout(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Backoff::Linear(Duration::from_millis(self.backoff_step_ms)),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    /// Public address of the journal, base of share links
    #[serde(default = "default_app_url")]
    pub url: String,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_restore_timeout_secs")]
    pub session_restore_timeout_secs: u64,
    #[serde(default)]
    pub locale: Locale,
}

fn default_app_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_restore_timeout_secs() -> u64 {
    5
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            url: default_app_url(),
            data_dir: None,
            session_restore_timeout_secs: default_restore_timeout_secs(),
            locale: Locale::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfflineConfig {
    #[serde(default = "default_cache_version")]
    pub cache_version: String,
}

fn default_cache_version() -> String {
    "v1.0.9".to_string()
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub offline: OfflineConfig,
}

impl AppConfig {
    /// Load from `path`, or from `journal.toml` when present. An explicit
    /// path must exist; the default one may be missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend.url = url;
        }
        if let Some(key) = lookup(ANON_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend.anon_key = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend.url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        if self.backend.anon_key.trim().is_empty() {
            return Err(ConfigError::MissingAnonKey);
        }
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.app.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("g-trade-journal"))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    pub fn restore_timeout(&self) -> Duration {
        Duration::from_secs(self.app.session_restore_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.network.timeout(), Duration::from_secs(12));
        assert_eq!(config.network.retry_policy().max_attempts(), 3);
        assert_eq!(config.restore_timeout(), Duration::from_secs(5));
        assert_eq!(config.offline.cache_version, "v1.0.9");
        assert_eq!(config.app.locale, Locale::Uk);
        assert!(matches!(config.validate(), Err(ConfigError::MissingUrl)));
    }

    #[test]
    fn test_full_file() {
        let config = AppConfig::parse(
            r#"
            [backend]
            url = "https://abc.supabase.co"
            anon_key = "anon"

            [network]
            timeout_secs = 60
            max_attempts = 5

            [app]
            url = "https://journal.example.com/"
            locale = "en"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.network.timeout(), Duration::from_secs(15));
        assert_eq!(config.network.retry_policy().max_attempts(), 5);
        assert_eq!(config.app.locale, Locale::En);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::parse("[backend]\nurl = \"https://file.example\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingAnonKey)));

        config.apply_overrides(|name| match name {
            URL_ENV => Some("https://env.example".to_string()),
            ANON_KEY_ENV => Some("env-key".to_string()),
            _ => None,
        });

        assert_eq!(config.backend.url, "https://env.example");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = AppConfig::parse("[backend]\nurl = \"ftp://x\"\nanon_key = \"k\"").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_explicit_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_explicit_data_dir() {
        let config = AppConfig::parse("[app]\ndata_dir = \"/tmp/journal\"").unwrap();
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/journal"));
    }
}
