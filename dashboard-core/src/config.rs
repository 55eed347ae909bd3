use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// charts_dir = "/srv/dashboard/media/charts"
/// request_timeout_secs = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// OpenWeatherMap API key.
    pub api_key: Option<String>,

    /// Directory chart images are written to.
    pub charts_dir: Option<PathBuf>,

    /// TrueType font used for chart text; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,

    pub request_timeout_secs: Option<u64>,

    /// Override for the API root, mostly useful against a local mock.
    pub base_url: Option<String>,

    /// JSON-lines file readings are appended to.
    pub readings_file: Option<PathBuf>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        Self::pick_api_key(from_env, self.api_key.clone())
    }

    fn pick_api_key(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
        from_env
            .filter(|k| !k.trim().is_empty())
            .or_else(|| from_file.filter(|k| !k.trim().is_empty()))
            .map(|k| k.trim().to_owned())
    }

    /// Charts directory; defaults to `<data dir>/media/charts`.
    pub fn charts_dir(&self) -> Result<PathBuf> {
        match &self.charts_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("media").join("charts")),
        }
    }

    pub fn readings_file(&self) -> Result<PathBuf> {
        match &self.readings_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("readings.jsonl")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_wins_over_file_key() {
        let key = Config::pick_api_key(Some("ENV".into()), Some("FILE".into()));
        assert_eq!(key.as_deref(), Some("ENV"));
    }

    #[test]
    fn blank_keys_are_ignored() {
        let key = Config::pick_api_key(Some("  ".into()), Some(" FILE ".into()));
        assert_eq!(key.as_deref(), Some("FILE"));

        assert_eq!(Config::pick_api_key(None, Some(String::new())), None);
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::default();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn explicit_charts_dir_is_used() {
        let cfg = Config { charts_dir: Some("/srv/media/charts".into()), ..Config::default() };
        assert_eq!(cfg.charts_dir().unwrap(), PathBuf::from("/srv/media/charts"));
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: Config = toml::from_str("api_key = \"K\"\nrequest_timeout_secs = 3\n").unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("K"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
        assert!(cfg.charts_dir.is_none());
    }

    #[test]
    fn set_api_key_replaces_existing() {
        let mut cfg = Config::default();
        cfg.set_api_key("OLD".into());
        cfg.set_api_key("NEW".into());
        assert_eq!(cfg.api_key.as_deref(), Some("NEW"));
    }
}
