use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path, path::PathBuf, time::Duration};

use crate::{SunboardError, model::City};

/// Placeholder shipped in the sample config; treated the same as a missing key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_WEATHERAPI_KEY_HERE";

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
///
/// [[cities]]
/// id = "darwin"
/// name = "Darwin"
/// query = "Darwin,AU"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// WeatherAPI.com key.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_cities")]
    pub cities: Vec<City>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Days requested from the forecast endpoint; only today is used.
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,

    /// Presentation-only tick; never triggers a fetch.
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: u64,
}

fn default_cities() -> Vec<City> {
    [
        ("adelaide", "Adelaide"),
        ("darwin", "Darwin"),
        ("melbourne", "Melbourne"),
        ("sydney", "Sydney"),
    ]
    .into_iter()
    .map(|(id, name)| City::new(id, name, format!("{name},AU")))
    .collect()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_forecast_days() -> u8 {
    3
}

const fn default_refresh_interval_minutes() -> u64 {
    30
}

const fn default_tick_interval_seconds() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            cities: default_cities(),
            base_url: default_base_url(),
            forecast_days: default_forecast_days(),
            refresh_interval_minutes: default_refresh_interval_minutes(),
            tick_interval_seconds: default_tick_interval_seconds(),
        }
    }
}

impl Config {
    /// Returns the usable API key, or a configuration error when it is absent,
    /// blank, or still the documented placeholder.
    pub fn credential(&self) -> Result<&str, SunboardError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && !key.contains(API_KEY_PLACEHOLDER) => Ok(key),
            _ => Err(SunboardError::configuration(
                "Add your WeatherAPI key to the config file.\n\
                 Hint: run `sunboard configure` and paste your key.",
            )),
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.saturating_mul(60))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    /// Checks the city list (at least one city, unique ids, non-empty queries)
    /// and that the forecast length and both intervals are non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            bail!("No cities configured.");
        }

        let mut seen = HashSet::new();
        for city in &self.cities {
            if !seen.insert(city.id.as_str()) {
                bail!("Duplicate city id '{}' in config.", city.id);
            }
            if city.query.trim().is_empty() {
                bail!("City '{}' has an empty provider query.", city.id);
            }
        }

        if self.forecast_days == 0 {
            bail!("forecast_days must be at least 1.");
        }
        if self.refresh_interval_minutes == 0 {
            bail!("refresh_interval_minutes must be at least 1.");
        }
        if self.tick_interval_seconds == 0 {
            bail!("tick_interval_seconds must be at least 1.");
        }

        Ok(())
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use the built-in city list.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "sunboard", "sunboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
