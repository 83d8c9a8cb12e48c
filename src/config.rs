use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::geo::{Coordinates, DEFAULT_WALKING_SPEED_M_PER_MIN};

const ACCESS_TOKEN_ENV: &str = "WAYFIND_ACCESS_TOKEN";

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub search: SearchConfig,
    pub navigation: NavigationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    pub geocoding_url: String,
    pub directions_url: String,
    pub access_token: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string(),
            directions_url: "https://api.mapbox.com/directions/v5/mapbox".to_string(),
            access_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub result_limit: usize,
    pub debounce_ms: u64,
    /// Proximity anchor as `"lat,lon"`.
    pub anchor: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: 5,
            debounce_ms: 250,
            anchor: "6.3980,5.6120".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn anchor_coordinates(&self) -> AppResult<Coordinates> {
        Coordinates::parse(&self.anchor)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    pub step_interval_ms: u64,
    pub walking_speed_m_per_min: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: 10_000,
            walking_speed_m_per_min: DEFAULT_WALKING_SPEED_M_PER_MIN,
        }
    }
}

impl NavigationConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub default: String,
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "warn".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let config = match default_config_path() {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(AppError::invalid_argument(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        let parsed = toml::from_str::<Self>(&raw).map_err(|source| {
            AppError::invalid_argument(format!(
                "failed to parse config {}: {source}",
                path.display()
            ))
        })?;
        Ok(parsed.sanitized())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(token) = std::env::var_os(ACCESS_TOKEN_ENV)
            && !token.is_empty()
        {
            self.provider.access_token = token.to_string_lossy().into_owned();
        }
        self
    }

    fn sanitized(mut self) -> Self {
        self.search.result_limit = self.search.result_limit.clamp(1, 10);
        if self.search.anchor_coordinates().is_err() {
            self.search.anchor = SearchConfig::default().anchor;
        }
        self.navigation.step_interval_ms = self.navigation.step_interval_ms.max(1);
        let speed = self.navigation.walking_speed_m_per_min;
        if !speed.is_finite() || speed <= 0.0 {
            self.navigation.walking_speed_m_per_min = DEFAULT_WALKING_SPEED_M_PER_MIN;
        }
        if self.logging.default.trim().is_empty() {
            self.logging.default = LoggingConfig::default().default;
        }
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("WAYFIND_CONFIG_PATH")
        && !explicit.is_empty()
    {
        return Some(PathBuf::from(explicit));
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Some(PathBuf::from(xdg).join("wayfind").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("wayfind")
                .join("config.toml"),
        );
    }
    if let Some(appdata) = std::env::var_os("APPDATA")
        && !appdata.is_empty()
    {
        return Some(PathBuf::from(appdata).join("wayfind").join("config.toml"));
    }
    None
}
