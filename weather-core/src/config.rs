use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::session::{DEFAULT_HISTORY_WINDOW, DEFAULT_SYSTEM_PROMPT};

pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_LLM_URL: &str = "WEATHER_LLM_URL";
pub const ENV_LLM_MODEL: &str = "WEATHER_LLM_MODEL";

/// Used when neither the environment nor the config file provides a key.
pub const FALLBACK_WEATHER_API_KEY: &str = "openweather-demo-key";

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_LLM_URL: &str = "http://localhost:1234/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "llama 8B";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Weather provider credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
        }
    }
}

/// Chat-completions backend the orchestrator talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LLM_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of most recent messages sent to the backend each turn.
    pub history_window: usize,
    pub system_prompt: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            system_prompt: None,
        }
    }
}

impl ChatConfig {
    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [backend]
/// url = "http://localhost:1234/v1/chat/completions"
/// model = "llama 8B"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherConfig,
    pub backend: BackendConfig,
    pub chat: ChatConfig,
}

impl Config {
    /// Load config from the platform config dir, or defaults if the file doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from an explicit path, or defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to `path`, creating parent directories as needed.
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
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `WEATHER_*` environment overrides on top of the file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_WEATHER_API_KEY) {
            self.weather.api_key = Some(key);
        }
        if let Some(url) = non_empty(ENV_LLM_URL) {
            self.backend.url = url;
        }
        if let Some(model) = non_empty(ENV_LLM_MODEL) {
            self.backend.model = model;
        }
        self
    }

    /// Resolved weather API key: configured value, or the built-in fallback.
    pub fn weather_api_key(&self) -> &str {
        self.weather
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(FALLBACK_WEATHER_API_KEY)
    }

    pub fn has_weather_api_key(&self) -> bool {
        self.weather.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
