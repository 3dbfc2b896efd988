use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::CoreError;

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Generative Language API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable consulted when no key is configured under `gemini.api_key`.
pub const FALLBACK_API_KEY_VAR: &str = "API_KEY";

/// Generation service settings.
#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
        }
    }
}

/// Mock calendar behaviour. The failure rate stands in for a real OAuth flow.
#[derive(Debug, Deserialize, Clone)]
pub struct CalendarConfig {
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            failure_rate: default_failure_rate(),
            latency_ms: default_latency_ms(),
        }
    }
}

impl CalendarConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Directory for persisted preferences/feedback. `None` keeps everything in memory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Top-level process configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_recipient_name")]
    pub recipient_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            calendar: CalendarConfig::default(),
            storage: StorageConfig::default(),
            recipient_name: default_recipient_name(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_failure_rate() -> f64 {
    0.3
}

fn default_latency_ms() -> u64 {
    1500
}

fn default_recipient_name() -> String {
    "Traveler".to_string()
}

impl AppConfig {
    /// Loads configuration from files and environment variables.
    ///
    /// Reads, in order of increasing priority:
    /// 1. `wanderlust.toml` in the working directory (optional)
    /// 2. Environment variables prefixed with `WANDERLUST_`, `__` between
    ///    levels (e.g., `WANDERLUST_GEMINI__API_KEY`)
    /// 3. `API_KEY`, only if no key was found above
    pub fn load() -> Result<Self, CoreError> {
        let builder = Config::builder()
            .add_source(File::with_name("wanderlust").required(false))
            .add_source(
                Environment::with_prefix("WANDERLUST")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let mut cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;

        if cfg.gemini.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            cfg.gemini.api_key = std::env::var(FALLBACK_API_KEY_VAR).ok();
        }

        tracing::debug!(
            model = %cfg.gemini.model,
            has_api_key = cfg.gemini.api_key.is_some(),
            persistent = cfg.storage.dir.is_some(),
            "configuration loaded"
        );
        Ok(cfg)
    }

    /// Reject values that would make the mock calendar meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        let rate = self.calendar.failure_rate;
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(CoreError::Configuration(format!(
                "calendar.failure_rate must be between 0 and 1, got {rate}"
            )));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(CoreError::Configuration("gemini.model must not be empty".into()));
        }
        Ok(())
    }

    /// The generation service credential.
    /// Missing or blank keys are a configuration error, never a network one.
    pub fn api_key(&self) -> Result<&str, CoreError> {
        match self.gemini.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(CoreError::Configuration(format!(
                "No API key configured. Set WANDERLUST_GEMINI__API_KEY or {FALLBACK_API_KEY_VAR}."
            ))),
        }
    }
}
