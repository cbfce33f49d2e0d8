//! Runtime configuration.
//!
//! Sources, later ones winning:
//! 1. built-in defaults ([`AppConfig::default`])
//! 2. `tone_toner.toml` in the working directory, if present
//! 3. `TONE_TONER__*` environment variables, e.g. `TONE_TONER__BACKEND__BASE_URL`

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_STEM: &str = "tone_toner";
pub const ENV_PREFIX: &str = "TONE_TONER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub ui: UiConfig,
    pub clipboard: ClipboardConfig,
    pub logging: LoggingConfig,
    /// Dump every presented frame to `debug_out/`.
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// No client-side timeout unless set.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub font_path: Option<String>,
    pub emoji_font_path: Option<String>,
    pub font_size: f32,
    /// Skip the window and use the terminal surface.
    pub headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Fallback copy commands, tried in order; text is written to stdin.
    pub commands: Vec<String>,
    pub feedback_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// "error", "warn", "info", "debug" or "trace"; `RUST_LOG` overrides it.
    pub level: String,
    /// Also append logs to this file.
    pub file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            ui: UiConfig::default(),
            clipboard: ClipboardConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 760,
            title: "Tone Toner".to_string(),
            font_path: None,
            emoji_font_path: None,
            font_size: 20.0,
            headless: false,
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            commands: vec![
                "wl-copy".to_string(),
                "xclip -selection clipboard".to_string(),
                "xsel --clipboard --input".to_string(),
                "pbcopy".to_string(),
            ],
            feedback_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name(CONFIG_FILE_STEM).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.backend.base_url.starts_with("http://") && !self.backend.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url must be an http(s) url, got {:?}",
                self.backend.base_url
            )));
        }
        if self.ui.width == 0 || self.ui.height == 0 {
            return Err(ConfigError::Invalid("ui size must be positive".to_string()));
        }
        if self.ui.font_size <= 0.0 {
            return Err(ConfigError::Invalid("ui.font_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clipboard.feedback_ms, 2000);
        assert!(config.backend.timeout_secs.is_none());
    }

    #[test]
    fn rejects_non_http_backend() {
        let mut config = AppConfig::default();
        config.backend.base_url = "ftp://example".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
