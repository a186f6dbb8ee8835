//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ColmixError, ColmixResult};
use std::time::Duration;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Mixing pipeline defaults.
    pub mixer: MixerDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default mixing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MixerDefaults {
    /// Rate at which a still image is re-emitted.
    pub image_fps: u32,

    /// Pacing used when a video stream does not report a usable frame rate.
    pub fallback_video_fps: f64,

    /// How long the compositor waits on each channel before skipping a cycle.
    pub take_timeout_ms: u64,

    /// File extensions (without the dot, case-insensitive) decoded as video.
    pub video_extensions: Vec<String>,

    /// Resampling used when the second source must match the first.
    pub resize_filter: ResizeFilter,
}

/// Resampling kernel for resolution reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "colmix=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for MixerDefaults {
    fn default() -> Self {
        Self {
            image_fps: 30,
            fallback_video_fps: 30.0,
            take_timeout_ms: 1000,
            video_extensions: vec!["mp4".to_string(), "avi".to_string(), "mov".to_string()],
            resize_filter: ResizeFilter::Bilinear,
        }
    }
}

impl MixerDefaults {
    /// Compositor take timeout as a `Duration`.
    pub fn take_timeout(&self) -> Duration {
        Duration::from_millis(self.take_timeout_ms.max(1))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ColmixResult<()> {
        if self.image_fps == 0 {
            return Err(ColmixError::config("image_fps must be at least 1"));
        }
        if !self.fallback_video_fps.is_finite() || self.fallback_video_fps <= 0.0 {
            return Err(ColmixError::config(format!(
                "fallback_video_fps must be positive, got {}",
                self.fallback_video_fps
            )));
        }
        if self.take_timeout_ms == 0 {
            return Err(ColmixError::config("take_timeout_ms must be at least 1"));
        }
        if self.video_extensions.iter().any(|ext| ext.trim_start_matches('.').is_empty()) {
            return Err(ColmixError::config("video_extensions must not contain empty entries"));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("colmix").join("config.json")
}
