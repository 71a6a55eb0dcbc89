//! imgframe configuration system
//!
//! Settings are loaded from `imgframe.toml`, then individual values can be
//! overridden through environment variables.

use imgframe_transform::animation::{DEFAULT_DURATION_MS, EasingFunction};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the current directory by [`ImgframeConfig::load`].
pub const DEFAULT_CONFIG_FILE: &str = "imgframe.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImgframeConfig {
    /// Transform animation settings
    pub animation: AnimationConfig,
    /// Frame clock settings
    pub clock: ClockConfig,
    /// Log output settings
    pub logging: LoggingConfig,
    /// Headless runner settings
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Default animation duration in milliseconds
    pub duration_ms: f64,
    /// Easing curve applied to animation progress
    pub easing: EasingFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Interval between frames of the wall-clock scheduler, in milliseconds
    pub frame_interval_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is not set (e.g. "info", "imgframe=debug")
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// Image to load before animating
    pub image: Option<PathBuf>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            easing: EasingFunction::EaseInOut,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 1000.0 / 60.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ImgframeConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `imgframe.toml` in the current directory, or
    /// return the defaults if it is missing or invalid
    pub fn load_or_default() -> Self {
        match Self::load_from_file(DEFAULT_CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::default(),
            Err(err) => {
                log::warn!("{err}; using default configuration");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Unparseable values are ignored with a warning.
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary key lookup (the environment in
    /// production, a map in tests)
    pub fn merge_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("IMGFRAME_DURATION_MS") {
            match val.parse::<f64>() {
                Ok(ms) if ms.is_finite() && ms >= 0.0 => self.animation.duration_ms = ms,
                _ => log::warn!("ignoring IMGFRAME_DURATION_MS={val:?}"),
            }
        }
        if let Some(val) = lookup("IMGFRAME_EASING") {
            match val.parse::<EasingFunction>() {
                Ok(easing) => self.animation.easing = easing,
                Err(err) => log::warn!("ignoring IMGFRAME_EASING: {err}"),
            }
        }
        if let Some(val) = lookup("IMGFRAME_FRAME_INTERVAL_MS") {
            match val.parse::<f64>() {
                Ok(ms) if ms.is_finite() && ms > 0.0 => self.clock.frame_interval_ms = ms,
                _ => log::warn!("ignoring IMGFRAME_FRAME_INTERVAL_MS={val:?}"),
            }
        }
        if let Some(level) = lookup("IMGFRAME_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(image) = lookup("IMGFRAME_IMAGE") {
            self.demo.image = Some(PathBuf::from(image));
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from `imgframe.toml` (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ImgframeConfig::default();
        assert_eq!(config.animation.duration_ms, 350.0);
        assert_eq!(config.animation.easing, EasingFunction::EaseInOut);
        assert_eq!(config.logging.level, "info");
        assert!(config.demo.image.is_none());
    }

    #[test]
    fn test_toml_serialization() {
        let config = ImgframeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ImgframeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[animation]
duration_ms = 500.0
easing = {{ type = "cubic_bezier", x1 = 0.4, y1 = 0.0, x2 = 0.2, y2 = 1.0 }}
"#
        )
        .unwrap();

        let config = ImgframeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.animation.duration_ms, 500.0);
        assert_eq!(
            config.animation.easing,
            EasingFunction::CubicBezier {
                x1: 0.4,
                y1: 0.0,
                x2: 0.2,
                y2: 1.0
            }
        );
        assert_eq!(config.clock, ClockConfig::default());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = ImgframeConfig::load_from_file("/nonexistent/imgframe.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[animation]\nduration_ms = \"slow\"").unwrap();
        let err = ImgframeConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn test_load_or_default() {
        // Should not panic even if imgframe.toml doesn't exist
        let config = ImgframeConfig::load_or_default();
        assert!(config.clock.frame_interval_ms > 0.0);
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = ImgframeConfig::default();
        config.merge_with(lookup(&[
            ("IMGFRAME_DURATION_MS", "120"),
            ("IMGFRAME_EASING", "linear"),
            ("IMGFRAME_FRAME_INTERVAL_MS", "8.5"),
            ("IMGFRAME_LOG_LEVEL", "debug"),
            ("IMGFRAME_IMAGE", "photo.png"),
        ]));

        assert_eq!(config.animation.duration_ms, 120.0);
        assert_eq!(config.animation.easing, EasingFunction::Linear);
        assert_eq!(config.clock.frame_interval_ms, 8.5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.demo.image, Some(PathBuf::from("photo.png")));
    }

    #[test]
    fn test_merge_ignores_bad_values() {
        let mut config = ImgframeConfig::default();
        config.merge_with(lookup(&[
            ("IMGFRAME_DURATION_MS", "-4"),
            ("IMGFRAME_EASING", "wobble"),
            ("IMGFRAME_FRAME_INTERVAL_MS", "0"),
        ]));
        assert_eq!(config, ImgframeConfig::default());
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("IMGFRAME_DURATION_MS", "275");
        }

        let mut config = ImgframeConfig::default();
        config.merge_with_env();
        assert_eq!(config.animation.duration_ms, 275.0);

        unsafe {
            std::env::remove_var("IMGFRAME_DURATION_MS");
        }
    }
}
