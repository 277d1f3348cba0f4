//! Rail configuration (animation tuning + lifecycle policy).
//!
//! Loaded once at startup and then treated as immutable for the rest of the
//! process. Every field has a serde default, so a partial JSON document is
//! enough.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::Easing;

/// How lifecycle programmer errors (e.g. double initialization) are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Surface the error to the caller.
    Development,
    /// Ignore it and keep the current state.
    Production,
}

/// Animation tuning for the replace workflow.
///
/// The outgoing and incoming durations are independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Distance (points) a card slides while fading.
    pub y_delta: f64,

    /// Followed card fade-out.
    pub out_duration_ms: u64,

    /// Suggested card fade-in.
    pub in_duration_ms: u64,

    pub easing: Easing,

    /// Tick interval of the animation driver.
    pub frame_interval_ms: u64,
}

impl AnimationConfig {
    pub fn out_duration(&self) -> Duration {
        Duration::from_millis(self.out_duration_ms)
    }

    pub fn in_duration(&self) -> Duration {
        Duration::from_millis(self.in_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            y_delta: 20.0,
            out_duration_ms: 500,
            in_duration_ms: 400,
            easing: Easing::CubicOut,
            frame_interval_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailConfig {
    pub animation: AnimationConfig,
    pub environment: Environment,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            animation: AnimationConfig::default(),
            environment: Environment::Production,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RailConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

static GLOBAL: OnceLock<RailConfig> = OnceLock::new();

/// Install the process-wide configuration.
///
/// Returns the rejected config if one was already installed.
pub fn install(config: RailConfig) -> Result<(), RailConfig> {
    GLOBAL.set(config)
}

/// The process-wide configuration (defaults if nothing was installed).
pub fn global() -> &'static RailConfig {
    GLOBAL.get_or_init(RailConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_card_animation() {
        let c = RailConfig::default();
        assert_eq!(c.animation.y_delta, 20.0);
        assert_eq!(c.animation.out_duration(), Duration::from_millis(500));
        assert_eq!(c.animation.in_duration(), Duration::from_millis(400));
        assert_eq!(c.animation.easing, Easing::CubicOut);
        assert_eq!(c.environment, Environment::Production);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let c = RailConfig::from_json_str(
            r#"{ "animation": { "in_duration_ms": 250 }, "environment": "development" }"#,
        )
        .expect("parse");
        assert_eq!(c.animation.in_duration_ms, 250);
        assert_eq!(c.animation.out_duration_ms, 500);
        assert_eq!(c.environment, Environment::Development);
    }

    #[test]
    fn zero_frame_interval_is_clamped() {
        let c = AnimationConfig {
            frame_interval_ms: 0,
            ..AnimationConfig::default()
        };
        assert_eq!(c.frame_interval(), Duration::from_millis(1));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = RailConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn global_is_stable() {
        let a = global() as *const RailConfig;
        let b = global() as *const RailConfig;
        assert_eq!(a, b);
    }
}
