//! Animator configuration
//!
//! Loaded once at startup from TOML (`aniflux.toml`), or built from presets.
//!
//! ```toml
//! default_duration_us = 1000000
//! default_repeat_count = 1
//! sync = false
//! duration_scale = 1.0
//! frame_rate = 60
//! finalize_policy = "flag_only"
//! log_filter = "aniflux=info"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::handle::TeardownPolicy;

/// Configuration applied to newly set-up animators
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Duration of one repetition for new engines, in microseconds
    pub default_duration_us: i64,
    /// Repetitions for new engines; `<= 0` repeats forever
    pub default_repeat_count: i32,
    /// Flush frames on the calling thread
    pub sync: bool,
    /// Multiplier on elapsed time; 0 makes animations finish immediately
    pub duration_scale: f32,
    /// Display link frame rate
    pub frame_rate: u32,
    /// Teardown policy used when a finalizer destroys the peer
    pub finalize_policy: TeardownPolicy,
    /// `tracing` filter directive used by `init_logging`
    pub log_filter: String,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnimatorConfig {
    /// Standard configuration
    pub fn standard() -> Self {
        Self {
            default_duration_us: 0,
            default_repeat_count: 1,
            sync: false,
            duration_scale: 1.0,
            frame_rate: 60,
            finalize_policy: TeardownPolicy::FlagOnly,
            log_filter: "info".to_string(),
        }
    }

    /// Configuration for tests: synchronous flushing and verbose logs
    pub fn testing() -> Self {
        Self {
            sync: true,
            frame_rate: 120,
            log_filter: "debug".to_string(),
            ..Self::standard()
        }
    }

    /// Parse from TOML text; missing keys take their standard values
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnimatorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded animator config from {}", path.display());
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.default_duration_us < 0 {
            return Err(ConfigError::Invalid {
                field: "default_duration_us",
                reason: format!("must not be negative, got {}", self.default_duration_us),
            });
        }
        if !self.duration_scale.is_finite() || self.duration_scale < 0.0 {
            return Err(ConfigError::Invalid {
                field: "duration_scale",
                reason: format!("must be a finite value >= 0, got {}", self.duration_scale),
            });
        }
        if self.frame_rate == 0 || self.frame_rate > 240 {
            return Err(ConfigError::Invalid {
                field: "frame_rate",
                reason: format!("must be in 1..=240, got {}", self.frame_rate),
            });
        }
        Ok(())
    }

    pub fn with_duration_us(mut self, duration_us: i64) -> Self {
        self.default_duration_us = duration_us;
        self
    }

    pub fn with_repeat_count(mut self, count: i32) -> Self {
        self.default_repeat_count = count;
        self
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_duration_scale(mut self, scale: f32) -> Self {
        self.duration_scale = scale;
        self
    }

    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn with_finalize_policy(mut self, policy: TeardownPolicy) -> Self {
        self.finalize_policy = policy;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
