//! Codec configuration.
//!
//! The connection layer knows the server version and session timezone; the
//! codec only needs them as plain values. [`CodecConfig`] collects them
//! (optionally from `qail-array.toml`) and [`CodecConfig::context`] turns them
//! into the immutable [`TextContext`] passed to every encode/decode call.
//!
//! ```toml
//! server_version = 90600
//! utc_offset_minutes = 120
//!
//! [infinity]
//! negative = "1900-01-01T00:00:00Z"
//! positive = "2200-01-01T00:00:00Z"
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::protocol::bytea::HEX_FORMAT_MIN_VERSION;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "qail-array.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),

    #[error("infinity bounds must satisfy negative < positive")]
    InvalidInfinityBounds,
}

/// Timestamps at or beyond these bounds are written as `-infinity` / `infinity`,
/// and those tokens decode back to the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InfinityBounds {
    pub negative: DateTime<Utc>,
    pub positive: DateTime<Utc>,
}

impl InfinityBounds {
    pub fn new(negative: DateTime<Utc>, positive: DateTime<Utc>) -> Result<Self, ConfigError> {
        if negative >= positive {
            return Err(ConfigError::InvalidInfinityBounds);
        }
        Ok(Self { negative, positive })
    }
}

/// Serializable codec settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Server version in `server_version_num` form (e.g. 90600, 160002).
    pub server_version: u32,

    /// Session timezone as minutes east of UTC.
    pub utc_offset_minutes: i32,

    /// Opt-in infinite timestamp sentinels.
    pub infinity: Option<InfinityBounds>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            server_version: HEX_FORMAT_MIN_VERSION,
            utc_offset_minutes: 0,
            infinity: None,
        }
    }
}

impl CodecConfig {
    /// Create a new configuration builder
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = toml::from_str(content)?;
        config.context()?;
        Ok(config)
    }

    /// Load from an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded codec config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load `./qail-array.toml`, then `<config dir>/qail-array/config.toml`,
    /// falling back to defaults when neither exists.
    pub fn discover() -> Result<Self, ConfigError> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(user) = dirs::config_dir().map(|d| d.join("qail-array").join("config.toml")) {
            if user.exists() {
                return Self::load(&user);
            }
        }

        tracing::debug!("No codec config found, using defaults");
        Ok(Self::default())
    }

    /// Validate and freeze into a [`TextContext`].
    pub fn context(&self) -> Result<TextContext, ConfigError> {
        let timezone = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))?;

        if let Some(bounds) = &self.infinity {
            InfinityBounds::new(bounds.negative, bounds.positive)?;
        }

        Ok(TextContext {
            server_version: self.server_version,
            timezone,
            infinity: self.infinity,
        })
    }
}

/// Builder for CodecConfig
#[derive(Debug, Default)]
pub struct CodecConfigBuilder {
    config: CodecConfig,
}

impl CodecConfigBuilder {
    /// Set the server version
    pub fn server_version(mut self, version: u32) -> Self {
        self.config.server_version = version;
        self
    }

    /// Set the session timezone
    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.config.utc_offset_minutes = minutes;
        self
    }

    /// Enable infinite timestamp sentinels
    pub fn infinity(mut self, bounds: InfinityBounds) -> Self {
        self.config.infinity = Some(bounds);
        self
    }

    /// Build the configuration
    pub fn build(self) -> CodecConfig {
        self.config
    }
}

/// Immutable per-call settings read by element conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextContext {
    pub server_version: u32,
    pub timezone: FixedOffset,
    pub infinity: Option<InfinityBounds>,
}

impl Default for TextContext {
    fn default() -> Self {
        Self {
            server_version: HEX_FORMAT_MIN_VERSION,
            timezone: Utc.fix(),
            infinity: None,
        }
    }
}

impl TextContext {
    pub fn with_server_version(mut self, server_version: u32) -> Self {
        self.server_version = server_version;
        self
    }

    pub fn with_timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_infinity(mut self, bounds: InfinityBounds) -> Self {
        self.infinity = Some(bounds);
        self
    }
}
