//! Runtime configuration
//!
//! Capacities and timing constants are fixed for the life of a runtime.
//! They come from a JSON document produced by the build/configuration
//! tooling; every field is optional and falls back to its default.

use integrity::DEFAULT_POLYNOMIAL;
use kernel_api::{Duration, RtError, RtResult};
use resources::ResourceLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] RtError),
}

/// Static configuration of a [`crate::Runtime`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Table capacity per resource kind
    pub limits: ResourceLimits,
    /// Length of one timer tick in nanoseconds
    pub tick_period_ns: u64,
    /// Priorities are valid in `0..priority_levels`
    pub priority_levels: u16,
    /// Smallest stack budget accepted for a one-shot task
    pub min_stack_size: usize,
    /// Profiling events buffered before a hand-off to the transport
    pub profiling_buffer_events: usize,
    /// Polynomial of the runtime's CRC engine
    pub crc_polynomial: u32,
}

impl RuntimeConfig {
    /// Parses and validates a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Serializes to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> RtResult<()> {
        self.limits.validate()?;
        if self.tick_period_ns == 0 {
            return Err(RtError::InvalidParameter("tick period must be non-zero"));
        }
        if self.priority_levels == 0 || self.priority_levels > 256 {
            return Err(RtError::InvalidParameter(
                "priority levels must be within 1..=256",
            ));
        }
        if self.profiling_buffer_events == 0 {
            return Err(RtError::InvalidParameter(
                "profiling buffer must hold at least one event",
            ));
        }
        Ok(())
    }

    /// Length of one timer tick
    pub fn tick_period(&self) -> Duration {
        Duration::from_nanos(self.tick_period_ns)
    }

    /// Builder: replaces the resource limits
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Builder: sets the tick length
    pub fn with_tick_period_ns(mut self, tick_period_ns: u64) -> Self {
        self.tick_period_ns = tick_period_ns;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            limits: ResourceLimits::default(),
            tick_period_ns: 1_000_000,
            priority_levels: 256,
            min_stack_size: 4096,
            profiling_buffer_events: 32,
            crc_polynomial: DEFAULT_POLYNOMIAL,
        }
    }
}
