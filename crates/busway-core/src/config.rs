//! Processing unit configuration.
//!
//! # Example
//!
//! ```ignore
//! use busway_core::UnitConfig;
//!
//! let config = UnitConfig::new("Sidechain Gate", "2-2 2.2-2")
//!     .with_latency(64)
//!     .with_max_block_size(512);
//!
//! // Or from a JSON document; missing fields take their defaults.
//! let config = UnitConfig::from_json(r#"{ "name": "Gate", "channel_io": "1-1 2-2" }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{UnitError, UnitResult};
use crate::session::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};
use crate::topology::Topology;

/// Static description of a processing unit: its channel-I/O string and the
/// session values it starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Display name, used in log messages.
    pub name: String,
    /// Channel-I/O string, e.g. `"1-1 2-2"`.
    pub channel_io: String,
    /// Initial latency in samples.
    pub latency: usize,
    /// Initial tail length in samples.
    pub tail_size: usize,
    /// Largest block the host will deliver.
    pub max_block_size: usize,
    /// Initial sample rate in Hz.
    pub sample_rate: f64,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            name: String::from("unit"),
            channel_io: String::from("2-2"),
            latency: 0,
            tail_size: 0,
            max_block_size: DEFAULT_BLOCK_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl UnitConfig {
    /// Create a configuration with the given name and channel-I/O string.
    pub fn new(name: impl Into<String>, channel_io: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel_io: channel_io.into(),
            ..Self::default()
        }
    }

    /// Set the initial latency.
    pub fn with_latency(mut self, samples: usize) -> Self {
        self.latency = samples;
        self
    }

    /// Set the initial tail length.
    pub fn with_tail_size(mut self, samples: usize) -> Self {
        self.tail_size = samples;
        self
    }

    /// Set the largest block size.
    pub fn with_max_block_size(mut self, frames: usize) -> Self {
        self.max_block_size = frames;
        self
    }

    /// Set the initial sample rate.
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> UnitResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> UnitResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration and parse its topology.
    pub fn validate(&self) -> UnitResult<Topology> {
        if self.max_block_size == 0 {
            return Err(UnitError::InvalidConfiguration(
                "max_block_size must be greater than zero".to_string(),
            ));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(UnitError::InvalidConfiguration(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }

        let topology = Topology::parse(&self.channel_io)?;
        topology.validate().map_err(UnitError::InvalidConfiguration)?;
        Ok(topology)
    }
}
