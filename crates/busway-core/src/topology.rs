//! Topology model.
//!
//! [`Topology`] owns the descriptors parsed from the channel-I/O string and
//! answers the questions a host asks while negotiating a session: how many
//! buses, how wide each bus can be, whether a given channel pair is legal.
//! It is immutable after construction.

use crate::bus_config::{ChannelCount, IoConfig};
use crate::channel_io::{parse_channel_io, ChannelIoSpec};
use crate::error::ChannelIoError;
use crate::types::{Direction, MAX_CHANNELS};

/// Validated set of legal I/O configurations for a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    spec: ChannelIoSpec,
}

impl Topology {
    /// Parse a channel-I/O string into a topology.
    pub fn parse(io_str: &str) -> Result<Self, ChannelIoError> {
        parse_channel_io(io_str).map(Self::from_spec)
    }

    /// Wrap an already parsed spec.
    pub fn from_spec(spec: ChannelIoSpec) -> Self {
        Self { spec }
    }

    /// The parsed spec, including aggregate counts.
    #[inline]
    pub fn spec(&self) -> &ChannelIoSpec {
        &self.spec
    }

    /// Number of alternative I/O configurations.
    #[inline]
    pub fn n_io_configs(&self) -> usize {
        self.spec.len()
    }

    /// Get an I/O configuration by index.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    pub fn io_config(&self, index: usize) -> Option<&IoConfig> {
        self.spec.configs.get(index)
    }

    /// Iterate over all I/O configurations.
    pub fn io_configs(&self) -> impl Iterator<Item = &IoConfig> + '_ {
        self.spec.configs.iter()
    }

    /// Maximum bus count in a direction across all configurations.
    #[inline]
    pub fn max_buses(&self, direction: Direction) -> usize {
        self.spec.max_buses(direction)
    }

    /// Widest fixed channel total in a direction across all configurations.
    #[inline]
    pub fn max_total_channels(&self, direction: Direction) -> usize {
        self.spec.max_total(direction)
    }

    /// Maximum channel count a bus can carry across all configurations.
    ///
    /// Returns `None` when `bus` is beyond [`max_buses`](Self::max_buses), and
    /// `Some(ChannelCount::Wildcard)` when any configuration declares a
    /// wildcard at that position.
    pub fn max_channels_for_bus(&self, direction: Direction, bus: usize) -> Option<ChannelCount> {
        if bus >= self.max_buses(direction) {
            return None;
        }

        let mut widest = 0;
        for config in self.io_configs() {
            match config.bus_info(direction, bus).map(|b| b.channels) {
                Some(ChannelCount::Wildcard) => return Some(ChannelCount::Wildcard),
                Some(ChannelCount::Fixed(n)) => widest = widest.max(n),
                None => {}
            }
        }

        Some(ChannelCount::Fixed(widest))
    }

    /// Returns true if the direction has a wildcard bus.
    ///
    /// Only the first configuration is consulted. Wildcards that appear solely
    /// in later alternatives are not reported here.
    pub fn has_wildcard_bus(&self, direction: Direction) -> bool {
        self.io_config(0)
            .map(|config| config.contains_wildcard(direction))
            .unwrap_or(false)
    }

    /// Returns true if any configuration has a wildcard in the direction.
    fn any_wildcard(&self, direction: Direction) -> bool {
        self.io_configs().any(|c| c.contains_wildcard(direction))
    }

    /// Check whether a pair of total channel counts matches a configuration.
    ///
    /// Pass [`UNCHECKED`](crate::UNCHECKED) (or any negative value) for one
    /// side to test only the other. Wildcard buses accept any count at least
    /// as large as the fixed channels sharing their direction.
    pub fn legal_io(&self, n_inputs: i32, n_outputs: i32) -> bool {
        let fits = |config: &IoConfig, direction: Direction, n: i32| {
            n < 0 || config.accepts(direction, n as usize)
        };

        self.io_configs().any(|config| {
            fits(config, Direction::Input, n_inputs) && fits(config, Direction::Output, n_outputs)
        })
    }

    /// Number of channel slots to allocate for a direction.
    ///
    /// This is the widest fixed total, or [`MAX_CHANNELS`] when any
    /// configuration has a wildcard bus in the direction.
    pub fn channel_capacity(&self, direction: Direction) -> usize {
        if self.any_wildcard(direction) {
            MAX_CHANNELS
        } else {
            self.max_total_channels(direction).min(MAX_CHANNELS)
        }
    }

    /// Returns true if the unit declares a side-chain input.
    ///
    /// The side-chain may not be active in every configuration.
    #[inline]
    pub fn has_sidechain_input(&self) -> bool {
        self.max_buses(Direction::Input) > 1
    }

    /// Channel count of the side-chain (input bus 1).
    ///
    /// Taken from the first configuration that declares a side-chain. A
    /// wildcard side-chain reports the input slots left after the main bus.
    pub fn sidechain_channels(&self) -> usize {
        let Some(config) = self.io_configs().find(|c| c.bus_count(Direction::Input) > 1) else {
            return 0;
        };

        match config.inputs[1].channels {
            ChannelCount::Fixed(n) => n,
            ChannelCount::Wildcard => self
                .channel_capacity(Direction::Input)
                .saturating_sub(config.channels_on_bus(Direction::Input, 0)),
        }
    }

    /// Validate every configuration against routing limits.
    pub fn validate(&self) -> Result<(), String> {
        for (i, config) in self.io_configs().enumerate() {
            config
                .validate()
                .map_err(|msg| format!("I/O configuration {} ({}): {}", i, config, msg))?;
        }
        Ok(())
    }

    /// Describe the topology as JSON for host-side diagnostics.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&serde_json::json!({
            "configs": self.spec.configs,
            "max_total_in": self.spec.max_total_in,
            "max_total_out": self.spec.max_total_out,
            "max_in_buses": self.spec.max_in_buses,
            "max_out_buses": self.spec.max_out_buses,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNCHECKED;

    #[test]
    fn test_legal_io_mono() {
        let topology = Topology::parse("1-1").unwrap();
        assert!(topology.legal_io(1, 1));
        assert!(!topology.legal_io(2, 1));
        assert!(!topology.legal_io(1, 2));
    }

    #[test]
    fn test_legal_io_unchecked_side() {
        let topology = Topology::parse("1-1 2-2").unwrap();
        assert!(topology.legal_io(UNCHECKED, 2));
        assert!(topology.legal_io(1, UNCHECKED));
        assert!(!topology.legal_io(UNCHECKED, 3));
        // Each side matches some token, but no single token matches both.
        assert!(!topology.legal_io(1, 2));
    }

    #[test]
    fn test_wildcard_input_accepts_any_count() {
        let topology = Topology::parse("*-2").unwrap();
        for n in 0..=64 {
            assert!(topology.legal_io(n, 2), "n = {}", n);
        }
        assert!(!topology.legal_io(2, 1));
        assert!(topology.has_wildcard_bus(Direction::Input));
        assert!(!topology.has_wildcard_bus(Direction::Output));
        assert_eq!(topology.channel_capacity(Direction::Input), MAX_CHANNELS);
        assert_eq!(topology.channel_capacity(Direction::Output), 2);
    }

    #[test]
    fn test_wildcard_query_uses_first_config_only() {
        let topology = Topology::parse("2-2 *-2").unwrap();
        assert!(!topology.has_wildcard_bus(Direction::Input));
        // Legality and capacity still see every alternative.
        assert!(topology.legal_io(5, 2));
        assert_eq!(topology.channel_capacity(Direction::Input), MAX_CHANNELS);
    }

    #[test]
    fn test_max_channels_for_bus() {
        let topology = Topology::parse("2.1-2 2.2-2 1-1.1").unwrap();
        assert_eq!(topology.max_buses(Direction::Input), 2);
        assert_eq!(
            topology.max_channels_for_bus(Direction::Input, 0),
            Some(ChannelCount::Fixed(2))
        );
        assert_eq!(
            topology.max_channels_for_bus(Direction::Input, 1),
            Some(ChannelCount::Fixed(2))
        );
        assert_eq!(
            topology.max_channels_for_bus(Direction::Output, 1),
            Some(ChannelCount::Fixed(1))
        );
        assert_eq!(topology.max_channels_for_bus(Direction::Input, 2), None);
    }

    #[test]
    fn test_max_channels_for_wildcard_bus() {
        let topology = Topology::parse("2.*-2").unwrap();
        assert_eq!(
            topology.max_channels_for_bus(Direction::Input, 1),
            Some(ChannelCount::Wildcard)
        );
    }

    #[test]
    fn test_sidechain_queries() {
        let plain = Topology::parse("2-2").unwrap();
        assert!(!plain.has_sidechain_input());
        assert_eq!(plain.sidechain_channels(), 0);

        let keyed = Topology::parse("2-2 2.2-2").unwrap();
        assert!(keyed.has_sidechain_input());
        assert_eq!(keyed.sidechain_channels(), 2);
        assert_eq!(keyed.channel_capacity(Direction::Input), 4);
    }

    #[test]
    fn test_io_config_access() {
        let topology = Topology::parse("1-1 2-2").unwrap();
        assert_eq!(topology.n_io_configs(), 2);
        assert_eq!(topology.io_config(1).unwrap().to_string(), "2-2");
        assert!(topology.io_config(2).is_none());
        assert!(topology.validate().is_ok());
    }

    #[test]
    fn test_to_json() {
        let topology = Topology::parse("1.1-1").unwrap();
        let json: serde_json::Value = serde_json::from_str(&topology.to_json().unwrap()).unwrap();
        assert_eq!(json["max_in_buses"], 2);
        assert_eq!(json["configs"][0]["inputs"][1]["bus_type"], "aux");
    }
}
