//! Bus-topology descriptors.
//!
//! An [`IoConfig`] is one alternative legal wiring of the unit, produced from a
//! single token of the channel-I/O string (see [`channel_io`](crate::channel_io)).
//! Bus order is significant: bus 0 is the main bus, later buses are auxiliary
//! (side-chain inputs, extra outputs).

use serde::ser::{Serialize, Serializer};

use crate::types::{Direction, MAX_BUSES, MAX_CHANNELS};

/// Channel count of a single bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCount {
    /// A fixed, positive number of channels.
    Fixed(usize),
    /// Accepts any channel count the host offers (`*` in the I/O string).
    Wildcard,
}

impl ChannelCount {
    /// Fixed channel count, or `None` for a wildcard.
    #[inline]
    pub fn fixed(&self) -> Option<usize> {
        match self {
            ChannelCount::Fixed(n) => Some(*n),
            ChannelCount::Wildcard => None,
        }
    }

    /// Returns true for a wildcard count.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, ChannelCount::Wildcard)
    }

    /// Contribution of this bus to a fixed channel total (wildcards add 0).
    #[inline]
    pub fn fixed_or_zero(&self) -> usize {
        self.fixed().unwrap_or(0)
    }
}

impl std::fmt::Display for ChannelCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelCount::Fixed(n) => write!(f, "{n}"),
            ChannelCount::Wildcard => f.write_str("*"),
        }
    }
}

// Serialized in the same notation the I/O string uses: a number or "*".
impl Serialize for ChannelCount {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        match self {
            ChannelCount::Fixed(n) => serializer.serialize_u64(*n as u64),
            ChannelCount::Wildcard => serializer.serialize_str("*"),
        }
    }
}

/// Role of a bus within its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusType {
    /// Bus 0 of a direction.
    #[default]
    Main,
    /// Any bus after the first (side-chain, extra outputs).
    Aux,
}

/// A single bus within an [`IoConfig`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BusInfo {
    /// Channel count of the bus.
    pub channels: ChannelCount,
    /// Bus role, derived from its position.
    pub bus_type: BusType,
    /// Display label ("input" / "output" by default).
    pub label: String,
}

impl BusInfo {
    /// Create a bus with the default label for its direction.
    pub fn new(channels: ChannelCount, bus_type: BusType, direction: Direction) -> Self {
        Self {
            channels,
            bus_type,
            label: direction.as_str().to_string(),
        }
    }
}

/// One alternative legal I/O configuration.
///
/// Holds the ordered input and output buses declared by one token of the
/// channel-I/O string.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IoConfig {
    /// Input buses in declaration order.
    pub inputs: Vec<BusInfo>,
    /// Output buses in declaration order.
    pub outputs: Vec<BusInfo>,
}

impl IoConfig {
    /// Create an empty configuration. Buses are added with [`add_bus`](Self::add_bus).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bus in the given direction.
    ///
    /// The first bus of a direction becomes the main bus.
    pub fn add_bus(&mut self, direction: Direction, channels: ChannelCount) {
        let buses = self.buses_mut(direction);
        let bus_type = if buses.is_empty() {
            BusType::Main
        } else {
            BusType::Aux
        };
        buses.push(BusInfo::new(channels, bus_type, direction));
    }

    /// Buses of one direction.
    #[inline]
    pub fn buses(&self, direction: Direction) -> &[BusInfo] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    fn buses_mut(&mut self, direction: Direction) -> &mut Vec<BusInfo> {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }

    /// Number of buses in a direction.
    #[inline]
    pub fn bus_count(&self, direction: Direction) -> usize {
        self.buses(direction).len()
    }

    /// Get information about a bus.
    ///
    /// Returns `None` if the bus index is out of bounds.
    pub fn bus_info(&self, direction: Direction, bus: usize) -> Option<&BusInfo> {
        self.buses(direction).get(bus)
    }

    /// Fixed channel count of a bus, 0 when out of range or wildcard.
    pub fn channels_on_bus(&self, direction: Direction, bus: usize) -> usize {
        self.bus_info(direction, bus)
            .map(|b| b.channels.fixed_or_zero())
            .unwrap_or(0)
    }

    /// Total fixed channel count across all buses of a direction.
    ///
    /// Wildcard buses contribute nothing. Saturates instead of overflowing.
    pub fn total_channels(&self, direction: Direction) -> usize {
        self.buses(direction)
            .iter()
            .fold(0usize, |total, b| total.saturating_add(b.channels.fixed_or_zero()))
    }

    /// Returns true if any bus of the direction is a wildcard.
    pub fn contains_wildcard(&self, direction: Direction) -> bool {
        self.buses(direction).iter().any(|b| b.channels.is_wildcard())
    }

    /// Returns true if a total channel count `n` fits this direction.
    ///
    /// Without wildcards the count must match the fixed total exactly. With a
    /// wildcard bus, any count at least as large as the fixed total is accepted.
    pub fn accepts(&self, direction: Direction, n: usize) -> bool {
        let fixed = self.total_channels(direction);
        if self.contains_wildcard(direction) {
            n >= fixed
        } else {
            n == fixed
        }
    }

    /// Validate that this configuration doesn't exceed routing limits.
    ///
    /// Checks that:
    /// - At least one bus exists
    /// - Bus counts are within MAX_BUSES
    /// - Fixed channel counts are non-zero and the totals within MAX_CHANNELS
    ///
    /// Returns `Ok(())` if valid, or `Err` with a descriptive message.
    pub fn validate(&self) -> Result<(), String> {
        if self.inputs.is_empty() && self.outputs.is_empty() {
            return Err("I/O configuration declares no buses".to_string());
        }

        for direction in Direction::ALL {
            let count = self.bus_count(direction);
            if count > MAX_BUSES {
                return Err(format!(
                    "{} {} buses declared, but MAX_BUSES is {}",
                    count, direction, MAX_BUSES
                ));
            }

            for (i, bus) in self.buses(direction).iter().enumerate() {
                if bus.channels == ChannelCount::Fixed(0) {
                    return Err(format!("{} bus {} declares zero channels", direction, i));
                }
            }

            let total = self.total_channels(direction);
            if total > MAX_CHANNELS {
                return Err(format!(
                    "{} {} channels declared, but MAX_CHANNELS is {}",
                    total, direction, MAX_CHANNELS
                ));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for IoConfig {
    /// Formats the configuration back into I/O string notation, e.g. `1.1-1`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = |buses: &[BusInfo]| -> String {
            if buses.is_empty() {
                return "0".to_string();
            }
            buses
                .iter()
                .map(|b| b.channels.to_string())
                .collect::<Vec<_>>()
                .join(".")
        };
        write!(f, "{}-{}", side(&self.inputs), side(&self.outputs))
    }
}
