//! Channel-I/O string parsing.
//!
//! A channel-I/O string lists every legal wiring of a unit as space separated
//! tokens of the form `<inputs>-<outputs>`. Each side is a `.`-separated list
//! of bus channel counts, where an entry is a positive integer or `*`
//! (wildcard). A side written as `0` declares no buses on that side.
//!
//! | String | Meaning |
//! |--------|---------|
//! | `"1-1"` | mono in, mono out |
//! | `"1-1 2-2"` | mono or stereo |
//! | `"1.1-1"` | mono in with mono side-chain, mono out |
//! | `"0-2.2.2.2"` | generator with four stereo outputs |
//! | `"*-2"` | any input width, stereo out |
//!
//! Tokens are alternatives, so the aggregate counts are maxima per direction,
//! never sums.

use crate::bus_config::{ChannelCount, IoConfig};
use crate::error::ChannelIoError;
use crate::types::{Direction, MAX_CHANNELS};

/// Wildcard bus entry.
pub const WILDCARD: &str = "*";

/// Result of parsing a channel-I/O string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelIoSpec {
    /// One descriptor per token, in string order.
    pub configs: Vec<IoConfig>,
    /// Widest fixed input channel total of any token.
    pub max_total_in: usize,
    /// Widest fixed output channel total of any token.
    pub max_total_out: usize,
    /// Largest input bus count of any token.
    pub max_in_buses: usize,
    /// Largest output bus count of any token.
    pub max_out_buses: usize,
}

impl ChannelIoSpec {
    /// Number of tokens parsed.
    #[inline]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Returns true if no tokens were parsed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Widest fixed channel total for a direction.
    #[inline]
    pub fn max_total(&self, direction: Direction) -> usize {
        match direction {
            Direction::Input => self.max_total_in,
            Direction::Output => self.max_total_out,
        }
    }

    /// Largest bus count for a direction.
    #[inline]
    pub fn max_buses(&self, direction: Direction) -> usize {
        match direction {
            Direction::Input => self.max_in_buses,
            Direction::Output => self.max_out_buses,
        }
    }
}

/// Parse a channel-I/O string into its descriptors and aggregate counts.
///
/// # Errors
///
/// Fails on an empty string, a token without exactly one `-`, a bus entry that
/// is neither a positive integer nor `*`, a zero entry inside a multi-bus side,
/// a token with no buses, or a token exceeding routing limits.
pub fn parse_channel_io(io_str: &str) -> Result<ChannelIoSpec, ChannelIoError> {
    let mut spec = ChannelIoSpec::default();

    for token in io_str.split_whitespace() {
        let config = parse_token(token)?;

        spec.max_total_in = spec.max_total_in.max(config.total_channels(Direction::Input));
        spec.max_total_out = spec.max_total_out.max(config.total_channels(Direction::Output));
        spec.max_in_buses = spec.max_in_buses.max(config.bus_count(Direction::Input));
        spec.max_out_buses = spec.max_out_buses.max(config.bus_count(Direction::Output));
        spec.configs.push(config);
    }

    if spec.is_empty() {
        return Err(ChannelIoError::Empty);
    }

    Ok(spec)
}

fn parse_token(token: &str) -> Result<IoConfig, ChannelIoError> {
    let (inputs, outputs) = token
        .split_once('-')
        .filter(|(_, rest)| !rest.contains('-'))
        .ok_or_else(|| ChannelIoError::MissingSeparator(token.to_string()))?;

    let mut config = IoConfig::new();
    parse_side(token, inputs, Direction::Input, &mut config)?;
    parse_side(token, outputs, Direction::Output, &mut config)?;

    if config.bus_count(Direction::Input) == 0 && config.bus_count(Direction::Output) == 0 {
        return Err(ChannelIoError::NoBuses(token.to_string()));
    }

    config
        .validate()
        .map_err(|reason| ChannelIoError::LimitExceeded {
            token: token.to_string(),
            reason,
        })?;

    Ok(config)
}

fn parse_side(
    token: &str,
    side: &str,
    direction: Direction,
    config: &mut IoConfig,
) -> Result<(), ChannelIoError> {
    // A lone "0" is the way to spell "no buses on this side".
    if side == "0" {
        return Ok(());
    }

    for entry in side.split('.') {
        let channels = parse_entry(token, entry)?;
        config.add_bus(direction, channels);
    }

    Ok(())
}

fn parse_entry(token: &str, entry: &str) -> Result<ChannelCount, ChannelIoError> {
    if entry == WILDCARD {
        return Ok(ChannelCount::Wildcard);
    }

    let invalid = || ChannelIoError::InvalidBusEntry {
        token: token.to_string(),
        entry: entry.to_string(),
    };

    // usize::from_str accepts a leading '+', the grammar does not.
    if entry.is_empty() || !entry.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match entry.parse::<usize>() {
        Ok(0) => Err(ChannelIoError::ZeroChannelBus(token.to_string())),
        Ok(n) if n > MAX_CHANNELS => Err(ChannelIoError::LimitExceeded {
            token: token.to_string(),
            reason: format!("bus declares {} channels, but MAX_CHANNELS is {}", n, MAX_CHANNELS),
        }),
        Ok(n) => Ok(ChannelCount::Fixed(n)),
        // Digits only, so the sole failure left is overflow.
        Err(_) => Err(ChannelIoError::LimitExceeded {
            token: token.to_string(),
            reason: format!("bus entry {:?} is out of range", entry),
        }),
    }
}
