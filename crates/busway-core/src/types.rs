//! Common types and limits used throughout busway.

// =============================================================================
// Routing Limits
// =============================================================================
//
// These constants bound the per-direction channel slot storage and the number
// of buses a channel-I/O string may declare. `Buffer` uses fixed-size arrays
// of `MAX_CHANNELS` entries, so no allocation happens while a block is in
// flight.
//
// - 32 channels: 22.2 surround and Dolby Atmos 9.1.6 with headroom
// - 16 buses: main + sidechain + 14 aux (multi-out instruments)
//
// A channel-I/O string that exceeds either limit is rejected at parse time.
// =============================================================================

/// Maximum number of channel slots per direction.
///
/// Also the slot count reserved for a direction that contains a wildcard bus,
/// since a wildcard bus accepts any channel count the host offers.
pub const MAX_CHANNELS: usize = 32;

/// Maximum number of buses per direction in a single I/O configuration.
pub const MAX_BUSES: usize = 16;

/// Sentinel accepted by [`Topology::legal_io`](crate::Topology::legal_io) to
/// skip checking one direction.
pub const UNCHECKED: i32 = -1;

/// Signal flow direction of a bus or channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Audio flowing from the host into the unit.
    Input,
    /// Audio flowing from the unit back to the host.
    Output,
}

impl Direction {
    /// Both directions, inputs first.
    pub const ALL: [Direction; 2] = [Direction::Input, Direction::Output];

    /// Lowercase name used in default labels and log messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
