//! Channel registry.
//!
//! One [`ChannelData`] slot exists per physical channel per direction, sized
//! once from the topology's channel capacity. Slots carry the host-visible
//! label and the connection flag. Sample memory is never owned here; the
//! router binds it for the duration of a block.

use crate::types::Direction;

/// Per-channel state for one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelData {
    /// Host-visible label ("input 1", "output 2", ...).
    pub label: String,
    /// Whether the host has connected a buffer to this channel.
    pub connected: bool,
}

impl ChannelData {
    fn new(direction: Direction, index: usize) -> Self {
        Self {
            label: format!("{} {}", direction, index + 1),
            connected: false,
        }
    }
}

/// Connection state and labels for every input and output channel slot.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    inputs: Vec<ChannelData>,
    outputs: Vec<ChannelData>,
}

impl ChannelRegistry {
    /// Allocate `n_inputs` + `n_outputs` slots, all disconnected, with
    /// default labels.
    pub fn new(n_inputs: usize, n_outputs: usize) -> Self {
        Self {
            inputs: (0..n_inputs).map(|i| ChannelData::new(Direction::Input, i)).collect(),
            outputs: (0..n_outputs).map(|i| ChannelData::new(Direction::Output, i)).collect(),
        }
    }

    #[inline]
    fn slots(&self, direction: Direction) -> &[ChannelData] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    #[inline]
    fn slots_mut(&mut self, direction: Direction) -> &mut [ChannelData] {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }

    /// Number of channel slots in a direction.
    #[inline]
    pub fn n_channels(&self, direction: Direction) -> usize {
        self.slots(direction).len()
    }

    /// Get a channel slot.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    pub fn channel(&self, direction: Direction, index: usize) -> Option<&ChannelData> {
        self.slots(direction).get(index)
    }

    /// Mark channels `start..start + n` as connected or disconnected.
    ///
    /// A start index beyond the slot count is a caller error (debug assertion,
    /// ignored in release). A range running past the last slot is clamped and
    /// logged, since it means the host disagrees with the topology.
    pub fn set_connections(&mut self, direction: Direction, start: usize, n: usize, connected: bool) {
        let Some(range) = self.clamp_range(direction, start, n) else {
            return;
        };
        for slot in &mut self.slots_mut(direction)[range] {
            slot.connected = connected;
        }
    }

    /// Resolve `start..start + n` against the slot count of a direction.
    ///
    /// Shared by the registry and the router so both apply the same contract.
    pub(crate) fn clamp_range(
        &self,
        direction: Direction,
        start: usize,
        n: usize,
    ) -> Option<std::ops::Range<usize>> {
        let size = self.n_channels(direction);
        debug_assert!(
            start <= size,
            "{} channel start {} out of range ({} slots)",
            direction,
            start,
            size
        );
        if start > size {
            return None;
        }

        let end = start.saturating_add(n);
        if end > size {
            log::warn!(
                "Host addressed {} channels {}..{} but only {} exist; clamping",
                direction,
                start,
                end,
                size
            );
        }
        Some(start..end.min(size))
    }

    /// Returns true if the channel is connected. Out-of-range indices are
    /// reported as disconnected.
    #[inline]
    pub fn is_connected(&self, direction: Direction, index: usize) -> bool {
        self.channel(direction, index).map(|c| c.connected).unwrap_or(false)
    }

    /// Label of a channel, or `None` if the index is out of bounds.
    #[inline]
    pub fn label(&self, direction: Direction, index: usize) -> Option<&str> {
        self.channel(direction, index).map(|c| c.label.as_str())
    }

    /// Replace the label of a channel. Out-of-range indices are ignored.
    pub fn set_label(&mut self, direction: Direction, index: usize, label: impl Into<String>) {
        if let Some(slot) = self.slots_mut(direction).get_mut(index) {
            slot.label = label.into();
        }
    }

    /// Number of connected channels, counted as the run of connected slots
    /// starting at slot 0.
    ///
    /// Hosts connect channels contiguously from the first slot. A gap ends the
    /// count; use [`connections_contiguous`](Self::connections_contiguous) to
    /// detect hosts that break this.
    pub fn n_connected(&self, direction: Direction) -> usize {
        self.slots(direction)
            .iter()
            .take_while(|c| c.connected)
            .count()
    }

    /// Returns true if no connected slot follows a disconnected one.
    pub fn connections_contiguous(&self, direction: Direction) -> bool {
        let total = self.slots(direction).iter().filter(|c| c.connected).count();
        total == self.n_connected(direction)
    }

    /// Disconnect every slot at position 2 and above, in both directions.
    pub fn limit_to_stereo(&mut self) {
        for direction in Direction::ALL {
            let n = self.n_channels(direction);
            if n > 2 {
                self.set_connections(direction, 2, n - 2, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels_are_one_based() {
        let registry = ChannelRegistry::new(2, 3);
        assert_eq!(registry.label(Direction::Input, 0), Some("input 1"));
        assert_eq!(registry.label(Direction::Input, 1), Some("input 2"));
        assert_eq!(registry.label(Direction::Output, 2), Some("output 3"));
        assert_eq!(registry.label(Direction::Output, 3), None);
    }

    #[test]
    fn test_new_slots_start_disconnected() {
        let registry = ChannelRegistry::new(2, 2);
        assert_eq!(registry.n_connected(Direction::Input), 0);
        assert!(!registry.is_connected(Direction::Output, 0));
        assert!(!registry.is_connected(Direction::Output, 9));
    }

    #[test]
    fn test_set_connections_range() {
        let mut registry = ChannelRegistry::new(4, 2);
        registry.set_connections(Direction::Input, 0, 2, true);
        assert_eq!(registry.n_connected(Direction::Input), 2);
        assert!(registry.is_connected(Direction::Input, 1));
        assert!(!registry.is_connected(Direction::Input, 2));
        assert_eq!(registry.n_connected(Direction::Output), 0);
    }

    #[test]
    fn test_overflowing_range_is_clamped() {
        let mut registry = ChannelRegistry::new(2, 2);
        registry.set_connections(Direction::Output, 1, 8, true);
        assert!(registry.is_connected(Direction::Output, 1));
        assert_eq!(registry.n_channels(Direction::Output), 2);
    }

    #[test]
    fn test_n_connected_stops_at_gap() {
        let mut registry = ChannelRegistry::new(4, 0);
        registry.set_connections(Direction::Input, 0, 1, true);
        registry.set_connections(Direction::Input, 2, 2, true);
        assert_eq!(registry.n_connected(Direction::Input), 1);
        assert!(!registry.connections_contiguous(Direction::Input));

        registry.set_connections(Direction::Input, 1, 1, true);
        assert_eq!(registry.n_connected(Direction::Input), 4);
        assert!(registry.connections_contiguous(Direction::Input));
    }

    #[test]
    fn test_set_label() {
        let mut registry = ChannelRegistry::new(2, 0);
        registry.set_label(Direction::Input, 1, "Key L");
        assert_eq!(registry.label(Direction::Input, 1), Some("Key L"));
        registry.set_label(Direction::Input, 5, "ignored");
        assert_eq!(registry.n_channels(Direction::Input), 2);
    }

    #[test]
    fn test_limit_to_stereo() {
        let mut registry = ChannelRegistry::new(6, 4);
        registry.set_connections(Direction::Input, 0, 6, true);
        registry.set_connections(Direction::Output, 0, 4, true);
        registry.limit_to_stereo();
        assert_eq!(registry.n_connected(Direction::Input), 2);
        assert_eq!(registry.n_connected(Direction::Output), 2);
        assert!(!registry.is_connected(Direction::Input, 5));
    }
}
