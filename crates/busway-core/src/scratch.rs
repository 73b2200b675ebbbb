//! Pre-allocated per-channel scratch buffers.
//!
//! The router needs somewhere to put samples when a host buffer can't be
//! handed to the processor directly: foreign-format channels, disconnected
//! channels, and outputs that are summed into the host buffer. Each channel
//! slot owns one scratch buffer of `block_size` samples.
//!
//! # Real-Time Safety
//!
//! - All buffers are allocated in [`ScratchBuffers::new`] and [`ScratchBuffers::resize`]
//! - No heap allocations occur during audio processing
//! - Buffer access is O(1)

use crate::sample::Sample;
use crate::types::Direction;

/// Scratch storage for every channel slot: `[channel][samples]` per direction.
#[derive(Debug, Clone, Default)]
pub struct ScratchBuffers<S: Sample> {
    inputs: Vec<Vec<S>>,
    outputs: Vec<Vec<S>>,
    block_size: usize,
}

impl<S: Sample> ScratchBuffers<S> {
    /// Allocate zeroed scratch for `n_inputs` + `n_outputs` channels.
    pub fn new(n_inputs: usize, n_outputs: usize, block_size: usize) -> Self {
        Self {
            inputs: (0..n_inputs).map(|_| vec![S::ZERO; block_size]).collect(),
            outputs: (0..n_outputs).map(|_| vec![S::ZERO; block_size]).collect(),
            block_size,
        }
    }

    /// Samples per channel buffer.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of channel buffers in a direction.
    #[inline]
    pub fn n_channels(&self, direction: Direction) -> usize {
        self.buffers(direction).len()
    }

    #[inline]
    fn buffers(&self, direction: Direction) -> &[Vec<S>] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        }
    }

    #[inline]
    fn buffers_mut(&mut self, direction: Direction) -> &mut [Vec<S>] {
        match direction {
            Direction::Input => &mut self.inputs,
            Direction::Output => &mut self.outputs,
        }
    }

    /// Resize every buffer to `block_size` samples and clear it.
    ///
    /// Allocates. Call only between blocks.
    pub fn resize(&mut self, block_size: usize) {
        for buf in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            buf.clear();
            buf.resize(block_size, S::ZERO);
        }
        self.block_size = block_size;
    }

    /// Fill every buffer with silence.
    pub fn zero(&mut self) {
        for buf in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            buf.fill(S::ZERO);
        }
    }

    /// Get a channel buffer.
    ///
    /// Returns `None` if the channel index is out of bounds.
    #[inline]
    pub fn channel(&self, direction: Direction, index: usize) -> Option<&[S]> {
        self.buffers(direction).get(index).map(|v| v.as_slice())
    }

    /// Get a mutable channel buffer.
    #[inline]
    pub fn channel_mut(&mut self, direction: Direction, index: usize) -> Option<&mut [S]> {
        self.buffers_mut(direction)
            .get_mut(index)
            .map(|v| v.as_mut_slice())
    }
}
