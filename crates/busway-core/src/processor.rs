//! Processing capability and the buffer view handed to it.
//!
//! The router assembles a [`Buffer`] for every block, with each input and
//! output channel backed either by host memory or by scratch, so a
//! [`BlockProcessor`] always sees fully populated channels in the unit's
//! canonical sample type.
//!
//! # Example: Gain
//!
//! ```ignore
//! struct Gain(f64);
//!
//! impl BlockProcessor<f64> for Gain {
//!     fn process_block(&mut self, buffer: &mut Buffer<f64>, _context: &ProcessContext) {
//!         for (input, output) in buffer.zip_channels() {
//!             for (i, o) in input.iter().zip(output.iter_mut()) {
//!                 *o = *i * self.0;
//!             }
//!         }
//!     }
//! }
//! ```

use crate::sample::Sample;
use crate::session::ProcessContext;
use crate::types::MAX_CHANNELS;

// =============================================================================
// Buffer
// =============================================================================

/// Input and output channel slices for one block.
///
/// Uses fixed-size storage; building and using it never allocates.
pub struct Buffer<'a, S: Sample> {
    inputs: [Option<&'a [S]>; MAX_CHANNELS],
    outputs: [Option<&'a mut [S]>; MAX_CHANNELS],
    n_inputs: usize,
    n_outputs: usize,
    n_frames: usize,
}

impl<'a, S: Sample> Buffer<'a, S> {
    /// Create a buffer from channel slices.
    ///
    /// Channels beyond [`MAX_CHANNELS`] are ignored. Every slice must hold at
    /// least `n_frames` samples.
    pub fn new(
        inputs: impl IntoIterator<Item = &'a [S]>,
        outputs: impl IntoIterator<Item = &'a mut [S]>,
        n_frames: usize,
    ) -> Self {
        let mut input_arr: [Option<&'a [S]>; MAX_CHANNELS] = [None; MAX_CHANNELS];
        let mut n_inputs = 0;
        for (i, slice) in inputs.into_iter().take(MAX_CHANNELS).enumerate() {
            debug_assert!(slice.len() >= n_frames);
            input_arr[i] = Some(slice);
            n_inputs = i + 1;
        }

        // &mut slices aren't Copy, so no [None; N] here
        let mut output_arr: [Option<&'a mut [S]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut n_outputs = 0;
        for (i, slice) in outputs.into_iter().take(MAX_CHANNELS).enumerate() {
            debug_assert!(slice.len() >= n_frames);
            output_arr[i] = Some(slice);
            n_outputs = i + 1;
        }

        Self {
            inputs: input_arr,
            outputs: output_arr,
            n_inputs,
            n_outputs,
            n_frames,
        }
    }

    /// Frames in this block.
    #[inline]
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Number of input channels.
    #[inline]
    pub fn n_input_channels(&self) -> usize {
        self.n_inputs
    }

    /// Number of output channels.
    #[inline]
    pub fn n_output_channels(&self) -> usize {
        self.n_outputs
    }

    /// Get an input channel, or an empty slice if it doesn't exist.
    #[inline]
    pub fn input(&self, channel: usize) -> &[S] {
        self.inputs
            .get(channel)
            .and_then(|opt| opt.as_ref())
            .map(|ch| &ch[..self.n_frames])
            .unwrap_or(&[])
    }

    /// Get a mutable output channel.
    ///
    /// Returns `None` if the channel doesn't exist.
    #[inline]
    pub fn output(&mut self, channel: usize) -> Option<&mut [S]> {
        let n = self.n_frames;
        self.outputs
            .get_mut(channel)
            .and_then(|opt| opt.as_mut())
            .map(|ch| &mut ch[..n])
    }

    /// Iterate over input channels.
    pub fn inputs(&self) -> impl Iterator<Item = &[S]> + '_ {
        let n = self.n_frames;
        self.inputs[..self.n_inputs]
            .iter()
            .filter_map(move |opt| opt.as_ref().map(|ch| &ch[..n]))
    }

    /// Iterate over output channels mutably.
    pub fn outputs_mut(&mut self) -> impl Iterator<Item = &mut [S]> + use<'_, 'a, S> {
        let n = self.n_frames;
        self.outputs[..self.n_outputs]
            .iter_mut()
            .filter_map(move |opt| opt.as_mut().map(|ch| &mut ch[..n]))
    }

    /// Iterate over (input, output) pairs for channels present on both sides.
    pub fn zip_channels(&mut self) -> impl Iterator<Item = (&[S], &mut [S])> + use<'_, 'a, S> {
        let n = self.n_frames;
        let pairs = self.n_inputs.min(self.n_outputs);
        self.inputs[..pairs]
            .iter()
            .zip(self.outputs[..pairs].iter_mut())
            .filter_map(move |(i_opt, o_opt)| match (i_opt.as_ref(), o_opt.as_mut()) {
                (Some(i), Some(o)) => Some((&i[..n], &mut o[..n])),
                _ => None,
            })
    }

    /// Copy paired inputs to outputs and silence outputs without an input.
    pub fn copy_to_output(&mut self) {
        let pairs = self.n_inputs.min(self.n_outputs);
        for (input, output) in self.zip_channels() {
            output.copy_from_slice(input);
        }
        for output in self.outputs_mut().skip(pairs) {
            output.fill(S::ZERO);
        }
    }

    /// Silence every output channel.
    pub fn clear_outputs(&mut self) {
        for output in self.outputs_mut() {
            output.fill(S::ZERO);
        }
    }
}

// =============================================================================
// BlockProcessor
// =============================================================================

/// User processing routine.
///
/// Every hook has a default, so an empty `impl` is a valid unity-gain
/// processor.
pub trait BlockProcessor<S: Sample> {
    /// Process one block.
    ///
    /// The default copies paired inputs to outputs and silences the rest.
    fn process_block(&mut self, buffer: &mut Buffer<'_, S>, _context: &ProcessContext) {
        buffer.copy_to_output();
    }

    /// Clear internal state (delay lines, envelopes). Called between blocks.
    fn on_reset(&mut self, _context: &ProcessContext) {}

    /// Called when the host activates or deactivates processing.
    fn on_activate(&mut self, _active: bool) {}
}

/// Processor that keeps every default: inputs straight to outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl<S: Sample> BlockProcessor<S> for Passthrough {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;

    struct Gain(f32);

    impl BlockProcessor<f32> for Gain {
        fn process_block(&mut self, buffer: &mut Buffer<'_, f32>, _context: &ProcessContext) {
            let gain = self.0;
            for (input, output) in buffer.zip_channels() {
                for (i, o) in input.iter().zip(output.iter_mut()) {
                    *o = *i * gain;
                }
            }
        }
    }

    fn context(n_frames: usize) -> ProcessContext {
        ProcessContext::new(SessionConfig::default(), n_frames)
    }

    #[test]
    fn test_buffer_channel_counts() {
        let a = [1.0f32; 4];
        let mut x = [0.0f32; 4];
        let mut y = [0.0f32; 4];
        let buffer = Buffer::new([&a[..]], [&mut x[..], &mut y[..]], 4);
        assert_eq!(buffer.n_input_channels(), 1);
        assert_eq!(buffer.n_output_channels(), 2);
        assert_eq!(buffer.n_frames(), 4);
        assert!(buffer.input(3).is_empty());
    }

    #[test]
    fn test_default_process_copies_and_silences() {
        let a = [0.5f32; 3];
        let mut x = [0.0f32; 3];
        let mut y = [9.0f32; 3];
        {
            let mut buffer = Buffer::new([&a[..]], [&mut x[..], &mut y[..]], 3);
            Passthrough.process_block(&mut buffer, &context(3));
        }
        assert_eq!(x, [0.5; 3]);
        assert_eq!(y, [0.0; 3]);
    }

    #[test]
    fn test_custom_processor() {
        let a = [1.0f32, 2.0];
        let mut x = [0.0f32; 2];
        {
            let mut buffer = Buffer::new([&a[..]], [&mut x[..]], 2);
            Gain(0.5).process_block(&mut buffer, &context(2));
        }
        assert_eq!(x, [0.5, 1.0]);
    }

    #[test]
    fn test_view_is_limited_to_n_frames() {
        let a = [1.0f32; 8];
        let mut x = [0.0f32; 8];
        {
            let mut buffer = Buffer::new([&a[..]], [&mut x[..]], 5);
            assert_eq!(buffer.input(0).len(), 5);
            assert_eq!(buffer.output(0).map(|o| o.len()), Some(5));
            buffer.copy_to_output();
        }
        assert_eq!(x, [1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
    }
}
