//! Block-lifetime buffer routing.
//!
//! [`BufferRouter`] binds the host's per-block channel pointers to the unit's
//! channel slots, runs the processor (or the bypass delay line) over them, and
//! writes the results back to the host.
//!
//! # Binding rules
//!
//! | Slot | Bound to |
//! |------|----------|
//! | connected, host format == `S` | host memory, directly |
//! | connected, host format != `S` | scratch, converted on the way in/out |
//! | output in [`OutputMode::Accumulate`] | scratch, summed into host memory |
//! | disconnected or null pointer | scratch, zero-filled at attach |
//!
//! # Block sequence
//!
//! ```ignore
//! unsafe {
//!     router.attach_input_buffers(0, n_in, &host_inputs, n_frames);
//!     router.attach_output_buffers(0, n_out, &host_outputs);
//!     router.process_buffers::<f32, _>(&mut processor, &context, n_frames);
//! }
//! router.detach();
//! ```
//!
//! # Real-Time Safety
//!
//! Bindings and scratch are allocated in [`BufferRouter::new`] and
//! [`BufferRouter::set_block_size`]. Attaching, processing and detaching
//! never allocate.

use std::ptr::{self, NonNull};
use std::slice;

use crate::channel::ChannelRegistry;
use crate::latency_delay::LatencyDelay;
use crate::processor::{BlockProcessor, Buffer};
use crate::sample::{accumulate_slice, convert_slice, Sample, SampleFormat};
use crate::scratch::ScratchBuffers;
use crate::session::ProcessContext;
use crate::types::{Direction, MAX_CHANNELS};

/// How processed output reaches host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Output overwrites the host buffer.
    #[default]
    Replace,
    /// Output is added to whatever the host buffer already holds.
    Accumulate,
}

/// Where a channel slot reads or writes for the current block.
#[derive(Debug, Clone, Copy)]
struct Binding<S> {
    /// Memory the processor sees. Null when unbound.
    data: *mut S,
    /// Host memory to write back to after processing, with its format.
    host: Option<(NonNull<()>, SampleFormat)>,
}

impl<S> Binding<S> {
    const UNBOUND: Self = Self {
        data: ptr::null_mut(),
        host: None,
    };

    #[inline]
    fn direct(data: *mut S) -> Self {
        Self { data, host: None }
    }
}

/// Routes host buffers into and out of the unit's channel slots.
///
/// `S` is the canonical sample type the processor runs in.
pub struct BufferRouter<S: Sample> {
    channels: ChannelRegistry,
    scratch: ScratchBuffers<S>,
    delay: LatencyDelay<S>,
    inputs: Vec<Binding<S>>,
    outputs: Vec<Binding<S>>,
    output_mode: OutputMode,
    block_size: usize,
    /// Frame count given to the last input attach.
    attached_frames: usize,
}

impl<S: Sample> BufferRouter<S> {
    /// Allocate slots, scratch and delay rings for the given channel counts.
    pub fn new(n_inputs: usize, n_outputs: usize, block_size: usize) -> Self {
        let n_inputs = n_inputs.min(MAX_CHANNELS);
        let n_outputs = n_outputs.min(MAX_CHANNELS);
        Self {
            channels: ChannelRegistry::new(n_inputs, n_outputs),
            scratch: ScratchBuffers::new(n_inputs, n_outputs, block_size),
            delay: LatencyDelay::new(n_inputs, n_outputs),
            inputs: vec![Binding::UNBOUND; n_inputs],
            outputs: vec![Binding::UNBOUND; n_outputs],
            output_mode: OutputMode::default(),
            block_size,
            attached_frames: 0,
        }
    }

    // =========================================================================
    // Configuration (between blocks)
    // =========================================================================

    /// Channel labels and connection state.
    #[inline]
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Mutable channel labels and connection state.
    #[inline]
    pub fn channels_mut(&mut self) -> &mut ChannelRegistry {
        &mut self.channels
    }

    /// Maximum frames per block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Resize scratch storage. Drops any live bindings.
    pub fn set_block_size(&mut self, block_size: usize) {
        self.detach();
        self.scratch.resize(block_size);
        self.block_size = block_size;
    }

    /// Current output mode.
    #[inline]
    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Choose how outputs reach the host. Takes effect at the next attach.
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    /// Bypass delay in samples.
    #[inline]
    pub fn latency(&self) -> usize {
        self.delay.delay()
    }

    /// Resize the bypass delay line, discarding its contents.
    pub fn set_latency(&mut self, samples: usize) {
        self.delay.set_delay(samples);
    }

    /// Silence the bypass delay line.
    pub fn reset_delay(&mut self) {
        self.delay.reset();
    }

    /// Fill every scratch buffer with silence.
    pub fn zero_scratch_buffers(&mut self) {
        self.scratch.zero();
    }

    /// Returns true if the slot is bound for the current block.
    pub fn is_attached(&self, direction: Direction, index: usize) -> bool {
        let bindings = match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        };
        bindings.get(index).is_some_and(|b| !b.data.is_null())
    }

    // =========================================================================
    // Block path
    // =========================================================================

    /// Bind host input channels `start..start + n` for this block.
    ///
    /// `host[i]` feeds slot `start + i`. Missing or null entries, and slots
    /// the host has not connected, read silence.
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `host` must be valid for `n_frames` reads
    /// until [`detach`](Self::detach), and must not overlap an output buffer
    /// other than by being the exact same pointer.
    pub unsafe fn attach_input_buffers<T: Sample>(
        &mut self,
        start: usize,
        n: usize,
        host: &[*const T],
        n_frames: usize,
    ) {
        let n_frames = self.clamp_frames(n_frames);
        self.attached_frames = n_frames;

        let Some(range) = self.channels.clamp_range(Direction::Input, start, n) else {
            return;
        };

        for (i, idx) in range.enumerate() {
            let host_ptr = host.get(i).copied().unwrap_or(ptr::null());
            if host_ptr.is_null() || !self.channels.is_connected(Direction::Input, idx) {
                self.inputs[idx] = Binding::direct(self.silent_scratch(Direction::Input, idx));
                continue;
            }

            let native = T::cast_ptr::<S>(host_ptr.cast_mut());
            self.inputs[idx] = match native {
                Some(native) if !self.bound_as_output(native) => Binding::direct(native),
                _ => {
                    // SAFETY: the caller guarantees `host_ptr` is valid for
                    // `n_frames` reads.
                    let src = unsafe { slice::from_raw_parts(host_ptr, n_frames) };
                    Binding::direct(self.fill_scratch(Direction::Input, idx, src))
                }
            };
        }
    }

    /// Bind host output channels `start..start + n` for this block.
    ///
    /// # Safety
    ///
    /// Every non-null pointer in `host` must be valid for reads and writes of
    /// the block's frame count until [`detach`](Self::detach), and must not
    /// overlap another bound buffer other than by being the exact same pointer
    /// as an input. In [`OutputMode::Accumulate`] several outputs may also
    /// share one pointer; their contributions are summed.
    pub unsafe fn attach_output_buffers<T: Sample>(
        &mut self,
        start: usize,
        n: usize,
        host: &[*mut T],
    ) {
        let Some(range) = self.channels.clamp_range(Direction::Output, start, n) else {
            return;
        };

        for (i, idx) in range.enumerate() {
            let host_ptr = host.get(i).copied().unwrap_or(ptr::null_mut());
            let Some(host_nn) = NonNull::new(host_ptr.cast::<()>()) else {
                self.outputs[idx] = Binding::direct(self.silent_scratch(Direction::Output, idx));
                continue;
            };
            if !self.channels.is_connected(Direction::Output, idx) {
                self.outputs[idx] = Binding::direct(self.silent_scratch(Direction::Output, idx));
                continue;
            }

            let native = T::cast_ptr::<S>(host_ptr);
            self.outputs[idx] = match (self.output_mode, native) {
                (OutputMode::Replace, Some(native)) => {
                    // SAFETY: forwarded from this function's contract.
                    unsafe { self.unalias_inputs(native) };
                    Binding::direct(native)
                }
                _ => Binding {
                    data: self.silent_scratch(Direction::Output, idx),
                    host: Some((host_nn, T::FORMAT)),
                },
            };
        }
    }

    /// Run the processor over the bound buffers, then write foreign-format
    /// outputs back to the host.
    ///
    /// The dry inputs are also pushed into the bypass delay line, so a later
    /// switch to bypass continues from this block's audio.
    ///
    /// # Safety
    ///
    /// Must follow the attach calls of the same block, with `T` matching the
    /// type those calls were given and the attached pointers still valid.
    pub unsafe fn process_buffers<T: Sample, P: BlockProcessor<S> + ?Sized>(
        &mut self,
        processor: &mut P,
        context: &ProcessContext,
        n_frames: usize,
    ) {
        let n_frames = self.clamp_frames(n_frames);
        self.bind_unattached();
        // SAFETY: forwarded from this function's contract.
        unsafe { self.feed_delay(n_frames) };
        {
            // SAFETY: forwarded from this function's contract.
            let mut buffer = unsafe { self.buffer(n_frames) };
            processor.process_block(&mut buffer, context);
        }
        // SAFETY: forwarded from this function's contract.
        unsafe { self.flush_outputs::<T>(n_frames, false) };
    }

    /// Like [`process_buffers`](Self::process_buffers), but adds the output
    /// into host memory instead of overwriting it.
    ///
    /// Outputs must have been attached in [`OutputMode::Accumulate`].
    ///
    /// # Safety
    ///
    /// Same contract as [`process_buffers`](Self::process_buffers).
    pub unsafe fn process_buffers_accumulating<T: Sample, P: BlockProcessor<S> + ?Sized>(
        &mut self,
        processor: &mut P,
        context: &ProcessContext,
        n_frames: usize,
    ) {
        debug_assert_eq!(
            self.output_mode,
            OutputMode::Accumulate,
            "accumulating outputs that were attached in replace mode"
        );
        let n_frames = self.clamp_frames(n_frames);
        self.bind_unattached();
        // SAFETY: forwarded from this function's contract.
        unsafe { self.feed_delay(n_frames) };
        {
            // SAFETY: forwarded from this function's contract.
            let mut buffer = unsafe { self.buffer(n_frames) };
            processor.process_block(&mut buffer, context);
        }
        // SAFETY: forwarded from this function's contract.
        unsafe { self.flush_outputs::<T>(n_frames, true) };
    }

    /// Bypass path: feed inputs through the latency delay line into the
    /// outputs. The processor is not involved.
    ///
    /// With zero latency, `min(inputs, outputs)` channels are copied straight
    /// through. Surplus outputs are silenced.
    ///
    /// # Safety
    ///
    /// Same contract as [`process_buffers`](Self::process_buffers).
    pub unsafe fn pass_through_buffers<T: Sample>(&mut self, n_frames: usize) {
        let n_frames = self.clamp_frames(n_frames);
        self.bind_unattached();

        let mut inputs: [&[S]; MAX_CHANNELS] = [<&[S]>::default(); MAX_CHANNELS];
        let mut outputs: [&mut [S]; MAX_CHANNELS] = std::array::from_fn(|_| Default::default());
        for (slot, binding) in inputs.iter_mut().zip(&self.inputs) {
            // SAFETY: every binding is non-null after `bind_unattached` and
            // points at scratch or host memory valid for `n_frames`.
            *slot = unsafe { slice::from_raw_parts(binding.data.cast_const(), n_frames) };
        }
        for (slot, binding) in outputs.iter_mut().zip(&self.outputs) {
            // SAFETY: as above; output memory is disjoint from input memory.
            *slot = unsafe { slice::from_raw_parts_mut(binding.data, n_frames) };
        }

        self.delay.process_block(
            &inputs[..self.inputs.len()],
            &mut outputs[..self.outputs.len()],
            n_frames,
        );

        let accumulate = self.output_mode == OutputMode::Accumulate;
        // SAFETY: forwarded from this function's contract.
        unsafe { self.flush_outputs::<T>(n_frames, accumulate) };
    }

    /// Drop every binding. Connection state and labels are untouched.
    pub fn detach(&mut self) {
        self.inputs.fill(Binding::UNBOUND);
        self.outputs.fill(Binding::UNBOUND);
        self.attached_frames = 0;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn clamp_frames(&self, n_frames: usize) -> usize {
        debug_assert!(
            n_frames <= self.block_size,
            "{} frames exceed block size {}",
            n_frames,
            self.block_size
        );
        n_frames.min(self.block_size)
    }

    /// Zero a slot's scratch and return a pointer to it.
    fn silent_scratch(&mut self, direction: Direction, index: usize) -> *mut S {
        match self.scratch.channel_mut(direction, index) {
            Some(buf) => {
                buf.fill(S::ZERO);
                buf.as_mut_ptr()
            }
            None => ptr::null_mut(),
        }
    }

    /// Convert `src` into a slot's scratch and return a pointer to it.
    fn fill_scratch<T: Sample>(&mut self, direction: Direction, index: usize, src: &[T]) -> *mut S {
        match self.scratch.channel_mut(direction, index) {
            Some(buf) => {
                convert_slice(src, buf);
                buf.as_mut_ptr()
            }
            None => ptr::null_mut(),
        }
    }

    fn bound_as_output(&self, data: *mut S) -> bool {
        self.outputs.iter().any(|b| b.data == data)
    }

    /// Move inputs that share memory with an output onto their scratch, so
    /// the processor never sees the same samples as both `&` and `&mut`.
    ///
    /// # Safety
    ///
    /// `output` must be valid for `attached_frames` reads.
    unsafe fn unalias_inputs(&mut self, output: *mut S) {
        let n_frames = self.attached_frames;
        for idx in 0..self.inputs.len() {
            if self.inputs[idx].data == output {
                // SAFETY: the caller guarantees `output` is readable for
                // `n_frames`; scratch never overlaps host memory.
                let src = unsafe { slice::from_raw_parts(output.cast_const(), n_frames) };
                self.inputs[idx] = Binding::direct(self.fill_scratch(Direction::Input, idx, src));
            }
        }
    }

    /// Bind every slot that was not attached this block to silent scratch.
    fn bind_unattached(&mut self) {
        for direction in Direction::ALL {
            let n = match direction {
                Direction::Input => self.inputs.len(),
                Direction::Output => self.outputs.len(),
            };
            for idx in 0..n {
                if !self.is_attached(direction, idx) {
                    let data = self.silent_scratch(direction, idx);
                    match direction {
                        Direction::Input => self.inputs[idx] = Binding::direct(data),
                        Direction::Output => self.outputs[idx] = Binding::direct(data),
                    }
                }
            }
        }
    }

    /// Push the bound inputs into the bypass delay line.
    ///
    /// # Safety
    ///
    /// Every input binding must be non-null and valid for `n_frames` reads.
    unsafe fn feed_delay(&mut self, n_frames: usize) {
        if self.delay.delay() == 0 {
            return;
        }

        let mut inputs: [&[S]; MAX_CHANNELS] = [<&[S]>::default(); MAX_CHANNELS];
        for (slot, binding) in inputs.iter_mut().zip(&self.inputs) {
            // SAFETY: guaranteed by the caller.
            *slot = unsafe { slice::from_raw_parts(binding.data.cast_const(), n_frames) };
        }
        self.delay.write_block(&inputs[..self.inputs.len()], n_frames);
    }

    /// Build the processor's view over the current bindings.
    ///
    /// # Safety
    ///
    /// Every binding must be non-null and valid for `n_frames`, with no
    /// output overlapping any other bound buffer.
    unsafe fn buffer(&mut self, n_frames: usize) -> Buffer<'_, S> {
        let inputs = self.inputs.iter().map(move |b| {
            // SAFETY: guaranteed by the caller.
            unsafe { slice::from_raw_parts(b.data.cast_const(), n_frames) }
        });
        let outputs = self.outputs.iter().map(move |b| {
            // SAFETY: guaranteed by the caller.
            unsafe { slice::from_raw_parts_mut(b.data, n_frames) }
        });
        Buffer::new(inputs, outputs, n_frames)
    }

    /// Write scratch-bound outputs back into their host buffers.
    ///
    /// # Safety
    ///
    /// Host pointers recorded at attach must still be valid for `n_frames`.
    unsafe fn flush_outputs<T: Sample>(&mut self, n_frames: usize, accumulate: bool) {
        for binding in &self.outputs {
            let Some((host, format)) = binding.host else {
                continue;
            };
            debug_assert_eq!(format, T::FORMAT, "outputs flushed as a different sample type");
            if format != T::FORMAT {
                continue;
            }

            // SAFETY: scratch holds at least `n_frames` samples.
            let src = unsafe { slice::from_raw_parts(binding.data.cast_const(), n_frames) };
            // SAFETY: `host` was attached as a `*mut T` (format checked above)
            // and the caller guarantees it is still valid.
            let dst = unsafe { slice::from_raw_parts_mut(host.as_ptr().cast::<T>(), n_frames) };
            if accumulate {
                accumulate_slice(src, dst);
            } else {
                convert_slice(src, dst);
            }
        }
    }
}

// SAFETY: The raw pointers are only dereferenced between attach and detach
// within a single block, where the host guarantees single-threaded access.
unsafe impl<S: Sample> Send for BufferRouter<S> {}
