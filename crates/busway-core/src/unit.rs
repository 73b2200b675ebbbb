//! Host-facing processing unit.
//!
//! [`ProcessingUnit`] ties the topology, the channel registry, the buffer
//! router and the session snapshot together. A host integration layer holds
//! one per plugin instance, forwards session changes to it between blocks,
//! and calls [`process_block`](ProcessingUnit::process_block) once per block.

use crate::bus_config::{ChannelCount, IoConfig};
use crate::config::UnitConfig;
use crate::error::UnitResult;
use crate::processor::BlockProcessor;
use crate::router::{BufferRouter, OutputMode};
use crate::sample::Sample;
use crate::session::{ProcessContext, SessionConfig, TimeInfo};
use crate::topology::Topology;
use crate::types::Direction;

/// Channel routing and session state for one unit, in canonical sample type `S`.
pub struct ProcessingUnit<S: Sample> {
    name: String,
    topology: Topology,
    router: BufferRouter<S>,
    session: SessionConfig,
}

impl<S: Sample> ProcessingUnit<S> {
    /// Build a unit from its configuration.
    ///
    /// Parses the channel-I/O string and allocates one channel slot per
    /// channel the topology can carry, plus scratch and delay storage.
    pub fn new(config: &UnitConfig) -> UnitResult<Self> {
        let topology = config.validate().inspect_err(|err| {
            log::error!("Unit '{}' rejected: {}", config.name, err);
        })?;

        let n_inputs = topology.channel_capacity(Direction::Input);
        let n_outputs = topology.channel_capacity(Direction::Output);
        let mut router = BufferRouter::new(n_inputs, n_outputs, config.max_block_size);
        router.set_latency(config.latency);

        let session = SessionConfig {
            sample_rate: config.sample_rate,
            block_size: config.max_block_size,
            latency: config.latency,
            tail_size: config.tail_size,
            ..SessionConfig::default()
        };

        log::debug!(
            "Unit '{}': {} I/O configurations, {} input / {} output channel slots",
            config.name,
            topology.n_io_configs(),
            n_inputs,
            n_outputs
        );

        Ok(Self {
            name: config.name.clone(),
            topology,
            router,
            session,
        })
    }

    /// Display name from the configuration.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed topology.
    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Snapshot of the current session.
    #[inline]
    pub fn session(&self) -> SessionConfig {
        self.session
    }

    /// Direct access to the router, for hosts that attach bus by bus.
    #[inline]
    pub fn router_mut(&mut self) -> &mut BufferRouter<S> {
        &mut self.router
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.session.sample_rate
    }

    /// Change the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.session.update(|s| s.sample_rate = sample_rate);
    }

    /// Maximum frames per block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.session.block_size
    }

    /// Change the maximum block size. Reallocates scratch storage.
    pub fn set_block_size(&mut self, block_size: usize) {
        if block_size == self.session.block_size {
            return;
        }
        log::debug!(
            "Unit '{}': block size {} -> {}",
            self.name,
            self.session.block_size,
            block_size
        );
        self.router.set_block_size(block_size);
        self.session.update(|s| s.block_size = block_size);
    }

    /// Reported latency in samples.
    #[inline]
    pub fn latency(&self) -> usize {
        self.session.latency
    }

    /// Change the reported latency. Resizes and clears the bypass delay line.
    pub fn set_latency(&mut self, samples: usize) {
        log::debug!(
            "Unit '{}': latency {} -> {} samples",
            self.name,
            self.session.latency,
            samples
        );
        self.router.set_latency(samples);
        self.session.update(|s| s.latency = samples);
    }

    /// Reported tail length in samples.
    #[inline]
    pub fn tail_size(&self) -> usize {
        self.session.tail_size
    }

    /// Change the reported tail length.
    pub fn set_tail_size(&mut self, samples: usize) {
        self.session.update(|s| s.tail_size = samples);
    }

    /// Returns true while blocks bypass the processor.
    #[inline]
    pub fn is_bypassed(&self) -> bool {
        self.session.bypassed
    }

    /// Route blocks through the latency-compensated passthrough instead of
    /// the processor.
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.session.update(|s| s.bypassed = bypassed);
    }

    /// Returns true while the host renders faster than real time.
    #[inline]
    pub fn is_rendering_offline(&self) -> bool {
        self.session.rendering_offline
    }

    /// Record whether the host is rendering offline.
    pub fn set_rendering_offline(&mut self, offline: bool) {
        self.session.update(|s| s.rendering_offline = offline);
    }

    /// Store the host's transport info for the next block.
    pub fn set_time_info(&mut self, time_info: TimeInfo) {
        self.session.update(|s| s.time_info = time_info);
    }

    /// Choose whether outputs replace or add to host memory.
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.router.set_output_mode(mode);
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Number of channel slots in a direction.
    #[inline]
    pub fn n_channels(&self, direction: Direction) -> usize {
        self.router.channels().n_channels(direction)
    }

    /// Number of connected channels (leading run from channel 0).
    #[inline]
    pub fn n_connected(&self, direction: Direction) -> usize {
        self.router.channels().n_connected(direction)
    }

    /// Returns true if the host has connected the channel.
    #[inline]
    pub fn is_channel_connected(&self, direction: Direction, index: usize) -> bool {
        self.router.channels().is_connected(direction, index)
    }

    /// Record which channels the host has connected.
    pub fn set_channel_connections(
        &mut self,
        direction: Direction,
        start: usize,
        n: usize,
        connected: bool,
    ) {
        self.router
            .channels_mut()
            .set_connections(direction, start, n, connected);
        if !self.router.channels().connections_contiguous(direction) {
            log::warn!(
                "Unit '{}': {} connections are not contiguous from channel 0",
                self.name,
                direction
            );
        }
    }

    /// Disconnect every channel above the first two in both directions.
    pub fn limit_to_stereo(&mut self) {
        self.router.channels_mut().limit_to_stereo();
    }

    /// Label of a channel, or `None` out of range.
    #[inline]
    pub fn channel_label(&self, direction: Direction, index: usize) -> Option<&str> {
        self.router.channels().label(direction, index)
    }

    /// Rename a channel. Out-of-range indices are ignored.
    pub fn set_channel_label(&mut self, direction: Direction, index: usize, label: impl Into<String>) {
        self.router.channels_mut().set_label(direction, index, label);
    }

    // =========================================================================
    // Topology queries
    // =========================================================================

    /// See [`Topology::legal_io`].
    #[inline]
    pub fn legal_io(&self, n_inputs: i32, n_outputs: i32) -> bool {
        self.topology.legal_io(n_inputs, n_outputs)
    }

    /// Maximum bus count in a direction.
    #[inline]
    pub fn max_buses(&self, direction: Direction) -> usize {
        self.topology.max_buses(direction)
    }

    /// See [`Topology::max_channels_for_bus`].
    #[inline]
    pub fn max_channels_for_bus(&self, direction: Direction, bus: usize) -> Option<ChannelCount> {
        self.topology.max_channels_for_bus(direction, bus)
    }

    /// Wildcard check on the first I/O configuration.
    #[inline]
    pub fn has_wildcard_bus(&self, direction: Direction) -> bool {
        self.topology.has_wildcard_bus(direction)
    }

    /// Returns true if any configuration declares a side-chain input.
    #[inline]
    pub fn has_sidechain_input(&self) -> bool {
        self.topology.has_sidechain_input()
    }

    /// Number of alternative I/O configurations.
    #[inline]
    pub fn n_io_configs(&self) -> usize {
        self.topology.n_io_configs()
    }

    /// Get an I/O configuration by index.
    #[inline]
    pub fn io_config(&self, index: usize) -> Option<&IoConfig> {
        self.topology.io_config(index)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Clear routing state and let the processor reset its own.
    pub fn reset<P: BlockProcessor<S> + ?Sized>(&mut self, processor: &mut P) {
        self.router.reset_delay();
        self.router.zero_scratch_buffers();
        processor.on_reset(&ProcessContext::new(self.session, 0));
    }

    /// Forward activation to the processor. Activation also clears routing state.
    pub fn activate<P: BlockProcessor<S> + ?Sized>(&mut self, processor: &mut P, active: bool) {
        if active {
            self.router.reset_delay();
            self.router.zero_scratch_buffers();
        }
        processor.on_activate(active);
    }

    /// Route one block of full-width I/O through the processor, or through
    /// the bypass delay line when bypassed.
    ///
    /// `inputs[i]` and `outputs[i]` feed channel slot `i`. Shorter arrays and
    /// null pointers leave the remaining slots silent.
    ///
    /// # Safety
    ///
    /// Every non-null pointer must be valid for `n_frames` samples for the
    /// duration of the call (reads for inputs, reads and writes for outputs).
    /// An output may be the same pointer as an input but must not otherwise
    /// overlap another buffer.
    pub unsafe fn process_block<T: Sample, P: BlockProcessor<S> + ?Sized>(
        &mut self,
        processor: &mut P,
        inputs: &[*const T],
        outputs: &[*mut T],
        n_frames: usize,
    ) {
        let context = ProcessContext::new(self.session, n_frames);
        let n_in = self.n_channels(Direction::Input);
        let n_out = self.n_channels(Direction::Output);

        // SAFETY: forwarded from this function's contract; attach, process
        // and detach all happen within this call.
        unsafe {
            self.router.attach_input_buffers(0, n_in, inputs, n_frames);
            self.router.attach_output_buffers(0, n_out, outputs);

            if self.session.bypassed {
                self.router.pass_through_buffers::<T>(n_frames);
            } else {
                match self.router.output_mode() {
                    OutputMode::Replace => {
                        self.router.process_buffers::<T, P>(processor, &context, n_frames)
                    }
                    OutputMode::Accumulate => self
                        .router
                        .process_buffers_accumulating::<T, P>(processor, &context, n_frames),
                }
            }
        }

        self.router.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChannelIoError, UnitError};
    use crate::processor::{Buffer, Passthrough};
    use crate::types::MAX_CHANNELS;

    struct Gain(f64);

    impl BlockProcessor<f64> for Gain {
        fn process_block(&mut self, buffer: &mut Buffer<'_, f64>, _context: &ProcessContext) {
            let gain = self.0;
            for (input, output) in buffer.zip_channels() {
                for (i, o) in input.iter().zip(output.iter_mut()) {
                    *o = *i * gain;
                }
            }
        }
    }

    /// Ducks the main input by the side-chain level.
    struct Ducker;

    impl BlockProcessor<f64> for Ducker {
        fn process_block(&mut self, buffer: &mut Buffer<'_, f64>, _context: &ProcessContext) {
            let key: f64 = buffer.input(2).iter().map(|s| s.abs()).fold(0.0, f64::max);
            let gain = 1.0 - key.min(1.0);
            for ch in 0..2 {
                let input: Vec<f64> = buffer.input(ch).to_vec();
                if let Some(output) = buffer.output(ch) {
                    for (o, i) in output.iter_mut().zip(&input) {
                        *o = *i * gain;
                    }
                }
            }
        }
    }

    #[derive(Default)]
    struct Lifecycle {
        resets: usize,
        active: Option<bool>,
        blocks: usize,
    }

    impl BlockProcessor<f64> for Lifecycle {
        fn process_block(&mut self, buffer: &mut Buffer<'_, f64>, _context: &ProcessContext) {
            self.blocks += 1;
            buffer.copy_to_output();
        }

        fn on_reset(&mut self, _context: &ProcessContext) {
            self.resets += 1;
        }

        fn on_activate(&mut self, active: bool) {
            self.active = Some(active);
        }
    }

    fn stereo_unit() -> ProcessingUnit<f64> {
        let config = UnitConfig::new("test", "1-1 2-2").with_max_block_size(64);
        let mut unit = ProcessingUnit::new(&config).unwrap();
        unit.set_channel_connections(Direction::Input, 0, 2, true);
        unit.set_channel_connections(Direction::Output, 0, 2, true);
        unit
    }

    #[test]
    fn test_bad_channel_io_fails_construction() {
        let config = UnitConfig::new("broken", "1-1 x-2");
        let result = ProcessingUnit::<f64>::new(&config);
        assert!(matches!(
            result,
            Err(UnitError::Topology(ChannelIoError::InvalidBusEntry { .. }))
        ));
    }

    #[test]
    fn test_slots_follow_topology() {
        let unit = stereo_unit();
        assert_eq!(unit.n_channels(Direction::Input), 2);
        assert_eq!(unit.n_channels(Direction::Output), 2);
        assert_eq!(unit.channel_label(Direction::Output, 1), Some("output 2"));
        assert!(unit.legal_io(1, 1));
        assert!(!unit.legal_io(2, 1));
        assert!(!unit.has_sidechain_input());

        let config = UnitConfig::new("fx", "*-2");
        let wide = ProcessingUnit::<f32>::new(&config).unwrap();
        assert_eq!(wide.n_channels(Direction::Input), MAX_CHANNELS);
        assert!(wide.has_wildcard_bus(Direction::Input));
    }

    #[test]
    fn test_session_setters_bump_version() {
        let mut unit = stereo_unit();
        let start = unit.session().version;
        unit.set_sample_rate(96000.0);
        unit.set_latency(32);
        unit.set_tail_size(100);
        unit.set_bypassed(true);
        unit.set_rendering_offline(true);

        let session = unit.session();
        assert_eq!(session.version, start + 5);
        assert_eq!(unit.sample_rate(), 96000.0);
        assert_eq!(unit.latency(), 32);
        assert_eq!(unit.tail_size(), 100);
        assert!(unit.is_bypassed());
        assert!(unit.is_rendering_offline());
        assert_eq!(unit.router_mut().latency(), 32);
    }

    #[test]
    fn test_process_block_f32_host() {
        let mut unit = stereo_unit();
        let in_l = [0.5f32; 16];
        let in_r = [0.25f32; 16];
        let mut out_l = [0.0f32; 16];
        let mut out_r = [0.0f32; 16];

        unsafe {
            unit.process_block(
                &mut Gain(2.0),
                &[in_l.as_ptr(), in_r.as_ptr()],
                &[out_l.as_mut_ptr(), out_r.as_mut_ptr()],
                16,
            );
        }

        assert_eq!(out_l, [1.0; 16]);
        assert_eq!(out_r, [0.5; 16]);
        assert!(!unit.router_mut().is_attached(Direction::Input, 0));
    }

    #[test]
    fn test_bypass_skips_processor_and_applies_latency() {
        let mut unit = stereo_unit();
        let mut processor = Lifecycle::default();
        unit.set_latency(4);
        unit.set_bypassed(true);

        let mut input = [0.0f64; 8];
        input[1] = 1.0;
        let mut out_l = [0.0f64; 8];
        let mut out_r = [0.0f64; 8];

        unsafe {
            unit.process_block(
                &mut processor,
                &[input.as_ptr()],
                &[out_l.as_mut_ptr(), out_r.as_mut_ptr()],
                8,
            );
        }

        assert_eq!(processor.blocks, 0);
        let mut expected = [0.0f64; 8];
        expected[5] = 1.0;
        assert_eq!(out_l, expected);
        assert_eq!(out_r, [0.0; 8]);
    }

    #[test]
    fn test_bypass_alignment_survives_toggling() {
        let mut unit = stereo_unit();
        let mut processor = Lifecycle::default();
        unit.set_latency(3);

        let mut run = |unit: &mut ProcessingUnit<f64>, input: &[f64; 8]| {
            let mut out_l = [0.0f64; 8];
            let mut out_r = [0.0f64; 8];
            unsafe {
                unit.process_block(
                    &mut processor,
                    &[input.as_ptr(), input.as_ptr()],
                    &[out_l.as_mut_ptr(), out_r.as_mut_ptr()],
                    8,
                );
            }
            out_l
        };

        let mut impulse = [0.0f64; 8];
        impulse[2] = 1.0;
        let mut expected = [0.0f64; 8];
        expected[5] = 1.0;

        unit.set_bypassed(true);
        assert_eq!(run(&mut unit, &impulse), expected);

        unit.set_bypassed(false);
        assert_eq!(run(&mut unit, &impulse), impulse);

        unit.set_bypassed(true);
        assert_eq!(run(&mut unit, &impulse), expected);
    }

    #[test]
    fn test_bypass_resumes_from_latest_input() {
        let mut unit = stereo_unit();
        let mut processor = Lifecycle::default();
        unit.set_latency(4);

        let mut run = |unit: &mut ProcessingUnit<f64>, input: &[f64; 8]| {
            let mut out_l = [0.0f64; 8];
            let mut out_r = [0.0f64; 8];
            unsafe {
                unit.process_block(
                    &mut processor,
                    &[input.as_ptr(), input.as_ptr()],
                    &[out_l.as_mut_ptr(), out_r.as_mut_ptr()],
                    8,
                );
            }
            out_l
        };

        // Audio from an earlier bypass period must not come back later.
        unit.set_bypassed(true);
        run(&mut unit, &[1.0; 8]);
        unit.set_bypassed(false);
        for _ in 0..100 {
            run(&mut unit, &[0.0; 8]);
        }
        unit.set_bypassed(true);
        assert_eq!(run(&mut unit, &[0.0; 8]), [0.0; 8]);

        // Entering bypass continues with the tail of the last active block.
        unit.set_bypassed(false);
        run(&mut unit, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        unit.set_bypassed(true);
        assert_eq!(
            run(&mut unit, &[0.0; 8]),
            [5.0, 6.0, 7.0, 8.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_sidechain_reaches_processor() {
        let config = UnitConfig::new("ducker", "2-2 2.1-2").with_max_block_size(4);
        let mut unit = ProcessingUnit::<f64>::new(&config).unwrap();
        assert!(unit.has_sidechain_input());
        assert_eq!(unit.n_channels(Direction::Input), 3);
        unit.set_channel_connections(Direction::Input, 0, 3, true);
        unit.set_channel_connections(Direction::Output, 0, 2, true);

        let main = [1.0f64; 4];
        let key = [0.5f64; 4];
        let mut out_l = [0.0f64; 4];
        let mut out_r = [0.0f64; 4];

        unsafe {
            unit.process_block(
                &mut Ducker,
                &[main.as_ptr(), main.as_ptr(), key.as_ptr()],
                &[out_l.as_mut_ptr(), out_r.as_mut_ptr()],
                4,
            );
        }

        assert_eq!(out_l, [0.5; 4]);
        assert_eq!(out_r, [0.5; 4]);
    }

    #[test]
    fn test_accumulate_mode() {
        let mut unit = stereo_unit();
        unit.set_output_mode(OutputMode::Accumulate);
        let input = [0.25f64; 4];
        let mut out_l = [1.0f64; 4];
        let mut out_r = [1.0f64; 4];

        unsafe {
            unit.process_block(
                &mut Passthrough,
                &[input.as_ptr(), input.as_ptr()],
                &[out_l.as_mut_ptr(), out_r.as_mut_ptr()],
                4,
            );
        }

        assert_eq!(out_l, [1.25; 4]);
        assert_eq!(out_r, [1.25; 4]);
    }

    #[test]
    fn test_lifecycle_hooks() {
        let mut unit = stereo_unit();
        let mut processor = Lifecycle::default();
        unit.activate(&mut processor, true);
        unit.reset(&mut processor);
        assert_eq!(processor.active, Some(true));
        assert_eq!(processor.resets, 1);
        unit.activate(&mut processor, false);
        assert_eq!(processor.active, Some(false));
    }

    #[test]
    fn test_limit_to_stereo_and_labels() {
        let config = UnitConfig::new("surround", "6-6");
        let mut unit = ProcessingUnit::<f32>::new(&config).unwrap();
        unit.set_channel_connections(Direction::Output, 0, 6, true);
        unit.limit_to_stereo();
        assert_eq!(unit.n_connected(Direction::Output), 2);

        unit.set_channel_label(Direction::Input, 0, "Front L");
        assert_eq!(unit.channel_label(Direction::Input, 0), Some("Front L"));
        assert!(!unit.is_channel_connected(Direction::Input, 0));
    }

    #[test]
    fn test_set_block_size() {
        let mut unit = stereo_unit();
        unit.set_block_size(256);
        assert_eq!(unit.block_size(), 256);
        assert_eq!(unit.router_mut().block_size(), 256);
    }
}
