//! Session state snapshot and per-block process context.
//!
//! The host changes session scalars (sample rate, block size, latency, ...)
//! only between blocks. [`SessionConfig`] is the `Copy` snapshot of those
//! values; every change made through the unit bumps its `version`, so a
//! processor can cheaply notice that something moved since the last block.
//!
//! [`TimeInfo`] carries the host's transport fields. The routing core never
//! interprets them.

/// Sample rate used until the host sets one.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Block size used until the host sets one.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Host transport and timing information, passed through untouched.
///
/// Timing fields are `Option<T>` because not all hosts provide them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeInfo {
    /// Tempo in BPM.
    pub tempo: Option<f64>,
    /// Position in samples from the start of the timeline.
    pub sample_pos: Option<f64>,
    /// Position in quarter notes.
    pub ppq_pos: Option<f64>,
    /// Start of the last bar in quarter notes.
    pub last_bar: Option<f64>,
    /// Loop start in quarter notes.
    pub cycle_start: Option<f64>,
    /// Loop end in quarter notes.
    pub cycle_end: Option<f64>,
    /// Time signature numerator.
    pub numerator: Option<i32>,
    /// Time signature denominator.
    pub denominator: Option<i32>,
    /// True while the transport is running.
    pub transport_running: bool,
    /// True when loop playback is enabled.
    pub loop_enabled: bool,
}

impl TimeInfo {
    /// Returns the time signature as (numerator, denominator).
    #[inline]
    pub fn time_signature(&self) -> Option<(i32, i32)> {
        match (self.numerator, self.denominator) {
            (Some(num), Some(denom)) => Some((num, denom)),
            _ => None,
        }
    }
}

/// Snapshot of the session scalars the host controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Maximum frames per block.
    pub block_size: usize,
    /// Reported latency in samples.
    pub latency: usize,
    /// Reported tail length in samples.
    pub tail_size: usize,
    /// Processing bypassed by the host.
    pub bypassed: bool,
    /// Rendering faster than real time (bounce/export).
    pub rendering_offline: bool,
    /// Transport info for the current block.
    pub time_info: TimeInfo,
    /// Incremented on every change.
    pub version: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            latency: 0,
            tail_size: 0,
            bypassed: false,
            rendering_offline: false,
            time_info: TimeInfo::default(),
            version: 0,
        }
    }
}

impl SessionConfig {
    /// Apply a change and bump the version.
    pub(crate) fn update(&mut self, f: impl FnOnce(&mut Self)) {
        f(self);
        self.version = self.version.wrapping_add(1);
    }
}

/// Context for one block, handed to the processor.
///
/// `Copy` and only meaningful for the block it was created for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    /// Session state at the start of the block.
    pub session: SessionConfig,
    /// Frames in this block.
    pub n_frames: usize,
}

impl ProcessContext {
    /// Create a context for a block of `n_frames`.
    #[inline]
    pub fn new(session: SessionConfig, n_frames: usize) -> Self {
        Self { session, n_frames }
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.session.sample_rate
    }

    /// Transport info for this block.
    #[inline]
    pub fn time_info(&self) -> &TimeInfo {
        &self.session.time_info
    }

    /// Duration of this block in seconds.
    #[inline]
    pub fn block_duration(&self) -> f64 {
        self.n_frames as f64 / self.session.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_bumps_version() {
        let mut session = SessionConfig::default();
        assert_eq!(session.version, 0);
        session.update(|s| s.latency = 64);
        session.update(|s| s.bypassed = true);
        assert_eq!(session.latency, 64);
        assert!(session.bypassed);
        assert_eq!(session.version, 2);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut session = SessionConfig::default();
        let snapshot = session;
        session.update(|s| s.sample_rate = 96000.0);
        assert_eq!(snapshot.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_ne!(snapshot.version, session.version);
    }

    #[test]
    fn test_context_helpers() {
        let session = SessionConfig {
            sample_rate: 48000.0,
            time_info: TimeInfo {
                numerator: Some(6),
                denominator: Some(8),
                ..TimeInfo::default()
            },
            ..SessionConfig::default()
        };
        let context = ProcessContext::new(session, 480);
        assert_eq!(context.block_duration(), 0.01);
        assert_eq!(context.time_info().time_signature(), Some((6, 8)));
        assert_eq!(TimeInfo::default().time_signature(), None);
    }
}
