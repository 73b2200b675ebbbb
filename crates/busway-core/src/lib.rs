//! # busway-core
//!
//! Channel topology and buffer routing for real-time audio processing units.
//!
//! This crate describes which channel layouts a unit accepts, tracks which
//! channels a host has connected, and moves per-block sample buffers between
//! the host and the unit's processing routine, including a latency-compensated
//! passthrough used while the unit is bypassed.
//!
//! ## Main Types
//!
//! - [`Topology`] - Parsed channel-I/O string and the queries a host asks
//! - [`ChannelRegistry`] - Per-channel labels and connection flags
//! - [`BufferRouter`] - Attaches host buffers, converts formats, runs the processor
//! - [`LatencyDelay`] - Multichannel delay line for bypass
//! - [`ProcessingUnit`] - Everything above behind one host-facing surface
//! - [`BlockProcessor`] - The user processing routine
//! - [`UnitConfig`] - Unit description, buildable in code or loaded from JSON
//!
//! ## Channel-I/O Strings
//!
//! ```text
//! "1-1 2-2"    mono or stereo effect
//! "2.2-2"      stereo effect with stereo side-chain
//! "0-2.2.2.2"  instrument with four stereo outputs
//! "*-2"        any input width, stereo out
//! ```

pub mod bus_config;
pub mod channel;
pub mod channel_io;
pub mod config;
pub mod error;
pub mod latency_delay;
pub mod processor;
pub mod router;
pub mod sample;
pub mod scratch;
pub mod session;
pub mod topology;
pub mod types;
pub mod unit;

// Re-exports for convenience
pub use bus_config::{BusInfo, BusType, ChannelCount, IoConfig};
pub use channel::{ChannelData, ChannelRegistry};
pub use channel_io::{parse_channel_io, ChannelIoSpec, WILDCARD};
pub use config::UnitConfig;
pub use error::{ChannelIoError, UnitError, UnitResult};
pub use latency_delay::LatencyDelay;
pub use processor::{BlockProcessor, Buffer, Passthrough};
pub use router::{BufferRouter, OutputMode};
pub use sample::{Sample, SampleFormat};
pub use scratch::ScratchBuffers;
pub use session::{ProcessContext, SessionConfig, TimeInfo, DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};
pub use topology::Topology;
pub use types::{Direction, MAX_BUSES, MAX_CHANNELS, UNCHECKED};
pub use unit::ProcessingUnit;
