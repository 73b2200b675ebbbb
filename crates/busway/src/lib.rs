//! # Busway
//!
//! Channel topology and buffer routing for real-time audio units.
//!
//! ## Architecture
//!
//! ```text
//! Host integration layer (plugin format wrapper)
//!        ↓  raw f32/f64 channel pointers, connections, session changes
//! ProcessingUnit<S>
//!        ↓  Buffer<S> with every channel populated
//! Your BlockProcessor<S>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busway::prelude::*;
//!
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
//!
//! let mut unit = ProcessingUnit::<f64>::new(&UnitConfig::new("Gain", "1-1 2-2"))?;
//! unit.set_channel_connections(Direction::Input, 0, 2, true);
//! unit.set_channel_connections(Direction::Output, 0, 2, true);
//!
//! // Once per block, with the host's f32 channel pointers:
//! unsafe { unit.process_block(&mut gain, &inputs, &outputs, n_frames) };
//! ```

// Re-export sub-crates
pub use busway_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use busway::prelude::*;
/// ```
pub mod prelude {
    pub use busway_core::{
        // Processing
        BlockProcessor, Buffer, Passthrough, ProcessContext, Sample,
        // Unit and configuration
        ProcessingUnit, SessionConfig, TimeInfo, UnitConfig,
        // Topology
        ChannelCount, Direction, IoConfig, Topology, UNCHECKED,
        // Routing
        OutputMode,
        // Error types
        ChannelIoError, UnitError, UnitResult,
    };
}
