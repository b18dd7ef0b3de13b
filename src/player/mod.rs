//! Playback scheduling.
//!
//! Consumes post-processed frames from either the live channel or a
//! frame cache, paces video display to the target frame rate, maps pixel
//! intensity to glyphs and feeds audio samples to the pull-based device
//! callback.
//!
//! Submodules:
//! - `glyph`: intensity-to-glyph ramp mapping
//! - `audio`: cpal output stream and its sample ring
//! - `scheduler`: the consumer loop (routing, pacing, blitting)

pub mod audio;
pub mod glyph;
pub mod scheduler;

pub use audio::{AudioError, AudioOutput};
pub use glyph::{GlyphRamp, RampError, DEFAULT_RAMP};
pub use scheduler::{run, FrameSource, PlaybackOptions, PlaybackStats, PlayerError};
