//! asciiplay — play media files as terminal glyph art.
//!
//! The core of the crate is the frame-transport and caching subsystem:
//!
//! - [`channel`]: a bounded FIFO handoff between the decode producer and
//!   the playback consumer, with backpressure and a drain signal for
//!   shutdown synchronization.
//! - [`cache`]: the `.apcache` on-disk container that persists a decoded
//!   frame stream for deterministic, decode-free replay.
//! - [`player`]: the playback scheduler — frame routing, fps pacing,
//!   glyph mapping and the pull-based audio callback.
//!
//! Everything else wires external collaborators: [`decode`] drives
//! FFmpeg, [`terminal`] owns the alternate screen and the row blitter,
//! and [`config`] reads the optional settings file. The `asciiplay`
//! binary layers argument parsing and mode routing on top.

pub mod cache;
pub mod channel;
pub mod config;
pub mod decode;
pub mod frame;
pub mod player;
pub mod terminal;

pub use cache::{looks_like_cache, CacheError, CacheHeader, CacheReader, CacheWriter};
pub use channel::{ChannelObserver, ChannelStatus, FrameChannel};
pub use config::Config;
pub use frame::Frame;
