//! Cached-replay mode: play a frame stream straight from disk.
//!
//! The cache header fixes frame rate, dimensions and sample rate, so
//! replay reproduces the original run without touching the decoder. The
//! calling thread is the only consumer.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use asciiplay::player::{self, FrameSource, PlaybackOptions};
use asciiplay::terminal::TerminalSession;
use asciiplay::{CacheReader, Config};

use crate::cli::Cli;

pub fn run(cli: &Cli, config: &Config, file: &Path) -> Result<()> {
    super::require_tty()?;

    let reader = CacheReader::open(file)?;
    let header = *reader.header();
    let fps = cli.fps.unwrap_or(header.fps as f64);
    let sample_rate = if cli.no_audio || !header.has_audio() {
        None
    } else {
        Some(header.sample_rate)
    };
    let ramp = super::glyph_ramp(cli, config)?;
    info!(fps, ?sample_rate, "replaying frame cache");

    let session = TerminalSession::enter()?;
    super::install_interrupt(Arc::clone(&session))?;

    let options = PlaybackOptions {
        fps,
        ramp,
        sample_rate,
    };
    let result = player::run(FrameSource::Replay(reader), options);
    session.restore();

    let stats = result?;
    info!(
        video_frames = stats.video_frames,
        audio_frames = stats.audio_frames,
        "replay finished"
    );
    Ok(())
}
