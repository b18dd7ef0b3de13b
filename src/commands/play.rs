//! Live playback: decode, hand off through the bounded channel, render.
//!
//! The calling thread is the producer (decode loop); a dedicated
//! `playback` thread is the consumer. The producer never touches
//! rendering primitives — post-processed frames go through the channel
//! and the consumer does everything display-side.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use asciiplay::decode::{DecodeError, Pipeline};
use asciiplay::player::{self, FrameSource, GlyphRamp, PlaybackOptions, PlaybackStats};
use asciiplay::terminal::{self, TerminalSession};
use asciiplay::{Config, Frame, FrameChannel};

use crate::cli::Cli;

pub fn run(cli: &Cli, config: &Config, file: &Path) -> Result<()> {
    super::require_tty()?;

    let (width, height) = terminal::output_dimensions()?;
    debug!(width, height, "output dimensions");

    // Open the input before entering the alternate screen so open errors
    // print on a clean terminal.
    let mut pipeline = Pipeline::open(file, width, height, !cli.no_audio)?;
    let fps = match cli.fps {
        Some(fps) => fps,
        None => pipeline.frame_rate().ok_or(DecodeError::UnknownFrameRate)?,
    };
    let sample_rate = if cli.no_audio {
        None
    } else {
        pipeline.sample_rate()
    };
    let ramp = super::glyph_ramp(cli, config)?;
    info!(fps, ?sample_rate, "starting live playback");

    let session = TerminalSession::enter()?;
    super::install_interrupt(Arc::clone(&session))?;

    let result = play_live(
        &mut pipeline,
        fps,
        ramp,
        sample_rate,
        config.channel_capacity,
    );
    session.restore();

    let stats = result?;
    info!(
        video_frames = stats.video_frames,
        audio_frames = stats.audio_frames,
        "playback finished"
    );
    Ok(())
}

fn play_live(
    pipeline: &mut Pipeline,
    fps: f64,
    ramp: GlyphRamp,
    sample_rate: Option<u32>,
    capacity: usize,
) -> Result<PlaybackStats> {
    let channel: Arc<FrameChannel<Frame>> = Arc::new(FrameChannel::new(capacity));

    let consumer = {
        let channel = Arc::clone(&channel);
        let options = PlaybackOptions {
            fps,
            ramp,
            sample_rate,
        };
        thread::Builder::new()
            .name("playback".into())
            .spawn(move || {
                let result = player::run(FrameSource::Live(Arc::clone(&channel)), options);
                if result.is_err() {
                    // Keep the producer from blocking on a dead consumer.
                    while channel.pop().is_some() {}
                }
                result
            })?
    };

    let produced = pipeline.run(|frame| {
        channel.push(frame);
        Ok(())
    });

    // Every pushed frame must be consumed before the decode, scale and
    // resample contexts are released.
    channel.wait_drained();
    channel.close();

    let consumed = consumer
        .join()
        .map_err(|_| anyhow!("playback thread panicked"))?;
    produced?;
    Ok(consumed?)
}
