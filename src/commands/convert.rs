//! Cache-write mode: decode once, persist the frame stream.
//!
//! Single-threaded — the decode loop appends straight to the cache
//! writer. No channel, no audio device, and no rendering: progress goes
//! to the log, and a summary is printed when the file is finalized.

use std::path::Path;

use anyhow::Result;
use humansize::{format_size, DECIMAL};
use tracing::{debug, info};

use asciiplay::decode::{DecodeError, Pipeline};
use asciiplay::terminal;
use asciiplay::{CacheHeader, CacheWriter, Config, Frame};

use crate::cli::Cli;

/// Records appended between progress log lines.
const PROGRESS_INTERVAL: u64 = 250;

pub fn run(cli: &Cli, _config: &Config, input: &Path, output: &Path) -> Result<()> {
    let (width, height) = terminal::output_dimensions()?;

    let mut pipeline = Pipeline::open(input, width, height, !cli.no_audio)?;
    let fps = match cli.fps {
        Some(fps) => fps,
        None => pipeline.frame_rate().ok_or(DecodeError::UnknownFrameRate)?,
    };
    let sample_rate = if cli.no_audio {
        0
    } else {
        pipeline.sample_rate().unwrap_or(0)
    };

    let header = CacheHeader {
        fps: fps as f32,
        width,
        height,
        sample_rate,
    };
    debug!(?header, "creating cache file");
    let mut writer = CacheWriter::create(output, header)?;

    let mut video_frames = 0u64;
    let mut audio_frames = 0u64;
    pipeline.run(|frame| {
        writer.append(&frame)?;
        match frame {
            Frame::Video { .. } => video_frames += 1,
            Frame::Audio { .. } => audio_frames += 1,
        }
        if writer.records_written() % PROGRESS_INTERVAL == 0 {
            info!(video_frames, audio_frames, "writing cache");
        }
        Ok(())
    })?;

    let bytes = writer.finalize()?;
    println!(
        "Wrote {} video and {} audio frames ({}) to {}",
        video_frames,
        audio_frames,
        format_size(bytes, DECIMAL),
        output.display()
    );
    Ok(())
}
