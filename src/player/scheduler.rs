//! The playback consumer: frame routing, pacing and blitting.
//!
//! A single consumer drains a [`FrameSource`] in FIFO order. Video frames
//! are glyph-mapped and blitted, then the consumer sleeps for whatever
//! remains of the frame budget (`1/fps` minus the render time). Pacing is
//! best-effort: a render that overruns its budget makes subsequent frames
//! lag real time; frames are never skipped or batched to catch up. Audio
//! frames are forwarded to the pull-driven output ring as they are
//! encountered.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CacheError, CacheReader};
use crate::channel::FrameChannel;
use crate::frame::Frame;
use crate::player::audio::{AudioError, AudioOutput};
use crate::player::glyph::GlyphRamp;
use crate::terminal::Renderer;

/// Errors surfaced by the playback consumer.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("render I/O error: {0}")]
    Render(#[from] std::io::Error),

    #[error("frame rate must be positive (got {0})")]
    InvalidFrameRate(f64),
}

/// Where the consumer obtains its frames.
pub enum FrameSource {
    /// Live mode: the bounded handoff channel fed by the decode loop.
    Live(Arc<FrameChannel<Frame>>),
    /// Replay mode: sequential records from a previously written cache.
    Replay(CacheReader),
}

impl FrameSource {
    /// The next frame in production order, or `None` at end-of-stream.
    fn next(&mut self) -> Result<Option<Frame>, PlayerError> {
        match self {
            FrameSource::Live(channel) => Ok(channel.pop()),
            FrameSource::Replay(reader) => {
                let header = *reader.header();
                let record = reader.next_record()?;
                Ok(record.map(|r| r.into_frame(&header)))
            }
        }
    }
}

/// Knobs for one playback run.
pub struct PlaybackOptions {
    /// Target video frame rate.
    pub fps: f64,
    /// Intensity-to-glyph mapping.
    pub ramp: GlyphRamp,
    /// Audio sample rate to open the output device at; `None` disables
    /// audio entirely.
    pub sample_rate: Option<u32>,
}

/// Counters reported after a completed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStats {
    pub video_frames: u64,
    pub audio_frames: u64,
}

/// Drains the source until end-of-stream, rendering and playing frames.
///
/// Runs on a dedicated consumer thread in live mode and on the calling
/// thread in replay mode. Opening the audio device happens here so the
/// device is only touched when playback actually starts.
pub fn run(mut source: FrameSource, options: PlaybackOptions) -> Result<PlaybackStats, PlayerError> {
    if !(options.fps.is_finite() && options.fps > 0.0) {
        return Err(PlayerError::InvalidFrameRate(options.fps));
    }
    let frame_budget = Duration::from_secs_f64(1.0 / options.fps);

    let mut audio = match options.sample_rate {
        Some(rate) => Some(AudioOutput::open(rate)?),
        None => None,
    };

    let mut renderer = Renderer::new();
    let mut stats = PlaybackStats::default();
    let mut row = String::new();

    while let Some(frame) = source.next()? {
        match frame {
            Frame::Video { buffer, width, .. } => {
                let started = Instant::now();
                blit(&mut renderer, &buffer, width as usize, &options.ramp, &mut row)?;
                stats.video_frames += 1;
                let elapsed = started.elapsed();
                if elapsed < frame_budget {
                    std::thread::sleep(frame_budget - elapsed);
                }
            }
            Frame::Audio { samples } => {
                if let Some(output) = audio.as_mut() {
                    output.start()?;
                    output.push_samples(&samples);
                }
                stats.audio_frames += 1;
            }
        }
    }

    tracing::debug!(
        video_frames = stats.video_frames,
        audio_frames = stats.audio_frames,
        "source exhausted"
    );
    Ok(stats)
}

/// Maps one intensity buffer through the ramp and blits it row by row.
fn blit(
    renderer: &mut Renderer,
    buffer: &[u8],
    width: usize,
    ramp: &GlyphRamp,
    row: &mut String,
) -> std::io::Result<()> {
    renderer.begin_frame()?;
    for line in buffer.chunks(width) {
        row.clear();
        row.extend(line.iter().map(|&v| ramp.glyph(v)));
        renderer.draw_row(row)?;
    }
    renderer.present()
}
