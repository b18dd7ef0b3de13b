//! Audio output via a pull-based device callback.
//!
//! The device pulls samples whenever it needs more; the producer side
//! pushes resampled frames into a lock-free SPSC ring shared with the
//! callback. The callback never blocks: it copies what the ring holds and
//! pads the rest of the requested span with silence, so an underrun is
//! audible but never an error. The producer blocks (sleep-poll) while the
//! ring is full, which keeps its memory use bounded.

use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::frame::AUDIO_CHANNELS;

/// Seconds of interleaved audio the ring can buffer ahead.
const RING_SECONDS: usize = 2;

/// How long the producer sleeps when the ring is full.
const FULL_RING_BACKOFF: Duration = Duration::from_millis(2);

/// Errors from opening or starting the output stream.
///
/// Fatal unless audio is disabled or a cache mode is active.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to open audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    Start(#[from] cpal::PlayStreamError),
}

/// An open output stream plus the producer half of its sample ring.
///
/// Owned by the playback consumer thread for its entire lifetime; the
/// stream stops when the handle is dropped.
pub struct AudioOutput {
    stream: cpal::Stream,
    producer: Producer<f32>,
    started: bool,
}

impl AudioOutput {
    /// Opens the default output device for interleaved stereo f32 at the
    /// given rate. The stream stays silent until [`AudioOutput::start`].
    pub fn open(sample_rate: u32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = StreamConfig {
            channels: AUDIO_CHANNELS as u16,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        let capacity = sample_rate as usize * AUDIO_CHANNELS * RING_SECONDS;
        let (producer, mut consumer) = RingBuffer::<f32>::new(capacity);

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                fill_output(&mut consumer, data);
            },
            |err| tracing::warn!("audio stream error: {err}"),
            None,
        )?;

        Ok(Self {
            stream,
            producer,
            started: false,
        })
    }

    /// Starts the device pulling samples. Idempotent.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if !self.started {
            self.stream.play()?;
            self.started = true;
        }
        Ok(())
    }

    /// Enqueues interleaved samples, blocking while the ring is full.
    pub fn push_samples(&mut self, samples: &[f32]) {
        for &value in samples {
            let mut sample = value;
            loop {
                match self.producer.push(sample) {
                    Ok(()) => break,
                    Err(PushError::Full(rejected)) => {
                        sample = rejected;
                        thread::sleep(FULL_RING_BACKOFF);
                    }
                }
            }
        }
    }
}

/// Copies buffered samples into the output span, padding with silence.
///
/// Runs on the device callback thread and must return promptly.
fn fill_output(consumer: &mut Consumer<f32>, out: &mut [f32]) {
    let available = consumer.slots().min(out.len());
    if available > 0 {
        if let Ok(chunk) = consumer.read_chunk(available) {
            let (first, second) = chunk.as_slices();
            out[..first.len()].copy_from_slice(first);
            out[first.len()..first.len() + second.len()].copy_from_slice(second);
            chunk.commit_all();
        }
    }
    for sample in out[available..].iter_mut() {
        *sample = 0.0;
    }
}
