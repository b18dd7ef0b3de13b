//! FFmpeg decode pipeline: demux, decode, scale, resample.
//!
//! External-collaborator glue. The pipeline opens an input, finds the
//! best video (and optionally audio) streams, and drives the packet loop,
//! emitting post-processed [`Frame`]s — GRAY8 intensity buffers at the
//! output dimensions, and packed stereo f32 sample blocks — into a
//! caller-supplied sink in decode order. Any decoder rejection aborts the
//! run; there is no skip-and-continue.

use std::path::Path;
use std::sync::Once;

use anyhow::Result;
use ffmpeg_next as ffmpeg;

use crate::frame::{Frame, AUDIO_CHANNELS};

static FFMPEG_LOG_INIT: Once = Once::new();

fn silence_ffmpeg_logging() {
    FFMPEG_LOG_INIT.call_once(|| unsafe {
        // FFmpeg writes to stderr by default, which would corrupt the
        // alternate screen during playback.
        ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_QUIET);
    });
}

/// Errors from opening the input or processing its streams.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to open input: {0}")]
    Open(ffmpeg::Error),

    #[error("no video stream in input")]
    NoVideoStream,

    #[error("no audio stream in input (pass --no-audio for silent files)")]
    NoAudioStream,

    #[error("unknown frame rate; pass --fps")]
    UnknownFrameRate,

    #[error("video decode error: {0}")]
    Video(ffmpeg::Error),

    #[error("audio decode error: {0}")]
    Audio(ffmpeg::Error),

    #[error("scaler error: {0}")]
    Scale(ffmpeg::Error),

    #[error("resampler error: {0}")]
    Resample(ffmpeg::Error),
}

/// A demux/decode/scale/resample pipeline for one input file.
pub struct Pipeline {
    ictx: ffmpeg::format::context::Input,
    video_index: usize,
    audio_index: Option<usize>,
    video_decoder: ffmpeg::decoder::Video,
    audio_decoder: Option<ffmpeg::decoder::Audio>,
    scaler: ffmpeg::software::scaling::Context,
    resampler: Option<ffmpeg::software::resampling::Context>,
    out_width: u32,
    out_height: u32,
    frame_rate: Option<f64>,
}

impl Pipeline {
    /// Opens `path` and prepares decoders for its best streams.
    ///
    /// Video is scaled to `out_width x out_height` GRAY8; audio (when
    /// `with_audio`) is resampled to packed stereo f32 at the source
    /// rate. A missing audio stream is an error unless audio was
    /// disabled.
    pub fn open<P: AsRef<Path>>(
        path: P,
        out_width: u32,
        out_height: u32,
        with_audio: bool,
    ) -> Result<Self, DecodeError> {
        silence_ffmpeg_logging();
        ffmpeg::init().map_err(DecodeError::Open)?;

        let ictx = ffmpeg::format::input(&path).map_err(DecodeError::Open)?;

        let (video_index, frame_rate, video_decoder) = {
            let stream = ictx
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or(DecodeError::NoVideoStream)?;
            let rate = stream.avg_frame_rate();
            let frame_rate = if rate.numerator() > 0 && rate.denominator() > 0 {
                Some(rate.numerator() as f64 / rate.denominator() as f64)
            } else {
                None
            };
            let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(DecodeError::Video)?
                .decoder()
                .video()
                .map_err(DecodeError::Video)?;
            (stream.index(), frame_rate, decoder)
        };

        let scaler = ffmpeg::software::scaling::Context::get(
            video_decoder.format(),
            video_decoder.width(),
            video_decoder.height(),
            ffmpeg::format::Pixel::GRAY8,
            out_width,
            out_height,
            ffmpeg::software::scaling::Flags::FAST_BILINEAR,
        )
        .map_err(DecodeError::Scale)?;

        let (audio_index, audio_decoder, resampler) = if with_audio {
            let stream = ictx
                .streams()
                .best(ffmpeg::media::Type::Audio)
                .ok_or(DecodeError::NoAudioStream)?;
            let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(DecodeError::Audio)?
                .decoder()
                .audio()
                .map_err(DecodeError::Audio)?;
            let resampler = decoder
                .resampler(
                    ffmpeg::format::Sample::F32(ffmpeg::format::sample::Type::Packed),
                    ffmpeg::ChannelLayout::STEREO,
                    decoder.rate(),
                )
                .map_err(DecodeError::Resample)?;
            (Some(stream.index()), Some(decoder), Some(resampler))
        } else {
            (None, None, None)
        };

        Ok(Self {
            ictx,
            video_index,
            audio_index,
            video_decoder,
            audio_decoder,
            scaler,
            resampler,
            out_width,
            out_height,
            frame_rate,
        })
    }

    /// Average frame rate reported by the video stream, when known.
    pub fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }

    /// Sample rate of the audio decoder, when audio is enabled.
    pub fn sample_rate(&self) -> Option<u32> {
        self.audio_decoder.as_ref().map(|decoder| decoder.rate())
    }

    /// Drives the packet loop to end-of-stream, emitting post-processed
    /// frames into `sink` in decode order.
    pub fn run<F>(&mut self, mut sink: F) -> Result<()>
    where
        F: FnMut(Frame) -> Result<()>,
    {
        let Pipeline {
            ictx,
            video_index,
            audio_index,
            video_decoder,
            audio_decoder,
            scaler,
            resampler,
            out_width,
            out_height,
            ..
        } = self;

        for (stream, packet) in ictx.packets() {
            if stream.index() == *video_index {
                video_decoder
                    .send_packet(&packet)
                    .map_err(DecodeError::Video)?;
                drain_video(video_decoder, scaler, *out_width, *out_height, &mut sink)?;
            } else if Some(stream.index()) == *audio_index {
                if let (Some(decoder), Some(resampler)) =
                    (audio_decoder.as_mut(), resampler.as_mut())
                {
                    decoder.send_packet(&packet).map_err(DecodeError::Audio)?;
                    drain_audio(decoder, resampler, &mut sink)?;
                }
            }
        }

        // Flush the decoders so buffered frames reach the sink.
        video_decoder.send_eof().map_err(DecodeError::Video)?;
        drain_video(video_decoder, scaler, *out_width, *out_height, &mut sink)?;
        if let (Some(decoder), Some(resampler)) = (audio_decoder.as_mut(), resampler.as_mut()) {
            decoder.send_eof().map_err(DecodeError::Audio)?;
            drain_audio(decoder, resampler, &mut sink)?;
        }

        Ok(())
    }
}

fn drain_video<F>(
    decoder: &mut ffmpeg::decoder::Video,
    scaler: &mut ffmpeg::software::scaling::Context,
    width: u32,
    height: u32,
    sink: &mut F,
) -> Result<()>
where
    F: FnMut(Frame) -> Result<()>,
{
    let mut decoded = ffmpeg::util::frame::video::Video::empty();
    while decoder.receive_frame(&mut decoded).is_ok() {
        let mut gray = ffmpeg::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut gray).map_err(DecodeError::Scale)?;
        let buffer = copy_plane(gray.data(0), gray.stride(0), width as usize, height as usize);
        sink(Frame::video(buffer, width, height))?;
    }
    Ok(())
}

fn drain_audio<F>(
    decoder: &mut ffmpeg::decoder::Audio,
    resampler: &mut ffmpeg::software::resampling::Context,
    sink: &mut F,
) -> Result<()>
where
    F: FnMut(Frame) -> Result<()>,
{
    let mut decoded = ffmpeg::util::frame::audio::Audio::empty();
    while decoder.receive_frame(&mut decoded).is_ok() {
        let mut resampled = ffmpeg::util::frame::audio::Audio::empty();
        resampler
            .run(&decoded, &mut resampled)
            .map_err(DecodeError::Resample)?;
        let count = resampled.samples() * AUDIO_CHANNELS;
        if count == 0 {
            continue;
        }
        let data = resampled.data(0);
        let mut samples = Vec::with_capacity(count);
        for chunk in data[..count * std::mem::size_of::<f32>()].chunks_exact(4) {
            samples.push(f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        sink(Frame::audio(samples))?;
    }
    Ok(())
}

/// Copies a strided plane into a tight row-major buffer.
fn copy_plane(data: &[u8], stride: usize, width: usize, height: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; width * height];
    for y in 0..height {
        let src = y * stride;
        let dst = y * width;
        buffer[dst..dst + width].copy_from_slice(&data[src..src + width]);
    }
    buffer
}
