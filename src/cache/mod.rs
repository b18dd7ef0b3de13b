//! On-disk frame cache (`.apcache`).
//!
//! A cache file stores an already-decoded frame stream so a later run can
//! replay it without touching the decoder: a fixed 16-byte header (frame
//! rate, output dimensions, sample rate) followed by typed records in the
//! exact order frames were produced. Once written, a cache reproduces the
//! original frame rate, resolution and sample rate with zero
//! recomputation.
//!
//! Wire format, little-endian throughout:
//!
//! | field      | type    |
//! |------------|---------|
//! | fps        | f32     |
//! | width      | u32     |
//! | height     | u32     |
//! | sampleRate | u32     |
//! | records[]  | 1-byte tag (0 = video, 1 = audio), u32 length, payload |
//!
//! `sampleRate == 0` denotes an audio-less cache. A video payload is
//! `width * height` intensity bytes; an audio payload is a whole number of
//! interleaved stereo f32 sample frames. Any I/O error while writing is
//! fatal for the run; a partial file stays on disk and is rejected by
//! [`looks_like_cache`] or record validation on a later read.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::frame::{Frame, SAMPLE_FRAME_BYTES};

/// Reserved file extension probed before falling back to live decoding.
pub const CACHE_EXTENSION: &str = "apcache";

const HEADER_BYTES: usize = 16;
const TAG_VIDEO: u8 = 0;
const TAG_AUDIO: u8 = 1;

// Header plausibility bounds used by the structural check.
const MAX_FPS: f32 = 1000.0;
const MAX_DIMENSION: u32 = 1 << 16;
const MAX_SAMPLE_RATE: u32 = 768_000;

/// Errors for cache create/write/read/validate operations.
///
/// All of them are fatal for the active run; there is no partial-record
/// recovery.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not a valid cache header")]
    InvalidHeader,

    #[error("unknown record tag {0:#04x}")]
    UnknownTag(u8),

    #[error("truncated record at end of cache")]
    Truncated,

    #[error("video record length {len} does not match {width}x{height} header")]
    VideoLengthMismatch { len: u32, width: u32, height: u32 },

    #[error("audio record length {0} is not a whole number of stereo samples")]
    AudioLengthMismatch(u32),
}

/// Playback metadata written exactly once, before any record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheHeader {
    /// Frame rate used for pacing on replay.
    pub fps: f32,
    /// Video frame width in cells.
    pub width: u32,
    /// Video frame height in cells.
    pub height: u32,
    /// Audio sample rate; 0 if the source has no audio.
    pub sample_rate: u32,
}

impl CacheHeader {
    pub fn has_audio(&self) -> bool {
        self.sample_rate != 0
    }

    /// Byte count of one video payload under this header.
    pub fn video_payload_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn to_bytes(self) -> [u8; HEADER_BYTES] {
        let mut bytes = [0u8; HEADER_BYTES];
        bytes[0..4].copy_from_slice(&self.fps.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.width.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.height.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.sample_rate.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8; HEADER_BYTES]) -> Self {
        let mut field = [0u8; 4];
        field.copy_from_slice(&bytes[0..4]);
        let fps = f32::from_le_bytes(field);
        field.copy_from_slice(&bytes[4..8]);
        let width = u32::from_le_bytes(field);
        field.copy_from_slice(&bytes[8..12]);
        let height = u32::from_le_bytes(field);
        field.copy_from_slice(&bytes[12..16]);
        let sample_rate = u32::from_le_bytes(field);
        Self {
            fps,
            width,
            height,
            sample_rate,
        }
    }

    /// Structural plausibility check: a header a write path could have
    /// produced.
    fn is_plausible(&self) -> bool {
        self.fps.is_finite()
            && self.fps > 0.0
            && self.fps <= MAX_FPS
            && (1..=MAX_DIMENSION).contains(&self.width)
            && (1..=MAX_DIMENSION).contains(&self.height)
            && self.sample_rate <= MAX_SAMPLE_RATE
    }
}

/// The type tag of one cache record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Video,
    Audio,
}

/// One typed record read back from a cache file.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    pub kind: RecordKind,
    pub payload: Vec<u8>,
}

impl CacheRecord {
    /// Reassembles the frame this record was serialized from.
    pub fn into_frame(self, header: &CacheHeader) -> Frame {
        match self.kind {
            RecordKind::Video => Frame::video(self.payload, header.width, header.height),
            RecordKind::Audio => {
                let samples = self
                    .payload
                    .chunks_exact(4)
                    .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .collect();
                Frame::audio(samples)
            }
        }
    }
}

/// Sequential cache writer.
///
/// The header is persisted at creation and never rewritten. Frames must be
/// appended in production order. The descriptor is owned by one thread for
/// its whole lifetime.
pub struct CacheWriter {
    out: BufWriter<File>,
    header: CacheHeader,
    records: u64,
    finalized: bool,
}

impl CacheWriter {
    /// Opens a new cache file and persists the header immediately.
    pub fn create<P: AsRef<Path>>(path: P, header: CacheHeader) -> Result<Self, CacheError> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(&header.to_bytes())?;
        Ok(Self {
            out,
            header,
            records: 0,
            finalized: false,
        })
    }

    pub fn header(&self) -> &CacheHeader {
        &self.header
    }

    /// Number of records appended so far.
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Serializes one record at the tail of the file.
    ///
    /// Validates the payload length against the header before touching the
    /// file, so a length bug cannot leave a half-written record behind.
    pub fn append(&mut self, frame: &Frame) -> Result<(), CacheError> {
        match frame {
            Frame::Video { buffer, .. } => {
                if buffer.len() != self.header.video_payload_len() {
                    return Err(CacheError::VideoLengthMismatch {
                        len: buffer.len() as u32,
                        width: self.header.width,
                        height: self.header.height,
                    });
                }
                self.out.write_all(&[TAG_VIDEO])?;
                self.out.write_all(&(buffer.len() as u32).to_le_bytes())?;
                self.out.write_all(buffer)?;
            }
            Frame::Audio { samples } => {
                let len = samples.len() * std::mem::size_of::<f32>();
                if len % SAMPLE_FRAME_BYTES != 0 {
                    return Err(CacheError::AudioLengthMismatch(len as u32));
                }
                self.out.write_all(&[TAG_AUDIO])?;
                self.out.write_all(&(len as u32).to_le_bytes())?;
                for sample in samples {
                    self.out.write_all(&sample.to_le_bytes())?;
                }
            }
        }
        self.records += 1;
        Ok(())
    }

    /// Flushes and closes the file, returning its final size in bytes.
    pub fn finalize(mut self) -> Result<u64, CacheError> {
        self.out.flush()?;
        self.finalized = true;
        let size = self.out.get_ref().metadata()?.len();
        Ok(size)
    }
}

impl Drop for CacheWriter {
    fn drop(&mut self) {
        if !self.finalized {
            let _ = self.out.flush();
        }
    }
}

/// Sequential, restartable cache reader.
///
/// Parses the header at open and then yields records lazily, one per call,
/// until end-of-file. Malformed trailing data surfaces as
/// [`CacheError::Truncated`] and stops iteration.
pub struct CacheReader {
    input: BufReader<File>,
    header: CacheHeader,
}

impl CacheReader {
    /// Opens a cache file and parses its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let file = File::open(path)?;
        let mut input = BufReader::new(file);
        let mut bytes = [0u8; HEADER_BYTES];
        input
            .read_exact(&mut bytes)
            .map_err(|_| CacheError::InvalidHeader)?;
        let header = CacheHeader::from_bytes(&bytes);
        if !header.is_plausible() {
            return Err(CacheError::InvalidHeader);
        }
        Ok(Self { input, header })
    }

    pub fn header(&self) -> &CacheHeader {
        &self.header
    }

    /// Reads the next record, or `Ok(None)` at a clean end-of-file.
    pub fn next_record(&mut self) -> Result<Option<CacheRecord>, CacheError> {
        let mut tag = [0u8; 1];
        if self.input.read(&mut tag)? == 0 {
            return Ok(None);
        }
        let kind = match tag[0] {
            TAG_VIDEO => RecordKind::Video,
            TAG_AUDIO => RecordKind::Audio,
            other => return Err(CacheError::UnknownTag(other)),
        };

        let mut len_bytes = [0u8; 4];
        read_fully(&mut self.input, &mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes);
        match kind {
            RecordKind::Video => {
                if len as usize != self.header.video_payload_len() {
                    return Err(CacheError::VideoLengthMismatch {
                        len,
                        width: self.header.width,
                        height: self.header.height,
                    });
                }
            }
            RecordKind::Audio => {
                if len as usize % SAMPLE_FRAME_BYTES != 0 {
                    return Err(CacheError::AudioLengthMismatch(len));
                }
            }
        }

        let mut payload = vec![0u8; len as usize];
        read_fully(&mut self.input, &mut payload)?;
        Ok(Some(CacheRecord { kind, payload }))
    }

    /// Repositions the reader at the first record.
    pub fn rewind(&mut self) -> Result<(), CacheError> {
        self.input.seek(SeekFrom::Start(HEADER_BYTES as u64))?;
        Ok(())
    }
}

impl Iterator for CacheReader {
    type Item = Result<CacheRecord, CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn read_fully<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<(), CacheError> {
    input.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CacheError::Truncated
        } else {
            CacheError::Io(err)
        }
    })
}

/// Structural probe used to route between cached-replay and live decode.
///
/// Checks the reserved extension and a plausible header (and, when the
/// file carries records, a known leading tag) without decoding any frame.
/// An arbitrary file merely bearing the extension fails the header check.
pub fn looks_like_cache<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if path.extension().and_then(|ext| ext.to_str()) != Some(CACHE_EXTENSION) {
        return false;
    }
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut input = BufReader::new(file);
    let mut bytes = [0u8; HEADER_BYTES];
    if input.read_exact(&mut bytes).is_err() {
        return false;
    }
    if !CacheHeader::from_bytes(&bytes).is_plausible() {
        return false;
    }
    let mut tag = [0u8; 1];
    match input.read(&mut tag) {
        Ok(0) => true,
        Ok(_) => tag[0] == TAG_VIDEO || tag[0] == TAG_AUDIO,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_header() -> CacheHeader {
        CacheHeader {
            fps: 24.0,
            width: 80,
            height: 40,
            sample_rate: 44_100,
        }
    }

    #[test]
    fn header_survives_byte_roundtrip() {
        let header = sample_header();
        let restored = CacheHeader::from_bytes(&header.to_bytes());
        assert_eq!(restored, header);
    }

    #[test]
    fn header_layout_is_little_endian() {
        let header = CacheHeader {
            fps: 10.0,
            width: 4,
            height: 2,
            sample_rate: 0,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], &10.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &[4, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn roundtrip_preserves_header_and_payloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.apcache");

        let header = sample_header();
        let video: Vec<u8> = (0..3200u32).map(|i| (i % 251) as u8).collect();
        let audio: Vec<f32> = (0..64).map(|i| i as f32 / 64.0).collect();

        let mut writer = CacheWriter::create(&path, header).unwrap();
        writer.append(&Frame::video(video.clone(), 80, 40)).unwrap();
        writer.append(&Frame::audio(audio.clone())).unwrap();
        writer.finalize().unwrap();

        let mut reader = CacheReader::open(&path).unwrap();
        assert_eq!(*reader.header(), header);

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.kind, RecordKind::Video);
        assert_eq!(first.payload, video);

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.kind, RecordKind::Audio);
        assert_eq!(
            second.into_frame(&header),
            Frame::Audio { samples: audio }
        );

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn rewind_restarts_from_first_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.apcache");
        let header = CacheHeader {
            fps: 10.0,
            width: 2,
            height: 2,
            sample_rate: 0,
        };

        let mut writer = CacheWriter::create(&path, header).unwrap();
        writer.append(&Frame::video(vec![1, 2, 3, 4], 2, 2)).unwrap();
        writer.finalize().unwrap();

        let mut reader = CacheReader::open(&path).unwrap();
        let first = reader.next_record().unwrap().unwrap();
        assert!(reader.next_record().unwrap().is_none());
        reader.rewind().unwrap();
        let again = reader.next_record().unwrap().unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn video_length_mismatch_is_rejected_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.apcache");
        let mut writer = CacheWriter::create(&path, sample_header()).unwrap();
        let err = writer.append(&Frame::video(vec![0; 7], 80, 40)).unwrap_err();
        assert!(matches!(err, CacheError::VideoLengthMismatch { .. }));
    }

    #[test]
    fn truncated_record_stops_iteration_with_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.apcache");
        let header = CacheHeader {
            fps: 10.0,
            width: 4,
            height: 2,
            sample_rate: 0,
        };
        let mut writer = CacheWriter::create(&path, header).unwrap();
        writer.append(&Frame::video(vec![0; 8], 4, 2)).unwrap();
        writer.finalize().unwrap();

        // Chop the payload of the only record short.
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut reader = CacheReader::open(&path).unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(matches!(err, CacheError::Truncated));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.apcache");
        let header = CacheHeader {
            fps: 10.0,
            width: 4,
            height: 2,
            sample_rate: 0,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.push(9);
        std::fs::write(&path, &bytes).unwrap();

        let mut reader = CacheReader::open(&path).unwrap();
        assert!(matches!(
            reader.next_record().unwrap_err(),
            CacheError::UnknownTag(9)
        ));
    }

    #[test]
    fn looks_like_cache_rejects_wrong_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, sample_header().to_bytes()).unwrap();
        assert!(!looks_like_cache(&path));
    }

    #[test]
    fn looks_like_cache_rejects_garbage_with_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.apcache");
        std::fs::write(&path, b"this is not a frame cache at all").unwrap();
        assert!(!looks_like_cache(&path));
    }

    #[test]
    fn looks_like_cache_rejects_short_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.apcache");
        std::fs::write(&path, [0u8; 7]).unwrap();
        assert!(!looks_like_cache(&path));
    }

    #[test]
    fn looks_like_cache_accepts_write_path_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("real.apcache");
        let header = CacheHeader {
            fps: 10.0,
            width: 4,
            height: 2,
            sample_rate: 0,
        };
        let mut writer = CacheWriter::create(&path, header).unwrap();
        writer.append(&Frame::video(vec![0; 8], 4, 2)).unwrap();
        writer.finalize().unwrap();
        assert!(looks_like_cache(&path));
    }

    #[test]
    fn audio_less_header_reports_no_audio() {
        let header = CacheHeader {
            fps: 10.0,
            width: 4,
            height: 2,
            sample_rate: 0,
        };
        assert!(!header.has_audio());
        assert!(sample_header().has_audio());
    }
}
