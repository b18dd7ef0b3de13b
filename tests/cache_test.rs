//! Integration tests for the on-disk frame cache.

use asciiplay::{looks_like_cache, CacheHeader, CacheReader, CacheWriter, Frame};

#[test]
fn roundtrip_restores_header_and_payload_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.apcache");

    let header = CacheHeader {
        fps: 24.0,
        width: 80,
        height: 40,
        sample_rate: 44_100,
    };
    let video: Vec<u8> = (0..3200u32).map(|i| (i * 7 % 256) as u8).collect();
    let audio: Vec<f32> = (0..512).map(|i| (i as f32 / 512.0) - 0.5).collect();

    let mut writer = CacheWriter::create(&path, header).unwrap();
    writer.append(&Frame::video(video.clone(), 80, 40)).unwrap();
    writer.append(&Frame::audio(audio.clone())).unwrap();
    writer.finalize().unwrap();

    let mut reader = CacheReader::open(&path).unwrap();
    let restored = *reader.header();
    assert_eq!(restored.fps, 24.0);
    assert_eq!(restored.width, 80);
    assert_eq!(restored.height, 40);
    assert_eq!(restored.sample_rate, 44_100);

    let first = reader.next_record().unwrap().unwrap();
    assert_eq!(first.payload, video);

    let second = reader.next_record().unwrap().unwrap();
    assert_eq!(
        second.into_frame(&restored),
        Frame::Audio { samples: audio }
    );

    assert!(reader.next_record().unwrap().is_none());
}

#[test]
fn audio_less_cache_has_exact_wire_layout() {
    // Two 4x2 video frames at 10 fps, no audio: a 16-byte header followed
    // by two records of 1 (tag) + 4 (length) + 8 (payload) bytes.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.apcache");

    let header = CacheHeader {
        fps: 10.0,
        width: 4,
        height: 2,
        sample_rate: 0,
    };
    let mut writer = CacheWriter::create(&path, header).unwrap();
    writer
        .append(&Frame::video(vec![0, 32, 64, 96, 128, 160, 192, 255], 4, 2))
        .unwrap();
    writer
        .append(&Frame::video(vec![255, 192, 160, 128, 96, 64, 32, 0], 4, 2))
        .unwrap();
    writer.finalize().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 16 + 2 * (1 + 4 + 8));

    assert_eq!(&bytes[0..4], &10.0f32.to_le_bytes());
    assert_eq!(&bytes[4..8], &4u32.to_le_bytes());
    assert_eq!(&bytes[8..12], &2u32.to_le_bytes());
    assert_eq!(&bytes[12..16], &0u32.to_le_bytes());

    // First record: video tag, 8-byte payload.
    assert_eq!(bytes[16], 0);
    assert_eq!(&bytes[17..21], &8u32.to_le_bytes());
    assert_eq!(&bytes[21..29], &[0, 32, 64, 96, 128, 160, 192, 255]);
    // Second record follows immediately.
    assert_eq!(bytes[29], 0);

    // And the reader sees exactly two video records, zero audio records.
    let reader = CacheReader::open(&path).unwrap();
    let records: Vec<_> = reader.map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.payload.len() == 8));
}

#[test]
fn probe_accepts_only_write_path_output() {
    let dir = tempfile::tempdir().unwrap();

    // A real cache passes.
    let real = dir.path().join("real.apcache");
    let header = CacheHeader {
        fps: 30.0,
        width: 8,
        height: 4,
        sample_rate: 48_000,
    };
    let mut writer = CacheWriter::create(&real, header).unwrap();
    writer.append(&Frame::video(vec![0; 32], 8, 4)).unwrap();
    writer.finalize().unwrap();
    assert!(looks_like_cache(&real));

    // An arbitrary file with the reserved extension does not.
    let fake = dir.path().join("fake.apcache");
    std::fs::write(&fake, b"definitely not a cache header, sorry").unwrap();
    assert!(!looks_like_cache(&fake));

    // Neither does a valid cache under the wrong extension.
    let wrong_ext = dir.path().join("real.mp4");
    std::fs::copy(&real, &wrong_ext).unwrap();
    assert!(!looks_like_cache(&wrong_ext));

    // Nor a missing file.
    assert!(!looks_like_cache(dir.path().join("absent.apcache")));
}

#[test]
fn truncated_tail_is_reported_and_stops_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.apcache");

    let header = CacheHeader {
        fps: 12.0,
        width: 4,
        height: 4,
        sample_rate: 0,
    };
    let mut writer = CacheWriter::create(&path, header).unwrap();
    writer.append(&Frame::video(vec![1; 16], 4, 4)).unwrap();
    writer.append(&Frame::video(vec![2; 16], 4, 4)).unwrap();
    writer.finalize().unwrap();

    // Cut into the second record's payload.
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();

    let mut reader = CacheReader::open(&path).unwrap();
    assert!(reader.next_record().unwrap().is_some());
    assert!(reader.next_record().is_err());
}
