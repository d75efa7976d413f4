use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use wavcodex_lib::scanner::scan_file;
use wavcodex_lib::*;

fn canonical_stereo(samples: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_all(b"RIFF").unwrap();
    out.write_u32::<LittleEndian>(36 + samples.len() as u32).unwrap();
    out.write_all(b"WAVEfmt ").unwrap();
    out.write_u32::<LittleEndian>(16).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(2).unwrap();
    out.write_u32::<LittleEndian>(44100).unwrap();
    out.write_u32::<LittleEndian>(176400).unwrap();
    out.write_u16::<LittleEndian>(4).unwrap();
    out.write_u16::<LittleEndian>(16).unwrap();
    out.write_all(b"data").unwrap();
    out.write_u32::<LittleEndian>(samples.len() as u32).unwrap();
    out.write_all(samples).unwrap();
    out
}

fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn canonical_stereo_file_parses() {
    let dir = tempfile::tempdir().unwrap();
    let samples: Vec<u8> = (0..4000u32).map(|i| (i * 7) as u8).collect();
    let path = write_bytes(dir.path(), "stereo.wav", &canonical_stereo(&samples));

    let container = read_wav(&path).unwrap();
    assert_eq!(container.codec_id(), 1);
    assert_eq!(container.channel_count(), 2);
    assert_eq!(container.sample_rate(), 44100);
    assert_eq!(container.byte_rate(), 176400);
    assert_eq!(container.block_align(), 4);
    assert_eq!(container.bits_per_sample(), 16);
    assert_eq!(container.data_size(), 4000);
    assert_eq!(container.reported_file_size(), Some(4036));
    assert_eq!(container.sample_bytes().unwrap(), &samples[..]);
    assert!(container.metadata().is_empty());
}

#[test]
fn write_then_parse_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let samples: Vec<u8> = (0..=254u8).collect();
    let original = AudioContainerBuilder::new()
        .codec(CodecId::Pcm)
        .channel_count(1)
        .sample_rate(11025)
        .bits_per_sample(8)
        .samples(samples.clone())
        .info(InfoId::Inam, "Title")
        .info(InfoId::Iart, "Artist")
        .metadata_field(MetadataField::parse("ZZZZ", "custom").unwrap())
        .build()
        .unwrap();

    for placement in [MetadataPlacement::AfterData, MetadataPlacement::BeforeData] {
        let container = AudioContainerBuilder::from_container(&original)
            .metadata_placement(placement)
            .build()
            .unwrap();
        let path = dir.path().join("round.wav");
        let written = write_wav(&container, &path).unwrap();
        assert_eq!(Some(written), container.total_file_size());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);

        let parsed = read_wav(&path).unwrap();
        assert_eq!(parsed.format(), container.format());
        assert_eq!(parsed.metadata(), container.metadata());
        assert_eq!(parsed.metadata_placement(), placement);
        assert_eq!(parsed.sample_bytes().unwrap(), &samples[..]);
    }
}

#[test]
fn info_field_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bytes(dir.path(), "in.wav", &canonical_stereo(&[0u8; 16]));

    let tagged = AudioContainerBuilder::from_container(&read_wav(&path).unwrap())
        .metadata_field(MetadataField::parse("INAM", "Test").unwrap())
        .build()
        .unwrap();
    let out = dir.path().join("out.wav");
    write_wav(&tagged, &out).unwrap();

    let parsed = read_wav(&out).unwrap();
    assert_eq!(parsed.metadata(), &[MetadataField::new(InfoId::Inam, "Test")]);
    assert_eq!(parsed.metadata()[0].size(), 9);
}

#[test]
fn missing_riff_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = canonical_stereo(&[0u8; 8]);
    bytes[0..4].copy_from_slice(b"JUNK");
    let path = write_bytes(dir.path(), "bad.wav", &bytes);

    assert!(matches!(read_wav(&path), Err(WavError::MissingRiffContainer)));
}

#[test]
fn missing_fmt_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = canonical_stereo(&[0u8; 8]);
    bytes[12..16].copy_from_slice(b"JUNK");
    let path = write_bytes(dir.path(), "nofmt.wav", &bytes);

    assert!(matches!(read_wav(&path), Err(WavError::MissingFormatChunk)));
}

#[test]
fn missing_data_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = canonical_stereo(&[]);
    bytes[36..40].copy_from_slice(b"JUNK");
    bytes.extend_from_slice(&[0u8; 50_000]);
    let path = write_bytes(dir.path(), "nodata.wav", &bytes);

    assert!(matches!(read_wav(&path), Err(WavError::MissingDataChunk)));
}

#[test]
fn data_signature_split_across_windows() {
    let dir = tempfile::tempdir().unwrap();
    // A JUNK chunk of 8 + 18 bytes moves "data" to offset 62
    let mut bytes = canonical_stereo(&[]);
    bytes.truncate(36);
    bytes.write_all(b"JUNK").unwrap();
    bytes.write_u32::<LittleEndian>(18).unwrap();
    bytes.extend_from_slice(&[0u8; 18]);
    bytes.write_all(b"data").unwrap();
    bytes.write_u32::<LittleEndian>(24).unwrap();
    bytes.extend_from_slice(&[5u8; 24]);
    let path = write_bytes(dir.path(), "split.wav", &bytes);

    let options = ScanOptions::default().with_window_size(64);
    let report = scan_file(&path, options).unwrap();
    report.check_chunks().unwrap();
    assert_eq!(report.data, Some(DataRegion { offset: 62, size: 24 }));
    assert!(report.windows_read >= 2);

    let container = WavCodec::with_options(options).decode_file(&path).unwrap();
    assert_eq!(container.sample_bytes().unwrap(), &[5u8; 24]);
}

#[test]
fn trailing_info_after_large_data() {
    let dir = tempfile::tempdir().unwrap();
    let samples = vec![0x41u8; 100_000];
    let container = AudioContainerBuilder::new()
        .codec(CodecId::Pcm)
        .channel_count(2)
        .sample_rate(48000)
        .bits_per_sample(16)
        .samples(samples)
        .info(InfoId::Icmt, "tail")
        .build()
        .unwrap();
    let path = dir.path().join("tail.wav");
    write_wav(&container, &path).unwrap();

    let report = scan_file(&path, ScanOptions::default()).unwrap();
    assert_eq!(
        report.chunks,
        vec![ChunkKind::Format, ChunkKind::Data, ChunkKind::Info]
    );
    assert_eq!(report.metadata, vec![MetadataField::new(InfoId::Icmt, "tail")]);
    // The data region is skipped, not read window by window
    assert!(report.windows_read <= 3);
}

#[test]
fn builder_derives_block_align() {
    for (channels, bits) in [(1u16, 8u16), (2, 16), (6, 24), (8, 32)] {
        let container = AudioContainerBuilder::new()
            .codec(CodecId::Pcm)
            .channel_count(channels)
            .sample_rate(96000)
            .bits_per_sample(bits)
            .build()
            .unwrap();
        assert_eq!(container.block_align(), bits / 8 * channels);
        assert_eq!(
            container.byte_rate(),
            96000 * u32::from(container.block_align())
        );
    }
}
