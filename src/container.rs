//! In-memory model of a WAVE file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use memmap2::MmapOptions;

use crate::dprintln;
use crate::error::Result;
use crate::layout::{
    ChunkSignature, CodecId, DATA_HEADER_LEN, INFO_FIELD_HEADER_LEN, InfoId, LIST_HEADER_LEN,
    canonical_header_len,
};

// Regions at least this large are copied out of a memory map instead of read
const MMAP_THRESHOLD: u32 = 100 * 1024 * 1024;

/// Format parameters carried by the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioFormatParams {
    pub codec_id: u16,
    pub channel_count: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl AudioFormatParams {
    pub fn codec(&self) -> Option<CodecId> {
        CodecId::from_u16(self.codec_id)
    }

    /// True when every field the builder cannot derive is set.
    pub fn is_complete(&self) -> bool {
        self.channel_count != 0
            && self.sample_rate != 0
            && self.bits_per_sample != 0
            && self.codec_id != 0
    }

    /// `bits_per_sample / 8 * channel_count`
    pub fn derived_block_align(&self) -> u16 {
        let align = u32::from(self.bits_per_sample / 8) * u32::from(self.channel_count);
        u16::try_from(align).unwrap_or(u16::MAX)
    }

    /// `sample_rate * block_align`, using the derived alignment when unset.
    pub fn derived_byte_rate(&self) -> u32 {
        let align = if self.block_align != 0 {
            self.block_align
        } else {
            self.derived_block_align()
        };
        self.sample_rate.saturating_mul(u32::from(align))
    }

    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }
}

/// Location of the sample bytes inside the source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRegion {
    /// Absolute offset of the `data` signature.
    pub offset: u64,
    /// Number of sample bytes declared by the chunk.
    pub size: u32,
}

impl DataRegion {
    /// Absolute offset of the first sample byte.
    pub fn samples_start(&self) -> u64 {
        self.offset + DATA_HEADER_LEN as u64
    }

    pub fn samples_end(&self) -> u64 {
        self.samples_start() + u64::from(self.size)
    }
}

/// A single `INFO` entry such as a title or an artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataField {
    pub field_id: ChunkSignature,
    pub text: String,
}

impl MetadataField {
    pub fn new(field_id: impl Into<ChunkSignature>, text: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            text: text.into(),
        }
    }

    /// Parses the id from text, e.g. `"INAM"`.
    pub fn parse(field_id: &str, text: impl Into<String>) -> Result<Self> {
        Ok(Self::new(ChunkSignature::new(field_id)?, text))
    }

    /// Id plus NUL terminated text: `4 + len(text) + 1`. Saturates at `u32::MAX`.
    pub fn size(&self) -> u32 {
        saturating_u32(4 + self.text.len() as u64 + 1)
    }

    /// Bytes taken on disk, including the length word and the pad byte.
    pub fn encoded_len(&self) -> u64 {
        let payload = self.text.len() as u64 + 1;
        INFO_FIELD_HEADER_LEN as u64 + payload + payload % 2
    }

    pub fn info_id(&self) -> Option<InfoId> {
        InfoId::from_signature(&self.field_id)
    }
}

/// Total on-disk length of a `LIST`/`INFO` chunk holding `fields`.
pub fn info_list_len(fields: &[MetadataField]) -> u64 {
    LIST_HEADER_LEN as u64 + fields.iter().map(MetadataField::encoded_len).sum::<u64>()
}

/// Converts a length to a 32-bit RIFF size field.
///
/// RIFF cannot describe more than `u32::MAX` bytes, so larger values are an
/// `InvalidInput` error rather than a wrapped size.
pub fn checked_u32(len: u64, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{what} of {len} bytes does not fit a 32-bit RIFF size field"),
        )
        .into()
    })
}

fn saturating_u32(len: u64) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Where the `LIST`/`INFO` chunk sits relative to `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataPlacement {
    BeforeData,
    #[default]
    AfterData,
}

/// Format parameters together with the sample bytes they describe.
///
/// This is the record audio devices consume and produce.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioData {
    pub params: AudioFormatParams,
    pub samples: Vec<u8>,
}

impl AudioData {
    pub fn new(params: AudioFormatParams, samples: Vec<u8>) -> Self {
        Self { params, samples }
    }

    pub fn is_data_correct(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Samples are present and the format can be derived from the record.
    pub fn is_complete(&self) -> bool {
        self.is_data_correct()
            && self.params.channel_count != 0
            && self.params.sample_rate != 0
            && self.params.bits_per_sample != 0
    }

    /// Saturates at `u32::MAX`.
    pub fn data_size(&self) -> u32 {
        saturating_u32(self.samples.len() as u64)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum SampleSource {
    Empty,
    Resident(Vec<u8>),
    File {
        path: PathBuf,
        region: DataRegion,
        cache: OnceLock<Vec<u8>>,
    },
}

/// An immutable WAVE file: format, sample data and `INFO` metadata.
///
/// Instances come from [`crate::AudioContainerBuilder`]. Samples that live in
/// a file are read on first access and cached for the life of the value.
#[derive(Debug, Clone)]
pub struct AudioContainer {
    pub(crate) format: AudioFormatParams,
    pub(crate) source: SampleSource,
    pub(crate) metadata: Vec<MetadataField>,
    pub(crate) placement: MetadataPlacement,
    pub(crate) reported_file_size: Option<u32>,
}

impl AudioContainer {
    pub fn format(&self) -> &AudioFormatParams {
        &self.format
    }

    pub fn codec_id(&self) -> u16 {
        self.format.codec_id
    }

    pub fn channel_count(&self) -> u16 {
        self.format.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    pub fn byte_rate(&self) -> u32 {
        self.format.byte_rate
    }

    pub fn block_align(&self) -> u16 {
        self.format.block_align
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.format.bits_per_sample
    }

    pub fn source_path(&self) -> Option<&Path> {
        match &self.source {
            SampleSource::File { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn data_region(&self) -> Option<DataRegion> {
        match &self.source {
            SampleSource::File { region, .. } => Some(*region),
            _ => None,
        }
    }

    /// Number of sample bytes, known without touching the source file.
    pub fn data_size(&self) -> u32 {
        match &self.source {
            SampleSource::Empty => 0,
            SampleSource::Resident(samples) => saturating_u32(samples.len() as u64),
            SampleSource::File { region, .. } => region.size,
        }
    }

    /// Value of the RIFF size field in the file this container was read from.
    pub fn reported_file_size(&self) -> Option<u32> {
        self.reported_file_size
    }

    /// `INFO` fields in insertion order.
    pub fn metadata(&self) -> &[MetadataField] {
        &self.metadata
    }

    pub fn metadata_placement(&self) -> MetadataPlacement {
        self.placement
    }

    /// Text of the first `INFO` field with the given id.
    pub fn info_field(&self, field_id: impl Into<ChunkSignature>) -> Option<&str> {
        let field_id = field_id.into();
        self.metadata
            .iter()
            .find(|field| field.field_id == field_id)
            .map(|field| field.text.as_str())
    }

    /// Sample bytes, loading them from the source file on first use.
    pub fn sample_bytes(&self) -> Result<&[u8]> {
        match &self.source {
            SampleSource::Empty => Ok(&[]),
            SampleSource::Resident(samples) => Ok(samples),
            SampleSource::File {
                path,
                region,
                cache,
            } => {
                if let Some(samples) = cache.get() {
                    return Ok(samples);
                }
                let loaded = load_region(path, region)?;
                Ok(cache.get_or_init(|| loaded))
            }
        }
    }

    /// Full on-disk size of the canonical PCM rendition of this container.
    ///
    /// Only PCM has a canonical layout, so other codecs yield `None`.
    pub fn total_file_size(&self) -> Option<u64> {
        match self.format.codec() {
            Some(CodecId::Pcm) => Some(self.canonical_len()),
            _ => None,
        }
    }

    /// Bytes the writer emits: fixed header, samples (+pad) and the INFO list.
    pub(crate) fn canonical_len(&self) -> u64 {
        let data = u64::from(self.data_size());
        let mut total = u64::from(canonical_header_len()) + data + data % 2;
        if !self.metadata.is_empty() {
            total += info_list_len(&self.metadata);
        }
        total
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        let bytes_per_second = f64::from(self.format.channel_count)
            * f64::from(self.format.sample_rate)
            * f64::from(self.format.bits_per_sample / 8);
        if bytes_per_second == 0.0 {
            return 0.0;
        }
        f64::from(self.data_size()) / bytes_per_second
    }

    /// Sample bytes between two whole-second marks.
    pub fn bytes_time_interval(&self, start_sec: u32, stop_sec: u32) -> Result<&[u8]> {
        let samples = self.sample_bytes()?;
        let per_second = u64::from(self.format.channel_count)
            * u64::from(self.format.sample_rate)
            * u64::from(self.format.bits_per_sample / 8);
        let frame = u64::from(self.format.block_align.max(1));

        let clamp = |sec: u32| {
            let at = (u64::from(sec) * per_second).min(samples.len() as u64);
            (at - at % frame) as usize
        };
        let (start, stop) = (clamp(start_sec), clamp(stop_sec));
        if start >= stop {
            return Ok(&[]);
        }
        Ok(&samples[start..stop])
    }

    /// Format and samples as a standalone record.
    pub fn audio_data(&self) -> Result<AudioData> {
        Ok(AudioData::new(self.format, self.sample_bytes()?.to_vec()))
    }
}

fn load_region(path: &Path, region: &DataRegion) -> Result<Vec<u8>> {
    dprintln!(
        "Loading {} sample bytes at {} from {}",
        region.size,
        region.samples_start(),
        path.display()
    );
    let mut file = File::open(path)?;

    if region.size >= MMAP_THRESHOLD {
        let mapped = unsafe { MmapOptions::new().map(&file)? };
        let start = region.samples_start() as usize;
        let end = region.samples_end() as usize;
        return mapped.get(start..end).map(<[u8]>::to_vec).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "data chunk runs past end of file").into()
        });
    }

    file.seek(SeekFrom::Start(region.samples_start()))?;
    let mut samples = vec![0u8; region.size as usize];
    file.read_exact(&mut samples)?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_16() -> AudioFormatParams {
        AudioFormatParams {
            codec_id: 1,
            channel_count: 2,
            sample_rate: 44100,
            byte_rate: 176400,
            block_align: 4,
            bits_per_sample: 16,
        }
    }

    fn resident(samples: Vec<u8>) -> AudioContainer {
        AudioContainer {
            format: stereo_16(),
            source: SampleSource::Resident(samples),
            metadata: Vec::new(),
            placement: MetadataPlacement::AfterData,
            reported_file_size: None,
        }
    }

    #[test]
    fn test_metadata_field_size() {
        let field = MetadataField::new(InfoId::Inam, "Test");
        assert_eq!(field.size(), 9);
        // id + length word + "Test\0" + pad
        assert_eq!(field.encoded_len(), 14);
        assert_eq!(MetadataField::new(InfoId::Inam, "Tes").encoded_len(), 12);
        assert_eq!(field.info_id(), Some(InfoId::Inam));
    }

    #[test]
    fn test_derived_fields() {
        let params = AudioFormatParams {
            block_align: 0,
            byte_rate: 0,
            ..stereo_16()
        };
        assert_eq!(params.derived_block_align(), 4);
        assert_eq!(params.derived_byte_rate(), 176400);
    }

    #[test]
    fn test_total_file_size() {
        let mut container = resident(vec![0u8; 100]);
        assert_eq!(container.total_file_size(), Some(144));

        container.metadata.push(MetadataField::new(InfoId::Inam, "Test"));
        assert_eq!(container.total_file_size(), Some(144 + 12 + 14));

        container.format.codec_id = 6;
        assert_eq!(container.total_file_size(), None);
    }

    #[test]
    fn test_duration_and_interval() {
        // Two seconds of 16-bit stereo at 44.1 kHz
        let container = resident((0..352800u32).map(|i| i as u8).collect());
        assert!((container.duration_secs() - 2.0).abs() < f64::EPSILON);

        let second = container.bytes_time_interval(1, 2).unwrap();
        assert_eq!(second.len(), 176400);
        assert_eq!(second[0], (176400u32 % 256) as u8);

        assert_eq!(container.bytes_time_interval(1, 10).unwrap().len(), 176400);
        assert!(container.bytes_time_interval(2, 1).unwrap().is_empty());
    }

    #[test]
    fn test_lazy_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.bin");
        let mut bytes = b"xxxxdata".to_vec();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[9, 8, 7, 6]);
        std::fs::write(&path, &bytes).unwrap();

        let container = AudioContainer {
            format: stereo_16(),
            source: SampleSource::File {
                path: path.clone(),
                region: DataRegion { offset: 4, size: 4 },
                cache: OnceLock::new(),
            },
            metadata: Vec::new(),
            placement: MetadataPlacement::AfterData,
            reported_file_size: None,
        };
        assert_eq!(container.data_size(), 4);
        assert_eq!(container.source_path(), Some(path.as_path()));
        assert_eq!(container.sample_bytes().unwrap(), &[9, 8, 7, 6]);

        // Cached: removing the file no longer matters
        std::fs::remove_file(&path).unwrap();
        assert_eq!(container.sample_bytes().unwrap(), &[9, 8, 7, 6]);
    }

    #[test]
    fn test_truncated_region_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, b"xxxxdata\x10\x00\x00\x00ab").unwrap();

        let container = AudioContainer {
            format: stereo_16(),
            source: SampleSource::File {
                path,
                region: DataRegion { offset: 4, size: 16 },
                cache: OnceLock::new(),
            },
            metadata: Vec::new(),
            placement: MetadataPlacement::AfterData,
            reported_file_size: None,
        };
        assert!(matches!(
            container.sample_bytes(),
            Err(crate::error::WavError::Io(_))
        ));
    }

    #[test]
    fn test_checked_u32() {
        assert_eq!(checked_u32(u64::from(u32::MAX), "data").unwrap(), u32::MAX);
        assert!(matches!(
            checked_u32(u64::from(u32::MAX) + 1, "data"),
            Err(crate::error::WavError::Io(e)) if e.kind() == io::ErrorKind::InvalidInput
        ));
    }
}
