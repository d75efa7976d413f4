//! Validating builder for [`AudioContainer`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::container::{
    AudioContainer, AudioData, AudioFormatParams, DataRegion, MetadataField, MetadataPlacement,
    SampleSource, checked_u32,
};
use crate::dprintln;
use crate::error::{Result, WavError};
use crate::layout::{ChunkSignature, CodecId, InfoId};
use crate::scanner::ScanReport;

/// Collects container fields and checks them once in [`build`](Self::build).
///
/// `block_align` and `byte_rate` are derived when left at zero; values the
/// caller set are kept as they are.
#[derive(Debug, Clone, Default)]
pub struct AudioContainerBuilder {
    format: AudioFormatParams,
    samples: Option<Vec<u8>>,
    raw: Option<AudioData>,
    source_path: Option<PathBuf>,
    data_region: Option<DataRegion>,
    metadata: Vec<MetadataField>,
    placement: MetadataPlacement,
    reported_file_size: Option<u32>,
}

impl AudioContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a raw record, e.g. one captured from an input device.
    pub fn from_audio_data(data: AudioData) -> Self {
        Self {
            raw: Some(data),
            ..Self::default()
        }
    }

    /// Starts from an existing container so a few fields can be changed.
    ///
    /// Samples held in memory are copied; samples that live in a file keep
    /// pointing at it.
    pub fn from_container(container: &AudioContainer) -> Self {
        let mut builder = Self {
            format: container.format,
            metadata: container.metadata.clone(),
            placement: container.placement,
            reported_file_size: container.reported_file_size,
            ..Self::default()
        };
        match &container.source {
            SampleSource::Empty => {}
            SampleSource::Resident(samples) => builder.samples = Some(samples.clone()),
            SampleSource::File { path, region, .. } => {
                builder.source_path = Some(path.clone());
                builder.data_region = Some(*region);
            }
        }
        builder
    }

    /// Starts from a scan of the file at `path`.
    pub fn from_scan(report: &ScanReport, path: impl Into<PathBuf>) -> Self {
        Self {
            format: report.format.unwrap_or_default(),
            source_path: Some(path.into()),
            data_region: report.data,
            metadata: report.metadata.clone(),
            placement: report.metadata_placement,
            reported_file_size: Some(report.file_size),
            ..Self::default()
        }
    }

    pub fn codec_id(mut self, codec_id: u16) -> Self {
        self.format.codec_id = codec_id;
        self
    }

    pub fn codec(self, codec: CodecId) -> Self {
        self.codec_id(codec.id())
    }

    pub fn channel_count(mut self, channel_count: u16) -> Self {
        self.format.channel_count = channel_count;
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.format.sample_rate = sample_rate;
        self
    }

    pub fn byte_rate(mut self, byte_rate: u32) -> Self {
        self.format.byte_rate = byte_rate;
        self
    }

    pub fn block_align(mut self, block_align: u16) -> Self {
        self.format.block_align = block_align;
        self
    }

    pub fn bits_per_sample(mut self, bits_per_sample: u16) -> Self {
        self.format.bits_per_sample = bits_per_sample;
        self
    }

    pub fn format(mut self, format: AudioFormatParams) -> Self {
        self.format = format;
        self
    }

    /// Sample bytes held in memory. Takes precedence over a data region.
    pub fn samples(mut self, samples: Vec<u8>) -> Self {
        self.samples = Some(samples);
        self
    }

    pub fn source_path(mut self, path: impl AsRef<Path>) -> Self {
        self.source_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn data_region(mut self, region: DataRegion) -> Self {
        self.data_region = Some(region);
        self
    }

    pub fn reported_file_size(mut self, size: u32) -> Self {
        self.reported_file_size = Some(size);
        self
    }

    /// Appends a field, keeping any earlier field with the same id.
    pub fn metadata_field(mut self, field: MetadataField) -> Self {
        self.metadata.push(field);
        self
    }

    pub fn info(self, id: InfoId, text: impl Into<String>) -> Self {
        self.metadata_field(MetadataField::new(id, text))
    }

    /// Replaces the text of the first field with this id, or appends one.
    pub fn set_info_field(
        mut self,
        field_id: impl Into<ChunkSignature>,
        text: impl Into<String>,
    ) -> Self {
        let field_id = field_id.into();
        let text = text.into();
        match self.metadata.iter_mut().find(|f| f.field_id == field_id) {
            Some(field) => field.text = text,
            None => self.metadata.push(MetadataField::new(field_id, text)),
        }
        self
    }

    pub fn metadata(mut self, fields: Vec<MetadataField>) -> Self {
        self.metadata = fields;
        self
    }

    pub fn metadata_placement(mut self, placement: MetadataPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn build(self) -> Result<AudioContainer> {
        let (mut format, samples) = match self.raw {
            Some(raw) if raw.is_complete() => {
                let mut params = raw.params;
                if params.codec_id == 0 {
                    params.codec_id = CodecId::Pcm.id();
                }
                (params, Some(raw.samples))
            }
            _ => (self.format, self.samples),
        };

        if !format.is_complete() {
            return Err(WavError::IncompleteFormatParameters);
        }

        if format.block_align == 0 {
            format.block_align = format.derived_block_align();
            dprintln!("Derived block align: {}", format.block_align);
        }
        if format.byte_rate == 0 {
            format.byte_rate = format.derived_byte_rate();
            dprintln!("Derived byte rate: {}", format.byte_rate);
        }

        for field in &self.metadata {
            checked_u32(field.text.len() as u64 + 1, "INFO field")?;
        }

        let source = match (samples, self.data_region, self.source_path) {
            (Some(samples), _, _) => {
                checked_u32(samples.len() as u64, "data chunk")?;
                SampleSource::Resident(samples)
            }
            (None, Some(region), Some(path)) => SampleSource::File {
                path,
                region,
                cache: OnceLock::new(),
            },
            (None, Some(_), None) => return Err(WavError::MissingSourcePath),
            (None, None, _) => SampleSource::Empty,
        };

        Ok(AudioContainer {
            format,
            source,
            metadata: self.metadata,
            placement: self.placement,
            reported_file_size: self.reported_file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_builder() -> AudioContainerBuilder {
        AudioContainerBuilder::new()
            .codec(CodecId::Pcm)
            .channel_count(2)
            .sample_rate(48000)
            .bits_per_sample(24)
    }

    #[test]
    fn test_derives_block_align_and_byte_rate() {
        let container = pcm_builder().samples(vec![0; 12]).build().unwrap();
        assert_eq!(container.block_align(), 6);
        assert_eq!(container.byte_rate(), 288000);
        assert_eq!(container.data_size(), 12);
    }

    #[test]
    fn test_keeps_caller_values() {
        let container = pcm_builder()
            .block_align(8)
            .byte_rate(1234)
            .build()
            .unwrap();
        assert_eq!(container.block_align(), 8);
        assert_eq!(container.byte_rate(), 1234);
    }

    #[test]
    fn test_incomplete_format() {
        for builder in [
            AudioContainerBuilder::new(),
            pcm_builder().channel_count(0),
            pcm_builder().sample_rate(0),
            pcm_builder().bits_per_sample(0),
            pcm_builder().codec_id(0),
        ] {
            assert!(matches!(
                builder.build(),
                Err(WavError::IncompleteFormatParameters)
            ));
        }
    }

    #[test]
    fn test_region_needs_path() {
        let region = DataRegion { offset: 36, size: 4 };
        assert!(matches!(
            pcm_builder().data_region(region).build(),
            Err(WavError::MissingSourcePath)
        ));

        let container = pcm_builder()
            .data_region(region)
            .source_path("in.wav")
            .build()
            .unwrap();
        assert_eq!(container.data_region(), Some(region));
        assert_eq!(container.source_path(), Some(Path::new("in.wav")));
    }

    #[test]
    fn test_from_audio_data() {
        let params = AudioFormatParams {
            channel_count: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            ..AudioFormatParams::default()
        };
        let container = AudioContainerBuilder::from_audio_data(AudioData::new(params, vec![1, 2]))
            .build()
            .unwrap();
        assert_eq!(container.codec_id(), 1);
        assert_eq!(container.block_align(), 2);
        assert_eq!(container.byte_rate(), 16000);
        assert_eq!(container.sample_bytes().unwrap(), &[1, 2]);

        // An empty record falls back to the builder's own fields
        let empty = AudioData::new(params, Vec::new());
        assert!(AudioContainerBuilder::from_audio_data(empty).build().is_err());
    }

    #[test]
    fn test_set_info_field_replaces_first() {
        let container = pcm_builder()
            .info(InfoId::Inam, "Old")
            .info(InfoId::Iart, "Artist")
            .set_info_field(InfoId::Inam, "New")
            .set_info_field(InfoId::Icmt, "Comment")
            .build()
            .unwrap();
        assert_eq!(container.info_field(InfoId::Inam), Some("New"));
        assert_eq!(container.metadata().len(), 3);
        assert_eq!(container.metadata()[2].field_id, InfoId::Icmt.signature());
    }

    #[test]
    fn test_from_container_keeps_fields() {
        let original = pcm_builder()
            .samples(vec![1; 6])
            .info(InfoId::Inam, "Song")
            .metadata_placement(MetadataPlacement::BeforeData)
            .build()
            .unwrap();
        let copy = AudioContainerBuilder::from_container(&original)
            .sample_rate(44100)
            .build()
            .unwrap();
        assert_eq!(copy.sample_rate(), 44100);
        assert_eq!(copy.bits_per_sample(), 24);
        assert_eq!(copy.metadata(), original.metadata());
        assert_eq!(copy.metadata_placement(), MetadataPlacement::BeforeData);
        assert_eq!(copy.sample_bytes().unwrap(), &[1; 6]);
    }
}
