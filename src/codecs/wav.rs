use std::io::{self, Cursor};
use std::path::Path;

use crate::builder::AudioContainerBuilder;
use crate::container::AudioContainer;
use crate::dprintln;
use crate::error::{Result, WavError};
use crate::layout::{Field, HEADER_SIZE, RIFF, WAVE};
use crate::reader::WindowReader;
use crate::scanner::{ChunkScanner, ScanOptions, scan_file};
use crate::writer;
use crate::Codec;

#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec {
    options: ScanOptions,
}

impl WavCodec {
    pub fn with_options(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }
}

impl Codec for WavCodec {
    fn file_extension(&self) -> &'static str {
        "wav"
    }

    fn validate_file_format(&self, data: &[u8]) -> Result<()> {
        if !RIFF.matches_at(data, Field::ContainerRiff.offset() as usize) {
            return Err(WavError::MissingRiffContainer);
        }
        if data.len() < HEADER_SIZE || !WAVE.matches_at(data, Field::FormatTag.offset() as usize) {
            return Err(WavError::NotAWaveFile);
        }
        Ok(())
    }

    fn encode(&self, container: &AudioContainer) -> Result<Vec<u8>> {
        writer::encode(container)
    }

    fn encode_file(&self, container: &AudioContainer, file_path: &Path) -> Result<()> {
        writer::write_file(container, file_path)?;
        Ok(())
    }

    /// Samples are copied out of `input`, so the result does not borrow it.
    fn decode(&self, input: &[u8]) -> Result<AudioContainer> {
        self.validate_file_format(input)?;

        let reader = WindowReader::from_reader(Cursor::new(input), input.len() as u64);
        let report = ChunkScanner::new(reader, self.options).scan()?;
        report.check_chunks()?;

        let mut builder = AudioContainerBuilder::new()
            .metadata(report.metadata.clone())
            .metadata_placement(report.metadata_placement)
            .reported_file_size(report.file_size);
        if let Some(format) = report.format {
            builder = builder.format(format);
        }
        if let Some(region) = report.data {
            let start = region.samples_start() as usize;
            let end = region.samples_end() as usize;
            let samples = input.get(start..end).ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "data chunk runs past end of input")
            })?;
            builder = builder.samples(samples.to_vec());
        }
        builder.build()
    }

    /// Sample bytes stay in the file until first accessed.
    fn decode_file(&self, file_path: &Path) -> Result<AudioContainer> {
        dprintln!("Decoding {}", file_path.display());
        let report = scan_file(file_path, self.options)?;
        report.check_chunks()?;
        AudioContainerBuilder::from_scan(&report, file_path).build()
    }
}
