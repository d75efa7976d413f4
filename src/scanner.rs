//! Streaming chunk scanner.
//!
//! RIFF does not fix the order of chunks, so instead of walking chunk headers
//! the scanner looks for the `fmt `, `data` and `LIST` signatures at every
//! byte of the current window. Windows come from a [`WindowReader`]; the
//! unconsumed tail of a window is carried into the next one, so a signature
//! or header split across a window edge is still seen in one piece. Sample
//! bytes are never scanned: a `data` match skips the reader straight past
//! the region.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::container::{AudioFormatParams, DataRegion, MetadataField, MetadataPlacement};
use crate::dprintln;
use crate::error::{Result, WavError};
use crate::layout::{
    ChunkSignature, DATA, DATA_HEADER_LEN, FMT, FMT_CHUNK_LEN, Field, HEADER_SIZE, INFO,
    INFO_FIELD_HEADER_LEN, LIST, LIST_HEADER_LEN, RIFF, WAVE, WAVE_BUFFER_SIZE,
};
use crate::reader::{WindowReader, read_u16_field, read_u32_field};

const SIGNATURE_LEN: usize = 4;

/// Tunables for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Bytes requested from the reader per window.
    pub window_size: usize,
    /// `LIST`/`INFO` chunks larger than this are skipped instead of decoded.
    pub max_info_list_size: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            window_size: WAVE_BUFFER_SIZE,
            max_info_list_size: 1024 * 1024,
        }
    }
}

impl ScanOptions {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    fn window(&self) -> usize {
        // The container header must fit in the first window
        self.window_size.max(HEADER_SIZE)
    }
}

/// Chunks the scanner reports, in the order it met them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Format,
    Data,
    Info,
}

/// Everything a scan found.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Value of the RIFF size field. Diagnostic only.
    pub file_size: u32,
    pub format: Option<AudioFormatParams>,
    pub data: Option<DataRegion>,
    pub metadata: Vec<MetadataField>,
    pub metadata_placement: MetadataPlacement,
    pub chunks: Vec<ChunkKind>,
    pub windows_read: u64,
    /// Bytes the stream actually held.
    pub stream_len: u64,
}

impl ScanReport {
    pub fn has_info(&self) -> bool {
        self.chunks.contains(&ChunkKind::Info)
    }

    /// Fails if either mandatory chunk was not found.
    pub fn check_chunks(&self) -> Result<()> {
        if self.format.is_none() {
            dprintln!("Post-condition failed: no 'fmt ' chunk");
            return Err(WavError::MissingFormatChunk);
        }
        if self.data.is_none() {
            dprintln!("Post-condition failed: no 'data' chunk");
            return Err(WavError::MissingDataChunk);
        }
        if let Some(region) = self.data.filter(|d| d.samples_end() > self.stream_len) {
            dprintln!(
                "Post-condition failed: 'data' ends at {} but the stream holds {} bytes",
                region.samples_end(),
                self.stream_len
            );
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "data chunk runs past end of stream",
            )
            .into());
        }
        Ok(())
    }
}

enum Step {
    /// Move the scan position forward within the window.
    Advance(usize),
    /// The chunk at the current position is not complete in this window.
    NeedMore,
    /// The window was discarded; resume at the start of the next one.
    Resume,
}

/// Single-use scanner over one byte stream.
pub struct ChunkScanner<R: Read> {
    reader: WindowReader<R>,
    options: ScanOptions,
    window: Vec<u8>,
    // Absolute stream offset of window[0]
    base: u64,
    window_index: u64,
    report: ScanReport,
}

impl ChunkScanner<File> {
    pub fn open(path: impl AsRef<Path>, options: ScanOptions) -> Result<Self> {
        Ok(Self::new(WindowReader::open(path)?, options))
    }
}

impl<R: Read> ChunkScanner<R> {
    pub fn new(reader: WindowReader<R>, options: ScanOptions) -> Self {
        Self {
            reader,
            options,
            window: Vec::new(),
            base: 0,
            window_index: 0,
            report: ScanReport::default(),
        }
    }

    /// Runs the scan to the end of the stream.
    ///
    /// Fails on a missing `RIFF` or `WAVE` signature and on I/O errors. A
    /// missing `fmt ` or `data` chunk is left for [`ScanReport::check_chunks`].
    pub fn scan(mut self) -> Result<ScanReport> {
        let outcome = self.run();
        self.report.stream_len = self.reader.position();
        self.reader.close();
        outcome?;

        dprintln!(
            "Scan finished after {} window(s): fmt {}, data {}, INFO fields {}",
            self.report.windows_read,
            self.report.format.is_some(),
            self.report.data.is_some(),
            self.report.metadata.len()
        );
        Ok(self.report)
    }

    fn run(&mut self) -> Result<()> {
        self.window = self.reader.get_window(self.options.window())?;
        self.report.windows_read = 1;
        self.check_header()?;
        self.report.file_size = read_u32_field(&self.window, 0, Field::RiffContainerSize);
        dprintln!("RIFF size field: {}", self.report.file_size);

        let mut pos = HEADER_SIZE;
        loop {
            if pos + SIGNATURE_LEN > self.window.len() {
                if self.refill(&mut pos)? {
                    continue;
                }
                break;
            }

            let step = if FMT.matches_at(&self.window, pos) {
                self.read_fmt_chunk(pos)
            } else if DATA.matches_at(&self.window, pos) {
                self.read_data_chunk(pos)?
            } else if LIST.matches_at(&self.window, pos) {
                self.read_list_chunk(pos)?
            } else {
                Step::Advance(1)
            };

            match step {
                Step::Advance(n) => pos += n,
                Step::NeedMore => {
                    if !self.refill(&mut pos)? {
                        // Chunk truncated by the end of the stream
                        pos += 1;
                    }
                }
                Step::Resume => pos = 0,
            }
        }
        Ok(())
    }

    fn check_header(&self) -> Result<()> {
        if !RIFF.matches_at(&self.window, Field::ContainerRiff.offset() as usize) {
            return Err(WavError::MissingRiffContainer);
        }
        if self.window.len() < HEADER_SIZE
            || !WAVE.matches_at(&self.window, Field::FormatTag.offset() as usize)
        {
            return Err(WavError::NotAWaveFile);
        }
        Ok(())
    }

    /// Drops the consumed part of the window and appends the next one.
    ///
    /// Returns false once the stream is exhausted.
    fn refill(&mut self, pos: &mut usize) -> Result<bool> {
        if self.reader.remaining() == 0 {
            return Ok(false);
        }
        let next = self.reader.get_window(self.options.window())?;
        if next.is_empty() {
            return Ok(false);
        }

        let consumed = (*pos).min(self.window.len());
        self.window.drain(..consumed);
        self.base += consumed as u64;
        *pos -= consumed;
        self.window.extend_from_slice(&next);

        self.window_index += 1;
        self.report.windows_read += 1;
        dprintln!(
            "Window {} loaded: {} new bytes, scanning from {}",
            self.window_index,
            next.len(),
            self.base + *pos as u64
        );
        Ok(true)
    }

    fn absolute(&self, pos: usize) -> u64 {
        self.base + pos as u64
    }

    fn read_fmt_chunk(&mut self, pos: usize) -> Step {
        if pos + FMT_CHUNK_LEN > self.window.len() {
            return Step::NeedMore;
        }
        let w = &self.window;
        let params = AudioFormatParams {
            codec_id: read_u16_field(w, pos, Field::AudioFormat),
            channel_count: read_u16_field(w, pos, Field::NumberChannels),
            sample_rate: read_u32_field(w, pos, Field::SampleRate),
            byte_rate: read_u32_field(w, pos, Field::ByteRate),
            block_align: read_u16_field(w, pos, Field::BlockAlign),
            bits_per_sample: read_u16_field(w, pos, Field::BitsPerSample),
        };
        dprintln!(
            "Found 'fmt ' chunk at {} (declared size {}): {:?}",
            self.absolute(pos),
            read_u32_field(w, pos, Field::ChunkFmtSize),
            params
        );

        self.report.format = Some(params);
        self.report.chunks.push(ChunkKind::Format);
        Step::Advance(FMT_CHUNK_LEN)
    }

    fn read_data_chunk(&mut self, pos: usize) -> Result<Step> {
        if pos + DATA_HEADER_LEN > self.window.len() {
            return Ok(Step::NeedMore);
        }
        let region = DataRegion {
            offset: self.absolute(pos),
            size: read_u32_field(&self.window, pos, Field::DataSize),
        };
        dprintln!(
            "Found 'data' chunk at {} with {} sample bytes",
            region.offset,
            region.size
        );

        self.report.data = Some(region);
        self.report.chunks.push(ChunkKind::Data);
        self.skip_to(pos, region.samples_end())
    }

    fn read_list_chunk(&mut self, pos: usize) -> Result<Step> {
        if pos + LIST_HEADER_LEN > self.window.len() {
            return Ok(Step::NeedMore);
        }
        let list_size = read_u32_field(&self.window, pos, Field::ListSize);
        let list_end = self.absolute(pos) + Field::ListSize.end() as u64 + u64::from(list_size);

        if !INFO.matches_at(&self.window, pos + Field::ChunkInfo.offset() as usize) {
            dprintln!("Skipping non-INFO LIST chunk at {}", self.absolute(pos));
            return self.skip_to(pos, list_end);
        }
        // The size must at least cover the INFO form type
        if list_size < Field::ChunkInfo.length() {
            dprintln!(
                "Skipping malformed INFO list at {} (declared size {})",
                self.absolute(pos),
                list_size
            );
            return self.skip_to(pos, list_end);
        }

        let oversized = list_size > self.options.max_info_list_size;
        let end_in_window = (list_end - self.base) as usize;
        if !oversized && end_in_window > self.window.len() && self.reader.remaining() > 0 {
            // Keep the whole list in one window before decoding
            return Ok(Step::NeedMore);
        }

        self.report.chunks.push(ChunkKind::Info);
        self.report.metadata_placement = if self.report.data.is_some() {
            MetadataPlacement::AfterData
        } else {
            MetadataPlacement::BeforeData
        };

        if oversized {
            dprintln!(
                "INFO list at {} is {} bytes, over the {} byte limit; skipping",
                self.absolute(pos),
                list_size,
                self.options.max_info_list_size
            );
            return self.skip_to(pos, list_end);
        }
        let end = end_in_window.min(self.window.len());

        let fields = parse_info_fields(&self.window[pos + LIST_HEADER_LEN..end]);
        dprintln!(
            "Found INFO list at {} with {} field(s)",
            self.absolute(pos),
            fields.len()
        );
        self.report.metadata.extend(fields);
        Ok(Step::Advance(end - pos))
    }

    /// Moves the scan to absolute offset `end`, discarding what lies between.
    fn skip_to(&mut self, pos: usize, end: u64) -> Result<Step> {
        let window_end = self.absolute(self.window.len());
        if end <= window_end {
            let n = (end - self.absolute(pos)) as usize;
            return Ok(Step::Advance(n.max(1)));
        }

        let skipped = self.reader.skip(end - window_end)?;
        dprintln!(
            "Skipped {} bytes from {} to {}",
            (window_end - self.absolute(pos)) + skipped,
            self.absolute(pos),
            window_end + skipped
        );
        self.window.clear();
        self.base = window_end + skipped;
        Ok(Step::Resume)
    }
}

/// Decodes the `{id}{size}{text}{NUL}` sub-records of an INFO list body.
pub fn parse_info_fields(body: &[u8]) -> Vec<MetadataField> {
    let mut fields = Vec::new();
    let mut at = 0;

    while at + INFO_FIELD_HEADER_LEN <= body.len() {
        let id = &body[Field::InfoFieldId.range_at(at)];
        let field_id = ChunkSignature([id[0], id[1], id[2], id[3]]);
        let size = read_u32_field(body, at, Field::InfoFieldSize) as usize;

        let start = at + INFO_FIELD_HEADER_LEN;
        let stop = start.saturating_add(size).min(body.len());
        let raw = &body[start..stop];
        let text = raw.split(|b| *b == 0).next().unwrap_or_default();
        fields.push(MetadataField::new(
            field_id,
            String::from_utf8_lossy(text).into_owned(),
        ));

        at = start.saturating_add(size).saturating_add(size % 2);
    }
    fields
}

/// Scans the file at `path`.
pub fn scan_file(path: impl AsRef<Path>, options: ScanOptions) -> Result<ScanReport> {
    ChunkScanner::open(path, options)?.scan()
}
