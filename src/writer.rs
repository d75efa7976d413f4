//! Canonical serializer for [`AudioContainer`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::container::{
    AudioContainer, MetadataField, MetadataPlacement, checked_u32, info_list_len,
};
use crate::dprintln;
use crate::error::Result;
use crate::layout::{DATA, FMT, INFO, LIST, RIFF, STANDARD_FMT_CHUNK_SIZE, WAVE};

/// Writes containers in the canonical layout:
/// `RIFF` header, a 16 byte `fmt ` chunk, `data`, and an optional `LIST`/`INFO`
/// chunk placed before or after `data` as the container records.
pub struct WavWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> WavWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Serializes `container` and returns the number of bytes written.
    pub fn write(&mut self, container: &AudioContainer) -> Result<u64> {
        let samples = container.sample_bytes()?;
        let start = self.written;
        let data_size = checked_u32(samples.len() as u64, "data chunk")?;
        let riff_size = checked_u32(container.canonical_len() - 8, "RIFF container")?;

        self.put(RIFF.as_bytes())?;
        self.put_u32(riff_size)?;
        self.put(WAVE.as_bytes())?;

        let format = container.format();
        self.put(FMT.as_bytes())?;
        self.put_u32(STANDARD_FMT_CHUNK_SIZE)?;
        self.put_u16(format.codec_id)?;
        self.put_u16(format.channel_count)?;
        self.put_u32(format.sample_rate)?;
        self.put_u32(format.byte_rate)?;
        self.put_u16(format.block_align)?;
        self.put_u16(format.bits_per_sample)?;

        let metadata = container.metadata();
        let before = container.metadata_placement() == MetadataPlacement::BeforeData;
        if before && !metadata.is_empty() {
            self.put_info_list(metadata)?;
        }

        self.put(DATA.as_bytes())?;
        self.put_u32(data_size)?;
        self.put(samples)?;
        if samples.len() % 2 == 1 {
            self.put(&[0])?;
        }

        if !before && !metadata.is_empty() {
            self.put_info_list(metadata)?;
        }

        self.inner.flush()?;
        let written = self.written - start;
        dprintln!(
            "Wrote {} bytes ({} sample bytes, {} INFO field(s))",
            written,
            samples.len(),
            metadata.len()
        );
        Ok(written)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put_info_list(&mut self, fields: &[MetadataField]) -> Result<()> {
        self.put(LIST.as_bytes())?;
        // The size word covers everything after itself
        self.put_u32(checked_u32(info_list_len(fields) - 8, "INFO list")?)?;
        self.put(INFO.as_bytes())?;
        for field in fields {
            let text = field.text.as_bytes();
            self.put(field.field_id.as_bytes())?;
            self.put_u32(checked_u32(text.len() as u64 + 1, "INFO field")?)?;
            self.put(text)?;
            self.put(&[0])?;
            if (text.len() + 1) % 2 == 1 {
                self.put(&[0])?;
            }
        }
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn put_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(value)?;
        self.written += 2;
        Ok(())
    }

    fn put_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(value)?;
        self.written += 4;
        Ok(())
    }
}

/// Serializes `container` into a new buffer.
pub fn encode(container: &AudioContainer) -> Result<Vec<u8>> {
    let mut writer = WavWriter::new(Vec::with_capacity(container.canonical_len() as usize));
    writer.write(container)?;
    Ok(writer.into_inner())
}

/// Writes `container` to `path`.
///
/// Samples are loaded before the destination is created, so `path` may be
/// the file the container was read from.
pub fn write_file(container: &AudioContainer, path: impl AsRef<Path>) -> Result<u64> {
    container.sample_bytes()?;
    let file = File::create(path.as_ref())?;
    let written = WavWriter::new(BufWriter::new(file)).write(container)?;
    dprintln!("Saved {}", path.as_ref().display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AudioContainerBuilder;
    use crate::layout::{CodecId, InfoId};

    fn mono_8bit(samples: Vec<u8>) -> AudioContainerBuilder {
        AudioContainerBuilder::new()
            .codec(CodecId::Pcm)
            .channel_count(1)
            .sample_rate(8000)
            .bits_per_sample(8)
            .samples(samples)
    }

    #[test]
    fn test_canonical_header_bytes() {
        let container = mono_8bit(vec![0x80; 4]).build().unwrap();
        let bytes = encode(&container).unwrap();

        assert_eq!(bytes.len(), 48);
        assert_eq!(bytes.len() as u64, container.total_file_size().unwrap());
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &40u32.to_le_bytes());
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(&bytes[16..20], &16u32.to_le_bytes());
        assert_eq!(&bytes[20..22], &1u16.to_le_bytes());
        assert_eq!(&bytes[22..24], &1u16.to_le_bytes());
        assert_eq!(&bytes[24..28], &8000u32.to_le_bytes());
        assert_eq!(&bytes[28..32], &8000u32.to_le_bytes());
        assert_eq!(&bytes[32..34], &1u16.to_le_bytes());
        assert_eq!(&bytes[34..36], &8u16.to_le_bytes());
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[40..44], &4u32.to_le_bytes());
        assert_eq!(&bytes[44..], &[0x80; 4]);
    }

    #[test]
    fn test_odd_data_is_padded() {
        let container = mono_8bit(vec![1, 2, 3]).build().unwrap();
        let bytes = encode(&container).unwrap();
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[40..44], &3u32.to_le_bytes());
        assert_eq!(bytes[47], 0);
    }

    #[test]
    fn test_info_list_layout() {
        let container = mono_8bit(vec![0; 2])
            .info(InfoId::Inam, "Test")
            .build()
            .unwrap();
        let bytes = encode(&container).unwrap();
        assert_eq!(bytes.len() as u64, container.total_file_size().unwrap());

        let list = &bytes[46..];
        assert_eq!(&list[0..4], b"LIST");
        assert_eq!(&list[4..8], &18u32.to_le_bytes());
        assert_eq!(&list[8..12], b"INFO");
        assert_eq!(&list[12..16], b"INAM");
        assert_eq!(&list[16..20], &5u32.to_le_bytes());
        assert_eq!(&list[20..], b"Test\0\0");
    }

    #[test]
    fn test_info_before_data() {
        let container = mono_8bit(vec![0; 2])
            .info(InfoId::Iart, "Me")
            .metadata_placement(MetadataPlacement::BeforeData)
            .build()
            .unwrap();
        let bytes = encode(&container).unwrap();
        assert_eq!(&bytes[36..40], b"LIST");
        let data_at = bytes.len() - 10;
        assert_eq!(&bytes[data_at..data_at + 4], b"data");
    }
}
