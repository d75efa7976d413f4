//! Static layout of the RIFF/WAVE chunks this crate understands.
//!
//! Every offset here is relative to the start of the chunk that owns the
//! field: container fields are relative to byte 0 of the file, `fmt `
//! fields to the `fmt ` signature, `data` fields to the `data` signature and
//! list fields to the `LIST` signature.

use std::fmt;
use std::ops::Range;

use crate::error::{Result, WavError};

/// Default size of the read window used by the chunk scanner.
pub const WAVE_BUFFER_SIZE: usize = 10240;

/// Size of the `fmt ` body written by the canonical writer (PCM).
pub const STANDARD_FMT_CHUNK_SIZE: u32 = 16;

/// Byte length and offset of a single field inside its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub byte_length: u32,
    pub byte_offset: u32,
}

/// Every field with a fixed position inside its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ContainerRiff,
    RiffContainerSize,
    FormatTag,

    ChunkFmt,
    ChunkFmtSize,
    AudioFormat,
    NumberChannels,
    SampleRate,
    ByteRate,
    BlockAlign,
    BitsPerSample,

    ChunkData,
    DataSize,

    ListContainer,
    ListSize,
    ChunkInfo,

    InfoFieldId,
    InfoFieldSize,
}

impl Field {
    pub const ALL: [Field; 18] = [
        Field::ContainerRiff,
        Field::RiffContainerSize,
        Field::FormatTag,
        Field::ChunkFmt,
        Field::ChunkFmtSize,
        Field::AudioFormat,
        Field::NumberChannels,
        Field::SampleRate,
        Field::ByteRate,
        Field::BlockAlign,
        Field::BitsPerSample,
        Field::ChunkData,
        Field::DataSize,
        Field::ListContainer,
        Field::ListSize,
        Field::ChunkInfo,
        Field::InfoFieldId,
        Field::InfoFieldSize,
    ];

    pub const fn spec(self) -> FieldSpec {
        let (name, byte_length, byte_offset) = match self {
            Field::ContainerRiff => ("RIFF tag", 4, 0),
            Field::RiffContainerSize => ("RIFF size", 4, 4),
            Field::FormatTag => ("WAVE tag", 4, 8),

            Field::ChunkFmt => ("fmt tag", 4, 0),
            Field::ChunkFmtSize => ("fmt size", 4, 4),
            Field::AudioFormat => ("codec id", 2, 8),
            Field::NumberChannels => ("channels", 2, 10),
            Field::SampleRate => ("sample rate", 4, 12),
            Field::ByteRate => ("byte rate", 4, 16),
            Field::BlockAlign => ("block align", 2, 20),
            Field::BitsPerSample => ("bits per sample", 2, 22),

            Field::ChunkData => ("data tag", 4, 0),
            Field::DataSize => ("data size", 4, 4),

            Field::ListContainer => ("LIST tag", 4, 0),
            Field::ListSize => ("LIST size", 4, 4),
            Field::ChunkInfo => ("INFO tag", 4, 8),

            // Relative to the start of each INFO sub-record
            Field::InfoFieldId => ("INFO field id", 4, 0),
            Field::InfoFieldSize => ("INFO field size", 4, 4),
        };
        FieldSpec {
            name,
            byte_length,
            byte_offset,
        }
    }

    pub const fn offset(self) -> u32 {
        self.spec().byte_offset
    }

    pub const fn length(self) -> u32 {
        self.spec().byte_length
    }

    /// First byte after the field.
    pub const fn end(self) -> u32 {
        self.offset() + self.length()
    }

    /// Byte range of the field for a chunk that starts at `base` in a buffer.
    pub fn range_at(self, base: usize) -> Range<usize> {
        base + self.offset() as usize..base + self.end() as usize
    }
}

/// Size of the RIFF header: RIFF tag, RIFF size and WAVE tag.
pub const HEADER_SIZE: usize = Field::FormatTag.end() as usize;

/// Bytes from the `fmt ` signature to the end of bits-per-sample.
pub const FMT_CHUNK_LEN: usize = Field::BitsPerSample.end() as usize;

/// Bytes from the `data` signature to the first sample byte.
pub const DATA_HEADER_LEN: usize = Field::DataSize.end() as usize;

/// Bytes from the `LIST` signature to the first INFO sub-record.
pub const LIST_HEADER_LEN: usize = Field::ChunkInfo.end() as usize;

/// Bytes from an INFO sub-record id to its text.
pub const INFO_FIELD_HEADER_LEN: usize = Field::InfoFieldSize.end() as usize;

/// Sum of every fixed field in the canonical PCM layout (44 bytes).
pub fn canonical_header_len() -> u32 {
    [
        Field::ContainerRiff,
        Field::RiffContainerSize,
        Field::FormatTag,
        Field::ChunkFmt,
        Field::ChunkFmtSize,
        Field::AudioFormat,
        Field::NumberChannels,
        Field::SampleRate,
        Field::ByteRate,
        Field::BlockAlign,
        Field::BitsPerSample,
        Field::ChunkData,
        Field::DataSize,
    ]
    .iter()
    .map(|field| field.length())
    .sum()
}

/// A four byte chunk identifier. Compared byte for byte, never as text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkSignature(pub [u8; 4]);

pub const RIFF: ChunkSignature = ChunkSignature(*b"RIFF");
pub const WAVE: ChunkSignature = ChunkSignature(*b"WAVE");
pub const FMT: ChunkSignature = ChunkSignature(*b"fmt ");
pub const DATA: ChunkSignature = ChunkSignature(*b"data");
pub const LIST: ChunkSignature = ChunkSignature(*b"LIST");
pub const INFO: ChunkSignature = ChunkSignature(*b"INFO");

impl ChunkSignature {
    /// Builds a signature from exactly four ASCII characters.
    pub fn new(id: &str) -> Result<Self> {
        let bytes = id.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return Err(WavError::InvalidSignature(id.to_string()));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// True if `window` holds this signature at `offset`.
    pub fn matches_at(&self, window: &[u8], offset: usize) -> bool {
        window.get(offset..offset + 4) == Some(&self.0[..])
    }
}

impl fmt::Display for ChunkSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ChunkSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkSignature({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Registered compression formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CodecId {
    /// Pulse-code modulation
    Pcm = 1,
    /// A-law
    ALaw = 6,
    /// µ-law
    MuLaw = 7,
}

impl CodecId {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Pcm),
            6 => Some(Self::ALaw),
            7 => Some(Self::MuLaw),
            _ => None,
        }
    }

    pub fn id(self) -> u16 {
        self as u16
    }
}

/// Standard fields of a RIFF `INFO` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoId {
    Iarl,
    Iart,
    Icms,
    Icmt,
    Icop,
    Icrd,
    Icrp,
    Idim,
    Idpi,
    Ieng,
    Ignr,
    Ikey,
    Ilgt,
    Imed,
    Inam,
    Iplt,
    Iprd,
    Isbj,
    Isft,
    Ishp,
    Isrc,
    Isrf,
    Itch,
}

impl InfoId {
    pub const ALL: [InfoId; 23] = [
        InfoId::Iarl,
        InfoId::Iart,
        InfoId::Icms,
        InfoId::Icmt,
        InfoId::Icop,
        InfoId::Icrd,
        InfoId::Icrp,
        InfoId::Idim,
        InfoId::Idpi,
        InfoId::Ieng,
        InfoId::Ignr,
        InfoId::Ikey,
        InfoId::Ilgt,
        InfoId::Imed,
        InfoId::Inam,
        InfoId::Iplt,
        InfoId::Iprd,
        InfoId::Isbj,
        InfoId::Isft,
        InfoId::Ishp,
        InfoId::Isrc,
        InfoId::Isrf,
        InfoId::Itch,
    ];

    pub fn signature(self) -> ChunkSignature {
        ChunkSignature(match self {
            InfoId::Iarl => *b"IARL",
            InfoId::Iart => *b"IART",
            InfoId::Icms => *b"ICMS",
            InfoId::Icmt => *b"ICMT",
            InfoId::Icop => *b"ICOP",
            InfoId::Icrd => *b"ICRD",
            InfoId::Icrp => *b"ICRP",
            InfoId::Idim => *b"IDIM",
            InfoId::Idpi => *b"IDPI",
            InfoId::Ieng => *b"IENG",
            InfoId::Ignr => *b"IGNR",
            InfoId::Ikey => *b"IKEY",
            InfoId::Ilgt => *b"ILGT",
            InfoId::Imed => *b"IMED",
            InfoId::Inam => *b"INAM",
            InfoId::Iplt => *b"IPLT",
            InfoId::Iprd => *b"IPRD",
            InfoId::Isbj => *b"ISBJ",
            InfoId::Isft => *b"ISFT",
            InfoId::Ishp => *b"ISHP",
            InfoId::Isrc => *b"ISRC",
            InfoId::Isrf => *b"ISRF",
            InfoId::Itch => *b"ITCH",
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            InfoId::Iarl => "Archival Location",
            InfoId::Iart => "Artist",
            InfoId::Icms => "Commissioned",
            InfoId::Icmt => "Comments",
            InfoId::Icop => "Copyright",
            InfoId::Icrd => "Creation Date",
            InfoId::Icrp => "Cropped",
            InfoId::Idim => "Dimensions",
            InfoId::Idpi => "Dots Per Inch",
            InfoId::Ieng => "Engineer",
            InfoId::Ignr => "Genre",
            InfoId::Ikey => "Keywords",
            InfoId::Ilgt => "Lightness",
            InfoId::Imed => "Medium",
            InfoId::Inam => "Name",
            InfoId::Iplt => "Palette Setting",
            InfoId::Iprd => "Product",
            InfoId::Isbj => "Subject",
            InfoId::Isft => "Software",
            InfoId::Ishp => "Sharpness",
            InfoId::Isrc => "Source",
            InfoId::Isrf => "Source Form",
            InfoId::Itch => "Technician",
        }
    }

    pub fn from_signature(signature: &ChunkSignature) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.signature() == *signature)
    }
}

impl From<InfoId> for ChunkSignature {
    fn from(id: InfoId) -> Self {
        id.signature()
    }
}

impl From<[u8; 4]> for ChunkSignature {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}
