pub use crate::dprintln; // Make the macro available
pub use crate::{
    AudioContainer, AudioContainerBuilder, AudioData, AudioFormatParams, ChunkSignature, Codec,
    CodecId, Codex, InfoId, MetadataField, MetadataPlacement, ScanOptions, WavCodec, WavError,
    read_wav, write_wav,
};
pub use anyhow::{Result as R, anyhow};
