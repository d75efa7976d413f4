//! Error types for the WAV container codec.

use thiserror::Error;

/// Errors raised while scanning, building or writing a RIFF/WAVE container.
#[derive(Error, Debug)]
pub enum WavError {
    #[error("File does not contain a 'RIFF' container")]
    MissingRiffContainer,

    #[error("File is not a WAVE file")]
    NotAWaveFile,

    #[error("File does not contain a 'fmt ' chunk")]
    MissingFormatChunk,

    #[error("File does not contain a 'data' chunk")]
    MissingDataChunk,

    #[error("Incomplete format parameters: channels, sample rate, bits per sample and codec are required")]
    IncompleteFormatParameters,

    #[error("Invalid chunk signature: {0:?} (expected 4 ASCII bytes)")]
    InvalidSignature(String),

    #[error("A data region was supplied without a source path")]
    MissingSourcePath,

    #[error("No codec found for extension: {0}")]
    UnsupportedExtension(String),

    #[error("Unsupported sample format: codec {codec_id}, {bits_per_sample} bits")]
    UnsupportedSampleFormat { codec_id: u16, bits_per_sample: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WavError>;
