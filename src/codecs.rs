use std::path::Path;

use crate::Codec;
use crate::error::{Result, WavError};
use crate::scanner::ScanOptions;

mod wav;
pub use wav::WavCodec;

/// Picks a codec from the file extension.
pub fn get_codec(file_path: impl AsRef<Path>) -> Result<Box<dyn Codec>> {
    get_codec_with(file_path, ScanOptions::default())
}

pub fn get_codec_with(
    file_path: impl AsRef<Path>,
    options: ScanOptions,
) -> Result<Box<dyn Codec>> {
    let extension = file_path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    match extension.to_lowercase().as_str() {
        "wav" | "wave" => Ok(Box::new(WavCodec::with_options(options))),
        _ => Err(WavError::UnsupportedExtension(extension.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_codec() {
        assert_eq!(get_codec("a/b/take1.WAV").unwrap().file_extension(), "wav");
        assert!(matches!(
            get_codec("song.flac"),
            Err(WavError::UnsupportedExtension(ext)) if ext == "flac"
        ));
        assert!(matches!(
            get_codec("noext"),
            Err(WavError::UnsupportedExtension(ext)) if ext.is_empty()
        ));
    }
}
