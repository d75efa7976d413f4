pub mod builder;
pub mod codecs;
pub mod container;
pub mod error;
pub mod layout;
pub mod pcm;
pub mod prelude;
pub mod reader;
pub mod scanner;
pub mod writer;

#[cfg(feature = "device")]
pub mod capture;
#[cfg(feature = "device")]
pub mod playback;

use std::path::{Path, PathBuf};

use anyhow::{Result as R, anyhow};

pub use builder::AudioContainerBuilder;
pub use codecs::{WavCodec, get_codec, get_codec_with};
pub use container::{
    AudioContainer, AudioData, AudioFormatParams, DataRegion, MetadataField, MetadataPlacement,
};
pub use error::WavError;
pub use layout::{ChunkSignature, CodecId, InfoId};
pub use scanner::{ChunkKind, ChunkScanner, ScanOptions, ScanReport};

// Helper macro to use it like println!
#[macro_export]
macro_rules! dprintln {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Reads the WAVE file at `path`. Samples are loaded on first access.
pub fn read_wav(path: impl AsRef<Path>) -> error::Result<AudioContainer> {
    WavCodec::default().decode_file(path.as_ref())
}

/// Writes `container` to `path` in the canonical layout.
pub fn write_wav(container: &AudioContainer, path: impl AsRef<Path>) -> error::Result<u64> {
    writer::write_file(container, path)
}

pub trait Codec: Send + Sync {
    fn validate_file_format(&self, data: &[u8]) -> error::Result<()>;
    fn file_extension(&self) -> &'static str;

    fn encode(&self, container: &AudioContainer) -> error::Result<Vec<u8>>;

    fn encode_file(&self, container: &AudioContainer, file_path: &Path) -> error::Result<()> {
        let encoded_data = self.encode(container)?;
        std::fs::write(file_path, encoded_data)?;
        Ok(())
    }

    fn decode(&self, input: &[u8]) -> error::Result<AudioContainer>;

    fn decode_file(&self, file_path: &Path) -> error::Result<AudioContainer> {
        let data = std::fs::read(file_path)?;
        self.decode(&data)
    }
}

/// One audio file on disk and, once decoded, its container.
#[derive(Default)]
pub struct Codex {
    pub path: PathBuf,
    pub container: Option<AudioContainer>,
    pub codec: Option<Box<dyn Codec>>,
}

impl Codex {
    pub fn new(input_file: impl AsRef<Path>) -> R<Self> {
        Self::with_options(input_file, ScanOptions::default())
    }

    pub fn with_options(input_file: impl AsRef<Path>, options: ScanOptions) -> R<Self> {
        let path = input_file.as_ref().to_path_buf();
        if !path.exists() {
            return Err(anyhow!("Input file does not exist: {}", path.display()));
        }

        Ok(Self {
            codec: get_codec_with(&path, options).ok(),
            path,
            container: None,
        })
    }

    pub fn decode(mut self) -> R<Self> {
        let codec = self.codec.as_ref().ok_or_else(|| {
            anyhow!(
                "No codec available for decoding audio file: {}",
                self.path.display()
            )
        })?;
        self.container = Some(codec.decode_file(&self.path)?);
        Ok(self)
    }

    pub fn open(input_file: impl AsRef<Path>) -> R<Self> {
        Self::new(input_file)?.decode()
    }

    pub fn get_filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
    }

    pub fn container(&self) -> R<&AudioContainer> {
        self.container
            .as_ref()
            .ok_or_else(|| anyhow!("No audio container available: {}", self.path.display()))
    }

    pub fn channels(&self) -> R<u16> {
        Ok(self.container()?.channel_count())
    }

    pub fn duration(&self) -> R<f64> {
        Ok(self.container()?.duration_secs())
    }

    /// Text of an `INFO` field such as `"INAM"`.
    pub fn info_field(&self, field_id: &str) -> Option<&str> {
        let field_id = ChunkSignature::new(field_id).ok()?;
        self.container.as_ref()?.info_field(field_id)
    }

    pub fn set_info_field(&mut self, field_id: &str, text: &str) -> R<()> {
        let field_id = ChunkSignature::new(field_id)?;
        let container = self.container()?;
        let updated = AudioContainerBuilder::from_container(container)
            .set_info_field(field_id, text)
            .build()?;
        self.container = Some(updated);
        Ok(())
    }

    /// Writes the container to `output_file` through a temporary sibling,
    /// so exporting over the source file is safe.
    pub fn export(&self, output_file: impl AsRef<Path>) -> R<()> {
        let output_file = output_file.as_ref();
        let container = self.container()?;
        let codec = get_codec(output_file)?;

        let mut temp_name = output_file.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_file = PathBuf::from(temp_name);
        codec.encode_file(container, &temp_file)?;

        match std::fs::rename(&temp_file, output_file) {
            Ok(_) => Ok(()),
            Err(e) => {
                // As a fallback, try to copy then delete
                if std::fs::copy(&temp_file, output_file).is_err() {
                    let _ = std::fs::remove_file(&temp_file);
                    Err(e.into())
                } else {
                    let _ = std::fs::remove_file(&temp_file);
                    Ok(())
                }
            }
        }
    }
}
