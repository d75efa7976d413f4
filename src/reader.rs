//! Paged file reader handing out fixed-size windows of a byte stream.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use crate::dprintln;
use crate::error::Result;
use crate::layout::Field;

/// Sequential reader that never holds more than one window in memory.
///
/// The underlying handle is released by [`WindowReader::close`] or when the
/// reader is dropped, whichever comes first.
pub struct WindowReader<R: Read> {
    inner: Option<R>,
    remaining: u64,
    position: u64,
}

impl WindowReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        dprintln!("Opened {} ({} bytes)", path.as_ref().display(), len);
        Ok(Self::from_reader(file, len))
    }
}

impl<R: Read> WindowReader<R> {
    /// Wraps a stream whose total length is known up front.
    pub fn from_reader(inner: R, len: u64) -> Self {
        Self {
            inner: Some(inner),
            remaining: len,
            position: 0,
        }
    }

    /// Returns up to `n` bytes from the current position and advances past them.
    ///
    /// A short final window holds exactly the bytes that were left.
    pub fn get_window(&mut self, n: usize) -> Result<Vec<u8>> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(Vec::new());
        };
        let want = (n as u64).min(self.remaining);
        let mut window = Vec::with_capacity(want as usize);
        inner.by_ref().take(want).read_to_end(&mut window)?;

        let got = window.len() as u64;
        self.position += got;
        // The stream ended before its announced length
        self.remaining = if got < want { 0 } else { self.remaining - got };
        Ok(window)
    }

    /// Discards `n` bytes without keeping them. Returns how many were skipped.
    pub fn skip(&mut self, n: u64) -> Result<u64> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(0);
        };
        let want = n.min(self.remaining);
        let skipped = io::copy(&mut inner.by_ref().take(want), &mut io::sink())?;
        self.position += skipped;
        self.remaining = if skipped < want { 0 } else { self.remaining - skipped };
        Ok(skipped)
    }

    /// Unread byte count.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Absolute position of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn close(&mut self) {
        self.inner = None;
        self.remaining = 0;
    }
}

/// Reverses the stored byte order of a field.
pub fn reverse_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Decodes a little-endian 2 byte field of the chunk starting at `base`.
///
/// The stored bytes are reversed first and then assembled most significant
/// byte first.
pub fn read_u16_field(window: &[u8], base: usize, field: Field) -> u16 {
    BigEndian::read_u16(&reverse_bytes(&window[field.range_at(base)]))
}

/// Decodes a little-endian 4 byte field of the chunk starting at `base`.
pub fn read_u32_field(window: &[u8], base: usize, field: Field) -> u32 {
    BigEndian::read_u32(&reverse_bytes(&window[field.range_at(base)]))
}
