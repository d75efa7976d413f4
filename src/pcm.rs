//! Sample conversion between stored bytes and `f32`.

use byteorder::{ByteOrder, LittleEndian};
use rayon::prelude::*;

use crate::container::AudioFormatParams;
use crate::dprintln;
use crate::error::{Result, WavError};
use crate::layout::CodecId;

// Sample conversion constants
const U8_OFFSET: f32 = 128.0;
const I16_MAX_F: f32 = 32767.0;
const I16_DIVISOR: f32 = 32768.0;
const I24_DIVISOR: f32 = 8388608.0;
const I32_DIVISOR: f32 = 2147483648.0;
const I24_SIGN_BIT: i32 = 0x800000;
const I24_SIGN_EXTENSION_MASK: i32 = -16777216; // 0xFF000000 as i32

/// G.711 A-law byte to 16-bit linear.
pub fn alaw_to_linear(value: u8) -> i16 {
    let a = value ^ 0x55;
    let mut t = i32::from(a & 0x0F) << 4;
    let segment = (a & 0x70) >> 4;
    match segment {
        0 => t += 8,
        1 => t += 0x108,
        _ => {
            t += 0x108;
            t <<= segment - 1;
        }
    }
    (if a & 0x80 != 0 { t } else { -t }) as i16
}

/// G.711 µ-law byte to 16-bit linear.
pub fn ulaw_to_linear(value: u8) -> i16 {
    let u = !value;
    let mut t = (i32::from(u & 0x0F) << 3) + 0x84;
    t <<= (u & 0x70) >> 4;
    (if u & 0x80 != 0 { 0x84 - t } else { t - 0x84 }) as i16
}

fn decode_sample(bytes: &[u8], codec: CodecId, bits_per_sample: u16) -> f32 {
    match (codec, bits_per_sample) {
        (CodecId::ALaw, _) => f32::from(alaw_to_linear(bytes[0])) / I16_DIVISOR,
        (CodecId::MuLaw, _) => f32::from(ulaw_to_linear(bytes[0])) / I16_DIVISOR,
        (CodecId::Pcm, 8) => (f32::from(bytes[0]) - U8_OFFSET) / U8_OFFSET,
        (CodecId::Pcm, 16) => f32::from(LittleEndian::read_i16(bytes)) / I16_DIVISOR,
        (CodecId::Pcm, 24) => {
            let val = LittleEndian::read_u24(bytes) as i32;
            let val = if val & I24_SIGN_BIT != 0 {
                val | I24_SIGN_EXTENSION_MASK
            } else {
                val
            };
            val as f32 / I24_DIVISOR
        }
        _ => LittleEndian::read_i32(bytes) as f32 / I32_DIVISOR,
    }
}

fn sample_layout(params: &AudioFormatParams) -> Result<(CodecId, usize)> {
    let unsupported = || WavError::UnsupportedSampleFormat {
        codec_id: params.codec_id,
        bits_per_sample: params.bits_per_sample,
    };
    let codec = params.codec().ok_or_else(unsupported)?;
    let width = match (codec, params.bits_per_sample) {
        (CodecId::Pcm, 8 | 16 | 24 | 32) => params.bytes_per_sample(),
        (CodecId::ALaw | CodecId::MuLaw, 8) => 1,
        _ => return Err(unsupported()),
    };
    Ok((codec, width))
}

/// Splits interleaved sample bytes into one `f32` vector per channel.
///
/// A trailing partial frame is dropped.
pub fn decode_channels(input: &[u8], params: &AudioFormatParams) -> Result<Vec<Vec<f32>>> {
    let (codec, width) = sample_layout(params)?;
    let channels = usize::from(params.channel_count.max(1));
    let frame_count = input.len() / (width * channels);

    dprintln!(
        "Decoding {} channels, {} frames per channel, {} bits per sample",
        channels,
        frame_count,
        params.bits_per_sample
    );

    let output = (0..channels)
        .into_par_iter()
        .map(|ch| {
            (0..frame_count)
                .map(|frame| {
                    let at = (frame * channels + ch) * width;
                    decode_sample(&input[at..at + width], codec, params.bits_per_sample)
                })
                .collect()
        })
        .collect();
    Ok(output)
}

/// Interleaved `f32` samples in stored order.
pub fn decode_interleaved(input: &[u8], params: &AudioFormatParams) -> Result<Vec<f32>> {
    let (codec, width) = sample_layout(params)?;
    let whole = input.len() - input.len() % width;
    Ok(input[..whole]
        .par_chunks_exact(width)
        .map(|bytes| decode_sample(bytes, codec, params.bits_per_sample))
        .collect())
}

/// Encodes samples in `[-1.0, 1.0]` as 16-bit little-endian PCM.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let val = (sample.clamp(-1.0, 1.0) * I16_MAX_F) as i16;
        out.extend_from_slice(&val.to_le_bytes());
    }
    out
}
