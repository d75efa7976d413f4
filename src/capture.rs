use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result as R, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::builder::AudioContainerBuilder;
use crate::container::{AudioContainer, AudioData, AudioFormatParams};
use crate::dprintln;
use crate::layout::CodecId;
use crate::pcm::encode_pcm16;

/// Records `seconds` of audio from the default input device as 16-bit PCM.
pub fn record(seconds: f32, sample_rate: u32, channels: u16) -> R<AudioContainer> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No default input device found"))?;

    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let captured = Arc::new(Mutex::new(Vec::<f32>::new()));
    let sink = Arc::clone(&captured);
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buffer) = sink.lock() {
                    buffer.extend_from_slice(data);
                }
            },
            |err| tracing::error!("Input stream error: {}", err),
            None,
        )
        .context("Failed to build input stream")?;

    stream.play().context("Failed to start input stream")?;
    std::thread::sleep(Duration::from_secs_f32(seconds.max(0.0)));
    drop(stream);

    let samples = captured
        .lock()
        .map_err(|_| anyhow!("capture buffer lock poisoned"))?
        .clone();
    dprintln!("Captured {} samples", samples.len());

    let params = AudioFormatParams {
        codec_id: CodecId::Pcm.id(),
        channel_count: channels,
        sample_rate,
        bits_per_sample: 16,
        ..AudioFormatParams::default()
    };
    let data = AudioData::new(params, encode_pcm16(&samples));
    if !data.is_data_correct() {
        return Err(anyhow!("No audio was captured"));
    }
    Ok(AudioContainerBuilder::from_audio_data(data).build()?)
}
