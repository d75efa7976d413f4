use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result as R, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::container::AudioContainer;
use crate::dprintln;
use crate::pcm::decode_interleaved;
use crate::Codex;

/// Plays `container` through the default output device and blocks until done.
///
/// The stream is opened at the container's own rate and channel count.
pub fn play(container: &AudioContainer) -> R<()> {
    let samples = decode_interleaved(container.sample_bytes()?, container.format())?;
    if samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device available"))?;

    let config = cpal::StreamConfig {
        channels: container.channel_count(),
        sample_rate: cpal::SampleRate(container.sample_rate()),
        buffer_size: cpal::BufferSize::Default,
    };

    let (done_tx, done_rx) = mpsc::channel();
    let mut position = 0;
    let mut finished = false;
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let available = (samples.len() - position).min(data.len());
                data[..available].copy_from_slice(&samples[position..position + available]);
                data[available..].fill(0.0);
                position += available;
                if position == samples.len() && !finished {
                    finished = true;
                    let _ = done_tx.send(());
                }
            },
            |err| tracing::error!("Output stream error: {}", err),
            None,
        )
        .context("Failed to build output stream")?;

    stream.play().context("Failed to start output stream")?;
    dprintln!(
        "Playing {:.2}s at {} Hz, {} channel(s)",
        container.duration_secs(),
        config.sample_rate.0,
        config.channels
    );

    let timeout = Duration::from_secs_f64(container.duration_secs()) + Duration::from_secs(2);
    if done_rx.recv_timeout(timeout).is_err() {
        tracing::warn!("Playback did not finish within {:?}", timeout);
    }
    Ok(())
}

impl Codex {
    pub fn playback(&self) -> R<()> {
        play(self.container()?)
    }
}
