//! wavcodex - inspect, tag and rewrite RIFF/WAVE files

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wavcodex_lib::prelude::*;

#[derive(Parser)]
#[command(name = "wavcodex")]
#[command(about = "RIFF/WAVE container tool")]
#[command(version)]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scanner window size in bytes
    #[arg(long, global = true, default_value_t = ScanOptions::default().window_size)]
    window_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print format parameters and INFO metadata
    Info {
        /// Input WAV file
        input: PathBuf,
    },

    /// Set INFO fields and write the result
    Tag {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file (may equal the input)
        output: PathBuf,

        /// Field to set, e.g. INAM=Title
        #[arg(short, long = "set", value_parser = parse_tag, required = true)]
        set: Vec<(String, String)>,
    },

    /// Rewrite a file in the canonical layout
    Copy {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,
    },

    /// Play a file through the default output device
    #[cfg(feature = "device")]
    Play {
        /// Input WAV file
        input: PathBuf,
    },

    /// Record from the default input device
    #[cfg(feature = "device")]
    Record {
        /// Output WAV file
        output: PathBuf,

        /// Length in seconds
        #[arg(short, long, default_value_t = 5.0)]
        seconds: f32,

        #[arg(short, long, default_value_t = 44100)]
        rate: u32,

        #[arg(short, long, default_value_t = 1)]
        channels: u16,
    },
}

fn parse_tag(arg: &str) -> Result<(String, String), String> {
    let (id, text) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected ID=TEXT, got {arg:?}"))?;
    ChunkSignature::new(id).map_err(|e| e.to_string())?;
    Ok((id.to_string(), text.to_string()))
}

fn print_info(codex: &Codex) -> R<()> {
    let container = codex.container()?;
    let format = container.format();
    let codec = format
        .codec()
        .map(|c| format!("{c:?}"))
        .unwrap_or_else(|| "unregistered".to_string());

    println!("{}", codex.path.display());
    println!("  codec:           {} ({})", format.codec_id, codec);
    println!("  channels:        {}", format.channel_count);
    println!("  sample rate:     {} Hz", format.sample_rate);
    println!("  byte rate:       {}", format.byte_rate);
    println!("  block align:     {}", format.block_align);
    println!("  bits per sample: {}", format.bits_per_sample);
    println!("  data size:       {} bytes", container.data_size());
    println!("  duration:        {:.3} s", container.duration_secs());
    if let Some(region) = container.data_region() {
        println!("  data offset:     {}", region.offset);
    }
    if let Some(size) = container.reported_file_size() {
        println!("  RIFF size field: {}", size);
    }

    if container.metadata().is_empty() {
        println!("  no INFO metadata");
        return Ok(());
    }
    println!("  INFO ({:?}):", container.metadata_placement());
    for field in container.metadata() {
        let label = field.info_id().map(|id| id.label()).unwrap_or("Unknown");
        println!("    {} {:<18} {}", field.field_id, label, field.text);
    }
    Ok(())
}

fn main() -> R<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = ScanOptions::default().with_window_size(cli.window_size);

    match cli.command {
        Commands::Info { input } => {
            let codex = Codex::with_options(&input, options)?.decode()?;
            print_info(&codex)?;
        }

        Commands::Tag { input, output, set } => {
            let mut codex = Codex::with_options(&input, options)?.decode()?;
            for (id, text) in &set {
                codex.set_info_field(id, text)?;
            }
            codex.export(&output)?;
            tracing::info!("Wrote {} field(s) to {:?}", set.len(), output);
        }

        Commands::Copy { input, output } => {
            let codex = Codex::with_options(&input, options)?.decode()?;
            codex.export(&output)?;
            tracing::info!("Copied {:?} -> {:?}", input, output);
        }

        #[cfg(feature = "device")]
        Commands::Play { input } => {
            Codex::with_options(&input, options)?.decode()?.playback()?;
        }

        #[cfg(feature = "device")]
        Commands::Record {
            output,
            seconds,
            rate,
            channels,
        } => {
            let container = wavcodex_lib::capture::record(seconds, rate, channels)?;
            write_wav(&container, &output)?;
            tracing::info!(
                "Recorded {:.2}s to {:?}",
                container.duration_secs(),
                output
            );
        }
    }

    Ok(())
}
