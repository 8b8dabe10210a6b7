//! Offline driver: runs a WAV file through the stereo STFT processor.
//!
//! Usage: stft_render <input.wav> <output.wav> [--preset NAME | --config FILE.json]
//!                    [--edit passthrough|reverse] [--block SIZE] [--compensate]

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::info;
use std::path::{Path, PathBuf};
use stft_engine::dsp::utils::{frame_rms, lin_to_db};
use stft_engine::{
    Channel, EngineConfig, EnginePreset, Passthrough, ReverseBins, SpectralEdit, StereoProcessor,
};

#[cfg(all(feature = "assert_process_allocs", debug_assertions))]
#[global_allocator]
static ALLOCATOR: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

const DEFAULT_BLOCK: usize = 512;
const MAX_BLOCK: usize = 1 << 16;
const USAGE: &str = "stft_render <input.wav> <output.wav> [--preset NAME | --config FILE] \
                     [--edit passthrough|reverse] [--block SIZE] [--compensate]";

#[derive(Clone, Copy)]
enum EditKind {
    Passthrough,
    Reverse,
}

impl EditKind {
    fn make(self) -> Box<dyn SpectralEdit> {
        match self {
            EditKind::Passthrough => Box::new(Passthrough),
            EditKind::Reverse => Box::new(ReverseBins),
        }
    }
}

struct Args {
    input: PathBuf,
    output: PathBuf,
    preset: Option<EnginePreset>,
    config: Option<PathBuf>,
    edit: EditKind,
    block: usize,
    compensate: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut preset = None;
    let mut config = None;
    let mut edit = EditKind::Passthrough;
    let mut block = DEFAULT_BLOCK;
    let mut compensate = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--preset" => {
                let name = it.next().context("--preset needs a name")?;
                preset = Some(
                    EnginePreset::from_name(&name)
                        .with_context(|| format!("unknown preset '{name}'"))?,
                );
            }
            "--config" => {
                config = Some(PathBuf::from(it.next().context("--config needs a path")?));
            }
            "--edit" => {
                edit = match it.next().context("--edit needs a value")?.as_str() {
                    "passthrough" => EditKind::Passthrough,
                    "reverse" => EditKind::Reverse,
                    other => bail!("unknown edit '{other}' (expected passthrough or reverse)"),
                };
            }
            "--block" => {
                let raw = it.next().context("--block needs a size")?;
                block = raw
                    .parse()
                    .with_context(|| format!("invalid block size '{raw}'"))?;
                if block == 0 || block > MAX_BLOCK {
                    bail!("block size must be in 1..={MAX_BLOCK}");
                }
            }
            "--compensate" => compensate = true,
            flag if flag.starts_with("--") => bail!("unknown flag '{flag}'"),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    if preset.is_some() && config.is_some() {
        bail!("--preset and --config are mutually exclusive");
    }
    let mut positional = positional.into_iter();
    let (Some(input), Some(output), None) =
        (positional.next(), positional.next(), positional.next())
    else {
        bail!("usage: {USAGE}");
    };

    Ok(Args {
        input,
        output,
        preset,
        config,
        edit,
        block,
        compensate,
    })
}

/// Reads a WAV file into one buffer per channel, scaled to [-1, 1].
fn read_channels(path: &Path) -> Result<(WavSpec, Vec<Vec<f32>>)> {
    let reader = WavReader::open(path)
        .with_context(|| format!("failed to open input WAV '{}'", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || channels > 2 {
        bail!("only mono and stereo input is supported (got {channels} channels)");
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                bail!("float WAV must be 32-bit");
            }
            reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .context("failed to decode float samples")?
        }
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .context("failed to decode integer samples")?
        }
    };

    let mut out = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &v) in frame.iter().enumerate() {
            out[ch].push(v);
        }
    }
    Ok((spec, out))
}

fn resolve_config(args: &Args, sample_rate: f32) -> Result<EngineConfig> {
    let config = if let Some(path) = &args.config {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        EngineConfig::from_json_str(&json)?.with_sample_rate(sample_rate)
    } else if let Some(preset) = args.preset {
        info!("using preset '{}': {}", preset.name(), preset.description());
        preset.config(sample_rate)
    } else {
        EngineConfig::default().with_sample_rate(sample_rate)
    };
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    #[cfg(feature = "debug")]
    stft_engine::debug::logger::init_logger();

    let args = parse_args()?;
    let (spec, mut channels) = read_channels(&args.input)?;
    let sample_rate = spec.sample_rate as f32;
    let config = resolve_config(&args, sample_rate)?;
    let edit = args.edit;
    let mut processor = StereoProcessor::with_hooks(&config, |_| edit.make())?;
    let latency = processor.latency_samples();
    let input_len = channels[0].len();

    let input_rms: Vec<f32> = channels.iter().map(|c| frame_rms(c)).collect();
    if args.compensate {
        for ch in channels.iter_mut() {
            ch.resize(input_len + latency, 0.0);
        }
    }

    info!(
        "rendering '{}' ({} ch, {} Hz, {} samples, block {})",
        args.input.display(),
        channels.len(),
        spec.sample_rate,
        input_len,
        args.block
    );

    match channels.as_mut_slice() {
        [mono] => {
            for block in mono.chunks_mut(args.block) {
                processor.process_block_mono(block);
            }
        }
        [left, right] => {
            for (l, r) in left.chunks_mut(args.block).zip(right.chunks_mut(args.block)) {
                processor.process_block(l, r);
            }
        }
        _ => unreachable!("channel count checked when reading"),
    }

    if args.compensate {
        for ch in channels.iter_mut() {
            ch.drain(..latency);
        }
    }

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, out_spec)
        .with_context(|| format!("failed to create output WAV '{}'", args.output.display()))?;
    let out_len = channels[0].len();
    for t in 0..out_len {
        for ch in &channels {
            writer.write_sample(ch[t])?;
        }
    }
    writer.finalize().context("failed to finalize output WAV")?;

    #[cfg(feature = "debug")]
    {
        let stats = stft_engine::debug::logger::drain_to_file(Path::new("stft_render.debug.log"))
            .context("failed to drain debug log")?;
        info!(
            "debug log: {} entries written, {} dropped",
            stats.written, stats.dropped
        );
    }

    println!("Render summary for '{}':", args.input.display());
    println!(
        "  latency          : {} samples ({:.2} ms)",
        latency,
        latency as f32 * 1000.0 / sample_rate
    );
    println!(
        "  frames per ch    : {}",
        processor.channel(Channel::Left).frames_fired()
    );
    for (ch, samples) in channels.iter().enumerate() {
        println!(
            "  ch{} level in/out : {:.2} dBFS / {:.2} dBFS",
            ch,
            lin_to_db(input_rms[ch]),
            lin_to_db(frame_rms(samples))
        );
    }
    println!("  wrote            : {}", args.output.display());
    Ok(())
}
