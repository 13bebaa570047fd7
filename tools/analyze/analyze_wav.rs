use acoustic_research_tool::{build_analyzer, AnalysisConfig, FileSink, TimeBase, WriterSink};
use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::PathBuf;

/// Samples handed to the engine per call, mimicking a host buffer.
const BLOCK_SIZE: usize = 512;

fn usage() -> ! {
    eprintln!("usage: analyze_wav <input.wav> [output.csv] [--config <analysis.json>]");
    std::process::exit(2);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut positional = Vec::new();
    let mut config_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = Some(PathBuf::from(args.next().unwrap_or_else(|| usage()))),
            "-h" | "--help" => usage(),
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    let mut positional = positional.into_iter();
    let input = positional.next().unwrap_or_else(|| usage());
    let output = positional.next();

    let mut config = match &config_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            AnalysisConfig::from_json_str(&json)
                .with_context(|| format!("invalid config '{}'", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    // Timestamps follow the file, not the wall clock.
    config.time_base = TimeBase::Stream;

    let reader = WavReader::open(&input)
        .with_context(|| format!("failed to open WAV '{}'", input.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let (mut engine, metrics, session) =
        build_analyzer(config).context("invalid analysis configuration")?;
    engine.prepare(spec.sample_rate as f32);
    log::info!(
        "analyzing '{}': {} Hz, {} channel(s), crossover bin {}",
        input.display(),
        spec.sample_rate,
        channels,
        engine.crossover_bin()
    );

    // First channel only, as in the plugin.
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .collect::<Result<Vec<f32>, _>>()
            .context("failed to decode float samples")?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<f32>, _>>()
                .context("failed to decode integer samples")?
        }
    };

    session.start_recording();
    for block in samples.chunks(BLOCK_SIZE) {
        engine.process_block(block);
        session.drain();
    }
    session.stop_recording();

    let summary = match &output {
        Some(path) => session.export_to(&mut FileSink::new(path))?,
        None => {
            let mut sink = WriterSink::new(std::io::stdout().lock(), "stdout");
            session.export_to(&mut sink)?
        }
    };

    let last = metrics.snapshot();
    eprintln!("Analysis summary for '{}':", input.display());
    eprintln!("  samples analyzed : {}", metrics.samples_processed());
    eprintln!("  frames analyzed  : {}", metrics.frames_analyzed());
    eprintln!("  rows written     : {} -> {}", summary.rows, summary.destination);
    eprintln!("  dropped points   : {}", session.dropped_points());
    eprintln!("  final score      : {:.1}", last.activation_score);
    Ok(())
}
