use std::time::Instant;

use clap::{Parser, ValueEnum};
use hound::{WavReader, WavWriter};
use srconv::{NonIntegerResampler, ResamplingMode};

const BLOCK_SIZE: usize = 512;

#[derive(Parser, Debug)]
#[command(name = "convert")]
#[command(about = "Run WAV files through the dual-direction resampling pipeline", long_about = None)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Mode::Lanczos)]
    mode: Mode,
    /// Internal rendering sample rate in Hz.
    #[arg(long, value_name = "RATE", default_value_t = 48000.0)]
    rendering_rate: f64,
    /// Gain applied by the processing callback at the rendering rate.
    #[arg(long, value_name = "FACTOR", default_value_t = 1.0)]
    gain: f32,
    input: String,
    output: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Linear,
    Cubic,
    Lanczos,
}

impl From<Mode> for ResamplingMode {
    fn from(value: Mode) -> Self {
        match value {
            Mode::Linear => ResamplingMode::Linear,
            Mode::Cubic => ResamplingMode::Cubic,
            Mode::Lanczos => ResamplingMode::Lanczos,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut reader = match WavReader::open(&cli.input) {
        Ok(reader) => reader,
        Err(error) => {
            eprintln!("Failed to open {}: {error}", cli.input);
            std::process::exit(1);
        }
    };
    let spec = reader.spec();

    println!(
        "Input: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );
    println!(
        "Pipeline: {} Hz -> {:?} @ {} Hz -> {} Hz",
        spec.sample_rate,
        cli.mode,
        cli.rendering_rate,
        spec.sample_rate
    );

    // Read all samples and convert to f32.
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().map(|s| s.unwrap()).collect(),
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.unwrap() as f32 / max_value)
                .collect()
        }
    };

    // Split into stereo channel buffers, duplicating mono input.
    let (mut left, mut right) = (Vec::new(), Vec::new());
    match spec.channels {
        1 => {
            left = samples.clone();
            right = samples;
        }
        2 => {
            for frame in samples.chunks_exact(2) {
                left.push(frame[0]);
                right.push(frame[1]);
            }
        }
        other => {
            eprintln!("Unsupported channel count: {other}");
            std::process::exit(1);
        }
    }

    let mut resampler = match NonIntegerResampler::new(cli.rendering_rate, cli.mode.into()) {
        Ok(resampler) => resampler,
        Err(error) => {
            eprintln!("Failed to create resampler: {error}");
            std::process::exit(1);
        }
    };
    if let Err(error) = resampler.reset(spec.sample_rate as f64, BLOCK_SIZE) {
        eprintln!("Failed to configure resampler: {error}");
        std::process::exit(1);
    }

    let frames = left.len();
    println!("Input frames: {frames}");

    let gain = cli.gain;
    let mut out_left = vec![0.0f32; frames.next_multiple_of(BLOCK_SIZE)];
    let mut out_right = vec![0.0f32; out_left.len()];

    // Pad the tail block with silence so every block has a full frame count.
    left.resize(out_left.len(), 0.0);
    right.resize(out_left.len(), 0.0);

    let start = Instant::now();
    for block_start in (0..left.len()).step_by(BLOCK_SIZE) {
        let block_end = block_start + BLOCK_SIZE;
        let result = resampler.process_block(
            [&left[block_start..block_end], &right[block_start..block_end]],
            [
                &mut out_left[block_start..block_end],
                &mut out_right[block_start..block_end],
            ],
            |left, right| {
                for sample in left.iter_mut().chain(right.iter_mut()) {
                    *sample *= gain;
                }
            },
        );
        if let Err(error) = result {
            eprintln!("Processing failed: {error}");
            std::process::exit(1);
        }
    }
    let elapsed = start.elapsed();
    println!("Processed in {elapsed:?}");

    let output_spec = hound::WavSpec {
        channels: 2,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = match WavWriter::create(&cli.output, output_spec) {
        Ok(writer) => writer,
        Err(error) => {
            eprintln!("Failed to create {}: {error}", cli.output);
            std::process::exit(1);
        }
    };
    for i in 0..frames {
        writer.write_sample(out_left[i]).unwrap();
        writer.write_sample(out_right[i]).unwrap();
    }
    writer.finalize().unwrap();

    println!("Wrote {} frames to {}", frames, cli.output);
}
