//! Denoise a WAV file.
//!
//! Learns the noise profile from the first `--learn-seconds` of the input
//! (which should contain only background noise), then denoises the whole
//! file. Shows the framing a host wraps around `FftDenoiser::run`:
//! square-root Hann windowing, a real FFT, half-complex packing, the
//! inverse FFT and overlap-add. Every channel gets its own engine.
//!
//! ```sh
//! cargo run -p quell --features examples --example wav -- \
//!     --input noisy.wav --output clean.wav --learn-seconds 1.0
//! ```

use std::f32::consts::PI;
use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use realfft::RealFftPlanner;
use realfft::num_complex::Complex;

use quell::gain_math::GainKernel;
use quell::{DenoiserConfig, FftDenoiser, ProcessorParameters};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kernel {
    Nonlinear,
    Linear,
    Gate,
    Wideband,
}

impl Kernel {
    fn into_gain_kernel(self, snr_influence: f32) -> GainKernel {
        match self {
            Self::Nonlinear => GainKernel::NonlinearSubtraction { snr_influence },
            Self::Linear => GainKernel::LinearSubtraction,
            Self::Gate => GainKernel::HardGate,
            Self::Wideband => GainKernel::WidebandGate,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Spectral noise reduction of a WAV file with quell")]
struct Args {
    /// Input WAV file.
    #[arg(short, long)]
    input: String,

    /// Output WAV file (32-bit float).
    #[arg(short, long, default_value = "denoised.wav")]
    output: String,

    /// Seconds of noise-only audio at the start of the input.
    #[arg(long, default_value_t = 1.0)]
    learn_seconds: f32,

    /// Transform length (power of two).
    #[arg(long, default_value_t = 2048)]
    fft_size: usize,

    /// Frames per transform length; at least 2.
    #[arg(long, default_value_t = 4)]
    overlap: usize,

    /// Attenuation kernel.
    #[arg(long, value_enum, default_value_t = Kernel::Linear)]
    kernel: Kernel,

    /// SNR influence of the non-linear kernel.
    #[arg(long, default_value_t = 1.0)]
    snr_influence: f32,

    /// Residual attenuation in dB.
    #[arg(long, default_value_t = 10.0)]
    reduction_db: f32,

    /// Gain release time in ms.
    #[arg(long, default_value_t = 150.0)]
    release_ms: f32,

    /// Residual whitening amount, 0 to 1.
    #[arg(long, default_value_t = 0.0)]
    whitening: f32,

    /// Transient protection sensitivity, 0 (off) to 4.
    #[arg(long, default_value_t = 0.0)]
    transient_threshold: f32,

    /// Output only what is removed.
    #[arg(long)]
    residual_listen: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if args.overlap < 2 {
        bail!("overlap must be at least 2 for square-root Hann overlap-add");
    }

    let mut reader =
        WavReader::open(&args.input).with_context(|| format!("opening {}", args.input))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    let samples = read_samples(&mut reader)?;

    let config = DenoiserConfig::new(spec.sample_rate, args.fft_size, args.overlap)?
        .with_gain_kernel(args.kernel.into_gain_kernel(args.snr_influence));
    let params = ProcessorParameters {
        reduction_amount_db: args.reduction_db,
        release_time_ms: args.release_ms,
        whitening_factor: args.whitening,
        transient_threshold: args.transient_threshold,
        residual_listen: args.residual_listen,
        ..Default::default()
    };
    let learn_samples = (args.learn_seconds * spec.sample_rate as f32) as usize;

    let num_frames = samples.len() / channels;
    let mut output = vec![0.0f32; samples.len()];
    for ch in 0..channels {
        let signal: Vec<f32> = samples.iter().skip(ch).step_by(channels).copied().collect();
        let denoised = process_channel(&signal, config, params, learn_samples)?;
        for (i, v) in denoised.into_iter().enumerate().take(num_frames) {
            output[i * channels + ch] = v;
        }
    }

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, out_spec)
        .with_context(|| format!("creating {}", args.output))?;
    for v in output {
        writer.write_sample(v)?;
    }
    writer.finalize()?;

    println!(
        "Denoised {} samples x {} channels into {}",
        num_frames, channels, args.output
    );
    Ok(())
}

fn read_samples(reader: &mut WavReader<BufReader<File>>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(samples)
}

/// Square-root periodic Hann window; its square overlap-adds to a constant.
fn sqrt_hann(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f32 / len as f32).cos()).sqrt())
        .collect()
}

fn process_channel(
    signal: &[f32],
    config: DenoiserConfig,
    params: ProcessorParameters,
    learn_samples: usize,
) -> Result<Vec<f32>> {
    let fft_size = config.fft_size();
    let hop = config.hop_size();
    let half = fft_size / 2;

    let mut planner = RealFftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(fft_size);
    let inverse = planner.plan_fft_inverse(fft_size);
    let mut time = forward.make_input_vec();
    let mut spectrum = forward.make_output_vec();
    let mut packed = vec![0.0f32; fft_size];

    let window = sqrt_hann(fft_size);
    let overlap_gain: f32 = (0..config.overlap_factor())
        .map(|j| window[j * hop].powi(2))
        .sum();
    let output_scale = 1.0 / (fft_size as f32 * overlap_gain);

    // Pad so the first and last samples get full overlap.
    let mut padded = vec![0.0f32; signal.len() + 2 * fft_size];
    padded[fft_size..fft_size + signal.len()].copy_from_slice(signal);
    let mut output = vec![0.0f32; padded.len()];

    let mut denoiser = FftDenoiser::new(config);
    let mut start = 0;
    while start + fft_size <= padded.len() {
        for ((t, &x), &w) in time.iter_mut().zip(&padded[start..]).zip(&window) {
            *t = x * w;
        }
        forward.process(&mut time, &mut spectrum)?;

        for (k, bin) in spectrum.iter().enumerate() {
            packed[k] = bin.re;
            if k != 0 && k != half {
                packed[fft_size - k] = bin.im;
            }
        }

        // The frame ends at signal sample `start` once padding is removed.
        denoiser.set_parameters(ProcessorParameters {
            learn_noise: start <= learn_samples,
            ..params
        });
        denoiser.run(&mut packed);

        for (k, bin) in spectrum.iter_mut().enumerate() {
            let im = if k != 0 && k != half {
                packed[fft_size - k]
            } else {
                0.0
            };
            *bin = Complex::new(packed[k], im);
        }
        inverse.process(&mut spectrum, &mut time)?;

        for ((o, &t), &w) in output[start..].iter_mut().zip(&time).zip(&window) {
            *o += t * w * output_scale;
        }
        start += hop;
    }

    let stats = denoiser.stats();
    tracing::info!(
        blocks_learned = stats.blocks_learned,
        mean_gain = stats.mean_gain,
        "channel processed",
    );
    Ok(output[fft_size..fft_size + signal.len()].to_vec())
}
