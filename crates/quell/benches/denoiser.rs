//! Benchmarks for the per-frame denoising path.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quell::gain_math::GainKernel;
use quell::{DenoiserConfig, FftDenoiser, ProcessorParameters};
use quell_proptest::generators::{mix_frames, noise_frame, stationary_noise_frames, tone_frame};

const SAMPLE_RATE: u32 = 48_000;

fn learned_denoiser(fft_size: usize, kernel: GainKernel) -> FftDenoiser {
    let config = DenoiserConfig::new(SAMPLE_RATE, fft_size, 4)
        .unwrap()
        .with_gain_kernel(kernel);
    let mut denoiser = FftDenoiser::new(config);
    denoiser.set_parameters(ProcessorParameters {
        learn_noise: true,
        ..Default::default()
    });
    for mut frame in stationary_noise_frames(fft_size, 0.05, 1, 50) {
        denoiser.run(&mut frame);
    }
    denoiser
}

fn bench_fft_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("denoise_frame");
    for fft_size in [512usize, 2048, 8192] {
        let mut denoiser = learned_denoiser(fft_size, GainKernel::LinearSubtraction);
        denoiser.set_parameters(ProcessorParameters::default());
        let input = mix_frames(&noise_frame(fft_size, 0.05, 9), &tone_frame(fft_size, 40, 1.0));
        let mut frame = input.clone();

        group.bench_with_input(BenchmarkId::from_parameter(fft_size), &input, |b, input| {
            b.iter(|| {
                frame.copy_from_slice(input);
                black_box(denoiser.run(black_box(&mut frame)));
            });
        });
    }
    group.finish();
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("gain_kernel");
    let fft_size = 2048;
    let kernels = [
        ("nonlinear", GainKernel::NonlinearSubtraction { snr_influence: 1.0 }),
        ("linear", GainKernel::LinearSubtraction),
        ("hard_gate", GainKernel::HardGate),
        ("wideband_gate", GainKernel::WidebandGate),
    ];
    let input = mix_frames(&noise_frame(fft_size, 0.05, 9), &tone_frame(fft_size, 40, 1.0));
    for (name, kernel) in kernels {
        let mut denoiser = learned_denoiser(fft_size, kernel);
        denoiser.set_parameters(ProcessorParameters::default());
        let mut frame = input.clone();
        group.bench_function(name, |b| {
            b.iter(|| {
                frame.copy_from_slice(&input);
                black_box(denoiser.run(black_box(&mut frame)));
            });
        });
    }
    group.finish();
}

fn bench_full_features(c: &mut Criterion) {
    let fft_size = 2048;
    let mut denoiser = learned_denoiser(fft_size, GainKernel::LinearSubtraction);
    denoiser.set_parameters(ProcessorParameters {
        whitening_factor: 0.5,
        transient_threshold: 2.0,
        ..Default::default()
    });
    let input = mix_frames(&noise_frame(fft_size, 0.05, 9), &tone_frame(fft_size, 40, 1.0));
    let mut frame = input.clone();
    c.bench_function("denoise_whitening_transients_2048", |b| {
        b.iter(|| {
            frame.copy_from_slice(&input);
            black_box(denoiser.run(black_box(&mut frame)));
        });
    });
}

fn bench_learning(c: &mut Criterion) {
    let fft_size = 2048;
    let mut denoiser = learned_denoiser(fft_size, GainKernel::LinearSubtraction);
    let input = noise_frame(fft_size, 0.05, 9);
    let mut frame = input.clone();
    c.bench_function("learn_2048", |b| {
        b.iter(|| {
            frame.copy_from_slice(&input);
            black_box(denoiser.run(black_box(&mut frame)));
        });
    });
}

criterion_group!(
    benches,
    bench_fft_sizes,
    bench_kernels,
    bench_full_features,
    bench_learning
);
criterion_main!(benches);
