#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quell::gain_math::GainKernel;
use quell::{DenoiserConfig, FftDenoiser, FrameOutcome, ProcessorParameters};

#[derive(Debug, Arbitrary)]
struct FrameParams {
    enable: bool,
    learn_noise: bool,
    residual_listen: bool,
    reduction_amount_db: f32,
    release_time_ms: f32,
    masking_ceiling_percent: f32,
    whitening_factor: f32,
    transient_threshold: f32,
    noise_rescale: f32,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Transform length index: 64 << (idx % 6)
    fft_size_idx: u8,
    /// Overlap index: 1 << (idx % 4)
    overlap_idx: u8,
    kernel_idx: u8,
    snr_influence: f32,
    /// Per-frame controls, cycled over the frames.
    params: Vec<FrameParams>,
    /// Spectrum values, chunked into frames.
    values: Vec<f32>,
}

fn kernel(idx: u8, snr_influence: f32) -> GainKernel {
    match idx % 4 {
        0 => GainKernel::NonlinearSubtraction { snr_influence },
        1 => GainKernel::LinearSubtraction,
        2 => GainKernel::HardGate,
        _ => GainKernel::WidebandGate,
    }
}

/// Keep spectra finite so non-finite output can only come from the engine.
fn sanitize_value(v: f32) -> f32 {
    if v.is_finite() { v.clamp(-1e3, 1e3) } else { 0.0 }
}

fuzz_target!(|input: FuzzInput| {
    let fft_size = 64usize << (input.fft_size_idx % 6);
    let overlap = 1usize << (input.overlap_idx % 4);
    let snr_influence = sanitize_value(input.snr_influence);
    let Ok(config) = DenoiserConfig::new(48_000, fft_size, overlap) else {
        return;
    };
    let config = config.with_gain_kernel(kernel(input.kernel_idx, snr_influence));
    let mut denoiser = FftDenoiser::new(config);

    if input.params.is_empty() {
        return;
    }

    for (i, chunk) in input.values.chunks(fft_size).enumerate() {
        let p = &input.params[i % input.params.len()];
        denoiser.set_parameters(ProcessorParameters {
            enable: p.enable,
            learn_noise: p.learn_noise,
            residual_listen: p.residual_listen,
            reduction_amount_db: p.reduction_amount_db,
            release_time_ms: p.release_time_ms,
            masking_ceiling_percent: p.masking_ceiling_percent,
            whitening_factor: p.whitening_factor,
            transient_threshold: p.transient_threshold,
            noise_rescale: p.noise_rescale,
        });

        let mut frame: Vec<f32> = chunk.iter().copied().map(sanitize_value).collect();
        let outcome = denoiser.run(&mut frame);
        if chunk.len() != fft_size {
            assert_eq!(outcome, FrameOutcome::InvalidFrameLength);
            continue;
        }
        assert!(frame.iter().all(|v| v.is_finite()), "non-finite output");
        let wet = denoiser.wet_dry();
        assert!((0.0..=1.0).contains(&wet));
    }
});
