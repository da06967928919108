//! Property tests for the gain kernels and the engine's pass-through paths.

use proptest::prelude::*;
use quell::gain_math::{GainKernel, NOISE_FLOOR};
use quell::{DenoiserConfig, FftDenoiser, FrameOutcome, NoiseLearning, ProcessorParameters};
use quell_proptest::generators::noise_frame;
use quell_proptest::strategies::{
    fft_size, sized_frame, spectrum_and_floor_thresholds, spectrum_and_thresholds,
};
use test_strategy::proptest;

fn kernel() -> impl Strategy<Value = GainKernel> {
    prop_oneof![
        (0.0f32..4.0)
            .prop_map(|snr_influence| GainKernel::NonlinearSubtraction { snr_influence }),
        Just(GainKernel::LinearSubtraction),
        Just(GainKernel::HardGate),
        Just(GainKernel::WidebandGate),
    ]
}

fn parameters() -> impl Strategy<Value = ProcessorParameters> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        0.0f32..=40.0,
        0.0f32..=1000.0,
        0.0f32..=100.0,
        0.0f32..=1.0,
        0.0f32..=4.0,
        0.0f32..=100.0,
    )
        .prop_map(
            |(
                enable,
                learn_noise,
                residual_listen,
                reduction_amount_db,
                release_time_ms,
                masking_ceiling_percent,
                whitening_factor,
                transient_threshold,
                noise_rescale,
            )| ProcessorParameters {
                enable,
                learn_noise,
                residual_listen,
                reduction_amount_db,
                release_time_ms,
                masking_ceiling_percent,
                whitening_factor,
                transient_threshold,
                noise_rescale,
            },
        )
}

fn noise_learning() -> impl Strategy<Value = NoiseLearning> {
    prop_oneof![
        Just(NoiseLearning::MinimumTracking),
        Just(NoiseLearning::RollingMean),
    ]
}

#[proptest]
fn gains_are_finite_and_bounded(
    #[strategy(spectrum_and_thresholds())] input: (Vec<f32>, Vec<f32>),
    #[strategy(kernel())] kernel: GainKernel,
) {
    let (spectrum, thresholds) = input;
    let mut gains = vec![f32::NAN; spectrum.len()];
    kernel.compute(&spectrum, &thresholds, &mut gains);
    for &g in &gains {
        prop_assert!(g.is_finite());
        prop_assert!((0.0..=1.0).contains(&g), "gain {g} out of range");
    }
}

#[proptest]
fn floor_thresholds_pass_everything(
    #[strategy(spectrum_and_floor_thresholds())] input: (Vec<f32>, Vec<f32>),
    #[strategy(kernel())] kernel: GainKernel,
) {
    let (spectrum, thresholds) = input;
    let mut gains = vec![0.0f32; spectrum.len()];
    kernel.compute(&spectrum, &thresholds, &mut gains);
    prop_assert!(gains.iter().all(|&g| g == 1.0));
}

#[proptest]
fn hard_gate_is_a_per_bin_comparison(
    #[strategy(spectrum_and_thresholds())] input: (Vec<f32>, Vec<f32>),
) {
    let (spectrum, thresholds) = input;
    let mut first = vec![0.5f32; spectrum.len()];
    let mut second = vec![0.5f32; spectrum.len()];
    GainKernel::HardGate.compute(&spectrum, &thresholds, &mut first);
    GainKernel::HardGate.compute(&spectrum, &thresholds, &mut second);
    prop_assert_eq!(&first, &second);

    for ((&g, &s), &n) in first.iter().zip(&spectrum).zip(&thresholds) {
        let expected = if n <= NOISE_FLOOR || s >= n { 1.0 } else { 0.0 };
        prop_assert_eq!(g, expected);
    }
}

#[proptest]
fn wideband_gate_makes_one_decision(
    #[strategy(spectrum_and_thresholds())] input: (Vec<f32>, Vec<f32>),
) {
    let (spectrum, thresholds) = input;
    let mut gains = vec![0.5f32; spectrum.len()];
    GainKernel::WidebandGate.compute(&spectrum, &thresholds, &mut gains);
    let first = gains[0];
    prop_assert!(first == 0.0 || first == 1.0);
    prop_assert!(gains.iter().all(|&g| g == first));
}

#[proptest]
fn unlearned_engine_never_alters_frames(#[strategy(sized_frame())] input: (usize, Vec<f32>)) {
    let (fft_size, frame) = input;
    let mut denoiser = FftDenoiser::new(DenoiserConfig::new(48_000, fft_size, 4).unwrap());
    let mut output = frame.clone();
    for _ in 0..3 {
        let outcome = denoiser.run(&mut output);
        prop_assert!(matches!(
            outcome,
            FrameOutcome::NoiseProfileUnavailable | FrameOutcome::Silent
        ));
    }
    prop_assert_eq!(output, frame);
}

#[proptest]
fn denoised_output_stays_finite(
    #[strategy(sized_frame())] noise: (usize, Vec<f32>),
    #[strategy(0.0f32..=1.0)] whitening_factor: f32,
    #[strategy(0.0f32..=4.0)] transient_threshold: f32,
    residual_listen: bool,
) {
    let (fft_size, noise) = noise;
    let mut denoiser = FftDenoiser::new(DenoiserConfig::new(48_000, fft_size, 4).unwrap());
    denoiser.set_parameters(ProcessorParameters {
        learn_noise: true,
        ..Default::default()
    });
    denoiser.run(&mut noise.clone());

    denoiser.set_parameters(ProcessorParameters {
        whitening_factor,
        transient_threshold,
        residual_listen,
        ..Default::default()
    });
    let mut frame: Vec<f32> = noise.iter().map(|v| v * 1.5).collect();
    for _ in 0..4 {
        denoiser.run(&mut frame);
        prop_assert!(frame.iter().all(|v| v.is_finite()));
    }
}

#[proptest]
fn dc_only_frames_are_left_alone(
    #[strategy(fft_size())] fft_size: usize,
    #[strategy(kernel())] kernel: GainKernel,
    #[strategy(noise_learning())] learning: NoiseLearning,
    #[strategy(parameters())] params: ProcessorParameters,
    #[strategy(-10.0f32..=10.0)] dc: f32,
    learned: bool,
) {
    let config = DenoiserConfig::new(48_000, fft_size, 4)
        .unwrap()
        .with_gain_kernel(kernel)
        .with_noise_learning(learning);
    let mut denoiser = FftDenoiser::new(config);
    if learned {
        denoiser.set_parameters(ProcessorParameters {
            learn_noise: true,
            ..Default::default()
        });
        denoiser.run(&mut noise_frame(fft_size, 0.1, 7));
    }
    denoiser.set_parameters(params);

    let mut frame = vec![0.0f32; fft_size];
    frame[0] = dc;
    let original = frame.clone();
    for _ in 0..3 {
        prop_assert_eq!(denoiser.run(&mut frame), FrameOutcome::Silent);
        prop_assert!(frame.iter().all(|v| v.is_finite()));
        prop_assert_eq!(&frame, &original);
    }
}
