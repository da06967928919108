//! Minimal noise reduction demo on synthetic spectra.
//!
//! Learns a noise profile from noise-only frames, then denoises frames that
//! carry a tone on top of the same noise and reports how much noise energy
//! was removed. Set `RUST_LOG=quell=debug` to see the engine's events.
//!
//! ```sh
//! cargo run -p quell --example simple
//! ```

use quell::{DenoiserConfig, FftDenoiser, FrameOutcome, ProcessorParameters};
use quell_proptest::generators::{energy, mix_frames, stationary_noise_frames, tone_frame};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: u32 = 48_000;
const FFT_SIZE: usize = 1024;
const OVERLAP: usize = 4;
const TONE_BIN: usize = 64;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = DenoiserConfig::new(SAMPLE_RATE, FFT_SIZE, OVERLAP).unwrap();
    let mut denoiser = FftDenoiser::new(config);

    // Noise-only passage.
    denoiser.set_parameters(ProcessorParameters {
        learn_noise: true,
        ..Default::default()
    });
    for mut frame in stationary_noise_frames(FFT_SIZE, 0.05, 7, 100) {
        assert_eq!(denoiser.run(&mut frame), FrameOutcome::Learned);
    }
    let profile = denoiser.noise_profile().unwrap();
    println!(
        "Learned {} frames, total noise power {:.4}",
        profile.blocks_learned(),
        profile.total_power(),
    );

    // Tone over noise.
    denoiser.set_parameters(ProcessorParameters {
        reduction_amount_db: 20.0,
        ..Default::default()
    });
    let tone = tone_frame(FFT_SIZE, TONE_BIN, 1.0);
    let mut noise_in = 0.0f32;
    let mut noise_out = 0.0f32;
    for noise in stationary_noise_frames(FFT_SIZE, 0.05, 99, 100) {
        let mut frame = mix_frames(&noise, &tone);
        denoiser.run(&mut frame);

        // Everything except the tone bin is noise.
        frame[TONE_BIN] = 0.0;
        frame[FFT_SIZE - TONE_BIN] = 0.0;
        let mut noise = noise;
        noise[TONE_BIN] = 0.0;
        noise[FFT_SIZE - TONE_BIN] = 0.0;
        noise_in += energy(&noise);
        noise_out += energy(&frame);
    }

    let stats = denoiser.stats();
    println!(
        "Noise energy reduced by {:.1} dB (mean gain {:.3}, wet/dry {:.2})",
        10.0 * (noise_in / noise_out).log10(),
        stats.mean_gain.unwrap_or(1.0),
        stats.wet_dry,
    );

    // The profile can be stored with the session and restored later.
    let bytes = denoiser.save_noise_profile().unwrap();
    let mut restored = FftDenoiser::new(config);
    restored.restore_noise_profile(&bytes).unwrap();
    println!("Saved and restored a {}-byte noise profile.", bytes.len());
}
