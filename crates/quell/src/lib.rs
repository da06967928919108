//! Real-time spectral noise reduction.
//!
//! Learns the power spectrum of background noise from frames the host marks
//! as noise-only, then attenuates it per frequency bin while keeping
//! transients intact and switching on and off without clicks.
//!
//! The transform itself belongs to the host: [`FftDenoiser::run`] consumes
//! and produces a packed half-complex spectrum of `fft_size` floats.
//!
//! # Quick Start
//!
//! ```
//! use quell::{DenoiserConfig, FftDenoiser, ProcessorParameters};
//! use quell::gain_math::GainKernel;
//!
//! let config = DenoiserConfig::new(48_000, 2048, 4)?
//!     .with_gain_kernel(GainKernel::NonlinearSubtraction { snr_influence: 1.0 });
//! let mut denoiser = FftDenoiser::new(config);
//!
//! // While the host reports a noise-only passage:
//! denoiser.set_parameters(ProcessorParameters {
//!     learn_noise: true,
//!     ..Default::default()
//! });
//! // denoiser.run(&mut spectrum);
//!
//! // Afterwards:
//! denoiser.set_parameters(ProcessorParameters {
//!     reduction_amount_db: 20.0,
//!     ..Default::default()
//! });
//! // denoiser.run(&mut spectrum);
//! # Ok::<(), quell::ConfigError>(())
//! ```

pub mod config;
pub mod fft_denoiser;
pub(crate) mod gain_estimator;
pub mod gain_math;
pub(crate) mod noise_estimator;
pub mod noise_profile;
pub mod parameters;
pub(crate) mod spectrum;
pub mod state;
pub mod stats;
pub(crate) mod transient_detector;
pub(crate) mod whitening;

// Public re-exports.
pub use config::{ConfigError, DenoiserConfig, NoiseLearning};
pub use fft_denoiser::{FftDenoiser, FrameOutcome};
pub use gain_math::GainKernel;
pub use noise_profile::{NoiseProfile, ProfileError, RejectedProfile};
pub use parameters::ProcessorParameters;
pub use state::StateError;
pub use stats::DenoiserStats;
