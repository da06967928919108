//! Construction-time configuration for the denoiser.
//!
//! Everything here is validated once when an
//! [`FftDenoiser`](crate::FftDenoiser) is built and never changes afterwards.
//! Controls that may change on every frame live in
//! [`ProcessorParameters`](crate::ProcessorParameters).

use std::error::Error;
use std::fmt;

use crate::gain_math::GainKernel;

/// Minimum supported sample rate in Hz.
pub const MIN_SAMPLE_RATE_HZ: u32 = 8_000;
/// Maximum supported sample rate in Hz.
pub const MAX_SAMPLE_RATE_HZ: u32 = 384_000;
/// Smallest supported transform length.
pub const MIN_FFT_SIZE: usize = 64;
/// Largest supported transform length.
pub const MAX_FFT_SIZE: usize = 65_536;
/// Default time over which the residual whitening maximum halves.
pub const DEFAULT_WHITENING_HALF_LIFE_MS: f32 = 1000.0;

/// Error returned when a [`DenoiserConfig`] cannot be built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Sample rate is outside the supported range.
    UnsupportedSampleRate { sample_rate_hz: u32 },
    /// Transform length is not a power of two in the supported range.
    InvalidFftSize { fft_size: usize },
    /// Overlap factor is zero or does not divide the transform length.
    InvalidOverlapFactor {
        fft_size: usize,
        overlap_factor: usize,
    },
    /// Whitening half-life is not a positive finite number of milliseconds.
    InvalidWhiteningHalfLife { half_life_ms: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UnsupportedSampleRate { sample_rate_hz } => write!(
                f,
                "unsupported sample rate {sample_rate_hz}; expected {MIN_SAMPLE_RATE_HZ}..={MAX_SAMPLE_RATE_HZ}",
            ),
            Self::InvalidFftSize { fft_size } => write!(
                f,
                "fft size {fft_size} must be a power of two in {MIN_FFT_SIZE}..={MAX_FFT_SIZE}",
            ),
            Self::InvalidOverlapFactor {
                fft_size,
                overlap_factor,
            } => write!(
                f,
                "overlap factor {overlap_factor} must be non-zero and divide fft size {fft_size}",
            ),
            Self::InvalidWhiteningHalfLife { half_life_ms } => write!(
                f,
                "whitening half-life {half_life_ms} ms must be positive and finite",
            ),
        }
    }
}

impl Error for ConfigError {}

/// How learned frames are folded into the noise profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoiseLearning {
    /// Minima-controlled averaging: a running minimum of the short-term
    /// smoothed power decides which bins hold noise only, and those bins
    /// average their raw power into the profile. Bursts of signal energy
    /// during learning are left out.
    #[default]
    MinimumTracking,
    /// Arithmetic mean over every learned frame.
    RollingMean,
}

/// Validated engine configuration.
///
/// Invariants:
/// - `sample_rate_hz` is in `8000..=384000`.
/// - `fft_size` is a power of two in `64..=65536`.
/// - `overlap_factor` is non-zero and divides `fft_size`.
/// - `whitening_half_life_ms` is positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenoiserConfig {
    sample_rate_hz: u32,
    fft_size: usize,
    overlap_factor: usize,
    gain_kernel: GainKernel,
    noise_learning: NoiseLearning,
    whitening_half_life_ms: f32,
}

impl DenoiserConfig {
    /// Create a validated configuration with the default gain kernel and
    /// learning policy.
    pub fn new(
        sample_rate_hz: u32,
        fft_size: usize,
        overlap_factor: usize,
    ) -> Result<Self, ConfigError> {
        if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&sample_rate_hz) {
            return Err(ConfigError::UnsupportedSampleRate { sample_rate_hz });
        }
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(ConfigError::InvalidFftSize { fft_size });
        }
        if overlap_factor == 0 || fft_size % overlap_factor != 0 {
            return Err(ConfigError::InvalidOverlapFactor {
                fft_size,
                overlap_factor,
            });
        }
        Ok(Self {
            sample_rate_hz,
            fft_size,
            overlap_factor,
            gain_kernel: GainKernel::default(),
            noise_learning: NoiseLearning::default(),
            whitening_half_life_ms: DEFAULT_WHITENING_HALF_LIFE_MS,
        })
    }

    /// Select the attenuation kernel.
    pub fn with_gain_kernel(mut self, gain_kernel: GainKernel) -> Self {
        self.gain_kernel = gain_kernel;
        self
    }

    /// Select how learned frames accumulate into the noise profile.
    pub fn with_noise_learning(mut self, noise_learning: NoiseLearning) -> Self {
        self.noise_learning = noise_learning;
        self
    }

    /// Set the time over which the whitening running maximum halves.
    pub fn with_whitening_half_life_ms(mut self, half_life_ms: f32) -> Result<Self, ConfigError> {
        if !half_life_ms.is_finite() || half_life_ms <= 0.0 {
            return Err(ConfigError::InvalidWhiteningHalfLife { half_life_ms });
        }
        self.whitening_half_life_ms = half_life_ms;
        Ok(self)
    }

    /// The sampling rate in Hz.
    #[inline]
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Length of the packed half-complex frame passed to `run`.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of overlapping frames per transform length.
    #[inline]
    pub fn overlap_factor(&self) -> usize {
        self.overlap_factor
    }

    /// Samples between consecutive frames.
    #[inline]
    pub fn hop_size(&self) -> usize {
        self.fft_size / self.overlap_factor
    }

    /// Index of the Nyquist bin.
    #[inline]
    pub fn half_size(&self) -> usize {
        self.fft_size / 2
    }

    /// Number of unique frequency bins (`fft_size / 2 + 1`).
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// The attenuation kernel.
    #[inline]
    pub fn gain_kernel(&self) -> GainKernel {
        self.gain_kernel
    }

    /// The noise learning policy.
    #[inline]
    pub fn noise_learning(&self) -> NoiseLearning {
        self.noise_learning
    }

    /// Half-life of the whitening running maximum in milliseconds.
    #[inline]
    pub fn whitening_half_life_ms(&self) -> f32 {
        self.whitening_half_life_ms
    }

    /// Duration of one hop in milliseconds.
    pub(crate) fn hop_duration_ms(&self) -> f32 {
        1000.0 * self.hop_size() as f32 / self.sample_rate_hz as f32
    }
}
