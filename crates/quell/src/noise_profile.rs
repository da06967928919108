//! Learned noise power spectrum.

use std::error::Error;
use std::fmt;

use crate::gain_math::NOISE_FLOOR;

/// Per-bin noise power estimate.
///
/// The profile's length is fixed at creation (`fft_size / 2 + 1` of the
/// transform it is learned at). It belongs to the host: it may be detached
/// from one [`FftDenoiser`](crate::FftDenoiser), persisted, and attached to
/// another one running at the same transform size.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseProfile {
    values: Vec<f32>,
    blocks_learned: u32,
}

impl NoiseProfile {
    /// Create an empty profile for a transform of `fft_size` samples.
    pub fn new(fft_size: usize) -> Self {
        Self {
            values: vec![0.0; fft_size / 2 + 1],
            blocks_learned: 0,
        }
    }

    /// Create a profile from previously learned per-bin power values.
    ///
    /// `blocks_learned` is the number of frames the values were learned
    /// from; a profile with zero learned blocks is not usable for reduction.
    pub fn from_values(values: Vec<f32>, blocks_learned: u32) -> Self {
        Self {
            values,
            blocks_learned,
        }
    }

    /// Number of bins in the profile.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the profile has no bins at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The transform length this profile matches.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.values.len().saturating_sub(1) * 2
    }

    /// Per-bin noise power.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Number of frames folded into the estimate.
    #[inline]
    pub fn blocks_learned(&self) -> u32 {
        self.blocks_learned
    }

    pub(crate) fn mark_block_learned(&mut self) {
        self.blocks_learned = self.blocks_learned.saturating_add(1);
    }

    /// True once the profile holds a usable estimate.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.blocks_learned > 0 && !self.values.is_empty()
    }

    /// Forget everything learned, keeping the allocation.
    pub fn clear(&mut self) {
        self.values.fill(0.0);
        self.blocks_learned = 0;
    }

    /// Total noise power above the numeric floor.
    pub fn total_power(&self) -> f32 {
        self.values.iter().filter(|&&v| v > NOISE_FLOOR).sum()
    }

    /// Check that the profile can be used with a transform of `fft_size`.
    pub fn check_fft_size(&self, fft_size: usize) -> Result<(), ProfileError> {
        let expected_len = fft_size / 2 + 1;
        if self.values.len() != expected_len {
            return Err(ProfileError::LengthMismatch {
                expected_len,
                actual_len: self.values.len(),
            });
        }
        if let Some(bin) = self.values.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(ProfileError::InvalidValue { bin });
        }
        Ok(())
    }
}

/// Why a profile cannot be attached to an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    /// The profile was learned at a different transform size.
    LengthMismatch {
        expected_len: usize,
        actual_len: usize,
    },
    /// A bin holds a negative or non-finite power.
    InvalidValue { bin: usize },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::LengthMismatch {
                expected_len,
                actual_len,
            } => write!(
                f,
                "noise profile has {actual_len} bins; expected {expected_len}",
            ),
            Self::InvalidValue { bin } => {
                write!(f, "noise profile bin {bin} is negative or not finite")
            }
        }
    }
}

impl Error for ProfileError {}

/// A profile refused by [`FftDenoiser::attach_noise_profile`](crate::FftDenoiser::attach_noise_profile).
///
/// Hands the profile back so the caller keeps ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedProfile {
    error: ProfileError,
    profile: NoiseProfile,
}

impl RejectedProfile {
    pub(crate) fn new(error: ProfileError, profile: NoiseProfile) -> Self {
        Self { error, profile }
    }

    /// Why the profile was refused.
    pub fn error(&self) -> ProfileError {
        self.error
    }

    /// Take the profile back.
    pub fn into_profile(self) -> NoiseProfile {
        self.profile
    }
}

impl fmt::Display for RejectedProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "noise profile rejected: {}", self.error)
    }
}

impl Error for RejectedProfile {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}
