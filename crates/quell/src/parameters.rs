//! Per-frame control values.
//!
//! The host refreshes these before each call to
//! [`FftDenoiser::run`](crate::FftDenoiser::run). Unlike
//! [`DenoiserConfig`](crate::DenoiserConfig), changing them never
//! reallocates or resets the engine.

use std::ops::RangeInclusive;

/// Accepted range of [`ProcessorParameters::reduction_amount_db`].
pub const REDUCTION_AMOUNT_DB_RANGE: RangeInclusive<f32> = 0.0..=40.0;
/// Accepted range of [`ProcessorParameters::release_time_ms`].
pub const RELEASE_TIME_MS_RANGE: RangeInclusive<f32> = 0.0..=1000.0;
/// Accepted range of [`ProcessorParameters::masking_ceiling_percent`].
pub const MASKING_CEILING_PERCENT_RANGE: RangeInclusive<f32> = 0.0..=100.0;
/// Accepted range of [`ProcessorParameters::whitening_factor`].
pub const WHITENING_FACTOR_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Accepted range of [`ProcessorParameters::transient_threshold`].
pub const TRANSIENT_THRESHOLD_RANGE: RangeInclusive<f32> = 0.0..=4.0;
/// Accepted range of [`ProcessorParameters::noise_rescale`].
pub const NOISE_RESCALE_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// Runtime controls of the denoiser.
///
/// # Example
///
/// ```
/// use quell::ProcessorParameters;
///
/// let params = ProcessorParameters {
///     reduction_amount_db: 18.0,
///     whitening_factor: 0.5,
///     ..Default::default()
/// };
/// assert!(params.enable);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorParameters {
    /// Cross-fade toward the processed spectrum when set, toward the input
    /// when cleared (default: true).
    pub enable: bool,
    /// Treat incoming frames as noise-only and learn from them instead of
    /// reducing (default: false).
    pub learn_noise: bool,
    /// Output only what would be removed (default: false).
    pub residual_listen: bool,
    /// How far the removed residual is attenuated, in dB (default: 10).
    pub reduction_amount_db: f32,
    /// Time constant with which gains fall, in ms (default: 150). Rising
    /// gains are never smoothed.
    pub release_time_ms: f32,
    /// Percentage of the kernel's attenuation that may be applied. At 100
    /// the kernel mask is used as is; at 0 nothing is attenuated
    /// (default: 100).
    pub masking_ceiling_percent: f32,
    /// Amount of residual whitening in `0..=1` (default: 0).
    pub whitening_factor: f32,
    /// Transient protection sensitivity in `0..=4`; 0 disables it
    /// (default: 0).
    pub transient_threshold: f32,
    /// Multiplier on the learned noise profile before it is used as the
    /// threshold (default: 1).
    pub noise_rescale: f32,
}

impl Default for ProcessorParameters {
    fn default() -> Self {
        Self {
            enable: true,
            learn_noise: false,
            residual_listen: false,
            reduction_amount_db: 10.0,
            release_time_ms: 150.0,
            masking_ceiling_percent: 100.0,
            whitening_factor: 0.0,
            transient_threshold: 0.0,
            noise_rescale: 1.0,
        }
    }
}

fn sanitize(value: f32, range: RangeInclusive<f32>, default: f32) -> f32 {
    if value.is_finite() {
        value.clamp(*range.start(), *range.end())
    } else {
        default
    }
}

impl ProcessorParameters {
    /// Copy with every numeric field clamped into its accepted range.
    /// Non-finite values are replaced by their default.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            enable: self.enable,
            learn_noise: self.learn_noise,
            residual_listen: self.residual_listen,
            reduction_amount_db: sanitize(
                self.reduction_amount_db,
                REDUCTION_AMOUNT_DB_RANGE,
                defaults.reduction_amount_db,
            ),
            release_time_ms: sanitize(
                self.release_time_ms,
                RELEASE_TIME_MS_RANGE,
                defaults.release_time_ms,
            ),
            masking_ceiling_percent: sanitize(
                self.masking_ceiling_percent,
                MASKING_CEILING_PERCENT_RANGE,
                defaults.masking_ceiling_percent,
            ),
            whitening_factor: sanitize(
                self.whitening_factor,
                WHITENING_FACTOR_RANGE,
                defaults.whitening_factor,
            ),
            transient_threshold: sanitize(
                self.transient_threshold,
                TRANSIENT_THRESHOLD_RANGE,
                defaults.transient_threshold,
            ),
            noise_rescale: sanitize(self.noise_rescale, NOISE_RESCALE_RANGE, defaults.noise_rescale),
        }
    }

    /// Linear multiplier applied to the residual: `10^(-reduction_amount_db / 10)`.
    pub fn reduction_gain(&self) -> f32 {
        10.0f32.powf(-self.reduction_amount_db / 10.0)
    }

    /// Lower bound placed on every gain by the masking ceiling.
    pub(crate) fn gain_floor(&self) -> f32 {
        1.0 - self.masking_ceiling_percent / 100.0
    }

    /// True when transient protection is switched on.
    pub(crate) fn transient_protection(&self) -> bool {
        self.transient_threshold > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = ProcessorParameters::default();
        assert!(params.enable);
        assert!(!params.learn_noise);
        assert!(!params.residual_listen);
        assert_eq!(params.reduction_amount_db, 10.0);
        assert_eq!(params.release_time_ms, 150.0);
        assert_eq!(params.masking_ceiling_percent, 100.0);
        assert_eq!(params.noise_rescale, 1.0);
        assert!(!params.transient_protection());
        assert_eq!(params.sanitized(), params);
    }

    #[test]
    fn sanitized_clamps_out_of_range() {
        let params = ProcessorParameters {
            reduction_amount_db: 90.0,
            release_time_ms: -5.0,
            masking_ceiling_percent: 250.0,
            whitening_factor: 1.5,
            transient_threshold: 9.0,
            noise_rescale: -1.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.reduction_amount_db, 40.0);
        assert_eq!(params.release_time_ms, 0.0);
        assert_eq!(params.masking_ceiling_percent, 100.0);
        assert_eq!(params.whitening_factor, 1.0);
        assert_eq!(params.transient_threshold, 4.0);
        assert_eq!(params.noise_rescale, 0.0);
    }

    #[test]
    fn sanitized_replaces_non_finite_with_default() {
        let params = ProcessorParameters {
            reduction_amount_db: f32::NAN,
            release_time_ms: f32::INFINITY,
            noise_rescale: f32::NEG_INFINITY,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params, ProcessorParameters::default());
    }

    #[test]
    fn reduction_gain_is_power_ratio() {
        let params = ProcessorParameters {
            reduction_amount_db: 10.0,
            ..Default::default()
        };
        assert!((params.reduction_gain() - 0.1).abs() < 1e-6);

        let params = ProcessorParameters {
            reduction_amount_db: 0.0,
            ..Default::default()
        };
        assert_eq!(params.reduction_gain(), 1.0);
    }

    #[test]
    fn gain_floor_follows_masking_ceiling() {
        let mut params = ProcessorParameters::default();
        assert_eq!(params.gain_floor(), 0.0);
        params.masking_ceiling_percent = 25.0;
        assert!((params.gain_floor() - 0.75).abs() < 1e-6);
        params.masking_ceiling_percent = 0.0;
        assert_eq!(params.gain_floor(), 1.0);
    }
}
