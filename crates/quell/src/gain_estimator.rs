//! Per-frame gain mask estimation.
//!
//! Chains threshold rescaling, the configured [`GainKernel`], the masking
//! ceiling, release smoothing and transient relief.

use crate::config::DenoiserConfig;
use crate::gain_math::GainKernel;
use crate::parameters::ProcessorParameters;
use crate::transient_detector::TransientDetector;

/// Fraction of the distance to unity gain restored on transient frames.
const TRANSIENT_PROTECTION_BIAS: f32 = 0.5;

/// Per-frame release coefficient for a time constant in ms.
fn release_coefficient(release_time_ms: f32, hop_size: usize, sample_rate_hz: f32) -> f32 {
    if release_time_ms <= 0.0 {
        return 0.0;
    }
    (-(hop_size as f32) * 1000.0 / (release_time_ms * sample_rate_hz)).exp()
}

#[derive(Debug)]
pub(crate) struct GainEstimator {
    kernel: GainKernel,
    hop_size: usize,
    sample_rate_hz: f32,
    thresholds: Vec<f32>,
    raw_gains: Vec<f32>,
    smoothed_gains: Vec<f32>,
    transient_detector: TransientDetector,
    first_frame: bool,
}

impl GainEstimator {
    pub(crate) fn new(config: &DenoiserConfig) -> Self {
        let num_bins = config.num_bins();
        Self {
            kernel: config.gain_kernel(),
            hop_size: config.hop_size(),
            sample_rate_hz: config.sample_rate_hz() as f32,
            thresholds: vec![0.0; num_bins],
            raw_gains: vec![1.0; num_bins],
            smoothed_gains: vec![1.0; num_bins],
            transient_detector: TransientDetector::new(num_bins),
            first_frame: true,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.smoothed_gains.fill(1.0);
        self.transient_detector.reset();
        self.first_frame = true;
    }

    /// Write the gain mask for `power` into `gains` and report whether the
    /// frame was classified as a transient.
    pub(crate) fn run(
        &mut self,
        power: &[f32],
        noise_profile: &[f32],
        params: &ProcessorParameters,
        gains: &mut [f32],
    ) -> bool {
        debug_assert_eq!(power.len(), noise_profile.len());
        debug_assert_eq!(power.len(), gains.len());

        let rescale = params.noise_rescale;
        for (t, &n) in self.thresholds.iter_mut().zip(noise_profile) {
            *t = n * rescale;
        }

        self.kernel.compute(power, &self.thresholds, &mut self.raw_gains);

        let gain_floor = params.gain_floor();
        for g in self.raw_gains.iter_mut() {
            *g = g.clamp(0.0, 1.0).max(gain_floor);
        }

        if self.first_frame {
            self.smoothed_gains.copy_from_slice(&self.raw_gains);
            self.first_frame = false;
        } else {
            let c = release_coefficient(params.release_time_ms, self.hop_size, self.sample_rate_hz);
            for (smoothed, &raw) in self.smoothed_gains.iter_mut().zip(&self.raw_gains) {
                *smoothed = if raw >= *smoothed {
                    raw
                } else {
                    c * *smoothed + (1.0 - c) * raw
                };
            }
        }
        gains.copy_from_slice(&self.smoothed_gains);

        let transient = self.transient_detector.run(power, params.transient_threshold);
        if transient && params.transient_protection() {
            for g in gains.iter_mut() {
                *g += TRANSIENT_PROTECTION_BIAS * (1.0 - *g);
            }
        }
        transient
    }
}
