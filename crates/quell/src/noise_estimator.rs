//! Noise profile learning.
//!
//! Folds the power spectrum of frames the host marks as noise-only into a
//! [`NoiseProfile`]. Learning never runs on the same frame as reduction.

use crate::config::{DenoiserConfig, NoiseLearning};
use crate::gain_math::NOISE_FLOOR;
use crate::noise_profile::NoiseProfile;

/// Time constant of the per-bin power smoothing ahead of minimum tracking.
const POWER_SMOOTHING_TIME_MS: f32 = 20.0;
/// Time constant with which the tracked minimum is allowed to rise.
const MINIMUM_RISE_TIME_MS: f32 = 1500.0;
/// Once a bin has this much history its profile value becomes a recursive
/// average instead of a plain mean.
const NOISE_AVERAGING_TIME_MS: f32 = 250.0;
/// Smoothed power above this multiple of the tracked minimum marks a bin as
/// carrying signal.
const PRESENCE_RATIO: f32 = 5.0;
/// Blocks after seeding during which the minimum follows the smoothed power
/// both ways and every bin counts as noise.
const MINIMUM_WARMUP_BLOCKS: u32 = 8;

/// One-pole coefficient for a time constant, evaluated once per hop.
pub(crate) fn one_pole_coefficient(time_constant_ms: f32, hop_duration_ms: f32) -> f32 {
    if time_constant_ms <= 0.0 {
        return 0.0;
    }
    (-hop_duration_ms / time_constant_ms).exp()
}

/// Learns the noise floor from noise-only frames.
#[derive(Debug)]
pub(crate) struct NoiseEstimator {
    policy: NoiseLearning,
    smoothing: f32,
    rise: f32,
    min_update_weight: f32,
    smoothed_power: Vec<f32>,
    minimum_power: Vec<f32>,
    /// Frames averaged into each bin of the profile.
    updates: Vec<u32>,
    frames_since_seed: u32,
    seeded: bool,
}

impl NoiseEstimator {
    pub(crate) fn new(config: &DenoiserConfig) -> Self {
        let hop_ms = config.hop_duration_ms();
        let num_bins = config.num_bins();
        Self {
            policy: config.noise_learning(),
            smoothing: one_pole_coefficient(POWER_SMOOTHING_TIME_MS, hop_ms),
            rise: one_pole_coefficient(MINIMUM_RISE_TIME_MS, hop_ms),
            min_update_weight: 1.0 - one_pole_coefficient(NOISE_AVERAGING_TIME_MS, hop_ms),
            smoothed_power: vec![0.0; num_bins],
            minimum_power: vec![0.0; num_bins],
            updates: vec![0; num_bins],
            frames_since_seed: 0,
            seeded: false,
        }
    }

    /// Forget the tracking history, e.g. after a different profile is
    /// attached.
    pub(crate) fn reset(&mut self) {
        self.smoothed_power.fill(0.0);
        self.minimum_power.fill(0.0);
        self.updates.fill(0);
        self.frames_since_seed = 0;
        self.seeded = false;
    }

    /// Whether `profile` holds enough learned data for reduction.
    pub(crate) fn is_available(&self, profile: &NoiseProfile) -> bool {
        profile.is_available()
    }

    /// Fold one frame's power spectrum into `profile`.
    pub(crate) fn run(&mut self, profile: &mut NoiseProfile, power: &[f32]) {
        debug_assert_eq!(profile.len(), power.len());

        let first_block = profile.blocks_learned() == 0;
        if !self.seeded {
            self.smoothed_power.copy_from_slice(power);
            self.minimum_power.copy_from_slice(power);
            // A restored profile keeps the weight of what it already holds.
            self.updates.fill(profile.blocks_learned());
            self.frames_since_seed = 0;
            self.seeded = true;
        }

        match self.policy {
            NoiseLearning::MinimumTracking => {
                let (smoothing, rise) = (self.smoothing, self.rise);
                let min_weight = self.min_update_weight;
                let warming_up = self.frames_since_seed < MINIMUM_WARMUP_BLOCKS;
                for ((((estimate, smoothed), minimum), updates), &p) in profile
                    .values_mut()
                    .iter_mut()
                    .zip(self.smoothed_power.iter_mut())
                    .zip(self.minimum_power.iter_mut())
                    .zip(self.updates.iter_mut())
                    .zip(power)
                {
                    *smoothed = smoothing * *smoothed + (1.0 - smoothing) * p;
                    if warming_up || *smoothed < *minimum {
                        *minimum = *smoothed;
                    } else {
                        *minimum = rise * *minimum + (1.0 - rise) * *smoothed;
                    }

                    let signal_present = !warming_up
                        && *minimum > NOISE_FLOOR
                        && *smoothed > PRESENCE_RATIO * *minimum;
                    if signal_present {
                        continue;
                    }
                    *updates = updates.saturating_add(1);
                    let weight = (1.0 / *updates as f32).max(min_weight);
                    *estimate += weight * (p - *estimate);
                }
                self.frames_since_seed = self.frames_since_seed.saturating_add(1);
            }
            NoiseLearning::RollingMean => {
                let count = profile.blocks_learned() as f32 + 1.0;
                for (estimate, &p) in profile.values_mut().iter_mut().zip(power) {
                    if first_block {
                        *estimate = p;
                    } else {
                        *estimate += (p - *estimate) / count;
                    }
                }
            }
        }

        profile.mark_block_learned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(learning: NoiseLearning) -> DenoiserConfig {
        DenoiserConfig::new(48_000, 1024, 4)
            .unwrap()
            .with_noise_learning(learning)
    }

    #[test]
    fn coefficient_edges() {
        assert_eq!(one_pole_coefficient(0.0, 5.0), 0.0);
        let c = one_pole_coefficient(1000.0, 5.0);
        assert!(c > 0.99 && c < 1.0);
    }

    #[test]
    fn first_block_seeds_profile() {
        for learning in [NoiseLearning::MinimumTracking, NoiseLearning::RollingMean] {
            let config = config(learning);
            let mut estimator = NoiseEstimator::new(&config);
            let mut profile = NoiseProfile::new(config.fft_size());
            assert!(!estimator.is_available(&profile));

            let power: Vec<f32> = (0..config.num_bins()).map(|k| k as f32 * 0.1).collect();
            estimator.run(&mut profile, &power);

            assert!(estimator.is_available(&profile));
            assert_eq!(profile.values(), power.as_slice(), "{learning:?}");
            assert_eq!(profile.blocks_learned(), 1);
        }
    }

    #[test]
    fn stationary_input_is_a_fixed_point() {
        let config = config(NoiseLearning::MinimumTracking);
        let mut estimator = NoiseEstimator::new(&config);
        let mut profile = NoiseProfile::new(config.fft_size());
        let power = vec![0.25f32; config.num_bins()];
        for _ in 0..50 {
            estimator.run(&mut profile, &power);
        }
        for &v in profile.values() {
            assert!((v - 0.25).abs() < 1e-6, "estimate {v} drifted");
        }
        assert_eq!(profile.blocks_learned(), 50);
    }

    #[test]
    fn minimum_tracking_resists_bursts() {
        let config = config(NoiseLearning::MinimumTracking);
        let mut estimator = NoiseEstimator::new(&config);
        let mut profile = NoiseProfile::new(config.fft_size());
        let quiet = vec![1.0f32; config.num_bins()];
        let loud = vec![100.0f32; config.num_bins()];

        for _ in 0..20 {
            estimator.run(&mut profile, &quiet);
        }
        estimator.run(&mut profile, &loud);
        let mut peak = 0.0f32;
        for _ in 0..10 {
            estimator.run(&mut profile, &quiet);
            peak = peak.max(profile.values()[5]);
        }
        assert!(peak < 2.0, "burst pushed estimate to {peak}");

        for _ in 0..100 {
            estimator.run(&mut profile, &quiet);
        }
        assert!((profile.values()[5] - 1.0).abs() < 0.01);
    }

    #[test]
    fn minimum_tracking_follows_floor_down() {
        let config = config(NoiseLearning::MinimumTracking);
        let mut estimator = NoiseEstimator::new(&config);
        let mut profile = NoiseProfile::new(config.fft_size());
        estimator.run(&mut profile, &vec![4.0; config.num_bins()]);
        for _ in 0..300 {
            estimator.run(&mut profile, &vec![1.0; config.num_bins()]);
        }
        assert!((profile.values()[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn fluctuating_noise_is_learned_at_its_mean() {
        let config = config(NoiseLearning::MinimumTracking);
        let mut estimator = NoiseEstimator::new(&config);
        let mut profile = NoiseProfile::new(config.fft_size());
        let low = vec![0.5f32; config.num_bins()];
        let high = vec![1.5f32; config.num_bins()];
        for _ in 0..50 {
            estimator.run(&mut profile, &low);
            estimator.run(&mut profile, &high);
        }
        // The bare minimum of the smoothed power would sit well below 1.
        for &v in profile.values() {
            assert!((v - 1.0).abs() < 0.05, "estimate {v}");
        }
    }

    #[test]
    fn reset_restarts_warmup() {
        let config = config(NoiseLearning::MinimumTracking);
        let mut estimator = NoiseEstimator::new(&config);
        let mut profile = NoiseProfile::new(config.fft_size());
        for _ in 0..20 {
            estimator.run(&mut profile, &vec![1.0; config.num_bins()]);
        }
        profile.clear();
        estimator.reset();

        // Right after a reset every bin counts as noise, even a jump.
        estimator.run(&mut profile, &vec![1.0; config.num_bins()]);
        estimator.run(&mut profile, &vec![100.0; config.num_bins()]);
        assert!((profile.values()[3] - 50.5).abs() < 1e-3);
    }

    #[test]
    fn rolling_mean_averages() {
        let config = config(NoiseLearning::RollingMean);
        let mut estimator = NoiseEstimator::new(&config);
        let mut profile = NoiseProfile::new(config.fft_size());
        for level in [1.0f32, 2.0, 3.0, 6.0] {
            estimator.run(&mut profile, &vec![level; config.num_bins()]);
        }
        for &v in profile.values() {
            assert!((v - 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn reset_reseeds_smoothing_for_restored_profiles() {
        let config = config(NoiseLearning::MinimumTracking);
        let mut estimator = NoiseEstimator::new(&config);
        let mut profile = NoiseProfile::from_values(vec![2.0; config.num_bins()], 10);
        estimator.reset();
        estimator.run(&mut profile, &vec![2.0; config.num_bins()]);
        // Without reseeding the zeroed smoother would pull the estimate down.
        assert!((profile.values()[1] - 2.0).abs() < 1e-6);
        assert_eq!(profile.blocks_learned(), 11);
    }
}
