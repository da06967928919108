//! Spectral-flux onset detection.
//!
//! Flux is the half-wave rectified increase of per-bin magnitude from one
//! frame to the next. A frame is flagged as a transient when its flux
//! exceeds a multiple of the long-term mean flux; the multiple shrinks as
//! the user threshold grows.

use std::mem;

/// Upper bound of the user threshold; the adaptive threshold is
/// `(TRANSIENT_UPPER_LIMIT - threshold) * mean_flux`.
pub(crate) const TRANSIENT_UPPER_LIMIT: f32 = 5.0;

/// Sum of positive magnitude differences over bins `1..`.
fn spectral_flux(magnitude: &[f32], previous_magnitude: &[f32]) -> f32 {
    magnitude[1..]
        .iter()
        .zip(&previous_magnitude[1..])
        .map(|(&m, &prev)| (m - prev).max(0.0))
        .sum()
}

/// Tracks spectral flux across frames.
#[derive(Debug)]
pub(crate) struct TransientDetector {
    magnitude: Vec<f32>,
    previous_magnitude: Vec<f32>,
    rolling_mean: f32,
    frame_count: u64,
}

impl TransientDetector {
    pub(crate) fn new(num_bins: usize) -> Self {
        Self {
            magnitude: vec![0.0; num_bins],
            previous_magnitude: vec![0.0; num_bins],
            rolling_mean: 0.0,
            frame_count: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.previous_magnitude.fill(0.0);
        self.rolling_mean = 0.0;
        self.frame_count = 0;
    }

    /// Analyze one frame's power spectrum and report whether it starts a
    /// transient.
    pub(crate) fn run(&mut self, power: &[f32], threshold: f32) -> bool {
        debug_assert_eq!(power.len(), self.previous_magnitude.len());

        for (m, &p) in self.magnitude.iter_mut().zip(power) {
            *m = p.max(0.0).sqrt();
        }
        let flux = spectral_flux(&self.magnitude, &self.previous_magnitude);
        mem::swap(&mut self.magnitude, &mut self.previous_magnitude);

        self.frame_count += 1;
        if self.frame_count > 1 {
            self.rolling_mean += (flux - self.rolling_mean) / self.frame_count as f32;
        } else {
            self.rolling_mean = flux;
        }

        let adapted_threshold = (TRANSIENT_UPPER_LIMIT - threshold) * self.rolling_mean;
        flux > adapted_threshold
    }

    #[cfg(test)]
    fn mean_flux(&self) -> f32 {
        self.rolling_mean
    }
}
