//! Residual spectrum whitening.
//!
//! Each residual bin is divided by a slowly decaying running maximum of its
//! own magnitude, which flattens tonal leftovers in what is removed.

use crate::config::DenoiserConfig;
use crate::gain_math::NOISE_FLOOR;
use crate::spectrum::imag_index;

/// Lower bound of the running maximum so quiet bins are not amplified
/// without limit.
pub(crate) const WHITENING_FLOOR: f32 = 0.02;

#[derive(Debug)]
pub(crate) struct ResidualWhitener {
    fft_size: usize,
    residual_max: Vec<f32>,
    decay: f32,
    frames: u64,
}

impl ResidualWhitener {
    pub(crate) fn new(config: &DenoiserConfig) -> Self {
        let decay = 0.5f32.powf(config.hop_duration_ms() / config.whitening_half_life_ms());
        Self {
            fft_size: config.fft_size(),
            residual_max: vec![0.0; config.num_bins()],
            decay,
            frames: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.residual_max.fill(0.0);
        self.frames = 0;
    }

    /// Whiten the packed `residual` in place by `whitening_factor`.
    pub(crate) fn run(&mut self, residual: &mut [f32], whitening_factor: f32) {
        debug_assert_eq!(residual.len(), self.fft_size);

        let first = self.frames == 0;
        self.frames = self.frames.saturating_add(1);

        for (k, max) in self.residual_max.iter_mut().enumerate() {
            let im_index = imag_index(self.fft_size, k);
            let re = residual[k];
            let im = im_index.map_or(0.0, |i| residual[i]);
            let magnitude = (re * re + im * im).sqrt();

            *max = if first {
                magnitude.max(WHITENING_FLOOR)
            } else {
                magnitude.max(WHITENING_FLOOR).max(*max * self.decay)
            };

            if magnitude > NOISE_FLOOR {
                let scale = (1.0 - whitening_factor) + whitening_factor / *max;
                residual[k] = re * scale;
                if let Some(i) = im_index {
                    residual[i] = im * scale;
                }
            }
        }
    }

    #[cfg(test)]
    fn residual_max(&self) -> &[f32] {
        &self.residual_max
    }
}
