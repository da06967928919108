//! Packed half-complex spectrum layout.
//!
//! A real transform of length `n` is stored in `n` floats: bin 0 and bin
//! `n / 2` are purely real and live at indices `0` and `n / 2`; every other
//! bin `k` keeps its real part at index `k` and its imaginary part at index
//! `n - k`.

use crate::gain_math::NOISE_FLOOR;

/// Index of the imaginary part of bin `k`, or `None` for the real-only bins.
#[inline]
pub(crate) fn imag_index(fft_size: usize, k: usize) -> Option<usize> {
    if k == 0 || k >= fft_size / 2 {
        None
    } else {
        Some(fft_size - k)
    }
}

/// Multiply every component of bin `k` by `gains[k]`, writing into `dst`.
pub(crate) fn scale_bins(src: &[f32], gains: &[f32], dst: &mut [f32]) {
    let fft_size = src.len();
    debug_assert_eq!(dst.len(), fft_size);
    debug_assert_eq!(gains.len(), fft_size / 2 + 1);

    for (k, &g) in gains.iter().enumerate() {
        dst[k] = src[k] * g;
        if let Some(im) = imag_index(fft_size, k) {
            dst[im] = src[im] * g;
        }
    }
}

/// Per-bin power, magnitude and phase of one frame.
#[derive(Debug)]
pub(crate) struct SpectralBins {
    fft_size: usize,
    power: Vec<f32>,
    magnitude: Vec<f32>,
    phase: Vec<f32>,
}

impl SpectralBins {
    pub(crate) fn new(fft_size: usize) -> Self {
        let num_bins = fft_size / 2 + 1;
        Self {
            fft_size,
            power: vec![0.0; num_bins],
            magnitude: vec![0.0; num_bins],
            phase: vec![0.0; num_bins],
        }
    }

    /// Recompute the per-bin quantities from a packed frame.
    pub(crate) fn decompose(&mut self, packed: &[f32]) {
        debug_assert_eq!(packed.len(), self.fft_size);

        for (k, ((power, magnitude), phase)) in self
            .power
            .iter_mut()
            .zip(self.magnitude.iter_mut())
            .zip(self.phase.iter_mut())
            .enumerate()
        {
            let re = packed[k];
            let im = imag_index(self.fft_size, k).map_or(0.0, |i| packed[i]);
            *power = re * re + im * im;
            *magnitude = power.sqrt();
            *phase = re.atan2(im);
        }
    }

    /// True when every bin above DC is at or below the numeric floor.
    pub(crate) fn is_silent(&self) -> bool {
        self.power[1..].iter().all(|&p| p <= NOISE_FLOOR)
    }

    pub(crate) fn power(&self) -> &[f32] {
        &self.power
    }

    pub(crate) fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    pub(crate) fn phase(&self) -> &[f32] {
        &self.phase
    }
}
