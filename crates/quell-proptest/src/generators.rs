//! Deterministic signal and spectrum generators.
//!
//! Spectra use the packed half-complex layout: real part of bin `k` at
//! index `k`, imaginary part at `fft_size - k`, bins 0 and `fft_size / 2`
//! real only.

use std::f32::consts::PI;

/// Linear congruential noise source, reproducible across platforms.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    seed: u32,
}

impl NoiseGenerator {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Next value, uniform in `[-1.0, 1.0)`.
    pub fn next_sample(&mut self) -> f32 {
        self.seed = self.seed.wrapping_mul(69069).wrapping_add(1) & 0x7fff_ffff;
        (self.seed as f32 / 1_073_741_824.0) - 1.0
    }

    /// Fill `out` with noise scaled by `amplitude`.
    pub fn fill(&mut self, out: &mut [f32], amplitude: f32) {
        for v in out.iter_mut() {
            *v = amplitude * self.next_sample();
        }
    }
}

/// Pack per-bin real and imaginary parts (`fft_size / 2 + 1` each) into a
/// half-complex frame. The imaginary parts of bins 0 and `fft_size / 2` are
/// dropped.
pub fn pack_bins(re: &[f32], im: &[f32]) -> Vec<f32> {
    assert_eq!(re.len(), im.len());
    assert!(re.len() >= 2, "need at least DC and Nyquist bins");
    let half = re.len() - 1;
    let fft_size = 2 * half;
    let mut packed = vec![0.0f32; fft_size];
    packed[..=half].copy_from_slice(re);
    for k in 1..half {
        packed[fft_size - k] = im[k];
    }
    packed
}

/// Packed frame with uniform random real and imaginary parts in every bin.
pub fn noise_frame(fft_size: usize, amplitude: f32, seed: u32) -> Vec<f32> {
    let mut frame = vec![0.0f32; fft_size];
    NoiseGenerator::new(seed).fill(&mut frame, amplitude);
    frame
}

/// `count` packed noise frames from one generator, so consecutive frames
/// differ but share the same statistics.
pub fn stationary_noise_frames(
    fft_size: usize,
    amplitude: f32,
    seed: u32,
    count: usize,
) -> Vec<Vec<f32>> {
    let mut generator = NoiseGenerator::new(seed);
    (0..count)
        .map(|_| {
            let mut frame = vec![0.0f32; fft_size];
            generator.fill(&mut frame, amplitude);
            frame
        })
        .collect()
}

/// Packed frame holding a single real-valued tone in `bin`.
pub fn tone_frame(fft_size: usize, bin: usize, amplitude: f32) -> Vec<f32> {
    let mut frame = vec![0.0f32; fft_size];
    frame[bin] = amplitude;
    frame
}

/// Element-wise sum of two equally long frames.
pub fn mix_frames(a: &[f32], b: &[f32]) -> Vec<f32> {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Sum of the squared components of a packed frame.
pub fn energy(frame: &[f32]) -> f32 {
    frame.iter().map(|v| v * v).sum()
}

/// Time-domain sine wave.
pub fn sine(len: usize, frequency_hz: f32, sample_rate_hz: u32, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency_hz / sample_rate_hz as f32;
    (0..len).map(|i| amplitude * (step * i as f32).sin()).collect()
}

/// Time-domain white noise.
pub fn white_noise(len: usize, amplitude: f32, seed: u32) -> Vec<f32> {
    let mut out = vec![0.0f32; len];
    NoiseGenerator::new(seed).fill(&mut out, amplitude);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic_and_bounded() {
        let a = noise_frame(64, 0.5, 7);
        let b = noise_frame(64, 0.5, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| v.abs() <= 0.5));
        assert_ne!(a, noise_frame(64, 0.5, 8));
    }

    #[test]
    fn pack_bins_layout() {
        let re = [1.0, 2.0, 3.0, 4.0, 5.0];
        let im = [9.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(
            pack_bins(&re, &im),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 8.0, 7.0, 6.0]
        );
    }

    #[test]
    fn stationary_frames_differ() {
        let frames = stationary_noise_frames(32, 1.0, 3, 2);
        assert_ne!(frames[0], frames[1]);
    }
}
