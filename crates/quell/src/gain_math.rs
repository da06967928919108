//! Per-bin attenuation kernels.
//!
//! Each kernel turns a signal power spectrum and a noise threshold spectrum
//! of the same length into a gain mask in `[0, 1]`. Thresholds at or below
//! [`NOISE_FLOOR`] mean "no noise estimate here" and always pass the bin
//! through with gain 1.

/// Smallest positive normal `f32`; thresholds at or below it are treated as
/// absent.
pub const NOISE_FLOOR: f32 = f32::MIN_POSITIVE;

/// Attenuation algorithm applied to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GainKernel {
    /// Power subtraction with an SNR-dependent over-subtraction factor.
    ///
    /// `snr_influence <= 0` disables the over-subtraction and behaves like
    /// [`GainKernel::LinearSubtraction`].
    NonlinearSubtraction { snr_influence: f32 },
    /// Plain power subtraction.
    #[default]
    LinearSubtraction,
    /// Binary per-bin gate.
    HardGate,
    /// Binary gate decided once per frame from total power.
    WidebandGate,
}

impl GainKernel {
    /// Compute the gain mask for one frame.
    ///
    /// `spectrum`, `noise_thresholds` and `gains` must have equal lengths.
    pub fn compute(&self, spectrum: &[f32], noise_thresholds: &[f32], gains: &mut [f32]) {
        debug_assert_eq!(spectrum.len(), noise_thresholds.len());
        debug_assert_eq!(spectrum.len(), gains.len());
        match *self {
            Self::NonlinearSubtraction { snr_influence } => {
                nonlinear_power_subtraction(snr_influence, spectrum, noise_thresholds, gains)
            }
            Self::LinearSubtraction => power_subtraction(spectrum, noise_thresholds, gains),
            Self::HardGate => spectral_gate(spectrum, noise_thresholds, gains),
            Self::WidebandGate => wideband_gate(spectrum, noise_thresholds, gains),
        }
    }
}

/// Clamp to `[0, 1]`, mapping NaN (e.g. from an infinite signal power) to 0.
#[inline]
fn bounded(gain: f32) -> f32 {
    if gain.is_nan() {
        0.0
    } else {
        gain.clamp(0.0, 1.0)
    }
}

/// Power subtraction with over-subtraction factor
/// `alpha = snr_influence + sqrt(S / N)`.
pub fn nonlinear_power_subtraction(
    snr_influence: f32,
    spectrum: &[f32],
    noise_thresholds: &[f32],
    gains: &mut [f32],
) {
    for ((g, &s), &n) in gains.iter_mut().zip(spectrum).zip(noise_thresholds) {
        *g = if n > NOISE_FLOOR {
            if s > 0.0 {
                let alpha = if snr_influence > 0.0 {
                    snr_influence + (s / n).sqrt()
                } else {
                    1.0
                };
                bounded((s - alpha * n) / s)
            } else {
                0.0
            }
        } else {
            1.0
        };
    }
}

/// Plain power subtraction: `(S - N) / S` above the threshold, 0 below.
pub fn power_subtraction(spectrum: &[f32], noise_thresholds: &[f32], gains: &mut [f32]) {
    for ((g, &s), &n) in gains.iter_mut().zip(spectrum).zip(noise_thresholds) {
        *g = if n > NOISE_FLOOR {
            if s > n {
                bounded((s - n) / s)
            } else {
                0.0
            }
        } else {
            1.0
        };
    }
}

/// Hard-knee gate per bin.
pub fn spectral_gate(spectrum: &[f32], noise_thresholds: &[f32], gains: &mut [f32]) {
    for ((g, &s), &n) in gains.iter_mut().zip(spectrum).zip(noise_thresholds) {
        *g = if n <= NOISE_FLOOR || s >= n { 1.0 } else { 0.0 };
    }
}

/// Hard-knee gate on total power; every bin gets the same gain.
///
/// Thresholds at or below [`NOISE_FLOOR`] do not count toward the noise
/// total.
pub fn wideband_gate(spectrum: &[f32], noise_thresholds: &[f32], gains: &mut [f32]) {
    let signal_sum: f32 = spectrum.iter().sum();
    let noise_sum: f32 = noise_thresholds.iter().filter(|&&n| n > NOISE_FLOOR).sum();

    let gain = if noise_sum <= NOISE_FLOOR || signal_sum >= noise_sum {
        1.0
    } else {
        0.0
    };
    gains.fill(gain);
}
