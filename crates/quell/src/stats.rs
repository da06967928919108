//! Runtime statistics of a denoiser instance.

use crate::fft_denoiser::FrameOutcome;

/// Snapshot of an [`FftDenoiser`](crate::FftDenoiser)'s state.
///
/// Fields that depend on a frame having been processed are `None` until one
/// has.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DenoiserStats {
    /// Current wet/dry mix in `[0.0, 1.0]`; 1 is fully processed.
    pub wet_dry: f32,
    /// Frames folded into the attached noise profile, or `None` when no
    /// profile is attached.
    pub blocks_learned: Option<u32>,
    /// Outcome of the most recent call to
    /// [`FftDenoiser::run`](crate::FftDenoiser::run).
    pub last_outcome: Option<FrameOutcome>,
    /// Whether the most recent frame was classified as a transient; `None`
    /// unless that frame was denoised.
    pub transient_detected: Option<bool>,
    /// Mean gain over all bins of the most recent frame; `None` unless that
    /// frame was denoised.
    pub mean_gain: Option<f32>,
}
