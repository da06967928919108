//! The per-channel denoising engine.
//!
//! [`FftDenoiser`] owns every buffer it needs and processes one packed
//! half-complex frame per call to [`FftDenoiser::run`], in place. Per frame:
//!
//! 1. The wet/dry mix moves one step toward `enable`.
//! 2. The frame is split into power, magnitude and phase per bin.
//! 3. Silent frames are left alone.
//! 4. With `learn_noise` set, the frame is folded into the noise profile.
//! 5. Otherwise, given a usable profile, a gain mask is estimated and the
//!    frame is split into a denoised part and a residual. The residual may
//!    be whitened and is then attenuated (or listened to on its own).
//! 6. The processed frame is cross-faded with the input by the wet/dry mix.

use std::f32::consts::PI;

use tracing::{debug, warn};

use crate::config::DenoiserConfig;
use crate::gain_estimator::GainEstimator;
use crate::noise_estimator::NoiseEstimator;
use crate::noise_profile::{NoiseProfile, RejectedProfile};
use crate::parameters::ProcessorParameters;
use crate::spectrum::{SpectralBins, scale_bins};
use crate::state::{self, StateError};
use crate::stats::DenoiserStats;
use crate::whitening::ResidualWhitener;

/// Corner frequency of the wet/dry smoother at the block rate.
const WET_DRY_CORNER_HZ: f32 = 25.0;
/// Distance at which the wet/dry mix snaps onto its target.
const WET_DRY_SNAP: f32 = 1e-6;

/// What [`FftDenoiser::run`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Every bin above DC was at the numeric floor; nothing was learned or
    /// reduced.
    Silent,
    /// The frame was folded into the noise profile.
    Learned,
    /// The frame was noise reduced.
    Denoised,
    /// Reduction was requested but no learned profile is attached. The
    /// frame passes through.
    NoiseProfileUnavailable,
    /// The buffer length differs from the configured transform length. The
    /// buffer was not touched.
    InvalidFrameLength,
}

/// Spectral noise reduction for one audio channel.
///
/// Create with [`FftDenoiser::new`], refresh the controls with
/// [`set_parameters`](Self::set_parameters) and feed every transformed
/// frame through [`run`](Self::run). Stereo signals use one instance per
/// channel.
///
/// # Example
///
/// ```
/// use quell::{DenoiserConfig, FftDenoiser, FrameOutcome, ProcessorParameters};
///
/// let config = DenoiserConfig::new(48_000, 1024, 4).unwrap();
/// let mut denoiser = FftDenoiser::new(config);
///
/// let mut frame = vec![0.0f32; 1024];
/// frame[10] = 1.0;
///
/// denoiser.set_parameters(ProcessorParameters {
///     learn_noise: true,
///     ..Default::default()
/// });
/// assert_eq!(denoiser.run(&mut frame), FrameOutcome::Learned);
///
/// denoiser.set_parameters(ProcessorParameters::default());
/// assert_eq!(denoiser.run(&mut frame), FrameOutcome::Denoised);
/// ```
#[derive(derive_more::Debug)]
pub struct FftDenoiser {
    config: DenoiserConfig,
    params: ProcessorParameters,
    #[debug(skip)]
    noise_profile: Option<NoiseProfile>,
    #[debug(skip)]
    bins: SpectralBins,
    #[debug(skip)]
    noise_estimator: NoiseEstimator,
    #[debug(skip)]
    gain_estimator: GainEstimator,
    #[debug(skip)]
    whitener: ResidualWhitener,
    #[debug(skip)]
    gains: Vec<f32>,
    #[debug(skip)]
    input: Vec<f32>,
    #[debug(skip)]
    processed: Vec<f32>,
    #[debug(skip)]
    residual: Vec<f32>,
    wet_dry: f32,
    wet_dry_coefficient: f32,
    last_outcome: Option<FrameOutcome>,
    transient_detected: Option<bool>,
    mean_gain: Option<f32>,
}

impl FftDenoiser {
    /// Create an engine with an empty noise profile attached.
    ///
    /// All working memory is allocated here; [`run`](Self::run) never
    /// allocates.
    pub fn new(config: DenoiserConfig) -> Self {
        let fft_size = config.fft_size();
        let num_bins = config.num_bins();
        let hop_size = config.hop_size();
        let wet_dry_coefficient = 1.0
            - (-2.0 * PI * WET_DRY_CORNER_HZ * hop_size as f32 / config.sample_rate_hz() as f32)
                .exp();

        debug!(
            sample_rate_hz = config.sample_rate_hz(),
            fft_size,
            hop_size,
            kernel = ?config.gain_kernel(),
            learning = ?config.noise_learning(),
            "denoiser created",
        );

        Self {
            config,
            params: ProcessorParameters::default(),
            noise_profile: Some(NoiseProfile::new(fft_size)),
            bins: SpectralBins::new(fft_size),
            noise_estimator: NoiseEstimator::new(&config),
            gain_estimator: GainEstimator::new(&config),
            whitener: ResidualWhitener::new(&config),
            gains: vec![1.0; num_bins],
            input: vec![0.0; fft_size],
            processed: vec![0.0; fft_size],
            residual: vec![0.0; fft_size],
            wet_dry: 0.0,
            wet_dry_coefficient,
            last_outcome: None,
            transient_detected: None,
            mean_gain: None,
        }
    }

    /// The configuration this engine was built with.
    #[inline]
    pub fn config(&self) -> &DenoiserConfig {
        &self.config
    }

    /// Length of the frames accepted by [`run`](Self::run).
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.config.fft_size()
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.config.hop_size()
    }

    #[inline]
    pub fn sample_rate_hz(&self) -> u32 {
        self.config.sample_rate_hz()
    }

    /// Store a sanitized copy of `params` for the following frames.
    pub fn set_parameters(&mut self, params: ProcessorParameters) {
        self.params = params.sanitized();
    }

    /// The parameters in effect, after sanitizing.
    #[inline]
    pub fn parameters(&self) -> &ProcessorParameters {
        &self.params
    }

    /// Attach `profile`, returning the previously attached one.
    ///
    /// The profile must have `fft_size / 2 + 1` finite, non-negative bins.
    /// On rejection it is handed back inside the error and the engine is
    /// unchanged.
    pub fn attach_noise_profile(
        &mut self,
        profile: NoiseProfile,
    ) -> Result<Option<NoiseProfile>, RejectedProfile> {
        if let Err(error) = profile.check_fft_size(self.fft_size()) {
            warn!(%error, "noise profile rejected");
            return Err(RejectedProfile::new(error, profile));
        }
        Ok(self.install_noise_profile(profile))
    }

    /// Detach and return the current profile. Until another one is
    /// attached, frames are neither learned nor reduced.
    pub fn detach_noise_profile(&mut self) -> Option<NoiseProfile> {
        let profile = self.noise_profile.take();
        if profile.is_some() {
            debug!("noise profile detached");
        }
        profile
    }

    /// The attached profile, if any.
    #[inline]
    pub fn noise_profile(&self) -> Option<&NoiseProfile> {
        self.noise_profile.as_ref()
    }

    /// Forget everything learned so far. The attached profile keeps its
    /// allocation and becomes unavailable until new frames are learned.
    pub fn clear_noise_profile(&mut self) {
        if let Some(profile) = self.noise_profile.as_mut() {
            profile.clear();
        }
        self.noise_estimator.reset();
        self.gain_estimator.reset();
        self.whitener.reset();
        debug!("noise profile cleared");
    }

    /// Serialize the attached profile for the host's session storage.
    pub fn save_noise_profile(&self) -> Option<Vec<u8>> {
        self.noise_profile.as_ref().map(state::encode_noise_profile)
    }

    /// Replace the attached profile with one previously returned by
    /// [`save_noise_profile`](Self::save_noise_profile).
    ///
    /// On error the engine keeps its current profile.
    pub fn restore_noise_profile(
        &mut self,
        bytes: &[u8],
    ) -> Result<Option<NoiseProfile>, StateError> {
        let profile = state::decode_noise_profile(bytes)
            .and_then(|profile| {
                if profile.fft_size() == self.fft_size() {
                    Ok(profile)
                } else {
                    Err(StateError::IncompatibleFftSize {
                        expected: self.fft_size(),
                        stored: profile.fft_size(),
                    })
                }
            })
            .inspect_err(|error| warn!(%error, "noise profile restore failed"))?;
        Ok(self.install_noise_profile(profile))
    }

    fn install_noise_profile(&mut self, profile: NoiseProfile) -> Option<NoiseProfile> {
        debug!(
            blocks_learned = profile.blocks_learned(),
            total_power = profile.total_power(),
            "noise profile attached",
        );
        self.noise_estimator.reset();
        self.gain_estimator.reset();
        self.whitener.reset();
        self.noise_profile.replace(profile)
    }

    /// Process one packed half-complex frame in place.
    ///
    /// `frame` must hold `fft_size` values laid out with the real part of
    /// bin `k` at index `k` and its imaginary part at index `fft_size - k`
    /// (bins 0 and `fft_size / 2` are real only). On return it holds the
    /// output spectrum in the same layout.
    pub fn run(&mut self, frame: &mut [f32]) -> FrameOutcome {
        self.transient_detected = None;
        self.mean_gain = None;
        if frame.len() != self.fft_size() {
            self.last_outcome = Some(FrameOutcome::InvalidFrameLength);
            return FrameOutcome::InvalidFrameLength;
        }

        let params = self.params;
        self.update_wet_dry(params.enable);
        self.bins.decompose(frame);

        let outcome = if self.bins.is_silent() {
            FrameOutcome::Silent
        } else if params.learn_noise {
            match self.noise_profile.as_mut() {
                Some(profile) => {
                    self.noise_estimator.run(profile, self.bins.power());
                    FrameOutcome::Learned
                }
                None => FrameOutcome::NoiseProfileUnavailable,
            }
        } else {
            match self.noise_profile.as_ref() {
                Some(profile) if self.noise_estimator.is_available(profile) => {
                    self.input.copy_from_slice(frame);
                    let transient = self.gain_estimator.run(
                        self.bins.power(),
                        profile.values(),
                        &params,
                        &mut self.gains,
                    );
                    self.transient_detected = Some(transient);
                    self.mean_gain =
                        Some(self.gains.iter().sum::<f32>() / self.gains.len() as f32);
                    self.reduce(&params);
                    self.mix(frame);
                    FrameOutcome::Denoised
                }
                _ => FrameOutcome::NoiseProfileUnavailable,
            }
        };

        self.last_outcome = Some(outcome);
        outcome
    }

    fn update_wet_dry(&mut self, enable: bool) {
        let target = if enable { 1.0 } else { 0.0 };
        self.wet_dry += self.wet_dry_coefficient * (target - self.wet_dry);
        if (target - self.wet_dry).abs() < WET_DRY_SNAP {
            self.wet_dry = target;
        }
    }

    /// Fill `processed` from `input` and the current gain mask.
    fn reduce(&mut self, params: &ProcessorParameters) {
        scale_bins(&self.input, &self.gains, &mut self.processed);
        for ((r, &x), &d) in self
            .residual
            .iter_mut()
            .zip(&self.input)
            .zip(&self.processed)
        {
            *r = x - d;
        }

        if params.whitening_factor > 0.0 {
            self.whitener.run(&mut self.residual, params.whitening_factor);
        }

        if params.residual_listen {
            self.processed.copy_from_slice(&self.residual);
        } else {
            let reduction_gain = params.reduction_gain();
            for (p, &r) in self.processed.iter_mut().zip(&self.residual) {
                *p += r * reduction_gain;
            }
        }
    }

    /// Cross-fade `processed` with `input` into `frame`.
    fn mix(&self, frame: &mut [f32]) {
        let wet = self.wet_dry;
        let dry = 1.0 - wet;
        for ((out, &x), &p) in frame.iter_mut().zip(&self.input).zip(&self.processed) {
            *out = dry * x + wet * p;
        }
    }

    /// Per-bin power of the last frame passed to [`run`](Self::run).
    #[inline]
    pub fn power_spectrum(&self) -> &[f32] {
        self.bins.power()
    }

    /// Per-bin magnitude of the last frame passed to [`run`](Self::run).
    #[inline]
    pub fn magnitude_spectrum(&self) -> &[f32] {
        self.bins.magnitude()
    }

    /// Per-bin phase, `atan2(re, im)`, of the last frame passed to
    /// [`run`](Self::run).
    #[inline]
    pub fn phase_spectrum(&self) -> &[f32] {
        self.bins.phase()
    }

    /// Current wet/dry mix; 1 is fully processed.
    #[inline]
    pub fn wet_dry(&self) -> f32 {
        self.wet_dry
    }

    pub fn stats(&self) -> DenoiserStats {
        DenoiserStats {
            wet_dry: self.wet_dry,
            blocks_learned: self.noise_profile.as_ref().map(NoiseProfile::blocks_learned),
            last_outcome: self.last_outcome,
            transient_detected: self.transient_detected,
            mean_gain: self.mean_gain,
        }
    }
}
