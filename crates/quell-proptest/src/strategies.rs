//! `proptest` strategies for spectra and engine inputs.

use proptest::collection::vec;
use proptest::prelude::*;

/// Supported transform lengths small enough for fast property runs.
pub fn fft_size() -> impl Strategy<Value = usize> {
    prop::sample::select(vec![64usize, 128, 256, 512, 1024])
}

/// One bin's power: exact zero, the numeric floor, or a finite positive
/// value spanning several decades.
pub fn bin_power() -> impl Strategy<Value = f32> {
    prop_oneof![
        1 => Just(0.0f32),
        1 => Just(f32::MIN_POSITIVE),
        8 => 0.0f32..1.0e4,
    ]
}

/// Power spectrum of `len` bins.
pub fn power_spectrum(len: usize) -> impl Strategy<Value = Vec<f32>> {
    vec(bin_power(), len)
}

/// Signal spectrum and noise thresholds of equal, random length.
pub fn spectrum_and_thresholds() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (1usize..=257).prop_flat_map(|len| (power_spectrum(len), power_spectrum(len)))
}

/// Signal spectrum with thresholds at or below the numeric floor.
pub fn spectrum_and_floor_thresholds() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (1usize..=257).prop_flat_map(|len| {
        (
            power_spectrum(len),
            vec(prop_oneof![Just(0.0f32), Just(f32::MIN_POSITIVE)], len),
        )
    })
}

/// Packed half-complex frame of `fft_size` values in `[-amplitude, amplitude]`.
pub fn packed_frame(fft_size: usize, amplitude: f32) -> impl Strategy<Value = Vec<f32>> {
    vec(-amplitude..=amplitude, fft_size)
}

/// Transform length together with a packed frame of that length.
pub fn sized_frame() -> impl Strategy<Value = (usize, Vec<f32>)> {
    fft_size().prop_flat_map(|n| (Just(n), packed_frame(n, 1.0)))
}
