#![no_main]

use libfuzzer_sys::fuzz_target;
use quell::state::{decode_noise_profile, encode_noise_profile};
use quell::{DenoiserConfig, FftDenoiser};

fuzz_target!(|data: &[u8]| {
    let Ok(profile) = decode_noise_profile(data) else {
        let config = DenoiserConfig::new(48_000, 1024, 4).unwrap();
        let mut denoiser = FftDenoiser::new(config);
        let before = denoiser.save_noise_profile();
        assert!(denoiser.restore_noise_profile(data).is_err());
        assert_eq!(denoiser.save_noise_profile(), before);
        return;
    };

    // Anything that decodes re-encodes to the same bytes.
    assert_eq!(encode_noise_profile(&profile), data);

    let config = DenoiserConfig::new(48_000, profile.fft_size(), 4).unwrap();
    let mut denoiser = FftDenoiser::new(config);
    denoiser.attach_noise_profile(profile).unwrap();
});
