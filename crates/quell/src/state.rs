//! Noise profile persistence.
//!
//! The host stores the learned profile with its session and hands it back
//! on the next load. The byte layout is:
//!
//! | offset | type      | field            |
//! |--------|-----------|------------------|
//! | 0      | `u32` LE  | `fft_size`       |
//! | 4      | `u32` LE  | `blocks_learned` |
//! | 8      | `u32` LE  | `len`            |
//! | 12     | `f32` LE  | `len` bin powers |

use std::error::Error;
use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::config::{MAX_FFT_SIZE, MIN_FFT_SIZE};
use crate::noise_profile::NoiseProfile;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct StateHeader {
    fft_size: u32,
    blocks_learned: u32,
    len: u32,
}

const HEADER_LEN: usize = size_of::<StateHeader>();

/// Error returned when a stored noise profile cannot be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// The input ends before the header or the declared values.
    Truncated { expected_len: usize, actual_len: usize },
    /// The input carries bytes past the declared values.
    LengthMismatch { expected_len: usize, actual_len: usize },
    /// The stored transform size is not a supported power of two, or the
    /// value count does not match it.
    InvalidFftSize { fft_size: u32, len: u32 },
    /// The stored profile belongs to a different transform size.
    IncompatibleFftSize { expected: usize, stored: usize },
    /// A stored bin power is negative or not finite.
    NonFiniteValue { bin: usize },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Truncated {
                expected_len,
                actual_len,
            } => write!(
                f,
                "noise profile state truncated: {actual_len} bytes, expected {expected_len}",
            ),
            Self::LengthMismatch {
                expected_len,
                actual_len,
            } => write!(
                f,
                "noise profile state has {actual_len} bytes, expected {expected_len}",
            ),
            Self::InvalidFftSize { fft_size, len } => write!(
                f,
                "noise profile state declares fft size {fft_size} with {len} bins",
            ),
            Self::IncompatibleFftSize { expected, stored } => write!(
                f,
                "noise profile was stored at fft size {stored}; engine runs at {expected}",
            ),
            Self::NonFiniteValue { bin } => {
                write!(f, "noise profile state bin {bin} is negative or not finite")
            }
        }
    }
}

impl Error for StateError {}

/// Serialize `profile` into the persistent byte layout.
pub fn encode_noise_profile(profile: &NoiseProfile) -> Vec<u8> {
    let header = StateHeader {
        fft_size: (profile.fft_size() as u32).to_le(),
        blocks_learned: profile.blocks_learned().to_le(),
        len: (profile.len() as u32).to_le(),
    };
    let mut bytes = Vec::with_capacity(HEADER_LEN + 4 * profile.len());
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    for value in profile.values() {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Parse a profile written by [`encode_noise_profile`].
pub fn decode_noise_profile(bytes: &[u8]) -> Result<NoiseProfile, StateError> {
    let header_bytes = bytes.get(..HEADER_LEN).ok_or(StateError::Truncated {
        expected_len: HEADER_LEN,
        actual_len: bytes.len(),
    })?;
    let header: StateHeader = bytemuck::pod_read_unaligned(header_bytes);
    let fft_size = u32::from_le(header.fft_size);
    let blocks_learned = u32::from_le(header.blocks_learned);
    let len = u32::from_le(header.len);

    let fft_size_usize = fft_size as usize;
    if !fft_size_usize.is_power_of_two()
        || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size_usize)
        || len as usize != fft_size_usize / 2 + 1
    {
        return Err(StateError::InvalidFftSize { fft_size, len });
    }

    let expected_len = HEADER_LEN + 4 * len as usize;
    if bytes.len() < expected_len {
        return Err(StateError::Truncated {
            expected_len,
            actual_len: bytes.len(),
        });
    }
    if bytes.len() > expected_len {
        return Err(StateError::LengthMismatch {
            expected_len,
            actual_len: bytes.len(),
        });
    }

    let mut values = Vec::with_capacity(len as usize);
    for (bin, chunk) in bytes[HEADER_LEN..].chunks_exact(4).enumerate() {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !value.is_finite() || value < 0.0 {
            return Err(StateError::NonFiniteValue { bin });
        }
        values.push(value);
    }

    Ok(NoiseProfile::from_values(values, blocks_learned))
}
