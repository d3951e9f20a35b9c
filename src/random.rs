//! Random filler generation.
//!
//! Chaff headers and bodies are filled with random bytes drawn from the
//! operating system's entropy source and base64-encoded so they are safe to
//! place in a header value or a response body.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{Rng, RngCore};
use rand_core::OsRng;

use crate::error::{Error, Result};

/// Upper bound on raw random bytes generated for a single payload.
pub const MAX_RANDOM_BYTES: usize = 1 << 20;

/// Payload returned when the random source is unavailable.
pub const RANDOM_FAILURE_PAYLOAD: &str = "Internal Server Error";

/// Secure random number generator backed by the OS entropy source.
pub struct SecureRandom;

impl SecureRandom {
    /// Fill a buffer with random bytes, reporting a failed entropy source.
    pub fn try_fill(dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::RandomSource(e.to_string()))
    }
}

/// Number of raw bytes whose base64 encoding is roughly `size` bytes long.
///
/// Base64 expands by 4/3, so 3/4 of the target is generated.
pub fn raw_len(size: usize) -> usize {
    (size.saturating_mul(3) / 4).min(MAX_RANDOM_BYTES)
}

/// Generate base64 filler approximately `size` bytes long.
pub fn try_random_data(size: usize) -> Result<String> {
    if size == 0 {
        return Ok(String::new());
    }

    let mut buffer = vec![0u8; raw_len(size)];
    SecureRandom::try_fill(&mut buffer)?;
    Ok(STANDARD.encode(buffer))
}

/// Generate base64 filler approximately `size` bytes long.
///
/// A failing entropy source never propagates out of the chaff path: it is
/// logged and the fixed [`RANDOM_FAILURE_PAYLOAD`] is returned instead.
pub fn random_data(size: usize) -> String {
    match try_random_data(size) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("unable to generate chaff filler: {}", e);
            RANDOM_FAILURE_PAYLOAD.to_string()
        }
    }
}

/// Generate a random delay in milliseconds within `[min_ms, max_ms)`.
pub fn random_delay_ms(min_ms: u64, max_ms: u64) -> u64 {
    if min_ms >= max_ms {
        return min_ms;
    }
    rand::thread_rng().gen_range(min_ms..max_ms)
}
