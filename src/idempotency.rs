//! Idempotency keys for mutating requests.
//!
//! A key is 12 random bytes rendered as 24 lowercase hex characters. When
//! the secure random source fails, a weaker identifier built from a
//! pseudo-random fraction and the current timestamp is used instead.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use custom_error::custom_error;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

const KEY_BYTES: usize = 12;

custom_error! {
    pub EntropyError
        Unavailable{reason: String} = "secure random source unavailable: {reason}",
}

pub trait EntropySource: Send + Sync + Debug {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError>;
}

/// The operating system's CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::getrandom(buf).map_err(|err| EntropyError::Unavailable {
            reason: err.to_string(),
        })
    }
}

/// Generates a fresh key. Never fails.
pub fn generate(source: &dyn EntropySource) -> String {
    let mut buf = [0u8; KEY_BYTES];
    match source.fill(&mut buf) {
        Ok(()) => hex::encode(buf),
        Err(err) => {
            warn!(error = %err, "falling back to pseudo-random idempotency key");
            fallback_key()
        }
    }
}

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

// Seeded from the clock and a counter only: the OS source is already known
// to be failing at this point.
fn fallback_key() -> String {
    let now = chrono::Utc::now();
    let nanos = now.timestamp_nanos_opt().unwrap_or_default() as u64;
    let seed = nanos ^ FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed).rotate_left(32);

    let fraction: f64 = SmallRng::seed_from_u64(seed).random();
    let digits = (fraction * (1u64 << 52) as f64) as u64;

    format!("{:x}{:x}", digits, now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&self, _buf: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError::Unavailable {
                reason: "no device".to_string(),
            })
        }
    }

    #[test]
    fn test_key_is_24_hex_chars() {
        let key = generate(&OsEntropy);

        assert_eq!(key.len(), 24);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_keys_differ_between_calls() {
        let first = generate(&OsEntropy);
        let second = generate(&OsEntropy);

        assert_ne!(first, second);
    }

    #[test]
    fn test_broken_source_falls_back() {
        let key = generate(&BrokenEntropy);

        assert!(!key.is_empty());
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate(&BrokenEntropy));
    }
}
