use crate::{Generator, GeneratorError};
use rand::rngs::OsRng;
use rand::TryRngCore;
use shortlink_core::Alias;
use typed_builder::TypedBuilder;

/// The 62-character alphabet generated aliases are drawn from.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Alias length used when none is configured.
pub const DEFAULT_LENGTH: usize = 6;

// Largest multiple of 62 that fits in a byte. Bytes at or above it are
// discarded so every character is equally likely.
const REJECTION_BOUND: u8 = 248;

/// Generates fixed-length aliases from the operating system's CSPRNG.
///
/// Errors from the OS random source are propagated; there is no fallback to
/// a weaker generator.
///
/// ```
/// use shortlink_generator::{Generator, RandomGenerator};
///
/// let generator = RandomGenerator::builder().length(8).build();
/// let alias = generator.generate().unwrap();
/// assert_eq!(alias.as_str().len(), 8);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomGenerator {
    #[builder(default = DEFAULT_LENGTH)]
    length: usize,
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RandomGenerator {
    pub fn length(&self) -> usize {
        self.length
    }

    fn random_string(&self) -> Result<String, GeneratorError> {
        let mut out = String::with_capacity(self.length);
        let mut buf = vec![0u8; self.length.max(1) * 2];

        while out.len() < self.length {
            OsRng
                .try_fill_bytes(&mut buf)
                .map_err(|e| GeneratorError::RandomSource(e.to_string()))?;

            for byte in buf.iter().copied().filter(|b| *b < REJECTION_BOUND) {
                if out.len() == self.length {
                    break;
                }
                out.push(ALPHABET[usize::from(byte) % ALPHABET.len()] as char);
            }
        }

        Ok(out)
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> Result<Alias, GeneratorError> {
        self.random_string().map(Alias::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_length_is_six() {
        let generator = RandomGenerator::default();

        let alias = generator.generate().unwrap();
        assert_eq!(alias.as_str().len(), 6);
    }

    #[test]
    fn samples_stay_within_alphabet() {
        let generator = RandomGenerator::default();

        for _ in 0..10_000 {
            let alias = generator.generate().unwrap();
            assert_eq!(alias.as_str().len(), 6);
            assert!(
                alias.as_str().bytes().all(|b| ALPHABET.contains(&b)),
                "unexpected character in {alias}"
            );
        }
    }

    #[test]
    fn custom_length() {
        let generator = RandomGenerator::builder().length(12).build();

        assert_eq!(generator.generate().unwrap().as_str().len(), 12);
    }

    #[test]
    fn aliases_are_not_repeated_in_small_samples() {
        let generator = RandomGenerator::default();

        let seen: HashSet<_> = (0..1_000)
            .map(|_| generator.generate().unwrap().into_inner())
            .collect();

        // 1000 draws from 62^6 collide with probability below 1e-5.
        assert!(seen.len() >= 999);
    }

    #[test]
    fn alphabet_has_no_duplicates() {
        let unique: HashSet<_> = ALPHABET.iter().collect();
        assert_eq!(unique.len(), 62);
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomGenerator>();
    }
}
