pub mod random;

pub use random::{RandomGenerator, ALPHABET, DEFAULT_LENGTH};

use shortlink_core::Alias;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    /// The operating system's secure random source could not be read.
    #[error("secure random source unavailable: {0}")]
    RandomSource(String),
}

/// Trait for generating aliases.
///
/// Implementations are pure generators that don't interact with storage.
/// Uniqueness is not guaranteed here; collisions surface as conflicts from
/// the repository.
pub trait Generator: Send + Sync + 'static {
    /// Generates a new alias, or fails if the entropy source is unavailable.
    fn generate(&self) -> Result<Alias, GeneratorError>;
}
