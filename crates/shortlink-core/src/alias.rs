use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The short key under which an original URL is stored.
///
/// Any non-empty string is accepted as a custom alias; uniqueness is the
/// only constraint and the repository enforces it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// Builds the public short URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the alias as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the alias and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Alias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
