use thiserror::Error;
use url::Url;

/// Why a raw string failed URL validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UrlValidationError {
    #[error("invalid URL format")]
    InvalidFormat,
    #[error("only http and https schemes are allowed")]
    InvalidScheme,
}

/// Checks that `raw` is an absolute `http` or `https` URL with a host.
///
/// The scheme is checked before the host, so `file:///etc/passwd` reports
/// [`UrlValidationError::InvalidScheme`] rather than a missing host.
///
/// `Url::parse` silently drops tabs and newlines and trims surrounding
/// whitespace, while the raw string is what gets stored and sent back as a
/// `Location` header. Such input is rejected before parsing.
pub fn validate_url(raw: &str) -> Result<(), UrlValidationError> {
    if raw.chars().any(|c| c.is_ascii_control()) || raw.trim() != raw {
        return Err(UrlValidationError::InvalidFormat);
    }

    let parsed = Url::parse(raw).map_err(|_| UrlValidationError::InvalidFormat)?;

    if parsed.scheme().is_empty() {
        return Err(UrlValidationError::InvalidFormat);
    }

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlValidationError::InvalidScheme);
    }

    // `http:example.com` parses with a host, but has no authority.
    let has_authority = raw
        .get(parsed.scheme().len()..)
        .is_some_and(|rest| rest.starts_with("://"));
    if !has_authority {
        return Err(UrlValidationError::InvalidFormat);
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlValidationError::InvalidFormat),
    }
}
