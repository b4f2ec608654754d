use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use shortlink_core::{ServiceError, UrlValidationError};
use tracing::{info, warn};

use crate::error::Result;
use crate::state::AppState;

/// Resolves `alias` and answers with `302 Found`.
///
/// The stored URL is re-validated by the service, so a corrupted record is
/// reported as `400 invalid redirect URL` instead of being followed.
pub async fn redirect_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let original_url = state.shortener().resolve(&alias).await?;
    let location = location(&original_url).inspect_err(|_| {
        warn!(alias = %alias, "stored url is not a valid header value");
    })?;

    state.metrics().redirected();
    info!(alias = %alias, original_url = %original_url, "redirected");

    Ok((StatusCode::FOUND, [(LOCATION, location)]))
}

fn location(url: &str) -> std::result::Result<HeaderValue, ServiceError> {
    HeaderValue::try_from(url)
        .map_err(|_| ServiceError::InvalidStoredUrl(UrlValidationError::InvalidFormat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_location_from_stored_url() {
        assert_eq!(
            location("https://example.com/a?b=c").unwrap(),
            "https://example.com/a?b=c"
        );
    }

    #[test]
    fn unencodable_url_is_an_invalid_redirect() {
        assert_eq!(
            location("https://example.com/\nSet-Cookie: x=1").unwrap_err(),
            ServiceError::InvalidStoredUrl(UrlValidationError::InvalidFormat)
        );
    }
}
