use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jiff::Timestamp;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shortlink_core::Requester;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;

/// Clock skew tolerated on `exp` and `iat`, in seconds.
pub const LEEWAY_SECS: u64 = 15;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid header format")]
    InvalidHeader,
    #[error("invalid token")]
    InvalidToken(String),
    #[error("invalid public key: {0}")]
    InvalidKey(String),
}

/// Claims issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub uid: i64,
    pub email: String,
    pub app_id: i32,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Verifies RS256 access tokens against the identity service's public key.
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl JwtValidator {
    /// Builds a validator from a PEM encoded RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = LEEWAY_SECS;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self { key, validation })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        if let Some(iat) = claims.iat {
            let now = Timestamp::now().as_second();
            if iat > now + LEEWAY_SECS as i64 {
                return Err(AuthError::InvalidToken(
                    "token used before issued".to_string(),
                ));
            }
        }

        Ok(claims)
    }
}

/// Extracts the bearer token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidHeader),
    }
}

/// The authenticated caller, taken from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

impl From<AuthUser> for Requester {
    fn from(user: AuthUser) -> Self {
        Requester {
            id: user.id,
            email: user.email,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            warn!("missing authorization header");
            return Err(AuthError::MissingToken.into());
        };

        let header = header.to_str().map_err(|_| {
            warn!("authorization header is not valid ascii");
            AuthError::InvalidHeader
        })?;
        let token = bearer_token(header).inspect_err(|_| {
            warn!("invalid authorization header format");
        })?;

        let claims = state.jwt().validate(token).inspect_err(|e| {
            warn!(error = ?e, "token validation failed");
        })?;

        debug!(uid = claims.uid, email = %claims.email, "user authenticated");

        Ok(AuthUser {
            id: claims.uid,
            email: claims.email,
        })
    }
}
