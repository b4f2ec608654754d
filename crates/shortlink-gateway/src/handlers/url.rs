use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use shortlink_core::ShortenParams;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, CreateUrlResponse, StatusResponse, STATUS_OK};
use crate::state::AppState;

/// Aliases that would be shadowed by fixed routes.
///
/// Custom aliases are rejected here; the service redraws generated ones.
pub const RESERVED_ALIASES: &[&str] = &["health", "metrics", "url"];

pub async fn create_url_handler(
    State(state): State<AppState>,
    user: AuthUser,
    payload: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<Json<CreateUrlResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "failed to decode request body");
        AppError::BadRequest("invalid request body".to_string())
    })?;

    if let Some(alias) = request.alias.as_deref() {
        if RESERVED_ALIASES.contains(&alias) {
            return Err(AppError::BadRequest(format!("alias '{alias}' is reserved")));
        }
    }

    let alias = state
        .shortener()
        .shorten(ShortenParams {
            original_url: request.original_url,
            alias: request.alias,
            owner_email: user.email,
        })
        .await?;

    state.metrics().url_created();
    info!(alias = %alias, user_id = user.id, "short url created");

    Ok(Json(CreateUrlResponse {
        status: STATUS_OK,
        short_url: alias.to_url(state.base_url()),
        alias: alias.into_inner(),
    }))
}

pub async fn delete_url_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(alias): Path<String>,
) -> Result<Json<StatusResponse>> {
    state.shortener().delete(&alias, &user.into()).await?;

    Ok(Json(StatusResponse::ok()))
}
