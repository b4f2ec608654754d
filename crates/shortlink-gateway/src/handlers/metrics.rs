use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::error::{AppError, Result};
use crate::metrics::render;
use crate::state::AppState;

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let (content_type, body) =
        render(state.registry()).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(([(CONTENT_TYPE, content_type)], body))
}
