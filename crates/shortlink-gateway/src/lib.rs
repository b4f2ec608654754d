//! HTTP gateway for the shortlink service.
//!
//! Routes:
//! - `POST /url` creates a short URL (JWT required)
//! - `DELETE /url/{alias}` deletes one (owner or admin, JWT required)
//! - `GET /{alias}` redirects to the original URL
//! - `GET /health` and `GET /metrics`

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod model;
pub mod state;

pub use app::App;
pub use auth::{AuthUser, Claims, JwtValidator};
pub use config::Cli;
pub use error::AppError;
pub use metrics::HttpMetrics;
pub use state::AppState;
