use std::sync::Arc;

use prometheus::Registry;
use shortlink_core::UrlShortener;

use crate::auth::JwtValidator;
use crate::metrics::HttpMetrics;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn UrlShortener>,
    jwt: Arc<JwtValidator>,
    metrics: HttpMetrics,
    registry: Registry,
    base_url: String,
}

impl AppState {
    pub fn new(
        shortener: Arc<dyn UrlShortener>,
        jwt: JwtValidator,
        metrics: HttpMetrics,
        registry: Registry,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            shortener,
            jwt: Arc::new(jwt),
            metrics,
            registry,
            base_url: public_base_url.into(),
        }
    }

    pub fn shortener(&self) -> &dyn UrlShortener {
        self.shortener.as_ref()
    }

    pub fn jwt(&self) -> &JwtValidator {
        &self.jwt
    }

    pub fn metrics(&self) -> &HttpMetrics {
        &self.metrics
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
