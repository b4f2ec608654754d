use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Instant;

const NAMESPACE: &str = "url_shortener";
const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// HTTP and business instruments, registered on an injected [`Registry`].
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    requests_in_flight: IntGauge,
    urls_created: IntCounter,
    redirects: IntCounter,
}

impl HttpMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Total number of HTTP requests")
                .namespace(NAMESPACE)
                .subsystem("http"),
            &["method", "path", "status_code"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new("request_duration_seconds", "HTTP request duration in seconds")
                .namespace(NAMESPACE)
                .subsystem("http")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "path"],
        )?;
        let requests_in_flight = IntGauge::with_opts(
            Opts::new(
                "requests_in_flight",
                "Number of HTTP requests currently being processed",
            )
            .namespace(NAMESPACE)
            .subsystem("http"),
        )?;
        let urls_created = IntCounter::with_opts(
            Opts::new("urls_created_total", "Total number of shortened URLs created")
                .namespace(NAMESPACE)
                .subsystem("business"),
        )?;
        let redirects = IntCounter::with_opts(
            Opts::new("redirects_total", "Total number of URL redirects performed")
                .namespace(NAMESPACE)
                .subsystem("business"),
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(requests_in_flight.clone()))?;
        registry.register(Box::new(urls_created.clone()))?;
        registry.register(Box::new(redirects.clone()))?;

        Ok(Self {
            requests_total,
            request_duration,
            requests_in_flight,
            urls_created,
            redirects,
        })
    }

    pub fn url_created(&self) {
        self.urls_created.inc();
    }

    pub fn redirected(&self) {
        self.redirects.inc();
    }

    fn observe(&self, method: &str, path: &str, status: u16, start: Instant) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method, path])
            .observe(start.elapsed().as_secs_f64());
    }
}

/// Decrements the in-flight gauge when the request finishes or is dropped.
struct InFlight(IntGauge);

impl InFlight {
    fn enter(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Middleware recording request count, latency and in-flight requests.
///
/// Requests are labelled with the matched route template, so `/abc123` and
/// `/xyz789` share the `/{alias}` series. Unmatched requests use `unknown`.
pub async fn track_metrics(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let _in_flight = InFlight::enter(&metrics.requests_in_flight);
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_owned());

    let response = next.run(request).await;

    metrics.observe(&method, &path, response.status().as_u16(), start);
    response
}

/// Renders every metric in `registry` in the Prometheus text format.
pub fn render(registry: &Registry) -> Result<(String, String), prometheus::Error> {
    let encoder = TextEncoder::new();
    let body = encoder.encode_to_string(&registry.gather())?;
    Ok((encoder.format_type().to_owned(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_instruments() {
        let registry = Registry::new();
        let metrics = HttpMetrics::new(&registry).unwrap();

        metrics.observe("GET", "/{alias}", 302, Instant::now());
        metrics.url_created();
        metrics.redirected();
        {
            let _guard = InFlight::enter(&metrics.requests_in_flight);
            assert_eq!(metrics.requests_in_flight.get(), 1);
        }
        assert_eq!(metrics.requests_in_flight.get(), 0);

        let (_, body) = render(&registry).unwrap();
        assert!(body.contains("url_shortener_http_requests_total"));
        assert!(body.contains("url_shortener_http_request_duration_seconds_bucket"));
        assert!(body.contains("url_shortener_http_requests_in_flight"));
        assert!(body.contains("url_shortener_business_urls_created_total 1"));
        assert!(body.contains("url_shortener_business_redirects_total 1"));
    }

    #[test]
    fn labels_requests_by_route_and_status() {
        let registry = Registry::new();
        let metrics = HttpMetrics::new(&registry).unwrap();

        metrics.observe("GET", "/{alias}", 302, Instant::now());
        metrics.observe("GET", "/{alias}", 302, Instant::now());
        metrics.observe("GET", "/{alias}", 404, Instant::now());

        assert_eq!(
            metrics
                .requests_total
                .with_label_values(&["GET", "/{alias}", "302"])
                .get(),
            2
        );
        assert_eq!(
            metrics
                .requests_total
                .with_label_values(&["GET", "/{alias}", "404"])
                .get(),
            1
        );
    }
}
