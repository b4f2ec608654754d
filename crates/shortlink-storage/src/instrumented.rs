use async_trait::async_trait;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use shortlink_core::repository::{Repository, Result, UrlRecord};
use shortlink_core::Alias;
use std::time::Instant;

const NAMESPACE: &str = "url_shortener";
const SUBSYSTEM: &str = "storage";

/// Prometheus instruments for repository calls.
///
/// - `url_shortener_storage_operations_total{operation,status}` where status
///   is `success` or `error`
/// - `url_shortener_storage_operation_duration_seconds{operation}`
#[derive(Debug, Clone)]
pub struct StorageMetrics {
    operations_total: IntCounterVec,
    operation_duration: HistogramVec,
}

impl StorageMetrics {
    /// Creates the instruments and registers them with `registry`.
    pub fn new(registry: &Registry) -> std::result::Result<Self, prometheus::Error> {
        let operations_total = IntCounterVec::new(
            Opts::new("operations_total", "Total number of storage operations")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
            &["operation", "status"],
        )?;
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "operation_duration_seconds",
                "Storage operation duration in seconds",
            )
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
            &["operation"],
        )?;

        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            operations_total,
            operation_duration,
        })
    }

    fn record<T, E>(&self, operation: &str, result: &std::result::Result<T, E>, start: Instant) {
        let status = if result.is_ok() { "success" } else { "error" };
        self.operations_total
            .with_label_values(&[operation, status])
            .inc();
        self.operation_duration
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
    }
}

/// Repository decorator that records [`StorageMetrics`] around every call.
#[derive(Debug, Clone)]
pub struct InstrumentedRepository<R> {
    inner: R,
    metrics: StorageMetrics,
}

impl<R: Repository> InstrumentedRepository<R> {
    pub fn new(inner: R, metrics: StorageMetrics) -> Self {
        Self { inner, metrics }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: Repository> Repository for InstrumentedRepository<R> {
    async fn save_url(&self, record: UrlRecord) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.save_url(record).await;
        self.metrics.record("save_url", &result, start);
        result
    }

    async fn get_url(&self, alias: &Alias) -> Result<String> {
        let start = Instant::now();
        let result = self.inner.get_url(alias).await;
        self.metrics.record("get_url", &result, start);
        result
    }

    async fn get_url_owner(&self, alias: &Alias) -> Result<String> {
        let start = Instant::now();
        let result = self.inner.get_url_owner(alias).await;
        self.metrics.record("get_url_owner", &result, start);
        result
    }

    async fn delete_url(&self, alias: &Alias) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.delete_url(alias).await;
        self.metrics.record("delete_url", &result, start);
        result
    }
}
