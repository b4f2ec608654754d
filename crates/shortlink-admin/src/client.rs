use crate::proto::{AuthClient, IsAdminRequest};
use async_trait::async_trait;
use shortlink_core::{AdminCheckError, AdminChecker};
use std::time::Duration;
use thiserror::Error;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Error)]
pub enum AdminClientError {
    #[error("invalid admin service address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: tonic::transport::Error,
    },
    #[error("failed to configure TLS for admin service: {0}")]
    Tls(tonic::transport::Error),
}

/// Connection and retry settings for [`GrpcAdminChecker`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct AdminClientSettings {
    /// `host:port` or a full `http(s)://` URI of the identity service.
    #[builder(setter(into))]
    pub address: String,
    /// Deadline for a single attempt.
    #[builder(default = Duration::from_secs(5))]
    pub timeout: Duration,
    /// Maximum number of attempts per check, including the first one.
    #[builder(default = 3)]
    pub retries: u32,
    /// Use plaintext HTTP/2 instead of TLS.
    #[builder(default = true)]
    pub insecure: bool,
    /// Delay before the second attempt; grows linearly with each retry.
    #[builder(default = Duration::from_millis(100))]
    pub backoff: Duration,
}

/// [`AdminChecker`] backed by the identity service's `IsAdmin` RPC.
///
/// The channel connects lazily, so the identity service does not have to be
/// reachable when the gateway starts.
#[derive(Debug, Clone)]
pub struct GrpcAdminChecker {
    client: AuthClient<Channel>,
    settings: AdminClientSettings,
}

impl GrpcAdminChecker {
    /// Builds the client. Must be called from within a tokio runtime.
    pub fn new(settings: AdminClientSettings) -> Result<Self, AdminClientError> {
        let address = normalize_address(&settings.address, settings.insecure);

        let mut endpoint =
            Endpoint::from_shared(address.clone()).map_err(|source| {
                AdminClientError::InvalidAddress {
                    address: address.clone(),
                    source,
                }
            })?;
        endpoint = endpoint
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout);

        if settings.insecure {
            warn!(
                address = %address,
                "using insecure gRPC connection to admin service, not recommended for production"
            );
        } else {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_webpki_roots())
                .map_err(AdminClientError::Tls)?;
        }

        let channel = endpoint.connect_lazy();

        Ok(Self {
            client: AuthClient::new(channel),
            settings,
        })
    }

    async fn attempt(&self, user_id: i64) -> Result<bool, Status> {
        let mut client = self.client.clone();

        debug!(user_id, "sending IsAdmin request");
        let response = tokio::time::timeout(
            self.settings.timeout,
            client.is_admin(IsAdminRequest { user_id }),
        )
        .await
        .map_err(|_| Status::deadline_exceeded("admin check attempt timed out"))??;

        let is_admin = response.into_inner().is_admin;
        debug!(user_id, is_admin, "received IsAdmin response");

        Ok(is_admin)
    }
}

#[async_trait]
impl AdminChecker for GrpcAdminChecker {
    async fn is_admin(&self, user_id: i64) -> Result<bool, AdminCheckError> {
        let attempts = self.settings.retries.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(user_id).await {
                Ok(is_admin) => return Ok(is_admin),
                Err(status) if attempt < attempts && is_retryable(status.code()) => {
                    warn!(
                        user_id,
                        attempt,
                        code = ?status.code(),
                        message = status.message(),
                        "admin check failed, retrying"
                    );
                    tokio::time::sleep(self.settings.backoff * attempt).await;
                    attempt += 1;
                }
                Err(status) => return Err(map_status(&status)),
            }
        }
    }
}

/// Prefixes a bare `host:port` with the scheme implied by `insecure`.
pub fn normalize_address(address: &str, insecure: bool) -> String {
    if address.contains("://") {
        return address.to_string();
    }

    let scheme = if insecure { "http" } else { "https" };
    format!("{scheme}://{address}")
}

/// Status codes worth another attempt.
pub fn is_retryable(code: Code) -> bool {
    matches!(code, Code::NotFound | Code::Aborted | Code::DeadlineExceeded)
}

fn map_status(status: &Status) -> AdminCheckError {
    let message = format!("{:?}: {}", status.code(), status.message());

    match status.code() {
        Code::Unavailable => AdminCheckError::Unavailable(message),
        Code::DeadlineExceeded | Code::Cancelled => AdminCheckError::Timeout(message),
        _ => AdminCheckError::Rejected(message),
    }
}
