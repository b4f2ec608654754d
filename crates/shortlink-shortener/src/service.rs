use async_trait::async_trait;
use shortlink_core::error::Result;
use shortlink_core::{
    validate_url, AdminChecker, Alias, Repository, Requester, ServiceError, ShortenParams,
    StorageError, UrlRecord, UrlShortener,
};
use shortlink_generator::Generator;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Extra draws allowed when the generator produces a reserved alias.
pub const RESERVED_REDRAWS: usize = 3;

/// A concrete implementation of the `UrlShortener` trait.
///
/// This service wraps a `Repository`, an `AdminChecker` and a `Generator` to
/// handle:
/// - URL validation on write and re-validation on read
/// - Alias generation (generated or custom)
/// - Ownership checks on delete, with an admin override
///
/// Alias uniqueness is left to the repository. A generated alias that
/// collides is reported as [`ServiceError::AliasExists`]; no retry happens
/// here.
#[derive(Debug, Clone)]
pub struct UrlService<R, A, G> {
    repository: Arc<R>,
    admin_checker: Arc<A>,
    generator: Arc<G>,
    operation_timeout: Option<Duration>,
    reserved: Arc<HashSet<String>>,
}

impl<R: Repository, A: AdminChecker, G: Generator> UrlService<R, A, G> {
    pub fn new(repository: R, admin_checker: A, generator: G) -> Self {
        Self {
            repository: Arc::new(repository),
            admin_checker: Arc::new(admin_checker),
            generator: Arc::new(generator),
            operation_timeout: None,
            reserved: Arc::default(),
        }
    }

    /// Keeps generated aliases out of `aliases`, e.g. paths taken by fixed routes.
    ///
    /// A generated alias that lands in the set is drawn again, up to
    /// [`RESERVED_REDRAWS`] times. Custom aliases are not checked here.
    pub fn with_reserved_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved = Arc::new(aliases.into_iter().map(Into::into).collect());
        self
    }

    /// Bounds every repository and admin-checker call by `timeout`.
    ///
    /// A call that does not finish in time is abandoned and reported as
    /// [`ServiceError::Internal`].
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Some(limit) = self.operation_timeout else {
            return fut.await;
        };

        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(operation, timeout = ?limit, "operation timed out");
                Err(ServiceError::Internal(format!(
                    "{operation} timed out after {limit:?}"
                )))
            }
        }
    }

    fn alias_for(&self, params: &ShortenParams) -> Result<Alias> {
        match params.custom_alias() {
            Some(alias) => Ok(Alias::new(alias)),
            None => self.generate_alias(),
        }
    }

    fn generate_alias(&self) -> Result<Alias> {
        for _ in 0..=RESERVED_REDRAWS {
            let alias = self.generator.generate().map_err(|e| {
                error!(error = %e, "failed to generate alias");
                ServiceError::AliasGenerationFailed(e.to_string())
            })?;

            if !self.reserved.contains(alias.as_str()) {
                return Ok(alias);
            }
            debug!(alias = %alias, "generated alias is reserved, drawing again");
        }

        error!("generator kept producing reserved aliases");
        Err(ServiceError::AliasGenerationFailed(
            "generated alias is reserved".to_string(),
        ))
    }
}

#[async_trait]
impl<R: Repository, A: AdminChecker, G: Generator> UrlShortener for UrlService<R, A, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<Alias> {
        validate_url(&params.original_url)?;

        let alias = self.alias_for(&params)?;
        let record = UrlRecord {
            alias: alias.clone(),
            original_url: params.original_url,
            owner_email: params.owner_email,
        };

        self.bounded("save_url", async {
            self.repository
                .save_url(record)
                .await
                .map_err(storage_to_service_error)
        })
        .await?;

        info!(alias = %alias, "url saved");
        Ok(alias)
    }

    async fn resolve(&self, alias: &str) -> Result<String> {
        let alias = Alias::new(alias);

        let url = self
            .bounded("get_url", async {
                self.repository
                    .get_url(&alias)
                    .await
                    .map_err(storage_to_service_error)
            })
            .await?;

        if let Err(e) = validate_url(&url) {
            warn!(alias = %alias, error = %e, "stored url failed validation");
            return Err(ServiceError::InvalidStoredUrl(e));
        }

        debug!(alias = %alias, "url resolved");
        Ok(url)
    }

    async fn delete(&self, alias: &str, requester: &Requester) -> Result<()> {
        let alias = Alias::new(alias);

        let owner = self
            .bounded("get_url_owner", async {
                self.repository
                    .get_url_owner(&alias)
                    .await
                    .map_err(storage_to_service_error)
            })
            .await?;

        if owner != requester.email {
            let is_admin = self
                .bounded("is_admin", async {
                    self.admin_checker
                        .is_admin(requester.id)
                        .await
                        .map_err(|e| {
                            error!(user_id = requester.id, error = %e, "admin check failed");
                            ServiceError::from(e)
                        })
                })
                .await?;

            if !is_admin {
                warn!(
                    alias = %alias,
                    user_id = requester.id,
                    "delete rejected, requester is neither owner nor admin"
                );
                return Err(ServiceError::PermissionDenied);
            }

            info!(
                alias = %alias,
                user_id = requester.id,
                "admin deleting url owned by another user"
            );
        }

        self.bounded("delete_url", async {
            self.repository
                .delete_url(&alias)
                .await
                .map_err(storage_to_service_error)
        })
        .await?;

        info!(alias = %alias, user_id = requester.id, "url deleted");
        Ok(())
    }
}

/// Converts a StorageError to a ServiceError.
fn storage_to_service_error(e: StorageError) -> ServiceError {
    match e {
        StorageError::Conflict(alias) => ServiceError::AliasExists(alias),
        StorageError::NotFound(_) => ServiceError::UrlNotFound,
        other => {
            error!(error = %other, "storage operation failed");
            ServiceError::Internal(other.to_string())
        }
    }
}
