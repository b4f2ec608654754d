use crate::alias::Alias;
use crate::error::StorageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored alias → URL mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The unique key of the record.
    pub alias: Alias,
    /// The original URL that was shortened.
    pub original_url: String,
    /// Email of the principal that created the record. Never changes.
    pub owner_email: String,
}

/// Persistence contract consumed by the URL service.
///
/// Uniqueness of `alias` must be enforced atomically by the backend: two
/// concurrent `save_url` calls on the same alias produce exactly one success
/// and one [`StorageError::Conflict`].
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Inserts a new record. Returns `Err(Conflict)` if the alias is taken.
    async fn save_url(&self, record: UrlRecord) -> Result<()>;

    /// Returns the original URL for an alias, or `Err(NotFound)`.
    async fn get_url(&self, alias: &Alias) -> Result<String>;

    /// Returns the owner email for an alias, or `Err(NotFound)`.
    async fn get_url_owner(&self, alias: &Alias) -> Result<String>;

    /// Removes the record for an alias. Returns `Err(NotFound)` if nothing was removed.
    async fn delete_url(&self, alias: &Alias) -> Result<()>;
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn save_url(&self, record: UrlRecord) -> Result<()> {
        (**self).save_url(record).await
    }

    async fn get_url(&self, alias: &Alias) -> Result<String> {
        (**self).get_url(alias).await
    }

    async fn get_url_owner(&self, alias: &Alias) -> Result<String> {
        (**self).get_url_owner(alias).await
    }

    async fn delete_url(&self, alias: &Alias) -> Result<()> {
        (**self).delete_url(alias).await
    }
}
