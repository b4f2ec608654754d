use crate::alias::Alias;
use crate::error::Result;
use async_trait::async_trait;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// Optional custom alias. `None` or an empty string requests a generated alias.
    pub alias: Option<String>,
    /// Email of the authenticated principal creating the record.
    pub owner_email: String,
}

impl ShortenParams {
    /// Returns the requested custom alias, treating an empty string as absent.
    pub fn custom_alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|alias| !alias.is_empty())
    }
}

/// The authenticated principal issuing a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: i64,
    pub email: String,
}

#[async_trait]
pub trait UrlShortener: Send + Sync + 'static {
    /// Stores a new mapping and returns the alias used.
    async fn shorten(&self, params: ShortenParams) -> Result<Alias>;

    /// Resolves an alias to the stored original URL.
    async fn resolve(&self, alias: &str) -> Result<String>;

    /// Deletes a mapping on behalf of its owner or an admin.
    async fn delete(&self, alias: &str, requester: &Requester) -> Result<()>;
}
