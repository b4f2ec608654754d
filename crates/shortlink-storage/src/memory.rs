use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use shortlink_core::error::StorageError;
use shortlink_core::repository::{Repository, Result, UrlRecord};
use shortlink_core::Alias;

/// In-memory storage entry for a URL mapping.
#[derive(Debug, Clone)]
struct Entry {
    original_url: String,
    owner_email: String,
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// The alias uniqueness check and the insert happen under a single shard
/// lock via the entry API, so concurrent saves of the same alias produce
/// exactly one winner.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, Entry>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn save_url(&self, record: UrlRecord) -> Result<()> {
        match self.storage.entry(record.alias.into_inner()) {
            MapEntry::Occupied(occupied) => Err(StorageError::Conflict(occupied.key().clone())),
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry {
                    original_url: record.original_url,
                    owner_email: record.owner_email,
                });
                Ok(())
            }
        }
    }

    async fn get_url(&self, alias: &Alias) -> Result<String> {
        self.storage
            .get(alias.as_str())
            .map(|entry| entry.original_url.clone())
            .ok_or_else(|| StorageError::NotFound(alias.to_string()))
    }

    async fn get_url_owner(&self, alias: &Alias) -> Result<String> {
        self.storage
            .get(alias.as_str())
            .map(|entry| entry.owner_email.clone())
            .ok_or_else(|| StorageError::NotFound(alias.to_string()))
    }

    async fn delete_url(&self, alias: &Alias) -> Result<()> {
        self.storage
            .remove(alias.as_str())
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(alias.to_string()))
    }
}
