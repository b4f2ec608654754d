pub mod instrumented;
pub mod memory;
pub mod sqlite;

pub use instrumented::{InstrumentedRepository, StorageMetrics};
pub use memory::InMemoryRepository;
pub use shortlink_core::error::StorageError;
pub use shortlink_core::repository::{Repository, Result, UrlRecord};
pub use sqlite::{SqliteRepository, SqliteSettings, MIGRATOR};
