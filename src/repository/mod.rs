//! Entity repositories
//!
//! A repository stores blacklist entities keyed by the `(name, source)`
//! composite key. Two variants exist: an in-memory map and a remote
//! key-value table reached through a [`table::TableClient`].

pub mod memory;
pub mod table;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::Entity;

pub use memory::MemoryRepository;
pub use table::{TableClient, TableRepository};

/// Capacity of a repository's dump channel.
pub(crate) const DUMP_CHANNEL_SIZE: usize = 128;

/// Keyed store of blacklist entities.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert or overwrite entities by `(name, source)`. Accepts 1..N at a
    /// time; backends that batch internally report which round-trip failed.
    async fn put(&self, entities: &[Entity]) -> Result<()>;

    /// All entities stored under `name`, one per source, sorted by source.
    /// An absent name yields an empty vector, not an error.
    async fn get(&self, name: &str) -> Result<Vec<Entity>>;

    /// Remove all entities stored under `name`, across every source.
    /// Deleting an absent name is a no-op.
    async fn del(&self, name: &str) -> Result<()>;

    /// Full-store export as a lazy stream of batches. Backends where a full
    /// scan is impractical return [`crate::Error::Unsupported`] instead of
    /// an empty stream.
    async fn dump(&self) -> Result<mpsc::Receiver<Result<Vec<Entity>>>>;

    /// Remove everything.
    async fn clear(&self) -> Result<()>;
}
