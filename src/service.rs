//! Blacklist facade
//!
//! [`BadList`] composes a repository, a serializer, and a configured source
//! set behind insert/lookup/download/dump/load operations.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::download::download;
use crate::error::Result;
use crate::models::Entity;
use crate::repository::{MemoryRepository, Repository};
use crate::serializer::{JsonSerializer, Serializer};
use crate::sources::{default_set, Source};

/// Which sources, repository backend, and codec a [`BadList`] uses.
///
/// An explicit value passed at construction, so tests and alternate
/// deployments can substitute any of the three without shared process state.
pub struct Config {
    pub sources: Vec<Arc<dyn Source>>,
    pub repository: Box<dyn Repository>,
    pub serializer: Box<dyn Serializer>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_set(),
            repository: Box::new(MemoryRepository::new()),
            serializer: Box::new(JsonSerializer::new()),
        }
    }
}

/// Aggregated blacklist: a repository of bad entities plus the machinery to
/// refill it from feeds and to persist it.
pub struct BadList {
    sources: Vec<Arc<dyn Source>>,
    repo: Box<dyn Repository>,
    ser: Box<dyn Serializer>,
}

impl BadList {
    /// Default source set, in-memory repository, JSON lines codec.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            sources: config.sources,
            repo: config.repository,
            ser: config.serializer,
        }
    }

    /// Add one entity, e.g. an indicator observed locally.
    pub async fn insert(&self, entity: Entity) -> Result<()> {
        self.repo.put(&[entity]).await
    }

    /// All records for an IP address or domain name, one per source that
    /// blacklisted it, sorted by source. Empty when the name is clean.
    pub async fn lookup(&self, name: &str) -> Result<Vec<Entity>> {
        self.repo.get(name).await
    }

    /// Drop all records for a name, e.g. after a false-positive report.
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.repo.del(name).await
    }

    /// Fetch the given feeds concurrently and store their entities.
    pub async fn download(&self, sources: &[Arc<dyn Source>]) -> Result<()> {
        download(self.repo.as_ref(), sources).await
    }

    /// [`Self::download`] over the configured source set.
    pub async fn download_configured(&self) -> Result<()> {
        download(self.repo.as_ref(), &self.sources).await
    }

    /// Serialize the whole repository into `w`.
    pub async fn dump(&self, w: &mut (dyn Write + Send)) -> Result<()> {
        let rx = self.repo.dump().await?;
        self.ser.serialize(rx, w).await
    }

    /// Restore records serialized by [`Self::dump`]. Use the same serializer
    /// for both directions.
    pub async fn load(&self, r: Box<dyn Read + Send>) -> Result<()> {
        let mut rx = self.ser.deserialize(r);
        while let Some(msg) = rx.recv().await {
            let entity = msg?;
            self.repo.put(&[entity]).await?;
        }
        Ok(())
    }

    /// Migrate every stored entity into `new_repo`, then switch to it.
    ///
    /// Fails without switching when the current backend cannot dump (a
    /// remote table, say): a silent switch would look like an empty store
    /// and lose the data.
    pub async fn replace_repository(&mut self, new_repo: Box<dyn Repository>) -> Result<()> {
        let mut rx = self.repo.dump().await?;
        while let Some(msg) = rx.recv().await {
            let batch = msg?;
            new_repo.put(&batch).await?;
        }
        self.repo = new_repo;
        Ok(())
    }

    /// Switch the codec used by dump/load.
    pub fn replace_serializer(&mut self, ser: Box<dyn Serializer>) {
        self.ser = ser;
    }
}

impl Default for BadList {
    fn default() -> Self {
        Self::new()
    }
}
