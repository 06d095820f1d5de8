//! In-memory repository

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::error::Result;
use crate::models::Entity;
use crate::repository::{Repository, DUMP_CHANNEL_SIZE};

/// Two-level map: outer key is the entity name, inner key the source.
/// Dedup by `(name, source)` falls out of the map structure; inserting an
/// existing source under a name overwrites.
type EntityMap = HashMap<String, HashMap<String, Entity>>;

/// In-memory repository backed by a two-level [`HashMap`].
#[derive(Default)]
pub struct MemoryRepository {
    data: Arc<RwLock<EntityMap>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn put(&self, entities: &[Entity]) -> Result<()> {
        let mut data = self.data.write().await;
        for entity in entities {
            data.entry(entity.name.clone())
                .or_default()
                .insert(entity.source.clone(), entity.clone());
        }
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<Entity>> {
        let data = self.data.read().await;
        let Some(by_source) = data.get(name) else {
            return Ok(vec![]);
        };
        let mut entities: Vec<Entity> = by_source.values().cloned().collect();
        // Map iteration order is undefined; callers that take the first
        // match get a deterministic answer this way.
        entities.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(entities)
    }

    async fn del(&self, name: &str) -> Result<()> {
        self.data.write().await.remove(name);
        Ok(())
    }

    async fn dump(&self) -> Result<mpsc::Receiver<Result<Vec<Entity>>>> {
        let (tx, rx) = mpsc::channel(DUMP_CHANNEL_SIZE);
        let data = Arc::clone(&self.data);

        // The read guard is held for the whole walk: writers wait until the
        // consumer drains the stream, and the export is a stable view.
        tokio::spawn(async move {
            let data = data.read().await;
            for by_source in data.values() {
                let batch: Vec<Entity> = by_source.values().cloned().collect();
                if tx.send(Ok(batch)).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn clear(&self) -> Result<()> {
        self.data.write().await.clear();
        Ok(())
    }
}
