//! Remote key-value table repository
//!
//! The table is reached through [`TableClient`], a thin contract over a
//! hosted key-value store with partition key `name` and sort key `source`.
//! This module owns the batching and count-verification discipline; the
//! concrete network client lives outside the crate.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::Entity;
use crate::repository::Repository;

/// Items per batched write/delete round-trip.
const TABLE_BATCH_SIZE: usize = 25;

/// Client for the remote table. Batch calls return the number of items the
/// store reports as applied, which the repository checks against the number
/// submitted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Write items, returning the applied count
    async fn put_items(&self, items: &[Entity]) -> Result<usize>;

    /// All items whose partition key equals `name`, in sort-key order
    async fn query(&self, name: &str) -> Result<Vec<Entity>>;

    /// Delete by composite `(name, source)` keys, returning the applied count
    async fn delete_keys(&self, keys: &[(String, String)]) -> Result<usize>;
}

/// Repository over a remote table.
///
/// `dump` and `clear` are unsupported: a full scan at blacklist scale is
/// prohibitively expensive, so full exports must come from another tier.
pub struct TableRepository {
    client: Box<dyn TableClient>,
}

impl TableRepository {
    pub fn new(client: Box<dyn TableClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Repository for TableRepository {
    async fn put(&self, entities: &[Entity]) -> Result<()> {
        for chunk in entities.chunks(TABLE_BATCH_SIZE) {
            let wrote = self.client.put_items(chunk).await.map_err(|e| Error::Store {
                op: "put",
                key: chunk_keys(chunk),
                message: e.to_string(),
            })?;
            if wrote != chunk.len() {
                return Err(Error::CountMismatch {
                    op: "put",
                    expected: chunk.len(),
                    actual: wrote,
                });
            }
        }
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<Entity>> {
        self.client.query(name).await.map_err(|e| Error::Store {
            op: "get",
            key: name.to_string(),
            message: e.to_string(),
        })
    }

    async fn del(&self, name: &str) -> Result<()> {
        let items = self.client.query(name).await.map_err(|e| Error::Store {
            op: "del",
            key: name.to_string(),
            message: e.to_string(),
        })?;
        if items.is_empty() {
            return Ok(());
        }

        let keys: Vec<(String, String)> = items
            .into_iter()
            .map(|e| (e.name, e.source))
            .collect();

        for chunk in keys.chunks(TABLE_BATCH_SIZE) {
            let wrote = self
                .client
                .delete_keys(chunk)
                .await
                .map_err(|e| Error::Store {
                    op: "del",
                    key: name.to_string(),
                    message: e.to_string(),
                })?;
            if wrote != chunk.len() {
                return Err(Error::CountMismatch {
                    op: "del",
                    expected: chunk.len(),
                    actual: wrote,
                });
            }
        }
        Ok(())
    }

    async fn dump(&self) -> Result<mpsc::Receiver<Result<Vec<Entity>>>> {
        Err(Error::Unsupported("dump"))
    }

    async fn clear(&self) -> Result<()> {
        Err(Error::Unsupported("clear"))
    }
}

fn chunk_keys(chunk: &[Entity]) -> String {
    match chunk {
        [] => String::new(),
        [only] => only.name.clone(),
        [first, .., last] => format!("{}..{} ({} items)", first.name, last.name, chunk.len()),
    }
}
