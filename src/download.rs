//! Concurrent multi-source download pipeline
//!
//! One worker per feed drains that feed's stream and forwards it onto a
//! shared merge channel. A worker signals completion by dropping its clone
//! of the merge sender; once every clone is gone the channel closes and the
//! collector stops, so N-of-N completion needs no sentinel entities.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::repository::Repository;
use crate::sources::Source;

const MERGE_CHANNEL_SIZE: usize = 128;

/// Fetch every source concurrently and store the union of their entities in
/// `repo`.
///
/// Returns the first error any feed reports, or the first storage error
/// during ingestion. Entities already stored before the abort remain in the
/// repository. After an early return the remaining workers are abandoned:
/// their sends fail once the collector is gone and they stop on their own,
/// so they are never joined synchronously.
pub async fn download(repo: &dyn Repository, sources: &[Arc<dyn Source>]) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(MERGE_CHANNEL_SIZE);

    for source in sources {
        let mut feed_rx = source.fetch();
        let tx = tx.clone();
        let feed = source.name();

        tokio::spawn(async move {
            while let Some(msg) = feed_rx.recv().await {
                if tx.send(msg).await.is_err() {
                    tracing::debug!(feed, "collector gone, abandoning feed");
                    return;
                }
            }
        });
    }
    // The collector holds the only remaining sender otherwise.
    drop(tx);

    let mut stored = 0usize;
    while let Some(msg) = rx.recv().await {
        let batch = msg?;
        stored += batch.len();
        repo.put(&batch).await?;
    }

    tracing::info!(entities = stored, feeds = sources.len(), "download complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::Entity;
    use crate::repository::MemoryRepository;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Feed stub that plays back a scripted message sequence, optionally
    /// after a delay.
    struct StubSource {
        name: &'static str,
        delay: Duration,
        script: Mutex<Option<Vec<Result<Vec<Entity>>>>>,
    }

    impl StubSource {
        fn new(name: &'static str, script: Vec<Result<Vec<Entity>>>) -> Self {
            Self {
                name,
                delay: Duration::ZERO,
                script: Mutex::new(Some(script)),
            }
        }

        fn delayed(name: &'static str, delay: Duration, script: Vec<Result<Vec<Entity>>>) -> Self {
            Self {
                name,
                delay,
                script: Mutex::new(Some(script)),
            }
        }
    }

    impl Source for StubSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn fetch(&self) -> mpsc::Receiver<Result<Vec<Entity>>> {
            let (tx, rx) = mpsc::channel(8);
            let script = self.script.lock().unwrap().take().expect("fetched twice");
            let delay = self.delay;
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                for msg in script {
                    if tx.send(msg).await.is_err() {
                        return;
                    }
                }
            });
            rx
        }
    }

    fn entity(name: &str, source: &str) -> Entity {
        Entity::new(name, source, Utc::now(), None)
    }

    #[tokio::test]
    async fn merges_all_sources_into_the_repository() {
        let repo = MemoryRepository::new();
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(StubSource::new(
                "t1",
                vec![Ok(vec![entity("10.0.0.1", "t1"), entity("10.0.0.2", "t1")])],
            )),
            Arc::new(StubSource::new(
                "t2",
                vec![Ok(vec![entity("blue.example.com", "t2")])],
            )),
        ];

        download(&repo, &sources).await.unwrap();

        assert_eq!(repo.get("10.0.0.1").await.unwrap().len(), 1);
        assert_eq!(repo.get("10.0.0.2").await.unwrap().len(), 1);
        assert_eq!(repo.get("blue.example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn first_error_aborts_but_keeps_other_sources_data() {
        let repo = MemoryRepository::new();
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(StubSource::new(
                "t1",
                vec![Ok(vec![entity("10.0.0.1", "t1")])],
            )),
            Arc::new(StubSource::new(
                "t2",
                vec![Ok(vec![entity("blue.example.com", "t2")])],
            )),
            // Fails after emitting nothing, late enough that the healthy
            // feeds have already been collected.
            Arc::new(StubSource::delayed(
                "t3",
                Duration::from_millis(100),
                vec![Err(Error::Status {
                    feed: "t3".to_string(),
                    status: 503,
                })],
            )),
        ];

        let err = download(&repo, &sources).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));

        assert_eq!(repo.get("10.0.0.1").await.unwrap().len(), 1);
        assert_eq!(repo.get("blue.example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn per_source_order_reaches_the_repository() {
        let repo = MemoryRepository::new();
        let first = entity("blue.example.com", "t1");
        let mut second = first.clone();
        second.reason = Some("phishing".to_string());

        let sources: Vec<Arc<dyn Source>> = vec![Arc::new(StubSource::new(
            "t1",
            vec![Ok(vec![first]), Ok(vec![second.clone()])],
        ))];

        download(&repo, &sources).await.unwrap();

        // Same key twice in stream order: the later record wins.
        let got = repo.get("blue.example.com").await.unwrap();
        assert_eq!(got, vec![second]);
    }

    #[tokio::test]
    async fn empty_source_set_completes_immediately() {
        let repo = MemoryRepository::new();
        download(&repo, &[]).await.unwrap();
    }
}
