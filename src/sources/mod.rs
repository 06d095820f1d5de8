//! Blacklist feed sources
//!
//! Each source fetches one remote feed, parses it, and yields batches of
//! [`Entity`] over a channel. Completion is signalled by the sender side
//! closing, never by an empty "end" entity, so a legitimate record with no
//! reason is unambiguous.

pub mod malware_domains;
pub mod mvps;
pub mod urlhaus;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::Entity;

pub use malware_domains::MalwareDomains;
pub use mvps::Mvps;
pub use urlhaus::{UrlhausOnline, UrlhausRecent};

/// Capacity of each source's output channel.
pub(crate) const CHANNEL_SIZE: usize = 128;

/// Entities per batch message.
pub(crate) const BATCH_SIZE: usize = 128;

/// A blacklist feed.
///
/// `fetch` starts the download on its own task and returns the receiving end
/// of the feed's output stream. The stream is finite; the task drops its
/// sender when the feed is drained or after emitting one error.
pub trait Source: Send + Sync {
    /// Feed name, used as `Entity::source` and in error context
    fn name(&self) -> &'static str;

    /// Start fetching and return the stream of entity batches
    fn fetch(&self) -> mpsc::Receiver<Result<Vec<Entity>>>;
}

/// The default set of maintained feeds.
pub fn default_set() -> Vec<Arc<dyn Source>> {
    vec![
        Arc::new(MalwareDomains::new()),
        Arc::new(Mvps::new()),
        Arc::new(UrlhausRecent::new()),
        Arc::new(UrlhausOnline::new()),
    ]
}

pub(crate) fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .expect("Failed to create HTTP client")
}

/// Fetch a feed body as text, mapping transport failures and non-success
/// statuses to feed-tagged errors.
pub(crate) async fn fetch_text(client: &Client, feed: &'static str, url: &str) -> Result<String> {
    let response = client.get(url).send().await.map_err(|e| Error::Transport {
        feed: feed.to_string(),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            feed: feed.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| Error::Transport {
        feed: feed.to_string(),
        message: e.to_string(),
    })
}

/// Accumulates parsed entities and forwards them in batches.
///
/// `push` and `finish` return `false` when the receiver is gone, which a
/// producer treats as a request to stop early.
pub(crate) struct BatchSender {
    tx: mpsc::Sender<Result<Vec<Entity>>>,
    buf: Vec<Entity>,
}

impl BatchSender {
    pub(crate) fn new(tx: mpsc::Sender<Result<Vec<Entity>>>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(BATCH_SIZE),
        }
    }

    pub(crate) async fn push(&mut self, entity: Entity) -> bool {
        self.buf.push(entity);
        if self.buf.len() >= BATCH_SIZE {
            return self.flush().await;
        }
        true
    }

    async fn flush(&mut self) -> bool {
        if self.buf.is_empty() {
            return true;
        }
        let batch = std::mem::replace(&mut self.buf, Vec::with_capacity(BATCH_SIZE));
        self.tx.send(Ok(batch)).await.is_ok()
    }

    /// Flush the remaining partial batch. Consumes the sender, closing the
    /// stream.
    pub(crate) async fn finish(mut self) -> bool {
        self.flush().await
    }

    /// Flush anything buffered, emit one error item, and close the stream.
    pub(crate) async fn fail(mut self, err: Error) {
        let _ = self.flush().await;
        let _ = self.tx.send(Err(err)).await;
    }
}
