//! Streaming entity serialization
//!
//! A [`Serializer`] moves entities between a repository dump stream and a
//! byte stream without materializing the whole set: `serialize` writes each
//! record as it arrives, `deserialize` yields records lazily from a
//! background reader. Two codecs exist, JSON lines and a compact binary
//! framing, each optionally under transparent gzip compression.
//!
//! The byte layout carries no header, version field, or record count; it is
//! readable record-by-record until end-of-input. Timestamps are encoded as
//! unix seconds, so round-trips hold at one-second resolution.

pub mod binary;
pub mod json;

use std::io::{Read, Write};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::Entity;

pub use binary::BinarySerializer;
pub use json::JsonSerializer;

/// Capacity of a deserializer's output channel.
pub(crate) const CHANNEL_SIZE: usize = 128;

/// Streaming codec between entity sequences and bytes.
#[async_trait]
pub trait Serializer: Send + Sync {
    /// Drain `rx` and write every entity to `w`, record at a time. An error
    /// item on the stream aborts serialization after everything before it
    /// has been written.
    async fn serialize(
        &self,
        rx: mpsc::Receiver<Result<Vec<Entity>>>,
        w: &mut (dyn Write + Send),
    ) -> Result<()>;

    /// Produce a lazy stream of entities from `r`. A malformed record
    /// terminates the stream with one error item; records yielded before it
    /// stand.
    fn deserialize(&self, r: Box<dyn Read + Send>) -> mpsc::Receiver<Result<Entity>>;
}
