//! JSON lines codec: one JSON object per line

use std::io::{BufRead, BufReader, Read, Write};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::Entity;
use crate::serializer::{Serializer, CHANNEL_SIZE};

/// Line-delimited JSON serializer, optionally gzip-compressed.
pub struct JsonSerializer {
    compress: bool,
}

impl JsonSerializer {
    /// Plain JSON lines
    pub fn new() -> Self {
        Self { compress: false }
    }

    /// JSON lines under a gzip envelope
    pub fn gzip() -> Self {
        Self { compress: true }
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_stream(
    mut rx: mpsc::Receiver<Result<Vec<Entity>>>,
    w: &mut (dyn Write + Send),
) -> Result<()> {
    while let Some(batch) = rx.recv().await {
        for entity in batch? {
            serde_json::to_writer(&mut *w, &entity).map_err(std::io::Error::other)?;
            w.write_all(b"\n")?;
        }
    }
    w.flush()?;
    Ok(())
}

#[async_trait]
impl Serializer for JsonSerializer {
    async fn serialize(
        &self,
        rx: mpsc::Receiver<Result<Vec<Entity>>>,
        w: &mut (dyn Write + Send),
    ) -> Result<()> {
        if self.compress {
            let mut encoder = GzEncoder::new(w, Compression::default());
            write_stream(rx, &mut encoder).await?;
            encoder.finish()?;
            Ok(())
        } else {
            write_stream(rx, w).await
        }
    }

    fn deserialize(&self, r: Box<dyn Read + Send>) -> mpsc::Receiver<Result<Entity>> {
        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let compress = self.compress;

        tokio::task::spawn_blocking(move || {
            let reader: Box<dyn BufRead> = if compress {
                Box::new(BufReader::new(GzDecoder::new(r)))
            } else {
                Box::new(BufReader::new(r))
            };

            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        let _ = tx.blocking_send(Err(err.into()));
                        return;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Entity>(&line) {
                    Ok(entity) => {
                        if tx.blocking_send(Ok(entity)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        let _ = tx.blocking_send(Err(Error::Parse {
                            context: "serialized JSON record".to_string(),
                            message: err.to_string(),
                        }));
                        return;
                    }
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn malformed_line_terminates_stream_after_valid_records() {
        let entity = Entity::new("blue.example.com", "tester1", Utc::now(), None);
        let mut raw = serde_json::to_vec(&entity).unwrap();
        raw.extend_from_slice(b"\n{not json}\n");

        let ser = JsonSerializer::new();
        let mut rx = ser.deserialize(Box::new(std::io::Cursor::new(raw)));

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.name, "blue.example.com");

        let second = rx.recv().await.unwrap();
        assert!(matches!(second, Err(Error::Parse { .. })));

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn upstream_error_aborts_serialize() {
        let (tx, rx) = mpsc::channel(2);
        tokio::spawn(async move {
            tx.send(Ok(vec![Entity::new("10.0.0.1", "tester1", Utc::now(), None)]))
                .await
                .unwrap();
            tx.send(Err(Error::Unsupported("dump"))).await.unwrap();
        });

        let ser = JsonSerializer::new();
        let mut raw = Vec::new();
        let err = ser.serialize(rx, &mut raw).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported("dump")));
        // The record received before the error was still written out.
        assert!(!raw.is_empty());
    }
}
