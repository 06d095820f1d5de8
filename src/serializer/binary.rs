//! Compact binary codec: bincode-framed records

use std::io::{BufReader, Read, Write};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::Entity;
use crate::serializer::{Serializer, CHANNEL_SIZE};

/// Binary record serializer, optionally gzip-compressed. Records are
/// bincode-framed and decodable sequentially until a clean end-of-input.
pub struct BinarySerializer {
    compress: bool,
}

impl BinarySerializer {
    /// Plain binary records
    pub fn new() -> Self {
        Self { compress: false }
    }

    /// Binary records under a gzip envelope
    pub fn gzip() -> Self {
        Self { compress: true }
    }
}

impl Default for BinarySerializer {
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
            bincode::serialize_into(&mut *w, &entity).map_err(|err| match *err {
                bincode::ErrorKind::Io(io) => Error::Io(io),
                other => Error::Parse {
                    context: "binary record encode".to_string(),
                    message: other.to_string(),
                },
            })?;
        }
    }
    w.flush()?;
    Ok(())
}

fn read_stream(r: Box<dyn Read + Send>, tx: &mpsc::Sender<Result<Entity>>) {
    use std::io::BufRead;

    let mut reader = BufReader::new(r);
    loop {
        // End-of-input is only clean at a record boundary; EOF inside a
        // record is a malformed-record error below.
        match reader.fill_buf() {
            Ok(buf) if buf.is_empty() => return,
            Ok(_) => {}
            Err(err) => {
                let _ = tx.blocking_send(Err(err.into()));
                return;
            }
        }

        match bincode::deserialize_from::<_, Entity>(&mut reader) {
            Ok(entity) => {
                if tx.blocking_send(Ok(entity)).is_err() {
                    return;
                }
            }
            Err(err) => {
                let _ = tx.blocking_send(Err(Error::Parse {
                    context: "serialized binary record".to_string(),
                    message: err.to_string(),
                }));
                return;
            }
        }
    }
}

#[async_trait]
impl Serializer for BinarySerializer {
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
            if compress {
                read_stream(Box::new(GzDecoder::new(r)), &tx);
            } else {
                read_stream(r, &tx);
            }
        });

        rx
    }
}
