//! MVPS HOSTS feed collector
//!
//! Plain HOSTS-file format; blacklisted names appear as `0.0.0.0 <domain>`
//! lines. The feed carries no per-record timestamp, so ingestion time is
//! recorded instead.

use chrono::Utc;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::Entity;
use crate::sources::{fetch_text, http_client, BatchSender, Source, CHANNEL_SIZE};

const MVPS_HOSTS: &str = "http://winhelp2002.mvps.org/hosts.txt";

/// winhelp2002.mvps.org HOSTS blacklist.
pub struct Mvps {
    client: Client,
    pub url: String,
}

impl Mvps {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            url: MVPS_HOSTS.to_string(),
        }
    }
}

impl Default for Mvps {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for Mvps {
    fn name(&self) -> &'static str {
        "mvps"
    }

    fn fetch(&self) -> mpsc::Receiver<Result<Vec<Entity>>> {
        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let client = self.client.clone();
        let url = self.url.clone();
        let feed = self.name();

        tokio::spawn(async move {
            let mut out = BatchSender::new(tx);
            let text = match fetch_text(&client, feed, &url).await {
                Ok(text) => text,
                Err(err) => return out.fail(err).await,
            };

            let now = Utc::now();
            for line in text.lines() {
                let mut fields = line.split_whitespace();
                if fields.next() != Some("0.0.0.0") {
                    continue;
                }
                let Some(host) = fields.next() else {
                    continue;
                };
                // "0.0.0.0 localhost" heads the file; not an indicator.
                if host == "localhost" {
                    continue;
                }
                if !out.push(Entity::new(host, feed, now, None)).await {
                    return;
                }
            }

            out.finish().await;
        });

        rx
    }
}
