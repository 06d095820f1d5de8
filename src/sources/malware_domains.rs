//! malwaredomains.com style feed collector
//!
//! Whitespace-separated records: domain, category, attribution, review dates.
//! The category column becomes the reason. `##` lines are comments.

use chrono::Utc;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::Entity;
use crate::sources::{fetch_text, http_client, BatchSender, Source, CHANNEL_SIZE};

const MALWARE_DOMAINS: &str = "http://mirror1.malwaredomains.com/files/domains.txt";

/// malwaredomains.com domain blacklist.
pub struct MalwareDomains {
    client: Client,
    pub url: String,
}

impl MalwareDomains {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            url: MALWARE_DOMAINS.to_string(),
        }
    }
}

impl Default for MalwareDomains {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for MalwareDomains {
    fn name(&self) -> &'static str {
        "malware_domains"
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
                let line = line.trim();
                if line.is_empty() || line.starts_with("##") {
                    continue;
                }
                let mut fields = line.split_whitespace();
                let (Some(domain), Some(category)) = (fields.next(), fields.next()) else {
                    continue;
                };

                let entity = Entity::new(domain, feed, now, Some(category.to_string()));
                if !out.push(entity).await {
                    return;
                }
            }

            out.finish().await;
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = "## This is sample data
\tblue.example.com\tphishing\topenphish.com\t20171117\t20160527\t20160108
\torange.example.net\texploit\txxx.com\t20171117\t20160527\t20160108
";

    #[tokio::test]
    async fn parses_domains_with_category_as_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE))
            .mount(&server)
            .await;

        let mut src = MalwareDomains::new();
        src.url = server.uri();

        let mut rx = src.fetch();
        let mut entities = vec![];
        while let Some(msg) = rx.recv().await {
            entities.extend(msg.unwrap());
        }

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].name, "blue.example.com");
        assert_eq!(entities[0].reason.as_deref(), Some("phishing"));
        assert_eq!(entities[1].name, "orange.example.net");
        assert_eq!(entities[1].reason.as_deref(), Some("exploit"));
    }
}
