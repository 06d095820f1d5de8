//! URLhaus feed collectors (abuse.ch)
//!
//! URLhaus publishes malware distribution URLs as CSV. The hostname is
//! extracted from the URL column; the threat column becomes the reason.

use chrono::NaiveDateTime;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::Entity;
use crate::sources::{fetch_text, http_client, BatchSender, Source, CHANNEL_SIZE};

const URLHAUS_RECENT: &str = "https://urlhaus.abuse.ch/downloads/csv_recent/";
const URLHAUS_ONLINE: &str = "https://urlhaus.abuse.ch/downloads/csv_online/";

/// Columns: id, dateadded, url, url_status, threat, tags, urlhaus_link, reporter
const URLHAUS_COLUMNS: usize = 8;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

async fn download(client: Client, feed: &'static str, url: String, mut out: BatchSender) {
    let text = match fetch_text(&client, feed, &url).await {
        Ok(text) => text,
        Err(err) => return out.fail(err).await,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(text.as_bytes());

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                return out
                    .fail(Error::Parse {
                        context: format!("{feed} CSV"),
                        message: err.to_string(),
                    })
                    .await;
            }
        };

        if record.len() != URLHAUS_COLUMNS {
            continue;
        }

        let parsed = match url::Url::parse(&record[2]) {
            Ok(parsed) => parsed,
            Err(err) => {
                return out
                    .fail(Error::Parse {
                        context: format!("{feed} URL column"),
                        message: format!("{}: {err}", &record[2]),
                    })
                    .await;
            }
        };
        let Some(host) = parsed.host_str() else {
            continue;
        };

        let saved_at = match NaiveDateTime::parse_from_str(&record[1], TIMESTAMP_FORMAT) {
            Ok(ts) => ts.and_utc(),
            Err(err) => {
                return out
                    .fail(Error::Parse {
                        context: format!("{feed} dateadded column"),
                        message: format!("{}: {err}", &record[1]),
                    })
                    .await;
            }
        };

        let entity = Entity::new(host, feed, saved_at, Some(record[4].to_string()));
        if !out.push(entity).await {
            return;
        }
    }

    out.finish().await;
}

/// Recent URLhaus additions (last 30 days).
pub struct UrlhausRecent {
    client: Client,
    pub url: String,
}

impl UrlhausRecent {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            url: URLHAUS_RECENT.to_string(),
        }
    }
}

impl Default for UrlhausRecent {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for UrlhausRecent {
    fn name(&self) -> &'static str {
        "urlhaus_recent"
    }

    fn fetch(&self) -> mpsc::Receiver<Result<Vec<Entity>>> {
        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let client = self.client.clone();
        let url = self.url.clone();
        tokio::spawn(download(client, self.name(), url, BatchSender::new(tx)));
        rx
    }
}

/// URLs currently online according to URLhaus.
pub struct UrlhausOnline {
    client: Client,
    pub url: String,
}

impl UrlhausOnline {
    pub fn new() -> Self {
        Self {
            client: http_client(),
            url: URLHAUS_ONLINE.to_string(),
        }
    }
}

impl Default for UrlhausOnline {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for UrlhausOnline {
    fn name(&self) -> &'static str {
        "urlhaus_online"
    }

    fn fetch(&self) -> mpsc::Receiver<Result<Vec<Entity>>> {
        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let client = self.client.clone();
        let url = self.url.clone();
        tokio::spawn(download(client, self.name(), url, BatchSender::new(tx)));
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = r#"# URLhaus sample
# id,dateadded,url,url_status,threat,tags,urlhaus_link,reporter
"441849","2026-08-01 10:02:21","http://bad.example.com/malware.exe","online","malware_download","exe","https://urlhaus.abuse.ch/url/441849/","tester"
"441850","2026-08-01 10:05:00","https://10.1.2.3/drop.bin","online","malware_download","bin","https://urlhaus.abuse.ch/url/441850/","tester"
"#;

    async fn collect(rx: &mut mpsc::Receiver<Result<Vec<Entity>>>) -> Result<Vec<Entity>> {
        let mut all = vec![];
        while let Some(msg) = rx.recv().await {
            all.extend(msg?);
        }
        Ok(all)
    }

    #[tokio::test]
    async fn parses_hostnames_and_reasons_from_csv() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE))
            .mount(&server)
            .await;

        let mut src = UrlhausRecent::new();
        src.url = server.uri();

        let mut rx = src.fetch();
        let entities = collect(&mut rx).await.unwrap();

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].name, "bad.example.com");
        assert_eq!(entities[0].source, "urlhaus_recent");
        assert_eq!(entities[0].reason.as_deref(), Some("malware_download"));
        assert_eq!(
            entities[0].saved_at.to_rfc3339(),
            "2026-08-01T10:02:21+00:00"
        );
        assert_eq!(entities[1].name, "10.1.2.3");
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut src = UrlhausOnline::new();
        src.url = server.uri();

        let mut rx = src.fetch();
        let err = collect(&mut rx).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn malformed_timestamp_terminates_the_stream_with_parse_error() {
        let body = "\"1\",\"not-a-date\",\"http://x.example.com/a\",\"online\",\"malware_download\",\"\",\"\",\"t\"\n";
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let mut src = UrlhausRecent::new();
        src.url = server.uri();

        let mut rx = src.fetch();
        let err = collect(&mut rx).await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
