//! Core data model for blacklist records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One blacklisted indicator: an IP address, a domain name, or a hostname
/// extracted from a URL.
///
/// A repository stores at most one `Entity` per `(name, source)` pair;
/// inserting again with the same pair overwrites the prior record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// IP address, domain name, or hostname. The lookup key.
    pub name: String,
    /// Which feed produced this record. Part of the dedup key.
    pub source: String,
    /// When the feed reported the indicator, or ingestion time when the feed
    /// carries no timestamp. Persisted at one-second resolution, so
    /// sub-second precision is lost across a dump/load cycle.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub saved_at: DateTime<Utc>,
    /// Feed-supplied classification, e.g. "phishing".
    ///
    /// Always present in the serialized form (as null when unknown), so the
    /// binary codec's fixed field layout round-trips.
    #[serde(default)]
    pub reason: Option<String>,
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        saved_at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            saved_at,
            reason,
        }
    }

    /// The composite key identifying this record in a repository.
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_without_reason_field_still_loads() {
        let json = r#"{"name":"blue.example.com","source":"tester1","saved_at":1700000000}"#;
        let entity: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.name, "blue.example.com");
        assert!(entity.reason.is_none());

        let round = serde_json::to_string(&entity).unwrap();
        let back: Entity = serde_json::from_str(&round).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn timestamp_serializes_as_unix_seconds() {
        let entity = Entity::new(
            "10.0.0.1",
            "tester1",
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            Some("phishing".to_string()),
        );
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains("1700000000"));
    }
}
