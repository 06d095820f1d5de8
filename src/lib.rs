//! badlist
//!
//! Collects threat intelligence blacklists (IP addresses, domain names,
//! hostnames extracted from URLs) from multiple remote feeds in parallel,
//! deduplicates them by `(name, source)`, and keeps them in a queryable
//! repository that can be streamed to and from bytes.
//!
//! ```no_run
//! use badlist::{BadList, Entity};
//! use chrono::Utc;
//!
//! # async fn run() -> badlist::Result<()> {
//! let man = BadList::new();
//! man.download_configured().await?;
//!
//! man.insert(Entity::new("10.0.0.1", "local-siem", Utc::now(), None))
//!     .await?;
//!
//! for entity in man.lookup("10.0.0.1").await? {
//!     println!("{} listed by {}", entity.name, entity.source);
//! }
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod error;
pub mod models;
pub mod repository;
pub mod serializer;
pub mod service;
pub mod sources;

pub use download::download;
pub use error::{Error, Result};
pub use models::Entity;
pub use repository::{MemoryRepository, Repository, TableClient, TableRepository};
pub use serializer::{BinarySerializer, JsonSerializer, Serializer};
pub use service::{BadList, Config};
pub use sources::Source;
