// src/ingest/types.rs
use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;

/// One entry as the feed parser saw it. Text is still entity-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,   // summary / description / content
    pub published: Option<String>, // published / pubDate / updated
}

/// A cleaned headline ready for ranking and serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub source: String,
    pub published: DateTime<Tz>,
}

/// Transport seam: fetch a URL and hand back the response body.
/// Non-success statuses and network failures are errors.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
