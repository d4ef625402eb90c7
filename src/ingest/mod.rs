// src/ingest/mod.rs
pub mod fetch;
pub mod normalize;
pub mod parse;
pub mod types;

use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::config::FeedConfig;
use crate::ingest::normalize::normalize_entry;
use crate::ingest::parse::parse_entries;
use crate::ingest::types::{Fetcher, Item};

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Raw entries parsed from sources.");
        describe_counter!(
            "ingest_skipped_total",
            "Entries dropped for a missing title or link."
        );
        describe_counter!("ingest_kept_total", "Items written to the feed.");
        describe_counter!("ingest_dedup_total", "Items dropped as duplicate headlines.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("feed_last_build_ts", "Unix ts of the last written feed.");
    });
}

/// Fetch every configured source in order, keep the first `per_source`
/// entries of each and normalize them. The first transport error aborts.
///
/// `now` must already be in the configured zone; it backs entries that carry
/// no usable date.
pub async fn aggregate(
    cfg: &FeedConfig,
    fetcher: &dyn Fetcher,
    now: DateTime<Tz>,
) -> Result<Vec<Item>> {
    ensure_metrics_described();

    let mut items = Vec::new();
    for src in &cfg.sources {
        let body = fetcher
            .fetch(&src.url)
            .await
            .with_context(|| format!("fetching source {} ({})", src.label, src.url))?;

        let entries = parse_entries(&body);
        counter!("ingest_events_total").increment(entries.len() as u64);
        if entries.is_empty() {
            tracing::warn!(target: "ingest", source = %src.label, bytes = body.len(), "no entries parsed");
            continue;
        }

        let before = items.len();
        for raw in entries.iter().take(cfg.per_source) {
            match normalize_entry(raw, &src.label, now) {
                Some(it) => items.push(it),
                None => counter!("ingest_skipped_total").increment(1),
            }
        }

        tracing::info!(
            target: "ingest",
            source = %src.label,
            bytes = body.len(),
            entries = entries.len(),
            kept = items.len() - before,
            "source ingested"
        );
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceCfg;
    use anyhow::anyhow;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, Vec<u8>>);

    #[async_trait::async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("404 for {url}"))
        }
    }

    fn rss(n: usize) -> Vec<u8> {
        let mut s = String::from("<rss><channel>");
        for i in 0..n {
            s.push_str(&format!(
                "<item><title>Story {i}</title><link>https://example.test/{i}</link></item>"
            ));
        }
        s.push_str("</channel></rss>");
        s.into_bytes()
    }

    fn cfg(per_source: usize, sources: &[(&str, &str)]) -> FeedConfig {
        FeedConfig {
            per_source,
            sources: sources
                .iter()
                .map(|(l, u)| SourceCfg {
                    label: l.to_string(),
                    url: u.to_string(),
                })
                .collect(),
            ..FeedConfig::default()
        }
    }

    #[tokio::test]
    async fn caps_entries_per_source() {
        let fetcher = MapFetcher(HashMap::from([("u1".to_string(), rss(12))]));
        let now = New_York.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let items = aggregate(&cfg(8, &[("S1", "u1")]), &fetcher, now)
            .await
            .unwrap();
        assert_eq!(items.len(), 8);
        assert_eq!(items[0].title, "Story 0");
        assert!(items.iter().all(|i| i.published == now));
    }

    #[tokio::test]
    async fn failing_source_aborts_run() {
        let fetcher = MapFetcher(HashMap::from([("u1".to_string(), rss(2))]));
        let now = New_York.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let err = aggregate(&cfg(8, &[("S1", "u1"), ("S2", "missing")]), &fetcher, now)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("S2"));
    }
}
