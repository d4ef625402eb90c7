// src/lib.rs
//! Headline aggregation: fetch upstream feeds, normalize entries, dedupe and
//! rank them, and render one RSS 2.0 document.

pub mod config;
pub mod ingest;
pub mod output;
pub mod rank;
pub mod rss;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use metrics::{counter, gauge};
use tracing::info;

pub use crate::config::FeedConfig;
pub use crate::ingest::types::{Fetcher, Item, RawEntry};
pub use crate::output::FeedSink;

/// Current instant in the target zone.
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Aggregate and rank: the final, ordered item list.
pub async fn collect_items(
    cfg: &FeedConfig,
    fetcher: &dyn Fetcher,
    now: DateTime<Tz>,
) -> Result<Vec<Item>> {
    let all = ingest::aggregate(cfg, fetcher, now).await?;
    let total = all.len();
    let ranked = rank::rank(all, cfg.max_items);
    counter!("ingest_kept_total").increment(ranked.len() as u64);
    info!(total, kept = ranked.len(), max = cfg.max_items, "items ranked");
    Ok(ranked)
}

/// Full pipeline up to the rendered document.
pub async fn build_feed(
    cfg: &FeedConfig,
    fetcher: &dyn Fetcher,
    now: DateTime<Tz>,
) -> Result<String> {
    let items = collect_items(cfg, fetcher, now).await?;
    rss::render_feed(&cfg.channel_meta(), &items, now)
}

/// One complete run: build the feed and hand it to `sink`.
/// Nothing is stored unless every source was fetched. Returns the item count.
pub async fn run_once(
    cfg: &FeedConfig,
    fetcher: &dyn Fetcher,
    sink: &dyn FeedSink,
) -> Result<usize> {
    let now = now_in(cfg.timezone);
    let items = collect_items(cfg, fetcher, now).await?;
    let xml = rss::render_feed(&cfg.channel_meta(), &items, now)?;
    sink.store(xml.as_bytes())
        .await
        .context("storing rendered feed")?;

    gauge!("feed_last_build_ts").set(now.timestamp() as f64);
    info!(items = items.len(), bytes = xml.len(), "feed written");
    Ok(items.len())
}
