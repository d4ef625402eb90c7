// src/rank.rs
//! Newest-first ordering with title dedup and a hard cap.

use std::collections::HashSet;

use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::Item;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Dedup key: lower-cased title with whitespace runs folded to one space.
pub fn dedup_key(title: &str) -> String {
    RE_WS.replace_all(&title.to_lowercase(), " ").trim().to_string()
}

/// Sort newest first, drop repeated titles, keep at most `max`.
///
/// The sort is stable, so equal timestamps keep their input (source) order,
/// and the first occurrence of a title after sorting is the one kept.
pub fn rank(mut items: Vec<Item>, max: usize) -> Vec<Item> {
    items.sort_by(|a, b| b.published.cmp(&a.published));

    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(max.min(items.len()));
    for it in items {
        if out.len() >= max {
            break;
        }
        if !seen.insert(dedup_key(&it.title)) {
            counter!("ingest_dedup_total").increment(1);
            tracing::debug!(title = %it.title, source = %it.source, "duplicate headline dropped");
            continue;
        }
        out.push(it);
    }
    out
}
