// src/ingest/normalize.rs
//! Turns raw feed entries into [`Item`]s: entity decoding, tag stripping,
//! whitespace folding, the two-sentence summary cap and date normalization.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::{Item, RawEntry};

/// Character cap for summaries (Unicode scalar values, not bytes).
pub const SUMMARY_MAX_CHARS: usize = 320;
/// Number of leading sentences kept in a summary.
pub const SUMMARY_SENTENCES: usize = 2;
const ELLIPSIS: char = '\u{2026}';

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());
static RE_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").unwrap()
});

/// Decode entities, replace tags with a space, collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let untagged = RE_TAGS.replace_all(&decoded, " ");
    RE_WS.replace_all(&untagged, " ").trim().to_string()
}

/// First two sentences, capped at [`SUMMARY_MAX_CHARS`] with a trailing `…`.
/// Expects already-cleaned text; empty in, empty out.
pub fn summarize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // Segment boundaries sit right after the punctuation mark.
    let mut segments = Vec::with_capacity(SUMMARY_SENTENCES);
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(text) {
        if segments.len() == SUMMARY_SENTENCES {
            break;
        }
        segments.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    if segments.len() < SUMMARY_SENTENCES && start < text.len() {
        segments.push(&text[start..]);
    }
    let out = segments.join(" ").trim().to_string();

    if out.chars().count() <= SUMMARY_MAX_CHARS {
        return out;
    }
    let head: String = out.chars().take(SUMMARY_MAX_CHARS).collect();
    let mut cut = match head.rfind(' ') {
        Some(idx) => head[..idx].to_string(),
        None => head,
    };
    cut.push(ELLIPSIS);
    cut
}

// Formats carrying their own offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
];

// Offset-less formats, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y", "%m/%d/%Y",
];

/// Permissive date parsing. Offset-less values are taken as UTC, and the
/// result is converted to `tz`. `None` for empty or unrecognized input.
pub fn parse_date(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // Retry without a leading weekday name, which may disagree with the date.
    parse_any(s)
        .or_else(|| {
            let rest = RE_WEEKDAY.find(s).map(|m| &s[m.end()..])?;
            parse_any(rest)
        })
        .map(|dt| dt.with_timezone(&tz))
}

fn parse_any(s: &str) -> Option<DateTime<FixedOffset>> {
    parse_fixed(s).or_else(|| parse_naive(s).map(|n| Utc.from_utc_datetime(&n).fixed_offset()))
}

fn parse_fixed(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    // "Z" suffix without seconds or with a space separator
    let zulu = s.strip_suffix('Z').or_else(|| s.strip_suffix(" UTC"));
    if let Some(naive) = zulu.and_then(parse_naive) {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Build an [`Item`] from a raw entry, or `None` when title or link is empty.
/// `now` (already in the target zone) stands in for a missing or bad date.
pub fn normalize_entry(raw: &RawEntry, source: &str, now: DateTime<Tz>) -> Option<Item> {
    let title = clean_text(raw.title.as_deref().unwrap_or_default());
    let link = raw.link.as_deref().unwrap_or_default().trim().to_string();
    if title.is_empty() || link.is_empty() {
        tracing::debug!(source, %title, %link, "skipping entry without title or link");
        return None;
    }

    let summary = summarize(&clean_text(raw.summary.as_deref().unwrap_or_default()));
    let summary = if summary.is_empty() {
        title.clone()
    } else {
        summary
    };

    let tz = now.timezone();
    let published = match raw.published.as_deref().and_then(|d| parse_date(d, tz)) {
        Some(dt) => dt,
        None => {
            tracing::debug!(source, raw = ?raw.published, "no usable date, using now");
            now
        }
    };

    Some(Item {
        title,
        link,
        summary,
        source: source.to_string(),
        published,
    })
}
