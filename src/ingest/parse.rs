// src/ingest/parse.rs
//! Tolerant RSS 2.0 / RSS 1.0 / Atom entry extraction.
//!
//! `parse_entries` never fails: malformed input yields the entries that were
//! complete before the first syntax error, which may be none at all.

use metrics::histogram;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::ingest::types::RawEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
    Published,
    Updated,
    DcDate,
}

impl Field {
    fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "link" => Some(Self::Link),
            "description" | "summary" => Some(Self::Summary),
            "content" | "encoded" => Some(Self::Content),
            "pubDate" | "published" | "issued" => Some(Self::Published),
            "updated" | "modified" => Some(Self::Updated),
            "date" => Some(Self::DcDate),
            _ => None,
        }
    }
}

#[derive(Default)]
struct EntryBuilder {
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    dc_date: Option<String>,
}

impl EntryBuilder {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::DcDate => &mut self.dc_date,
        }
    }

    fn push_text(&mut self, field: Field, text: &str) {
        self.slot(field)
            .get_or_insert_with(String::new)
            .push_str(text);
    }

    /// First element per slot wins. A blank earlier value gives way.
    fn claim(&mut self, field: Field) -> bool {
        match self.slot(field).as_deref().map(|v| v.trim().is_empty()) {
            None => true,
            Some(true) => {
                *self.slot(field) = None;
                true
            }
            Some(false) => false,
        }
    }

    fn finish(self) -> RawEntry {
        RawEntry {
            title: non_blank(self.title),
            link: non_blank(self.link),
            summary: non_blank(self.summary).or_else(|| non_blank(self.content)),
            published: non_blank(self.published)
                .or_else(|| non_blank(self.dc_date))
                .or_else(|| non_blank(self.updated)),
        }
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn is_entry(name: &str) -> bool {
    name == "item" || name == "entry"
}

/// Atom-style `<link href=".." rel="..">`. Only alternate (or rel-less) links count.
fn alternate_href(e: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        match attr.key.local_name().as_ref() {
            b"href" => href = Some(value),
            b"rel" => rel = Some(value),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href.filter(|h| !h.trim().is_empty()),
        Some(_) => None,
    }
}

/// Extract raw entries from feed bytes. Never fails.
pub fn parse_entries(bytes: &[u8]) -> Vec<RawEntry> {
    let t0 = std::time::Instant::now();
    let xml = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_str(&xml);
    // Embedded, unescaped HTML often leaves tags unclosed.
    reader.config_mut().check_end_names = false;

    let mut out = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    // Element nesting below the open entry, not counting markup inside a field.
    let mut depth = 0usize;
    let mut field: Option<(Field, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if is_entry(&name) {
                    if let Some(open) = entry.take() {
                        out.push(open.finish());
                    }
                    entry = Some(EntryBuilder::default());
                    depth = 0;
                    field = None;
                    continue;
                }
                let Some(cur) = entry.as_mut() else { continue };
                if let Some((f, _)) = &field {
                    cur.push_text(*f, " ");
                    continue;
                }
                depth += 1;
                if depth == 1 {
                    if name == "link" {
                        if let Some(href) = alternate_href(&e) {
                            cur.link.get_or_insert(href);
                        }
                    }
                    field = Field::from_local_name(&name)
                        .filter(|f| cur.claim(*f))
                        .map(|f| (f, name));
                }
            }
            Ok(Event::Empty(e)) => {
                let Some(cur) = entry.as_mut() else { continue };
                if let Some((f, _)) = &field {
                    cur.push_text(*f, " ");
                    continue;
                }
                if depth == 0 && local_name(&e) == "link" {
                    if let Some(href) = alternate_href(&e) {
                        cur.link.get_or_insert(href);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(cur), Some((f, _))) = (entry.as_mut(), &field) {
                    let raw = String::from_utf8_lossy(&e);
                    // XML-level decoding; HTML entities are tolerated here too.
                    cur.push_text(*f, &html_escape::decode_html_entities(&raw));
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(cur), Some((f, _))) = (entry.as_mut(), &field) {
                    cur.push_text(*f, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) => {
                if entry.is_none() {
                    continue;
                }
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if is_entry(&name) {
                    if let Some(done) = entry.take() {
                        out.push(done.finish());
                    }
                    field = None;
                    depth = 0;
                    continue;
                }
                match &field {
                    Some((_, open)) if *open == name => {
                        field = None;
                        depth = depth.saturating_sub(1);
                    }
                    Some(_) => {}
                    None => depth = depth.saturating_sub(1),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    kept = out.len(),
                    "feed xml error, keeping entries parsed so far"
                );
                break;
            }
            _ => {}
        }
    }

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    out
}
