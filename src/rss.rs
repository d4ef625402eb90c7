// src/rss.rs
//! RSS 2.0 rendering with content-derived, non-permalink GUIDs.

use anyhow::{Context, Result};
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use quick_xml::escape::escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use sha2::{Digest, Sha256};
use std::io::Write;

use crate::ingest::types::Item;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Channel-level metadata; `link` doubles as the atom self link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub title: String,
    pub link: String,
    pub description: String,
}

/// `Www, DD Mon YYYY HH:MM:SS +ZZZZ`
pub fn rfc2822(dt: &DateTime<Tz>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

/// `YYYY-MM-DDTHH:MM:SS±HH:MM`, with `.ffffff` only when sub-second part is non-zero.
pub fn iso8601(dt: &DateTime<Tz>) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
    }
}

/// First 32 hex chars of SHA-256(link ++ iso8601(instant)).
pub fn guid_for(link: &str, published: &DateTime<Tz>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update(iso8601(published).as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::from_escaped(escape(text))))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// Raw text inside CDATA; a literal "]]>" is split across two sections.
fn write_cdata_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        let mut chunk = String::with_capacity(part.len() + 3);
        if i > 0 {
            chunk.push('>');
        }
        chunk.push_str(part);
        if i < last {
            chunk.push_str("]]");
        }
        w.write_event(Event::CData(BytesCData::new(chunk)))?;
    }
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render the whole document. `now` is only used for `lastBuildDate` when
/// `items` is empty, so equal inputs give byte-identical output.
pub fn render_feed(meta: &ChannelMeta, items: &[Item], now: DateTime<Tz>) -> Result<String> {
    let last_build = items.first().map(|it| it.published).unwrap_or(now);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    rss_start.push_attribute(("xmlns:atom", ATOM_NS));
    writer.write_event(Event::Start(rss_start))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &meta.title)?;
    write_text_element(&mut writer, "link", &meta.link)?;
    write_text_element(&mut writer, "description", &meta.description)?;
    write_text_element(&mut writer, "lastBuildDate", &rfc2822(&last_build))?;

    let mut self_link = BytesStart::new("atom:link");
    self_link.push_attribute(("href", meta.link.as_str()));
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/rss+xml"));
    writer.write_event(Event::Empty(self_link))?;

    for it in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", &it.title)?;
        write_text_element(&mut writer, "link", &it.link)?;
        write_cdata_element(
            &mut writer,
            "description",
            &format!("{}  Source: {}", it.summary, it.source),
        )?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&guid_for(&it.link, &it.published))))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        write_text_element(&mut writer, "pubDate", &rfc2822(&it.published))?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut out = String::from_utf8(writer.into_inner()).context("rss output is not utf-8")?;
    out.push('\n');
    Ok(out)
}
