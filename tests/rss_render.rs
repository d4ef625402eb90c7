// tests/rss_render.rs
use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::{America::New_York, Tz};
use headline_feed::rss::{guid_for, render_feed, rfc2822, ChannelMeta};
use headline_feed::Item;
use quick_xml::events::Event;
use quick_xml::Reader;

fn at(h: u32) -> DateTime<Tz> {
    New_York.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()
}

fn meta() -> ChannelMeta {
    ChannelMeta {
        title: "Dayton Headlines Feed".into(),
        link: "https://example.test/feed.xml?a=1&b=2".into(),
        description: "Daily top 6 headlines from Dayton, OH media".into(),
    }
}

fn tricky() -> Item {
    Item {
        title: r#"Fish & Chips <Grand> "Opening" at Joe's"#.into(),
        link: "https://example.test/story?id=1&ref=\"rss\"".into(),
        summary: "A <b>bold</b> & plain summary.".into(),
        source: "WHIO".into(),
        published: at(9),
    }
}

/// Unescaped text of every element with the given name, in document order.
fn texts_of(xml: &str, name: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut inside = false;
    loop {
        match reader.read_event().expect("well-formed xml") {
            Event::Start(e) if e.name().as_ref() == name.as_bytes() => {
                inside = true;
                out.push(String::new());
            }
            Event::End(e) if e.name().as_ref() == name.as_bytes() => inside = false,
            Event::Text(t) if inside => {
                out.last_mut().unwrap().push_str(&t.unescape().unwrap());
            }
            Event::CData(c) if inside => {
                out.last_mut()
                    .unwrap()
                    .push_str(&String::from_utf8_lossy(&c));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    out
}

#[test]
fn special_characters_are_entity_escaped_and_round_trip() {
    let item = tricky();
    let xml = render_feed(&meta(), &[item.clone()], at(12)).unwrap();

    assert!(xml.contains(
        "<title>Fish &amp; Chips &lt;Grand&gt; &quot;Opening&quot; at Joe&apos;s</title>"
    ));
    assert!(xml.contains("id=1&amp;ref=&quot;rss&quot;"));

    let titles = texts_of(&xml, "title");
    assert_eq!(titles, vec![meta().title, item.title.clone()]);
    let links = texts_of(&xml, "link");
    assert_eq!(links, vec![meta().link, item.link.clone()]);
}

#[test]
fn description_is_raw_cdata_with_source_suffix() {
    let xml = render_feed(&meta(), &[tricky()], at(12)).unwrap();
    assert!(xml.contains(
        "<description><![CDATA[A <b>bold</b> & plain summary.  Source: WHIO]]></description>"
    ));
}

#[test]
fn channel_has_atom_self_link_and_item_fields() {
    let item = tricky();
    let xml = render_feed(&meta(), &[item.clone()], at(12)).unwrap();

    assert!(xml.contains(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#));
    assert!(xml.contains(
        r#"<atom:link href="https://example.test/feed.xml?a=1&amp;b=2" rel="self" type="application/rss+xml"/>"#
    ));
    assert!(xml.contains(&format!(
        r#"<guid isPermaLink="false">{}</guid>"#,
        guid_for(&item.link, &item.published)
    )));
    assert!(xml.contains("<pubDate>Wed, 01 May 2024 09:00:00 -0400</pubDate>"));
    // lastBuildDate follows the first item, not "now"
    assert!(xml.contains(&format!("<lastBuildDate>{}</lastBuildDate>", rfc2822(&at(9)))));
}

#[test]
fn guid_is_pure_and_sensitive_to_both_inputs() {
    let a = guid_for("https://example.test/a", &at(9));
    assert_eq!(a, guid_for("https://example.test/a", &at(9)));
    assert_eq!(a.len(), 32);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_ne!(a, guid_for("https://example.test/b", &at(9)));
    assert_ne!(a, guid_for("https://example.test/a", &(at(9) + Duration::seconds(1))));
}

#[test]
fn items_render_in_given_order() {
    let mut first = tricky();
    first.title = "first".into();
    first.published = at(11);
    let mut second = tricky();
    second.title = "second".into();
    let xml = render_feed(&meta(), &[first, second], at(12)).unwrap();
    let a = xml.find("<title>first</title>").unwrap();
    let b = xml.find("<title>second</title>").unwrap();
    assert!(a < b);
}
