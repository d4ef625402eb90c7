// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::{America::New_York, Tz};
use headline_feed::config::{FeedConfig, SourceCfg};
use headline_feed::Fetcher;
use std::collections::HashMap;
use std::sync::Mutex;

pub const WHIO_XML: &[u8] = include_bytes!("../fixtures/google_news_whio.xml");
pub const WDTN_XML: &[u8] = include_bytes!("../fixtures/google_news_wdtn.xml");
pub const DDN_ATOM: &[u8] = include_bytes!("../fixtures/atom_ddn.xml");
pub const BROKEN_HTML: &[u8] = include_bytes!("../fixtures/malformed.html");

/// Serves canned bodies by URL; unknown URLs fail like a 404.
pub struct StubFetcher {
    bodies: HashMap<String, Vec<u8>>,
    pub calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new(pairs: &[(&str, &[u8])]) -> Self {
        Self {
            bodies: pairs
                .iter()
                .map(|(u, b)| (u.to_string(), b.to_vec()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("http status 404 Not Found for {url}"))
    }
}

pub fn config(sources: &[(&str, &str)]) -> FeedConfig {
    FeedConfig {
        sources: sources
            .iter()
            .map(|(label, url)| SourceCfg {
                label: label.to_string(),
                url: url.to_string(),
            })
            .collect(),
        ..FeedConfig::default()
    }
}

/// 2024-05-01 12:00 in New York.
pub fn fixed_now() -> DateTime<Tz> {
    New_York.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}
