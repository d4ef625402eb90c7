// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::rss::ChannelMeta;

pub const DEFAULT_CONFIG_TOML: &str = "config/feed.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/feed.json";

pub const DEFAULT_MAX_ITEMS: usize = 6;
pub const DEFAULT_PER_SOURCE: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
const MAX_TIMEOUT_SECS: u64 = 120;

fn default_title() -> String {
    "Dayton Headlines Feed".to_string()
}
fn default_link() -> String {
    "https://yourusername.github.io/dayton-headlines-rss/feed.xml".to_string()
}
fn default_description() -> String {
    "Daily top 6 headlines from Dayton, OH media".to_string()
}
fn default_output() -> PathBuf {
    PathBuf::from("feed.xml")
}
fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
fn default_per_source() -> usize {
    DEFAULT_PER_SOURCE
}
fn default_timezone() -> Tz {
    chrono_tz::America::New_York
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    "DaytonFeedBot/1.0 (+github actions)".to_string()
}

fn google_news(query: &str) -> String {
    format!("https://news.google.com/rss/search?q={query}&hl=en-US&gl=US&ceid=US:en")
}

fn default_sources() -> Vec<SourceCfg> {
    [
        ("WHIO", "site:whio.com"),
        ("WDTN", "site:wdtn.com"),
        (
            "ABC22/FOX45 (Dayton24/7Now)",
            "site:dayton247now.com%20OR%20site:abc22now.com%20OR%20site:fox45now.com",
        ),
        ("Dayton Daily News", "site:daytondailynews.com"),
    ]
    .into_iter()
    .map(|(label, q)| SourceCfg {
        label: label.to_string(),
        url: google_news(q),
    })
    .collect()
}

/// One upstream feed. Order in the config is the tie-break order for ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCfg {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Public URL of the generated feed (channel link and atom self link).
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Entries taken from the top of each source before normalization.
    #[serde(default = "default_per_source")]
    pub per_source: usize,
    /// IANA zone every timestamp is rendered in.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceCfg>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            link: default_link(),
            description: default_description(),
            output: default_output(),
            max_items: default_max_items(),
            per_source: default_per_source(),
            timezone: default_timezone(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            sources: default_sources(),
        }
    }
}

impl FeedConfig {
    pub fn channel_meta(&self) -> ChannelMeta {
        ChannelMeta {
            title: self.title.clone(),
            link: self.link.clone(),
            description: self.description.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn sanitize(mut self) -> Self {
        if self.max_items == 0 {
            self.max_items = DEFAULT_MAX_ITEMS;
        }
        if self.per_source == 0 {
            self.per_source = DEFAULT_PER_SOURCE;
        }
        self.timeout_secs = self.timeout_secs.clamp(1, MAX_TIMEOUT_SECS);
        self.sources = self
            .sources
            .into_iter()
            .filter_map(|s| {
                let label = s.label.trim();
                let url = s.url.trim();
                (!label.is_empty() && !url.is_empty()).then(|| SourceCfg {
                    label: label.to_string(),
                    url: url.to_string(),
                })
            })
            .collect();
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<FeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing feed config {}", path.display()))
}

/// Load config with fallbacks:
/// 1) config/feed.toml
/// 2) config/feed.json
/// 3) built-in defaults
pub fn load_config_default() -> Result<FeedConfig> {
    for p in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
    }
    Ok(FeedConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    let cfg = match hint_ext {
        "toml" => toml::from_str::<FeedConfig>(s)?,
        "json" => serde_json::from_str::<FeedConfig>(s)?,
        _ => match toml::from_str::<FeedConfig>(s) {
            Ok(v) => v,
            Err(toml_err) => serde_json::from_str::<FeedConfig>(s)
                .map_err(|_| anyhow!("unsupported feed config format: {toml_err}"))?,
        },
    };
    Ok(cfg.sanitize())
}
