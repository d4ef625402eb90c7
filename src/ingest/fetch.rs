// src/ingest/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::Duration;

use crate::ingest::types::Fetcher;

const ACCEPT_FEEDS: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.5";

/// Plain HTTP fetcher: one attempt per URL, fixed timeout, fixed user agent.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, ACCEPT_FEEDS)
            .send()
            .await
            .with_context(|| format!("http get {url}"))?;

        let status = resp.status();
        let resp = resp
            .error_for_status()
            .with_context(|| format!("http status {status} for {url}"))?;

        let body = resp
            .bytes()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        tracing::debug!(url, bytes = body.len(), %status, "fetched");
        Ok(body.to_vec())
    }
}
