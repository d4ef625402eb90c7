//! Headline feed builder — binary entrypoint.
//! Loads config, fetches every source once, writes the feed file, exits.

use headline_feed::config::load_config_default;
use headline_feed::ingest::fetch::HttpFetcher;
use headline_feed::output::FileSink;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("headline_feed=info,ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = load_config_default()?;
    tracing::info!(
        sources = cfg.sources.len(),
        max_items = cfg.max_items,
        per_source = cfg.per_source,
        tz = %cfg.timezone,
        output = %cfg.output.display(),
        "config loaded"
    );

    let fetcher = HttpFetcher::new(cfg.timeout(), &cfg.user_agent)?;
    let sink = FileSink::new(&cfg.output);

    if let Err(e) = headline_feed::run_once(&cfg, &fetcher, &sink).await {
        tracing::error!(error = %format!("{e:#}"), "run failed, feed not written");
        return Err(e);
    }
    Ok(())
}
