//! Command handlers: obtain a dealer page, run the scrape pipeline, and
//! write the rendered export.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use cnfeed_scraper::{build_dealer_url, render, scrape_listing, DealerClient, RenderedOutput};

use crate::OutputArgs;

pub(crate) async fn run_fetch(
    config: &cnfeed_core::AppConfig,
    dealer: Option<&str>,
    url: Option<&str>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let target = build_dealer_url(dealer, url, &config.base_url)?;
    let client = DealerClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_secs,
    )?;

    tracing::info!(url = %target, "fetching dealer page");
    let html = client
        .fetch_page(&target)
        .await
        .with_context(|| format!("failed to fetch {target}"))?;

    export(&html, &config.base_url, &target, output).await
}

pub(crate) async fn run_parse(
    html_file: &Path,
    base: &str,
    source_url: Option<&str>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let html = tokio::fs::read_to_string(html_file)
        .await
        .with_context(|| format!("failed to read {}", html_file.display()))?;
    let source = source_url.map_or_else(|| html_file.display().to_string(), str::to_owned);

    export(&html, base, &source, output).await
}

async fn export(
    html: &str,
    base: &str,
    source_url: &str,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let page = scrape_listing(html, base).with_context(|| format!("no listing in {source_url}"))?;
    let rendered = render(&page, output.format, source_url, Utc::now(), output.pretty);

    write_output(&rendered, output.output.as_deref()).await?;
    tracing::info!(
        format = %output.format,
        count = page.count(),
        total_results = page.total_results,
        "exported dealer listing"
    );
    Ok(())
}

async fn write_output(rendered: &RenderedOutput, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, rendered.body.as_bytes())
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = rendered.body.len(), "wrote export");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.body.as_bytes())?;
            if !rendered.body.is_empty() && !rendered.body.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}
