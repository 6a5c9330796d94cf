//! Driver: target lifecycle glue. A worker pool crawls targets in parallel;
//! each target gets its own collectors, sink and producers, torn down when
//! the crawl quiesces.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::CrawlOptions;
use crate::crawler::Crawler;
use crate::emit::{EmitFilter, OutputMode, Record, Sink};
use crate::enrich;
use crate::network::{FetchError, HttpClient};
use crate::render;
use crate::robots;
use crate::sitemaps;
use crate::target::{normalize_target, TargetError};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("output sink: {0}")]
    Sink(#[from] std::io::Error),

    #[error(transparent)]
    Client(#[from] FetchError),
}

/// Crawl every target, at most `threads` of them concurrently.
pub async fn run_all(opts: Arc<CrawlOptions>, targets: Vec<String>) {
    let permits = Arc::new(Semaphore::new(opts.threads.max(1)));
    let mut workers = JoinSet::new();

    for raw in targets {
        let opts = Arc::clone(&opts);
        let permits = Arc::clone(&permits);
        workers.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(p) => p,
                Err(_) => return,
            };
            if let Err(e) = run_target(opts, &raw).await {
                tracing::error!("target {} failed: {}", raw, e);
            }
        });
    }

    while workers.join_next().await.is_some() {}
}

/// Crawl a single target to quiescence.
pub async fn run_target(opts: Arc<CrawlOptions>, raw: &str) -> Result<(), DriverError> {
    let target = normalize_target(raw, &opts)?;

    let mode = if opts.json {
        OutputMode::Json
    } else if opts.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Plain
    };
    let filter = EmitFilter::new(&opts.types_include, &opts.types_exclude);
    let sink = Arc::new(Sink::new(
        mode,
        opts.length,
        filter,
        opts.output_dir.as_deref(),
        &target.host,
    )?);

    tracing::info!("start crawling: {}", target.start);
    let (crawler, rx) = Crawler::new(target, Arc::clone(&opts), sink)?;
    crawler.seed();

    if opts.robots {
        let guard = crawler.producer_guard();
        let c = crawler.clone();
        tokio::spawn(async move {
            let _guard = guard;
            robots::probe_robots(&c).await;
        });
    }

    if opts.sitemap {
        let guard = crawler.producer_guard();
        let c = crawler.clone();
        tokio::spawn(async move {
            let _guard = guard;
            sitemaps::probe_sitemaps(&c).await;
        });
    }

    if opts.other_source {
        let guard = crawler.producer_guard();
        let c = crawler.clone();
        let include_subs = opts.include_subs;
        let include_results = opts.include_other_results;
        let timeout = opts.timeout_secs;
        let proxy = opts.proxy.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let http = match HttpClient::basic(timeout, proxy.as_deref()) {
                Ok(h) => h,
                Err(e) => {
                    tracing::debug!("archive client build failed: {}", e);
                    return;
                }
            };
            let domain = c.target().host.clone();
            let urls = enrich::other_sources(&http, &domain, include_subs).await;
            tracing::info!("third-party sources produced {} URLs", urls.len());
            for url in urls {
                let url = url.trim();
                if url.is_empty() {
                    continue;
                }
                if include_results {
                    echo_other_source(&c, url);
                }
                c.enqueue_producer_url(url);
            }
        });
    }

    if opts.render {
        render::spawn(
            &crawler,
            opts.render_budget,
            Duration::from_secs(opts.render_timeout_secs),
        );
    }

    crawler.run(rx).await;
    Ok(())
}

/// Third-party URLs are printed outside the kind filter: the operator asked
/// for them explicitly.
fn echo_other_source(crawler: &Crawler, url: &str) {
    match crawler.sink().mode() {
        OutputMode::Json => {
            let rec = Record::new(crawler.input(), "other-sources", "url", url);
            if let Ok(line) = serde_json::to_string(&rec) {
                crawler.sink().line_unfiltered(&line);
            }
        }
        OutputMode::Quiet => crawler.sink().line_unfiltered(url),
        OutputMode::Plain => crawler
            .sink()
            .line_unfiltered(&format!("[other-sources] - {}", url)),
    }
}
