//! Optional headless render pass for single-page applications. One browser
//! per target renders a bounded number of likely SPA shells, blocks heavy
//! resources, and routes captured XHR/Fetch URLs back into the engine.
//!
//! Compiled in only with the `headless` feature; the default build carries a
//! stub that logs a warning when rendering is requested.

use std::time::Duration;

use crate::crawler::Crawler;

#[cfg(not(feature = "headless"))]
pub fn spawn(_crawler: &Crawler, _budget: usize, _per_page: Duration) {
    tracing::warn!("render requested but this build has no headless support; rebuild with --features headless");
}

#[cfg(feature = "headless")]
pub fn spawn(crawler: &Crawler, budget: usize, per_page: Duration) {
    use crate::config::Config;

    let budget = if budget == 0 {
        Config::DEFAULT_RENDER_BUDGET
    } else {
        budget
    };
    let per_page = if per_page.is_zero() {
        Duration::from_secs(Config::DEFAULT_RENDER_TIMEOUT_SECS)
    } else {
        per_page
    };

    let (tx, rx) = tokio::sync::mpsc::channel(Config::RENDER_QUEUE_DEPTH);
    // Seed with the start URL; the engine feeds small HTML shells afterwards.
    let _ = tx.try_send(crawler.target().start.to_string());
    crawler.set_render_queue(tx);

    let crawler = crawler.clone();
    tokio::spawn(async move {
        if let Err(e) = headless::render_loop(&crawler, rx, budget, per_page).await {
            tracing::debug!("render pass ended: {}", e);
        }
        crawler.render_finished();
    });
}

#[cfg(feature = "headless")]
mod headless {
    use std::time::Duration;

    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::network::{
        EventRequestWillBeSent, SetBlockedUrLsParams,
    };
    use futures_util::StreamExt;
    use tokio::sync::mpsc;

    use crate::crawler::Crawler;
    use crate::dedupe::SeenSet;

    // Heavy resource classes stay blocked so renders finish inside their
    // budget.
    const BLOCKED_PATTERNS: &[&str] = &[
        "*.png", "*.apng", "*.jpg", "*.jpeg", "*.gif", "*.svg", "*.webp", "*.ico", "*.bmp",
        "*.css", "*.woff", "*.woff2", "*.ttf", "*.otf", "*.eot", "*.mp3", "*.mp4", "*.m4a",
        "*.webm", "*.ogg", "*.mov", "*.avi",
    ];

    pub(super) async fn render_loop(
        crawler: &Crawler,
        mut rx: mpsc::Receiver<String>,
        budget: usize,
        per_page: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { e.into() })?;
        let (mut browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser.new_page("about:blank").await?;
        page.execute(SetBlockedUrLsParams::new(
            BLOCKED_PATTERNS.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        ))
        .await?;

        // Forward in-scope XHR/Fetch URLs back into the engine.
        let mut events = page.event_listener::<EventRequestWillBeSent>().await?;
        let capture = {
            let crawler = crawler.clone();
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    let resource = format!("{:?}", event.r#type);
                    if resource.contains("Xhr") || resource.contains("Fetch") {
                        crawler.capture_network(&event.request.url);
                    }
                }
            })
        };

        let seen = SeenSet::new();
        let mut idle = crawler.subscribe_idle();
        let mut remaining = budget;
        while remaining > 0 {
            tokio::select! {
                maybe = rx.recv() => {
                    let Some(url) = maybe else { break };
                    if seen.observe(&url) || !crawler.scope_allows(&url) {
                        continue;
                    }
                    crawler.emit_render(&url);
                    let _ = tokio::time::timeout(per_page, page.goto(url.clone())).await;
                    // Short settle window so the page fires its XHR traffic.
                    tokio::time::sleep(Duration::from_millis(1500)).await;
                    remaining -= 1;
                }
                changed = idle.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    // Engine drained and nothing queued here: wind down.
                    if *idle.borrow() && rx.is_empty() {
                        break;
                    }
                }
            }
        }

        capture.abort();
        let _ = browser.close().await;
        handler_task.abort();
        Ok(())
    }
}
