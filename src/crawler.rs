//! Per-target crawl engine: a bounded-concurrency fetch/parse/enqueue loop
//! with scope enforcement, canonicalization, politeness and extraction.
//!
//! One engine owns two kinds of work on a single channel: page jobs (HTML
//! element extraction plus the body greps) and script jobs (the link-finder
//! sub-crawler, which has no depth cap). Robots, sitemap, archive and render
//! producers all feed the same enqueue path; the engine owns the scope check
//! and the dedupers.

use parking_lot::Mutex;
use rand::Rng;
use regex::Regex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Duration;
use url::Url;

use crate::config::{Config, CrawlOptions};
use crate::dedupe::SeenSet;
use crate::emit::{Kind, OutputMode, Record, Sink};
use crate::grep;
use crate::linkfinder;
use crate::network::{FetchError, HttpClient};
use crate::target::Target;
use crate::url_utils;

/// Work item on the engine channel.
#[derive(Debug)]
pub enum Job {
    Page {
        url: Url,
        depth: u32,
        referer: Option<String>,
    },
    Script {
        url: Url,
        depth: u32,
    },
}

struct Inner {
    opts: Arc<CrawlOptions>,
    target: Target,
    http: HttpClient,
    sink: Arc<Sink>,
    input: String,

    /// Disallow patterns gate fetching: the static asset set plus the
    /// operator blacklist.
    deny: Vec<Regex>,
    sub_re: Regex,

    urls: SeenSet,
    visited: SeenSet,
    js_assets: SeenSet,
    subdomains: SeenSet,
    aws: SeenSet,
    forms: SeenSet,
    uploads: SeenSet,

    tx: mpsc::UnboundedSender<Job>,
    permits: Arc<Semaphore>,
    /// Queued plus in-flight jobs. Zero with no producers left means done.
    pending: AtomicUsize,
    producers: AtomicUsize,
    idle_tx: watch::Sender<bool>,

    render_tx: Mutex<Option<mpsc::Sender<String>>>,
    render_active: AtomicBool,
}

#[derive(Clone)]
pub struct Crawler {
    inner: Arc<Inner>,
}

/// Keeps the engine alive while an auxiliary producer (robots, sitemap,
/// archives, renderer) may still enqueue URLs.
pub struct ProducerGuard {
    counter: Arc<Inner>,
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        self.counter.producers.fetch_sub(1, Ordering::SeqCst);
    }
}

fn suppressed_status(status: u16) -> bool {
    status == 404 || status == 429 || status < 100 || status >= 500
}

impl Crawler {
    pub fn new(
        target: Target,
        opts: Arc<CrawlOptions>,
        sink: Arc<Sink>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Job>), FetchError> {
        let http = HttpClient::for_target(&opts, &target.host, target.allow_subs)?;

        let mut deny = vec![url_utils::disallowed_ext_re().clone()];
        if let Some(blacklist) = &opts.blacklist {
            deny.push(blacklist.clone());
        }

        let apex = url_utils::apex(&target.host);
        let sub_re = grep::subdomain_regex(&apex);

        let (tx, rx) = mpsc::unbounded_channel();
        let (idle_tx, _) = watch::channel(false);
        let permits = Arc::new(Semaphore::new(opts.concurrent.max(1)));
        let input = target.start.to_string();

        let inner = Arc::new(Inner {
            opts,
            target,
            http,
            sink,
            input,
            deny,
            sub_re,
            urls: SeenSet::new(),
            visited: SeenSet::new(),
            js_assets: SeenSet::new(),
            subdomains: SeenSet::new(),
            aws: SeenSet::new(),
            forms: SeenSet::new(),
            uploads: SeenSet::new(),
            tx,
            permits,
            pending: AtomicUsize::new(0),
            producers: AtomicUsize::new(0),
            idle_tx,
            render_tx: Mutex::new(None),
            render_active: AtomicBool::new(false),
        });

        Ok((Self { inner }, rx))
    }

    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    pub fn opts(&self) -> &CrawlOptions {
        &self.inner.opts
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    pub(crate) fn sink(&self) -> &Sink {
        &self.inner.sink
    }

    pub(crate) fn input(&self) -> &str {
        &self.inner.input
    }

    pub fn scope_allows(&self, url: &str) -> bool {
        self.inner.target.scope.allows(url)
    }

    /// Register an auxiliary producer. The engine does not quiesce while any
    /// guard is alive.
    pub fn producer_guard(&self) -> ProducerGuard {
        self.inner.producers.fetch_add(1, Ordering::SeqCst);
        ProducerGuard {
            counter: Arc::clone(&self.inner),
        }
    }

    /// Observe the engine's idle state; used by the render manager to decide
    /// when to wind down.
    pub fn subscribe_idle(&self) -> watch::Receiver<bool> {
        self.inner.idle_tx.subscribe()
    }

    pub fn set_render_queue(&self, tx: mpsc::Sender<String>) {
        *self.inner.render_tx.lock() = Some(tx);
        self.inner.render_active.store(true, Ordering::SeqCst);
    }

    pub fn render_finished(&self) {
        *self.inner.render_tx.lock() = None;
        self.inner.render_active.store(false, Ordering::SeqCst);
    }

    /// Queue the start URL.
    pub fn seed(&self) {
        let url = self.inner.target.start.clone();
        self.inner.visited.observe(&url_utils::canonicalize(&url));
        self.send(Job::Page {
            url,
            depth: 0,
            referer: None,
        });
    }

    /// Enqueue path for auxiliary producers: scope-checked, canonicalized,
    /// fetched at most once, entering at depth zero.
    pub fn enqueue_producer_url(&self, raw: &str) {
        let Ok(parsed) = Url::parse(raw.trim()) else {
            return;
        };
        let canon = url_utils::canonicalize(&parsed);
        if self.denied(&canon) || !self.inner.target.scope.allows(&canon) {
            return;
        }
        if self.inner.visited.observe(&canon) {
            return;
        }
        if let Ok(url) = Url::parse(&canon) {
            self.send(Job::Page {
                url,
                depth: 0,
                referer: None,
            });
        }
    }

    /// XHR/Fetch URL captured by the render pass: emit `network` and feed it
    /// back into the engine.
    pub fn capture_network(&self, raw: &str) {
        let Ok(parsed) = Url::parse(raw) else {
            return;
        };
        let canon = url_utils::canonicalize(&parsed);
        if !self.inner.target.scope.allows(&canon) {
            return;
        }
        if self.inner.urls.observe(&canon) {
            return;
        }
        let rec = Record::new(&self.inner.input, "render", "network", &canon);
        self.inner.sink.record(Kind::Network, "network", &rec);
        if !self.inner.visited.observe(&canon) {
            if let Ok(url) = Url::parse(&canon) {
                self.send(Job::Page {
                    url,
                    depth: 0,
                    referer: None,
                });
            }
        }
    }

    pub fn emit_render(&self, url: &str) {
        let rec = Record::new(&self.inner.input, "render", "render", url);
        self.inner.sink.record(Kind::Render, "render", &rec);
    }

    fn send(&self, job: Job) {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        if self.inner.tx.send(job).is_err() {
            self.inner.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn denied(&self, url: &str) -> bool {
        self.inner.deny.iter().any(|re| re.is_match(url))
    }

    /// Drive the engine until every job, producer and the render pass have
    /// drained. The per-target output file is flushed afterwards.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Job>) {
        let mut tasks: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    if let Some(job) = maybe {
                        let crawler = self.clone();
                        tasks.spawn(async move { crawler.process(job).await });
                    }
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        if e.is_panic() {
                            tracing::error!("crawl task panicked: {}", e);
                        }
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(Config::LOOP_YIELD_DELAY_MS)) => {}
            }

            let idle = tasks.is_empty()
                && self.inner.pending.load(Ordering::SeqCst) == 0
                && self.inner.producers.load(Ordering::SeqCst) == 0;
            let _ = self.inner.idle_tx.send_replace(idle);
            if idle && !self.inner.render_active.load(Ordering::SeqCst) {
                break;
            }
        }
        self.inner.sink.close();
    }

    async fn process(&self, job: Job) {
        struct PendingGuard(Arc<Inner>);
        impl Drop for PendingGuard {
            fn drop(&mut self) {
                self.0.pending.fetch_sub(1, Ordering::SeqCst);
            }
        }
        let _pending = PendingGuard(Arc::clone(&self.inner));

        let _permit = match Arc::clone(&self.inner.permits).acquire_owned().await {
            Ok(p) => p,
            Err(_) => return,
        };
        self.politeness_pause().await;

        match job {
            Job::Page {
                url,
                depth,
                referer,
            } => self.process_page(url, depth, referer).await,
            Job::Script { url, depth } => self.process_script(url, depth).await,
        }
    }

    async fn politeness_pause(&self) {
        let opts = &self.inner.opts;
        let jitter = if opts.random_delay_secs > 0 {
            rand::thread_rng().gen_range(0..=opts.random_delay_secs)
        } else {
            0
        };
        let total = opts.delay_secs + jitter;
        if total > 0 {
            tokio::time::sleep(Duration::from_secs(total)).await;
        }
    }

    async fn process_page(&self, url: Url, depth: u32, referer: Option<String>) {
        let fetched = match self.inner.http.fetch(url.as_str(), referer.as_deref()).await {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!("fetch error: {} - {}", url, e);
                return;
            }
        };

        let page_url = fetched.final_url.clone();
        let page_str = url_utils::canonicalize(&page_url);
        // Redirects are the only way a fetch lands off scope; an off-scope
        // final URL is never emitted as [url].
        let in_scope = self.inner.target.scope.allows(&page_str);

        if !fetched.is_success() {
            if suppressed_status(fetched.status) {
                tracing::debug!("suppressed status {} for {}", fetched.status, page_str);
            } else if in_scope {
                self.emit_url(fetched.status, fetched.body.len(), &page_str);
            }
            return;
        }

        let body = Arc::new(String::from_utf8_lossy(&fetched.body).into_owned());
        let body_len = body.len();
        let is_html = url_utils::is_html_content_type(&fetched.content_type);

        // Element callbacks run before the response-body pass.
        if is_html {
            let parse_body = Arc::clone(&body);
            let extract = match tokio::task::spawn_blocking(move || extract_elements(&parse_body))
                .await
            {
                Ok(extract) => extract,
                Err(_) => PageExtract::default(),
            };
            self.handle_elements(&page_url, &page_str, extract, depth);
        }

        let opts = &self.inner.opts;
        if !opts.filter_lengths.is_empty() && opts.filter_lengths.contains(&body_len) {
            return;
        }
        if in_scope {
            self.emit_url(fetched.status, body_len, &page_str);
        }

        if body_len <= Config::MAX_GREP_BODY && in_scope {
            self.grep_subdomains(&body);
            self.grep_aws(&body);
            if is_html && opts.linkfinder {
                self.scan_tokens(&body, &page_url, depth, TokenSource::Html);
            }
            if opts.raw {
                self.emit_raw(&body);
            }
        }

        if is_html && body_len < Config::RENDER_SHELL_MAX {
            if let Some(tx) = self.inner.render_tx.lock().as_ref() {
                let _ = tx.try_send(page_str.clone());
            }
        }
    }

    async fn process_script(&self, url: Url, depth: u32) {
        let fetched = match self.inner.http.fetch(url.as_str(), None).await {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!("fetch error: {} - {}", url, e);
                return;
            }
        };

        let script_url = fetched.final_url.clone();
        let script_str = url_utils::canonicalize(&script_url);
        let in_scope = self.inner.target.scope.allows(&script_str);

        if !fetched.is_success() {
            if suppressed_status(fetched.status) {
                tracing::debug!("suppressed status {} for {}", fetched.status, script_str);
            } else if in_scope {
                self.emit_url(fetched.status, fetched.body.len(), &script_str);
            }
            return;
        }

        // Oversized scripts still get their [url] line; the scans are skipped.
        if fetched.body.len() > Config::MAX_GREP_BODY {
            if in_scope {
                self.emit_url(fetched.status, fetched.body.len(), &script_str);
            }
            return;
        }

        let body = String::from_utf8_lossy(&fetched.body).into_owned();
        let body_len = body.len();

        let opts = &self.inner.opts;
        if !opts.filter_lengths.is_empty() && opts.filter_lengths.contains(&body_len) {
            return;
        }
        if in_scope {
            self.emit_url(fetched.status, body_len, &script_str);
            self.grep_subdomains(&body);
            self.grep_aws(&body);
            self.scan_tokens(&body, &script_url, depth, TokenSource::Script);
            if opts.raw {
                self.emit_raw(&body);
            }
        }
    }

    fn handle_elements(&self, page_url: &Url, page_str: &str, extract: PageExtract, depth: u32) {
        let effective_base = extract
            .base
            .as_deref()
            .and_then(|b| url_utils::resolve(page_url, b))
            .unwrap_or_else(|| page_url.clone());

        for href in &extract.hrefs {
            let Some(abs) = url_utils::resolve(&effective_base, href) else {
                continue;
            };
            let canon = url_utils::canonicalize(&abs);
            if self.denied(&canon) || !self.inner.target.scope.allows(&canon) {
                continue;
            }
            if self.inner.urls.observe(&canon) {
                continue;
            }
            let rec = Record::new(&self.inner.input, "body", "href", &canon);
            self.inner.sink.record(Kind::Href, "href", &rec);
            self.enqueue_child(&canon, depth + 1, Some(page_str.to_string()));
        }

        if extract.has_form && !self.inner.forms.observe(page_str) {
            let rec = Record::new(&self.inner.input, "body", "form", page_str);
            self.inner.sink.record(Kind::Form, "form", &rec);
        }

        if extract.has_upload && !self.inner.uploads.observe(page_str) {
            let rec = Record::new(&self.inner.input, "body", "upload-form", page_str);
            self.inner.sink.record(Kind::UploadForm, "upload-form", &rec);
        }

        for src in &extract.scripts {
            let Some(abs) = url_utils::resolve(&effective_base, src) else {
                continue;
            };
            let canon = url_utils::canonicalize(&abs);
            if let Some(ext) = url_utils::ext_type(&canon) {
                if url_utils::is_script_ext(&ext) {
                    self.feed_linkfinder(&canon, "javascript", "body", depth);
                }
            }
        }
    }

    /// Run the link-finder over a body and reconcile every surviving token
    /// against the document's own URL.
    fn scan_tokens(&self, body: &str, base: &Url, depth: u32, source: TokenSource) {
        let base_str = base.to_string();
        for token in linkfinder::find_links(body) {
            if linkfinder::is_noise_token(&token) {
                continue;
            }

            if linkfinder::is_absolute_url(&token) {
                let Ok(parsed) = Url::parse(&token) else {
                    continue;
                };
                let canon = url_utils::canonicalize(&parsed);
                if !self.inner.target.scope.allows(&canon) {
                    continue;
                }
                if let Some(ext) = url_utils::ext_type(&canon) {
                    if url_utils::is_script_ext(&ext) {
                        self.feed_linkfinder(&canon, "linkfinder", source.as_str(), depth);
                        continue;
                    }
                }
                if self.inner.urls.observe(&canon) {
                    continue;
                }
                let rec = Record::new(&self.inner.input, &base_str, "linkfinder", &canon);
                self.inner.sink.record(Kind::Linkfinder, "linkfinder", &rec);
                self.enqueue_child(&canon, depth + 1, Some(base_str.clone()));
                continue;
            }

            // Relative, including scheme-relative.
            let Some(abs) = url_utils::resolve(base, &token) else {
                continue;
            };
            let canon = url_utils::canonicalize(&abs);
            if !self.inner.target.scope.allows(&canon) {
                continue;
            }

            if let Some(ext) = url_utils::ext_type(&canon) {
                if url_utils::is_script_ext(&ext) {
                    self.feed_linkfinder(&canon, "linkfinder", source.as_str(), depth);
                    continue;
                }
            }

            if self.inner.urls.observe(&canon) {
                continue;
            }
            let rec = Record::new(&self.inner.input, &base_str, "linkfinder", &canon);
            self.inner.sink.record(Kind::Linkfinder, "linkfinder", &rec);
            self.enqueue_child(&canon, depth + 1, Some(base_str.clone()));
        }
    }

    /// Asset URLs are always emitted so the operator sees CDN-hosted scripts;
    /// only in-scope ones are fetched. Minified bundles also get their
    /// un-minified counterpart probed.
    fn feed_linkfinder(&self, raw: &str, label: &str, source: &str, depth: u32) {
        if self.inner.js_assets.observe(raw) {
            return;
        }
        let Ok(parsed) = Url::parse(raw) else {
            return;
        };
        let canon = url_utils::canonicalize(&parsed);

        let rec = Record::new(&self.inner.input, source, label, &canon);
        self.inner.sink.record(Kind::Javascript, label, &rec);

        if !self.inner.target.scope.allows(&canon) || !self.inner.opts.linkfinder {
            return;
        }
        if canon.contains(".min.js") {
            let unminified = canon.replace(".min.js", ".js");
            self.enqueue_script(&unminified, depth);
        }
        self.enqueue_script(&canon, depth);
    }

    fn enqueue_child(&self, canon: &str, depth: u32, referer: Option<String>) {
        let max = self.inner.opts.max_depth;
        if max != 0 && depth > max {
            return;
        }
        if self.denied(canon) || self.inner.visited.observe(canon) {
            return;
        }
        if let Ok(url) = Url::parse(canon) {
            self.send(Job::Page {
                url,
                depth,
                referer,
            });
        }
    }

    fn enqueue_script(&self, canon: &str, depth: u32) {
        if self.inner.visited.observe(canon) {
            return;
        }
        if let Ok(url) = Url::parse(canon) {
            self.send(Job::Script { url, depth });
        }
    }

    fn grep_subdomains(&self, body: &str) {
        for sub in grep::find_subdomains(body, &self.inner.sub_re) {
            if sub.is_empty() || self.inner.subdomains.observe(&sub) {
                continue;
            }
            if self.inner.sink.mode() == OutputMode::Plain {
                self.inner
                    .sink
                    .line(Kind::Subdomains, &format!("[subdomains] - http://{}", sub));
                self.inner
                    .sink
                    .line(Kind::Subdomains, &format!("[subdomains] - https://{}", sub));
            } else {
                let rec = Record::new(&self.inner.input, "body", "subdomains", &sub);
                self.inner.sink.record(Kind::Subdomains, "subdomains", &rec);
            }
        }
    }

    fn grep_aws(&self, body: &str) {
        for bucket in grep::find_aws_s3(body) {
            if self.inner.aws.observe(&bucket) {
                continue;
            }
            let rec = Record::new(&self.inner.input, "body", "aws", &bucket);
            self.inner.sink.record(Kind::Aws, "aws-s3", &rec);
        }
    }

    fn emit_url(&self, status: u16, length: usize, output: &str) {
        let rec = Record::new(&self.inner.input, "body", "url", output)
            .with_response(status, length);
        self.inner.sink.url_record(&rec);
    }

    fn emit_raw(&self, body: &str) {
        let line = format!("[Raw] - \n{}\n", body);
        if self.inner.sink.mode() == OutputMode::Quiet {
            self.inner.sink.file_only(&line);
        } else {
            self.inner.sink.line(Kind::Raw, &line);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TokenSource {
    Html,
    Script,
}

impl TokenSource {
    fn as_str(self) -> &'static str {
        match self {
            TokenSource::Html => "html",
            TokenSource::Script => "javascript",
        }
    }
}

#[derive(Debug, Default)]
struct PageExtract {
    base: Option<String>,
    hrefs: Vec<String>,
    scripts: Vec<String>,
    has_form: bool,
    has_upload: bool,
}

/// Pull the element set the engine cares about out of an HTML body. Runs on
/// the blocking pool because `scraper::Html` is neither cheap nor `Send`.
fn extract_elements(body: &str) -> PageExtract {
    use scraper::{Html, Selector};

    let document = Html::parse_document(body);
    let base_sel = Selector::parse("base[href]").unwrap();
    let link_sel = Selector::parse("a[href], link[href]").unwrap();
    let script_sel = Selector::parse("script[src]").unwrap();
    let form_sel = Selector::parse("form[action]").unwrap();
    let upload_sel = Selector::parse("input[type='file']").unwrap();

    let base = document
        .select(&base_sel)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|s| s.to_string());

    let mut hrefs = Vec::new();
    for el in document.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            let href = href.trim();
            if href.is_empty()
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
                || href.starts_with("data:")
            {
                continue;
            }
            hrefs.push(href.to_string());
        }
    }

    let mut scripts = Vec::new();
    for el in document.select(&script_sel) {
        if let Some(src) = el.value().attr("src") {
            let src = src.trim();
            if !src.is_empty() {
                scripts.push(src.to_string());
            }
        }
    }

    PageExtract {
        base,
        hrefs,
        scripts,
        has_form: document.select(&form_sel).next().is_some(),
        has_upload: document.select(&upload_sel).next().is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::EmitFilter;
    use crate::target::normalize_target;

    fn test_crawler(raw: &str, opts: CrawlOptions) -> (Crawler, mpsc::UnboundedReceiver<Job>) {
        let opts = Arc::new(opts);
        let target = normalize_target(raw, &opts).unwrap();
        let sink = Arc::new(
            Sink::new(
                OutputMode::Plain,
                false,
                EmitFilter::allow_everything(),
                None,
                &target.host,
            )
            .unwrap(),
        );
        Crawler::new(target, opts, sink).unwrap()
    }

    #[test]
    fn test_suppressed_status_set() {
        assert!(suppressed_status(404));
        assert!(suppressed_status(429));
        assert!(suppressed_status(99));
        assert!(suppressed_status(500));
        assert!(suppressed_status(503));
        assert!(!suppressed_status(200));
        assert!(!suppressed_status(301));
        assert!(!suppressed_status(403));
    }

    #[test]
    fn test_extract_elements() {
        let html = r#"
            <html><head>
              <base href="/app/">
              <link href="/style-page">
              <script src="/static/app.js"></script>
            </head><body>
              <a href="/x">x</a>
              <a href="mailto:a@b.c">mail</a>
              <form action="/submit"><input type="file" name="f"></form>
            </body></html>
        "#;
        let extract = extract_elements(html);
        assert_eq!(extract.base.as_deref(), Some("/app/"));
        assert_eq!(
            extract.hrefs,
            vec!["/style-page".to_string(), "/x".to_string()]
        );
        assert_eq!(extract.scripts, vec!["/static/app.js".to_string()]);
        assert!(extract.has_form);
        assert!(extract.has_upload);
    }

    #[tokio::test]
    async fn test_enqueue_child_depth_gate() {
        let opts = CrawlOptions {
            max_depth: 1,
            ..CrawlOptions::default()
        };
        let (crawler, mut rx) = test_crawler("https://a.test/", opts);

        crawler.enqueue_child("https://a.test/one", 1, None);
        crawler.enqueue_child("https://a.test/two", 2, None);

        let job = rx.try_recv().expect("depth 1 enqueued");
        match job {
            Job::Page { url, depth, .. } => {
                assert_eq!(url.as_str(), "https://a.test/one");
                assert_eq!(depth, 1);
            }
            other => panic!("unexpected job {:?}", other),
        }
        assert!(rx.try_recv().is_err(), "depth 2 must be gated");
    }

    #[tokio::test]
    async fn test_enqueue_child_depth_unbounded_when_zero() {
        let opts = CrawlOptions {
            max_depth: 0,
            ..CrawlOptions::default()
        };
        let (crawler, mut rx) = test_crawler("https://a.test/", opts);
        crawler.enqueue_child("https://a.test/deep", 40, None);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_enqueue_child_dedupes_and_denies() {
        let (crawler, mut rx) = test_crawler("https://a.test/", CrawlOptions::default());

        crawler.enqueue_child("https://a.test/page", 1, None);
        crawler.enqueue_child("https://a.test/page", 1, None);
        crawler.enqueue_child("https://a.test/logo.png", 1, None);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_producer_enqueue_respects_scope() {
        let (crawler, mut rx) = test_crawler("https://a.test/", CrawlOptions::default());

        crawler.enqueue_producer_url("https://a.test/from-robots");
        crawler.enqueue_producer_url("https://elsewhere.test/nope");

        match rx.try_recv().expect("in-scope producer URL enqueued") {
            Job::Page { url, depth, .. } => {
                assert_eq!(url.as_str(), "https://a.test/from-robots");
                assert_eq!(depth, 0);
            }
            other => panic!("unexpected job {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_seed_marks_visited() {
        let (crawler, mut rx) = test_crawler("https://a.test/", CrawlOptions::default());
        crawler.seed();
        assert!(rx.try_recv().is_ok());
        // A second discovery of the seed must not produce a second fetch.
        crawler.enqueue_child("https://a.test/", 1, None);
        assert!(rx.try_recv().is_err());
    }
}
