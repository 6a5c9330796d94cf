//! Crawl configuration: fixed engine constants plus the per-run options
//! resolved from the command line.

use regex::Regex;
use std::path::PathBuf;
use thiserror::Error;

use crate::cli::Cli;
use crate::rawreq;
use crate::useragent::UaPolicy;

pub struct Config;

impl Config {
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const TCP_KEEPALIVE_SECS: u64 = 30;
    pub const POOL_IDLE_PER_HOST: usize = 100;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Bodies above this size skip the subdomain/S3/link-finder scans.
    pub const MAX_GREP_BODY: usize = 4 * 1024 * 1024;
    /// Bodies above this size get line breaks inserted before the
    /// link-finder regex runs.
    pub const LINKFINDER_SPLIT_THRESHOLD: usize = 1_000_000;

    /// HTML responses under this size look like SPA shells and are queued
    /// for rendering.
    pub const RENDER_SHELL_MAX: usize = 60 * 1024;
    pub const RENDER_QUEUE_DEPTH: usize = 64;
    pub const DEFAULT_RENDER_BUDGET: usize = 6;
    pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 8;

    pub const OTX_PAGE_CAP: usize = 10;
    pub const LOOP_YIELD_DELAY_MS: u64 = 10;
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid {name} regex: {source}")]
    BadRegex {
        name: &'static str,
        source: regex::Error,
    },

    #[error("failed to read raw request file {path}: {source}")]
    RawRequest {
        path: String,
        source: std::io::Error,
    },
}

/// Everything the driver and per-target collectors need to know about a run.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub threads: usize,
    pub concurrent: usize,
    pub max_depth: u32,
    pub delay_secs: u64,
    pub random_delay_secs: u64,
    pub timeout_secs: u64,

    pub subs: bool,
    pub robots: bool,
    pub sitemap: bool,
    pub linkfinder: bool,
    pub other_source: bool,
    pub include_subs: bool,
    pub include_other_results: bool,

    pub render: bool,
    pub render_budget: usize,
    pub render_timeout_secs: u64,

    pub proxy: Option<String>,
    pub user_agent: UaPolicy,
    pub cookie: Option<String>,
    /// Explicit `-H K:V` headers; override anything from the raw request.
    pub headers: Vec<(String, String)>,
    /// Headers loaded from a saved raw request, applied first.
    pub raw_headers: Vec<(String, String)>,

    pub whitelist: Option<Regex>,
    pub whitelist_domain: Option<String>,
    pub blacklist: Option<Regex>,
    pub filter_lengths: Vec<usize>,
    pub no_redirect: bool,

    pub quiet: bool,
    pub json: bool,
    pub length: bool,
    pub raw: bool,
    pub types_include: String,
    pub types_exclude: String,
    pub output_dir: Option<PathBuf>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            concurrent: 5,
            max_depth: 1,
            delay_secs: 0,
            random_delay_secs: 0,
            timeout_secs: Config::DEFAULT_TIMEOUT_SECS,
            subs: false,
            robots: true,
            sitemap: false,
            linkfinder: true,
            other_source: false,
            include_subs: false,
            include_other_results: false,
            render: false,
            render_budget: Config::DEFAULT_RENDER_BUDGET,
            render_timeout_secs: Config::DEFAULT_RENDER_TIMEOUT_SECS,
            proxy: None,
            user_agent: UaPolicy::Web,
            cookie: None,
            headers: Vec::new(),
            raw_headers: Vec::new(),
            whitelist: None,
            whitelist_domain: None,
            blacklist: None,
            filter_lengths: Vec::new(),
            no_redirect: false,
            quiet: false,
            json: false,
            length: false,
            raw: false,
            types_include: String::new(),
            types_exclude: String::new(),
            output_dir: None,
        }
    }
}

impl CrawlOptions {
    pub fn from_cli(cli: &Cli) -> Result<Self, OptionsError> {
        let mut opts = Self {
            threads: cli.threads.max(1),
            concurrent: cli.concurrent.max(1),
            max_depth: cli.depth,
            delay_secs: cli.delay,
            random_delay_secs: cli.random_delay,
            timeout_secs: if cli.timeout == 0 {
                tracing::info!("timeout 0 coerced to {} seconds", Config::DEFAULT_TIMEOUT_SECS);
                Config::DEFAULT_TIMEOUT_SECS
            } else {
                cli.timeout
            },
            subs: cli.subs,
            robots: !cli.no_robots,
            sitemap: cli.sitemap,
            linkfinder: !cli.no_js,
            other_source: cli.other_source,
            include_subs: cli.include_subs,
            include_other_results: cli.include_other_source,
            render: cli.render,
            render_budget: cli.render_budget,
            render_timeout_secs: cli.render_timeout,
            proxy: cli.proxy.clone(),
            user_agent: UaPolicy::parse(&cli.user_agent),
            cookie: cli.cookie.clone(),
            headers: Vec::new(),
            raw_headers: Vec::new(),
            whitelist: None,
            whitelist_domain: cli.whitelist_domain.clone(),
            blacklist: None,
            filter_lengths: parse_length_csv(&cli.filter_length),
            no_redirect: cli.no_redirect,
            quiet: cli.quiet,
            json: cli.json,
            length: cli.length,
            raw: cli.raw,
            types_include: cli.types.clone(),
            types_exclude: cli.exclude_types.clone(),
            output_dir: cli.output.clone(),
        };

        for h in &cli.header {
            if let Some((name, value)) = h.split_once(':') {
                opts.headers
                    .push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if let Some(path) = &cli.burp {
            opts.raw_headers =
                rawreq::load_headers(path).map_err(|source| OptionsError::RawRequest {
                    path: path.display().to_string(),
                    source,
                })?;
        }

        if let Some(pattern) = &cli.whitelist {
            opts.whitelist = Some(Regex::new(pattern).map_err(|source| OptionsError::BadRegex {
                name: "whitelist",
                source,
            })?);
        }
        if let Some(pattern) = &cli.blacklist {
            opts.blacklist = Some(Regex::new(pattern).map_err(|source| OptionsError::BadRegex {
                name: "blacklist",
                source,
            })?);
        }

        // Base mode: plain HTML crawling only.
        if cli.base {
            opts.linkfinder = false;
            opts.robots = false;
            opts.sitemap = false;
            opts.other_source = false;
            opts.include_subs = false;
            opts.include_other_results = false;
        }

        Ok(opts)
    }
}

fn parse_length_csv(csv: &str) -> Vec<usize> {
    csv.split(',')
        .filter_map(|s| s.trim().parse::<usize>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_length_csv() {
        assert_eq!(parse_length_csv("12,345, 6"), vec![12, 345, 6]);
        assert_eq!(parse_length_csv(""), Vec::<usize>::new());
        assert_eq!(parse_length_csv("a,12,b"), vec![12]);
    }

    #[test]
    fn test_defaults() {
        let opts = CrawlOptions::default();
        assert_eq!(opts.threads, 1);
        assert_eq!(opts.concurrent, 5);
        assert_eq!(opts.max_depth, 1);
        assert_eq!(opts.timeout_secs, 10);
        assert!(opts.robots);
        assert!(opts.linkfinder);
        assert!(!opts.sitemap);
        assert!(!opts.other_source);
    }
}
