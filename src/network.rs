//! HTTP client construction and the fetch path. One client per target:
//! shared transport tuning, per-target proxy and redirect policy.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect;
use std::time::Duration;
use url::Url;

use crate::config::{Config, CrawlOptions};
use crate::useragent::UaPolicy;

const MAX_REDIRECT_HOPS: usize = 10;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    ua: UaPolicy,
    ua_overridden: bool,
}

/// A buffered response with the metadata the collectors care about.
#[derive(Debug)]
pub struct Fetched {
    pub status: u16,
    /// URL after redirects; the base for all relative resolution.
    pub final_url: Url,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Fetched {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl HttpClient {
    /// Build the per-target client: tuned transport, optional proxy, scope
    /// aware redirect policy, configured headers and cookie.
    pub fn for_target(
        opts: &CrawlOptions,
        scope_host: &str,
        allow_subs: bool,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();

        // Raw-request headers first so explicit -H flags override them.
        for (name, value) in opts.raw_headers.iter().chain(opts.headers.iter()) {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(n), Ok(v)) => {
                    headers.insert(n, v);
                }
                _ => tracing::warn!("skipping unparseable header {name}"),
            }
        }
        if let Some(cookie) = &opts.cookie {
            if let Ok(v) = HeaderValue::from_str(cookie) {
                headers.insert(reqwest::header::COOKIE, v);
            }
        }

        // Browsery defaults, only where nothing is set already.
        headers.entry(reqwest::header::ACCEPT).or_insert(
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers
            .entry(reqwest::header::ACCEPT_LANGUAGE)
            .or_insert(HeaderValue::from_static("en-US,en;q=0.9"));
        headers
            .entry(HeaderName::from_static("upgrade-insecure-requests"))
            .or_insert(HeaderValue::from_static("1"));

        let ua_overridden = headers.contains_key(reqwest::header::USER_AGENT);

        let redirect_policy = if opts.no_redirect {
            let host = scope_host.to_string();
            let suffix = format!(".{}", scope_host);
            redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECT_HOPS {
                    return attempt.stop();
                }
                let same = attempt
                    .url()
                    .host_str()
                    .map(|h| h == host || (allow_subs && h.ends_with(suffix.as_str())))
                    .unwrap_or(false);
                if same {
                    attempt.follow()
                } else {
                    // Off-scope hop: surface the redirect response itself.
                    attempt.stop()
                }
            })
        } else {
            redirect::Policy::limited(MAX_REDIRECT_HOPS)
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(Config::CONNECT_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(Config::TCP_KEEPALIVE_SECS))
            .pool_max_idle_per_host(Config::POOL_IDLE_PER_HOST)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .default_headers(headers)
            .redirect(redirect_policy);

        // Proxy env vars are honored only through the explicit option.
        if let Some(proxy) = &opts.proxy {
            tracing::info!("proxy: {}", proxy);
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| FetchError::ClientBuild(e.to_string()))?;
            builder = builder.proxy(proxy);
        } else {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            ua: opts.user_agent.clone(),
            ua_overridden,
        })
    }

    /// Plain client for third-party archive queries: same transport tuning,
    /// no scope-coupled redirect policy.
    pub fn basic(timeout_secs: u64, proxy: Option<&str>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(Config::CONNECT_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(Config::TCP_KEEPALIVE_SECS))
            .pool_max_idle_per_host(Config::POOL_IDLE_PER_HOST)
            .timeout(Duration::from_secs(timeout_secs));
        if let Some(proxy) = proxy {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| FetchError::ClientBuild(e.to_string()))?;
            builder = builder.proxy(proxy);
        } else {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            ua: UaPolicy::Web,
            ua_overridden: false,
        })
    }

    /// Fetch a URL and buffer the whole response.
    pub async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<Fetched, FetchError> {
        let mut request = self.client.get(url);
        if !self.ua_overridden {
            request = request.header(reqwest::header::USER_AGENT, self.ua.pick());
        }
        if let Some(referer) = referer {
            request = request.header(reqwest::header::REFERER, referer);
        }

        let response = request.send().await.map_err(FetchError::classify)?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
            .to_vec();

        Ok(Fetched {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("connection refused")]
    ConnectionRefused,

    #[error("dns resolution failed")]
    Dns,

    #[error("tls error")]
    Tls,

    #[error("request timeout")]
    Timeout,

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl FetchError {
    /// Sort a reqwest error into the transport taxonomy.
    fn classify(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return FetchError::Timeout;
        }

        let msg = error.to_string().to_lowercase();
        if error.is_connect() {
            if msg.contains("connection refused") {
                return FetchError::ConnectionRefused;
            }
            if msg.contains("dns") || msg.contains("name resolution") || msg.contains("no such host")
            {
                return FetchError::Dns;
            }
        }
        if msg.contains("certificate") || msg.contains("ssl") || msg.contains("tls") {
            return FetchError::Tls;
        }

        FetchError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_target_builds() {
        let opts = CrawlOptions::default();
        let client = HttpClient::for_target(&opts, "a.test", false);
        assert!(client.is_ok());
    }

    #[test]
    fn test_explicit_ua_header_wins() {
        let mut opts = CrawlOptions::default();
        opts.headers
            .push(("User-Agent".to_string(), "custom/1.0".to_string()));
        let client = HttpClient::for_target(&opts, "a.test", false).unwrap();
        assert!(client.ua_overridden);
    }

    #[test]
    fn test_flag_header_overrides_raw_request_header() {
        let mut opts = CrawlOptions::default();
        opts.raw_headers
            .push(("X-Api-Key".to_string(), "from-burp".to_string()));
        opts.headers
            .push(("X-Api-Key".to_string(), "from-flag".to_string()));
        // Construction must not fail; precedence is insert order (raw first).
        assert!(HttpClient::for_target(&opts, "a.test", false).is_ok());
    }

    #[test]
    fn test_bad_proxy_rejected() {
        let mut opts = CrawlOptions::default();
        opts.proxy = Some("::not a proxy::".to_string());
        assert!(HttpClient::for_target(&opts, "a.test", false).is_err());
    }
}
