//! Third-party archive enrichers. Each one turns a domain into a list of
//! historical URLs; all of them feed the crawl engine's enqueue path.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::network::{FetchError, HttpClient};

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("network: {0}")]
    Network(String),

    #[error("http {0}")]
    Http(u16),

    #[error("data: {0}")]
    Data(String),
}

impl From<FetchError> for EnrichError {
    fn from(err: FetchError) -> Self {
        EnrichError::Network(err.to_string())
    }
}

/// A source of historical URLs for a domain.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Human-readable name so logs identify which source produced URLs.
    fn name(&self) -> &'static str;

    async fn fetch_urls(
        &self,
        domain: &str,
        include_subs: bool,
    ) -> Result<Vec<String>, EnrichError>;
}

/// Query every enricher in parallel and return the deduplicated union.
pub async fn other_sources(http: &HttpClient, domain: &str, include_subs: bool) -> Vec<String> {
    let enrichers: Vec<Box<dyn Enricher>> = vec![
        Box::new(Wayback { http: http.clone() }),
        Box::new(CommonCrawl { http: http.clone() }),
        Box::new(VirusTotal { http: http.clone() }),
        Box::new(AlienVaultOtx { http: http.clone() }),
    ];

    let mut set = JoinSet::new();
    for enricher in enrichers {
        let domain = domain.to_string();
        set.spawn(async move {
            let name = enricher.name();
            (name, enricher.fetch_urls(&domain, include_subs).await)
        });
    }

    let mut urls = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(batch))) => urls.extend(batch),
            Ok((name, Err(e))) => tracing::debug!("enricher {} failed: {}", name, e),
            Err(e) => tracing::debug!("enricher task failed: {}", e),
        }
    }
    unique(urls)
}

fn unique(input: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    input
        .into_iter()
        .filter(|u| !u.is_empty() && seen.insert(u.clone()))
        .collect()
}

/* ------------------------------ Wayback CDX ------------------------------ */

pub struct Wayback {
    http: HttpClient,
}

fn parse_wayback(body: &[u8]) -> Result<Vec<String>, EnrichError> {
    // The first row is the column header when output=json.
    let rows: Vec<Vec<String>> =
        serde_json::from_slice(body).map_err(|e| EnrichError::Data(e.to_string()))?;
    Ok(rows
        .into_iter()
        .skip(1)
        .filter_map(|row| row.into_iter().nth(1))
        .collect())
}

#[async_trait]
impl Enricher for Wayback {
    fn name(&self) -> &'static str {
        "wayback"
    }

    async fn fetch_urls(
        &self,
        domain: &str,
        include_subs: bool,
    ) -> Result<Vec<String>, EnrichError> {
        let (wildcard, match_type) = if include_subs {
            ("*.", "domain")
        } else {
            ("", "host")
        };
        let query = format!(
            "https://web.archive.org/cdx/search/cdx?url={}{}/*&output=json&fl=timestamp,original&collapse=urlkey&matchType={}",
            wildcard, domain, match_type
        );
        let fetched = self.http.fetch(&query, None).await?;
        if fetched.status != 200 {
            return Err(EnrichError::Http(fetched.status));
        }
        parse_wayback(&fetched.body)
    }
}

/* ------------------------------ CommonCrawl ------------------------------ */

pub struct CommonCrawl {
    http: HttpClient,
}

/// One collection from the CommonCrawl index catalog. The newest collection
/// is first; its CDX endpoint is discovered here, never hardcoded.
#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
    #[serde(rename = "cdx-api")]
    cdx_api: String,
}

fn parse_cdx_lines(body: &str) -> Vec<String> {
    #[derive(Debug, Deserialize)]
    struct CdxEntry {
        url: String,
    }

    body.lines()
        .filter_map(|line| serde_json::from_str::<CdxEntry>(line).ok())
        .map(|entry| entry.url)
        .filter(|u| !u.is_empty())
        .collect()
}

#[async_trait]
impl Enricher for CommonCrawl {
    fn name(&self) -> &'static str {
        "commoncrawl"
    }

    async fn fetch_urls(
        &self,
        domain: &str,
        include_subs: bool,
    ) -> Result<Vec<String>, EnrichError> {
        let catalog = self
            .http
            .fetch("https://index.commoncrawl.org/collinfo.json", None)
            .await?;
        if catalog.status != 200 {
            return Err(EnrichError::Http(catalog.status));
        }
        let collections: Vec<CollectionInfo> =
            serde_json::from_slice(&catalog.body).map_err(|e| EnrichError::Data(e.to_string()))?;
        let latest = collections
            .first()
            .ok_or_else(|| EnrichError::Data("no CommonCrawl collections".to_string()))?;
        tracing::debug!("using CommonCrawl index: {}", latest.id);

        let wildcard = if include_subs { "*." } else { "" };
        let query = format!("{}?url={}{}/*&output=json", latest.cdx_api, wildcard, domain);
        let fetched = self.http.fetch(&query, None).await?;
        if fetched.status != 200 {
            return Err(EnrichError::Http(fetched.status));
        }
        Ok(parse_cdx_lines(&String::from_utf8_lossy(&fetched.body)))
    }
}

/* ------------------------------ VirusTotal ------------------------------- */

pub struct VirusTotal {
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct VtReport {
    #[serde(default)]
    detected_urls: Vec<VtUrl>,
}

#[derive(Debug, Deserialize)]
struct VtUrl {
    url: String,
}

#[async_trait]
impl Enricher for VirusTotal {
    fn name(&self) -> &'static str {
        "virustotal"
    }

    async fn fetch_urls(
        &self,
        domain: &str,
        _include_subs: bool,
    ) -> Result<Vec<String>, EnrichError> {
        let api_key = match std::env::var("VT_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("VT_API_KEY is not set; skipping VirusTotal");
                return Ok(Vec::new());
            }
        };

        let query = format!(
            "https://www.virustotal.com/vtapi/v2/domain/report?apikey={}&domain={}",
            api_key, domain
        );
        let fetched = self.http.fetch(&query, None).await?;
        if fetched.status != 200 {
            return Err(EnrichError::Http(fetched.status));
        }
        let report: VtReport =
            serde_json::from_slice(&fetched.body).map_err(|e| EnrichError::Data(e.to_string()))?;
        Ok(report
            .detected_urls
            .into_iter()
            .map(|u| u.url)
            .filter(|u| !u.is_empty())
            .collect())
    }
}

/* ----------------------------- AlienVault OTX ---------------------------- */

pub struct AlienVaultOtx {
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct OtxPage {
    #[serde(default)]
    has_next: bool,
    #[serde(default)]
    url_list: Vec<OtxUrl>,
}

#[derive(Debug, Deserialize)]
struct OtxUrl {
    url: String,
}

#[async_trait]
impl Enricher for AlienVaultOtx {
    fn name(&self) -> &'static str {
        "otx"
    }

    async fn fetch_urls(
        &self,
        domain: &str,
        _include_subs: bool,
    ) -> Result<Vec<String>, EnrichError> {
        let mut urls = Vec::new();
        for page in 0..Config::OTX_PAGE_CAP {
            let query = format!(
                "https://otx.alienvault.com/api/v1/indicators/hostname/{}/url_list?limit=50&page={}",
                domain, page
            );
            let fetched = self.http.fetch(&query, None).await?;
            if fetched.status != 200 {
                return Err(EnrichError::Http(fetched.status));
            }
            let parsed: OtxPage = serde_json::from_slice(&fetched.body)
                .map_err(|e| EnrichError::Data(e.to_string()))?;
            urls.extend(parsed.url_list.into_iter().map(|u| u.url).filter(|u| !u.is_empty()));
            if !parsed.has_next {
                break;
            }
        }
        Ok(urls)
    }
}
