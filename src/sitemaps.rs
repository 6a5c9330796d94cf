//! Sitemap probe: try the well-known sitemap paths at the seed origin, parse
//! whatever XML answers, and recurse one level into sitemap indexes.

use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;

use crate::crawler::Crawler;
use crate::emit::{Kind, Record};
use crate::url_utils;

pub const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_news.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemapindex.xml",
    "/sitemap-news.xml",
    "/post-sitemap.xml",
    "/page-sitemap.xml",
    "/portfolio-sitemap.xml",
    "/home_slider-sitemap.xml",
    "/category-sitemap.xml",
    "/author-sitemap.xml",
];

/// Parse one sitemap document into page URLs and nested sitemap URLs.
/// Malformed XML simply yields nothing.
fn parse_entities(body: &[u8]) -> (Vec<String>, Vec<String>) {
    let mut urls = Vec::new();
    let mut nested = Vec::new();
    let parser = SiteMapReader::new(Cursor::new(body));
    for entity in parser {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(loc) = entry.loc.get_url() {
                    urls.push(loc.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(loc) = entry.loc.get_url() {
                    nested.push(loc.to_string());
                }
            }
            _ => {}
        }
    }
    (urls, nested)
}

/// Probe all well-known sitemap paths for the target.
pub async fn probe_sitemaps(crawler: &Crawler) {
    let seed = crawler.target().start.clone();

    for path in SITEMAP_PATHS {
        let Some(target) = url_utils::resolve(&seed, path) else {
            continue;
        };
        tracing::info!("trying to find {}", target);

        let fetched = match crawler.http().fetch(target.as_str(), None).await {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!("sitemap fetch failed: {}", e);
                continue;
            }
        };
        if fetched.status != 200 || fetched.body.is_empty() {
            continue;
        }

        let (urls, nested) = parse_entities(&fetched.body);
        emit_sitemap_urls(crawler, &urls);

        // One level of sitemap-index recursion.
        for sitemap_url in nested {
            let nested_fetch = match crawler.http().fetch(&sitemap_url, None).await {
                Ok(f) => f,
                Err(e) => {
                    tracing::debug!("nested sitemap fetch failed: {}", e);
                    continue;
                }
            };
            if nested_fetch.status != 200 || nested_fetch.body.is_empty() {
                continue;
            }
            let (nested_urls, _) = parse_entities(&nested_fetch.body);
            emit_sitemap_urls(crawler, &nested_urls);
        }
    }
}

fn emit_sitemap_urls(crawler: &Crawler, urls: &[String]) {
    for loc in urls {
        let loc = loc.trim();
        if loc.is_empty() {
            continue;
        }
        let rec = Record::new(crawler.input(), "sitemap", "sitemap", loc);
        crawler.sink().record(Kind::Sitemap, "sitemap", &rec);
        crawler.enqueue_producer_url(loc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://a.test/one</loc></url>
              <url><loc>https://a.test/two</loc></url>
            </urlset>"#;
        let (urls, nested) = parse_entities(xml);
        assert_eq!(urls, vec!["https://a.test/one", "https://a.test/two"]);
        assert!(nested.is_empty());
    }

    #[test]
    fn test_parse_sitemapindex() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>https://a.test/post-sitemap.xml</loc></sitemap>
            </sitemapindex>"#;
        let (urls, nested) = parse_entities(xml);
        assert!(urls.is_empty());
        assert_eq!(nested, vec!["https://a.test/post-sitemap.xml"]);
    }

    #[test]
    fn test_parse_malformed_xml_yields_nothing() {
        let (urls, nested) = parse_entities(b"this is not xml <<<");
        assert!(urls.is_empty());
        assert!(nested.is_empty());
    }

    #[test]
    fn test_probe_path_list() {
        assert_eq!(SITEMAP_PATHS.len(), 12);
        assert!(SITEMAP_PATHS.contains(&"/sitemap.xml"));
        assert!(SITEMAP_PATHS.contains(&"/author-sitemap.xml"));
    }
}
