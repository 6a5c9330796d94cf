//! robots.txt probe: every Allow/Disallow path is a URL somebody cared
//! enough about to list, so all of them are resolved and fed to the engine.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::crawler::Crawler;
use crate::emit::{Kind, Record};
use crate::url_utils;

static ALLOW_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i).*llow:\s*").expect("allow strip pattern"));

/// Fetch `<seed-origin>/robots.txt` once and enqueue every rule path that
/// survives scope.
pub async fn probe_robots(crawler: &Crawler) {
    let seed = crawler.target().start.clone();
    let Some(robots_url) = url_utils::resolve(&seed, "/robots.txt") else {
        return;
    };

    let fetched = match crawler.http().fetch(robots_url.as_str(), None).await {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed: {}", e);
            return;
        }
    };
    if fetched.status != 200 || fetched.body.is_empty() {
        return;
    }
    tracing::info!("found robots.txt: {}", robots_url);

    let body = String::from_utf8_lossy(&fetched.body);
    for line in body.lines() {
        if !line.to_ascii_lowercase().contains("llow:") {
            continue;
        }
        let path = ALLOW_STRIP_RE.replace(line, "");
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        let Some(resolved) = url_utils::resolve(&seed, path) else {
            continue;
        };
        let resolved = url_utils::canonicalize(&resolved);

        let rec = Record::new(crawler.input(), "robots", "robots", &resolved);
        crawler.sink().record(Kind::Robots, "robots", &rec);
        crawler.enqueue_producer_url(&resolved);
    }
}

/// Extract the rule paths from a robots.txt body. Split out for testing.
pub fn rule_paths(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| line.to_ascii_lowercase().contains("llow:"))
        .map(|line| ALLOW_STRIP_RE.replace(line, "").trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_paths() {
        let body = "User-agent: *\nDisallow: /admin\nAllow: /public\nallow: /lower\nSitemap: https://a.test/sitemap.xml\n";
        assert_eq!(rule_paths(body), vec!["/admin", "/public", "/lower"]);
    }

    #[test]
    fn test_rule_paths_ignores_blank_rules() {
        assert_eq!(rule_paths("Disallow:\nAllow:   \n"), Vec::<String>::new());
    }
}
