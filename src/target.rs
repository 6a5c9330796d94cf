//! Target normalization: turn a raw operator string into a start URL plus
//! the scope the whole crawl enforces.

use thiserror::Error;
use url::Url;

use crate::config::CrawlOptions;
use crate::scope::Scope;
use crate::url_utils;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("failed to parse target {raw}: {reason}")]
    Parse { raw: String, reason: String },

    #[error("target {0} has no host")]
    NoHost(String),
}

/// One crawl target: where to start and what is in scope.
#[derive(Debug, Clone)]
pub struct Target {
    pub start: Url,
    pub host: String,
    pub scope: Scope,
    pub allow_subs: bool,
}

/// Normalize a raw target string.
///
/// A string with a scheme is a full URL: the scope is its exact host unless
/// subdomains were requested, or the host already is its own apex (seeding
/// the apex implies wanting the subdomains). A bare domain starts at
/// `https://<domain>` and scopes to the apex plus all subdomains. An explicit
/// whitelist pattern or whitelist domain takes precedence over both.
pub fn normalize_target(raw: &str, opts: &CrawlOptions) -> Result<Target, TargetError> {
    let raw = raw.trim();
    let (start, allow_subs) = if raw.contains("://") {
        let start = Url::parse(raw).map_err(|e| TargetError::Parse {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;
        let host = start
            .host_str()
            .ok_or_else(|| TargetError::NoHost(raw.to_string()))?
            .to_string();
        let subs = opts.subs || host.eq_ignore_ascii_case(&url_utils::apex(&host));
        (start, subs)
    } else {
        let start = Url::parse(&format!("https://{}", raw)).map_err(|e| TargetError::Parse {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;
        (start, true)
    };

    let host = start
        .host_str()
        .ok_or_else(|| TargetError::NoHost(raw.to_string()))?
        .to_string();

    let scope = if let Some(re) = &opts.whitelist {
        Scope::from_regex(re.clone())
    } else if let Some(domain) = &opts.whitelist_domain {
        Scope::host_only(domain)
    } else if allow_subs {
        Scope::subdomains(&url_utils::apex(&host))
    } else {
        Scope::host_only(&host)
    };

    Ok(Target {
        start,
        host,
        scope,
        allow_subs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_bare_domain_auto_scope() {
        let opts = CrawlOptions::default();
        let t = normalize_target("a.test", &opts).unwrap();
        assert_eq!(t.start.as_str(), "https://a.test/");
        assert!(t.allow_subs);
        assert!(t.scope.allows("https://a.test/"));
        assert!(t.scope.allows("https://api.a.test/v1"));
        assert!(!t.scope.allows("https://b.test/"));
    }

    #[test]
    fn test_full_url_host_only() {
        let opts = CrawlOptions::default();
        let t = normalize_target("https://www.example.com/start", &opts).unwrap();
        assert_eq!(t.host, "www.example.com");
        assert!(!t.allow_subs);
        assert!(t.scope.allows("https://www.example.com/x"));
        assert!(!t.scope.allows("https://api.example.com/x"));
    }

    #[test]
    fn test_full_url_with_subs_flag() {
        let opts = CrawlOptions {
            subs: true,
            ..CrawlOptions::default()
        };
        let t = normalize_target("https://www.example.com/", &opts).unwrap();
        assert!(t.allow_subs);
        assert!(t.scope.allows("https://api.example.com/x"));
    }

    #[test]
    fn test_full_url_at_apex_auto_enables_subs() {
        let opts = CrawlOptions::default();
        let t = normalize_target("https://example.com/", &opts).unwrap();
        assert!(t.allow_subs);
        assert!(t.scope.allows("https://api.example.com/x"));
    }

    #[test]
    fn test_whitelist_regex_takes_precedence() {
        let opts = CrawlOptions {
            whitelist: Some(Regex::new(r"^https?://only\.example\.com/").unwrap()),
            ..CrawlOptions::default()
        };
        let t = normalize_target("a.test", &opts).unwrap();
        assert!(t.scope.allows("https://only.example.com/x"));
        assert!(!t.scope.allows("https://a.test/"));
    }

    #[test]
    fn test_whitelist_domain() {
        let opts = CrawlOptions {
            whitelist_domain: Some("only.example.com".to_string()),
            ..CrawlOptions::default()
        };
        let t = normalize_target("https://a.test/", &opts).unwrap();
        assert!(t.scope.allows("https://only.example.com/"));
        assert!(!t.scope.allows("https://sub.only.example.com/"));
        assert!(!t.scope.allows("https://a.test/"));
    }

    #[test]
    fn test_unparseable_target() {
        let opts = CrawlOptions::default();
        assert!(normalize_target("http://[bad", &opts).is_err());
    }
}
