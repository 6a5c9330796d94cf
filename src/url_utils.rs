//! URL helper functions used throughout the crawler

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Static asset extensions that are never worth fetching. Matched against the
/// full URL string, case-insensitively, up to an optional query or fragment.
static DISALLOWED_EXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\.(?:png|apng|bmp|gif|ico|cur|jpg|jpeg|jfif|pjp|pjpeg|svg|tif|tiff|webp|xbm|3gp|aac|flac|mpg|mpeg|mp3|mp4|m4a|m4v|m4p|oga|ogg|ogv|mov|wav|webm|eot|woff|woff2|ttf|otf|css)(?:\?|#|$)",
    )
    .expect("disallowed extension pattern")
});

/// Return the canonical string form of a URL: fragment stripped, default port
/// dropped, empty path coerced to `/`. The `url` crate already performs the
/// port and path normalization at parse time.
pub fn canonicalize(u: &Url) -> String {
    let mut c = u.clone();
    c.set_fragment(None);
    c.to_string()
}

/// Resolve a reference against a base URL per RFC 3986. Absolute references
/// pass through unchanged. Returns `None` when the reference cannot be parsed.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok()
}

/// Return the registrable domain (eTLD+1) for a host via the public suffix
/// list, falling back to the host itself when the list yields nothing (IP
/// literals, single labels, internal names).
pub fn apex(host: &str) -> String {
    psl::domain_str(host)
        .map(|d| d.to_string())
        .unwrap_or_else(|| host.to_string())
}

/// Extract the lowercased path extension of a URL, without the dot.
/// `https://a.test/app.min.js?v=2` yields `js`.
pub fn ext_type(raw: &str) -> Option<String> {
    let u = Url::parse(raw).ok()?;
    let last = u.path().rsplit('/').next()?;
    let dot = last.rfind('.')?;
    let ext = &last[dot + 1..];
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Script-like extensions are routed to the link-finder sub-crawler.
pub fn is_script_ext(ext: &str) -> bool {
    matches!(ext, "js" | "xml" | "json" | "map")
}

/// Check a URL string against the static asset denylist.
pub fn is_disallowed_url(raw: &str) -> bool {
    DISALLOWED_EXT_RE.is_match(raw)
}

/// Shared handle on the compiled denylist so collectors can append their own
/// patterns next to it.
pub fn disallowed_ext_re() -> &'static Regex {
    &DISALLOWED_EXT_RE
}

/// Check if a content type represents HTML. An absent content type is treated
/// as HTML so bare servers still get parsed.
pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.is_empty() || lower.contains("text/html") || lower.contains("application/xhtml")
}

/// Unescape the JS string escapes that hide URLs inside script bodies.
pub fn decode_escapes(s: &str) -> String {
    if !s.contains("\\u00") && !s.contains("\\/") {
        return s.to_string();
    }
    s.replace("\\u002f", "/")
        .replace("\\u002F", "/")
        .replace("\\u0026", "&")
        .replace("\\/", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_strips_fragment() {
        let u = Url::parse("https://test.local/page#section").unwrap();
        assert_eq!(canonicalize(&u), "https://test.local/page");
    }

    #[test]
    fn test_canonicalize_drops_default_port() {
        let u = Url::parse("https://test.local:443/page").unwrap();
        assert_eq!(canonicalize(&u), "https://test.local/page");
        let u = Url::parse("http://test.local:80").unwrap();
        assert_eq!(canonicalize(&u), "http://test.local/");
    }

    #[test]
    fn test_canonicalize_keeps_explicit_port() {
        let u = Url::parse("https://test.local:8443/x").unwrap();
        assert_eq!(canonicalize(&u), "https://test.local:8443/x");
    }

    #[test]
    fn test_canonicalize_empty_path() {
        let u = Url::parse("https://test.local").unwrap();
        assert_eq!(canonicalize(&u), "https://test.local/");
    }

    #[test]
    fn test_canonicalize_idempotent() {
        for raw in [
            "https://test.local/page#frag",
            "https://test.local:443/a?b=c",
            "http://test.local",
        ] {
            let once = canonicalize(&Url::parse(raw).unwrap());
            let twice = canonicalize(&Url::parse(&once).unwrap());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_resolve() {
        let base = Url::parse("https://test.local/foo").unwrap();
        assert_eq!(
            resolve(&base, "/page1").unwrap().as_str(),
            "https://test.local/page1"
        );
        let base = Url::parse("https://test.local/foo/").unwrap();
        assert_eq!(
            resolve(&base, "page1").unwrap().as_str(),
            "https://test.local/foo/page1"
        );
        assert_eq!(
            resolve(&base, "https://other.local/page").unwrap().as_str(),
            "https://other.local/page"
        );
        assert_eq!(
            resolve(&base, "//cdn.test.local/app.js").unwrap().as_str(),
            "https://cdn.test.local/app.js"
        );
    }

    #[test]
    fn test_apex() {
        assert_eq!(apex("www.example.com"), "example.com");
        assert_eq!(apex("api.staging.example.co.uk"), "example.co.uk");
        // Single labels have no registrable domain; the host is used as-is.
        assert_eq!(apex("localhost"), "localhost");
    }

    #[test]
    fn test_ext_type() {
        assert_eq!(ext_type("https://a.test/app.min.js?v=2").as_deref(), Some("js"));
        assert_eq!(ext_type("https://a.test/data.JSON").as_deref(), Some("json"));
        assert_eq!(ext_type("https://a.test/path/"), None);
        assert_eq!(ext_type("https://a.test/readme"), None);
    }

    #[test]
    fn test_is_disallowed_url() {
        assert!(is_disallowed_url("https://a.test/logo.png"));
        assert!(is_disallowed_url("https://a.test/style.CSS?v=1"));
        assert!(is_disallowed_url("https://a.test/font.woff2"));
        assert!(!is_disallowed_url("https://a.test/page"));
        assert!(!is_disallowed_url("https://a.test/app.js"));
        assert!(!is_disallowed_url("https://a.test/data.json"));
    }

    #[test]
    fn test_is_html_content_type() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(is_html_content_type(""));
        assert!(!is_html_content_type("application/json"));
        assert!(!is_html_content_type("image/png"));
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_escapes("/plain/path"), "/plain/path");
        assert_eq!(decode_escapes(r"https:\/\/a.test\/x"), "https://a.test/x");
        assert_eq!(decode_escapes(r"a&b"), "a&b");
    }
}
