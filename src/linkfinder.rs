//! Link-finder: mines URL and path tokens out of arbitrary text bodies
//! (script sources above all) with a single quoted-token regex, then drops
//! the noise that regex inevitably drags in.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::url_utils;

/// The token pattern. Accepts a quoted string that is an absolute or
/// scheme-relative URL, a rooted/dotted relative path, a segment pair with a
/// recognized extension or a long tail, or a bare filename with a recognized
/// extension.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?:"|')"#,
        r#"("#,
        r#"((?:[a-zA-Z]{1,10}://|//)[^"'/]{1,}\.[a-zA-Z]{2,}[^"']{0,})"#,
        r#"|((?:/|\.\./|\./)[^"'><,;| *()(%$^/\\\[\]][^"'><,;|()]{1,})"#,
        r#"|([a-zA-Z0-9_\-/]{1,}/[a-zA-Z0-9_\-/]{1,}\.(?:[a-zA-Z]{1,4}|action)(?:[\?|#][^"|']{0,}|))"#,
        r#"|([a-zA-Z0-9_\-/]{1,}/[a-zA-Z0-9_\-/]{3,}(?:[\?|#][^"|']{0,}|))"#,
        r#"|([a-zA-Z0-9_\-]{1,}\.(?:php|asp|aspx|jsp|json|action|html|js|txt|xml)(?:[\?|#][^"|']{0,}|))"#,
        r#")"#,
        r#"(?:"|')"#,
    ))
    .expect("link-finder pattern")
});

static MIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9.+-]*/[a-zA-Z0-9.+-]+$").expect("mime pattern"));

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}$").expect("date pattern"));

static NEWLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t\r\n]+").expect("newline pattern"));

/// Extract the unique candidate tokens from a body, in first-seen order.
pub fn find_links(source: &str) -> Vec<String> {
    // Large minified bundles backtrack badly; breaking lines after statement
    // separators keeps the scan bounded.
    let broken;
    let mut source = source;
    if source.len() > Config::LINKFINDER_SPLIT_THRESHOLD {
        broken = source.replace(';', ";\r\n").replace(',', ",\r\n");
        source = &broken;
    }
    let decoded = url_utils::decode_escapes(source);

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for caps in LINK_RE.captures_iter(&decoded) {
        let token = match caps.get(1) {
            Some(m) => NEWLINE_RE.replace_all(m.as_str().trim(), " ").into_owned(),
            None => continue,
        };
        if token.is_empty() {
            continue;
        }
        if seen.insert(token.clone()) {
            links.push(token);
        }
    }
    links
}

/// Drop tokens that match something other than an endpoint: MIME types,
/// date literals, template placeholders, parameterized route templates.
pub fn is_noise_token(token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() {
        return true;
    }
    if MIME_RE.is_match(token) || DATE_RE.is_match(token) {
        return true;
    }
    if token.contains("{{") || token.contains("}}") {
        return true;
    }
    token.contains("/:")
}

/// A token is treated as absolute when it parses with a scheme and host.
pub fn is_absolute_url(token: &str) -> bool {
    match url::Url::parse(token) {
        Ok(u) => !u.scheme().is_empty() && u.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_rooted_paths() {
        let body = r#"fetch("/api/v1/users"); const x = '/static/app.js';"#;
        let links = find_links(body);
        assert!(links.contains(&"/api/v1/users".to_string()));
        assert!(links.contains(&"/static/app.js".to_string()));
    }

    #[test]
    fn test_finds_absolute_and_scheme_relative() {
        let body = r#"var a = "https://api.a.test/v2/items"; var b = "//cdn.a.test/bundle.js";"#;
        let links = find_links(body);
        assert!(links.contains(&"https://api.a.test/v2/items".to_string()));
        assert!(links.contains(&"//cdn.a.test/bundle.js".to_string()));
    }

    #[test]
    fn test_finds_bare_filenames() {
        let links = find_links(r#"loadScript("vendor.js"); load("config.json")"#);
        assert!(links.contains(&"vendor.js".to_string()));
        assert!(links.contains(&"config.json".to_string()));
    }

    #[test]
    fn test_unique_first_seen_order() {
        let links = find_links(r#"a("/x/one"); b("/x/two"); c("/x/one")"#);
        assert_eq!(links, vec!["/x/one".to_string(), "/x/two".to_string()]);
    }

    #[test]
    fn test_mime_types_survive_regex_but_fail_noise_filter() {
        // "application/json" matches the segment-pair alternative; the noise
        // filter is what keeps it out of the output.
        let links = find_links(r#"xhr.setRequestHeader("Content-Type", "application/json");"#);
        assert!(links.iter().any(|l| l == "application/json"));
        assert!(is_noise_token("application/json"));
        assert!(is_noise_token("text/plain"));
    }

    #[test]
    fn test_noise_dates_and_templates() {
        assert!(is_noise_token("12/31/2025"));
        assert!(is_noise_token("1/1/99"));
        assert!(is_noise_token("/users/{{id}}"));
        assert!(is_noise_token("/tenders/:id"));
        assert!(is_noise_token(""));
        assert!(!is_noise_token("/api/v1/users"));
        assert!(!is_noise_token("https://a.test/x"));
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://a.test/x"));
        assert!(!is_absolute_url("/api/v1"));
        assert!(!is_absolute_url("./rel"));
    }

    #[test]
    fn test_large_body_line_break_prestep() {
        // A body over the split threshold still yields its tokens.
        let mut body = String::with_capacity(Config::LINKFINDER_SPLIT_THRESHOLD + 64);
        while body.len() <= Config::LINKFINDER_SPLIT_THRESHOLD {
            body.push_str("var pad=1;");
        }
        body.push_str(r#"fetch("/api/after/split");"#);
        let links = find_links(&body);
        assert!(links.contains(&"/api/after/split".to_string()));
    }
}
