//! Scope model: the compiled URL patterns that decide what the crawler is
//! allowed to touch. A URL is in scope iff at least one pattern matches its
//! full string form.

use regex::Regex;

/// Build the pattern matching a host plus any depth of subdomain labels,
/// with an optional port and either a path or end-of-string after the host.
pub fn subdomain_pattern(host: &str) -> Regex {
    let quoted = regex::escape(host);
    Regex::new(&format!(r"^https?://([^.]+\.)*{}(?::\d+)?(?:/|$)", quoted))
        .expect("subdomain scope pattern")
}

/// Build the pattern matching exactly one host, optional port included.
pub fn host_pattern(host: &str) -> Regex {
    let quoted = regex::escape(host);
    Regex::new(&format!(r"^https?://{}(?::\d+)?(?:/|$)", quoted)).expect("host scope pattern")
}

#[derive(Debug, Clone)]
pub struct Scope {
    patterns: Vec<Regex>,
}

impl Scope {
    /// Scope covering an apex domain and all of its subdomains.
    pub fn subdomains(apex: &str) -> Self {
        Self {
            patterns: vec![subdomain_pattern(apex)],
        }
    }

    /// Scope covering one exact host.
    pub fn host_only(host: &str) -> Self {
        Self {
            patterns: vec![host_pattern(host)],
        }
    }

    /// Scope from an operator-supplied whitelist regex. Takes precedence over
    /// the automatic forms.
    pub fn from_regex(re: Regex) -> Self {
        Self { patterns: vec![re] }
    }

    pub fn allows(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_only_scope() {
        let scope = Scope::host_only("a.test");
        assert!(scope.allows("https://a.test/"));
        assert!(scope.allows("http://a.test/x"));
        assert!(scope.allows("https://a.test:8443/x"));
        assert!(scope.allows("https://a.test"));
        assert!(!scope.allows("https://api.a.test/"));
        assert!(!scope.allows("https://b.test/"));
        assert!(!scope.allows("https://a.test.evil.example/"));
    }

    #[test]
    fn test_subdomain_scope() {
        let scope = Scope::subdomains("a.test");
        assert!(scope.allows("https://a.test/"));
        assert!(scope.allows("https://api.a.test/v1"));
        assert!(scope.allows("https://deep.api.a.test/"));
        assert!(!scope.allows("https://nota.test/"));
        assert!(!scope.allows("https://a.test.evil.example/"));
    }

    #[test]
    fn test_dots_are_quoted() {
        let scope = Scope::host_only("a.test");
        assert!(!scope.allows("https://axtest/"));
    }

    #[test]
    fn test_ip_host_with_port() {
        let scope = Scope::host_only("127.0.0.1");
        assert!(scope.allows("http://127.0.0.1:8080/x"));
        assert!(!scope.allows("http://127.0.0.2:8080/x"));
    }
}
