//! Regex grep passes over response bodies: subdomain mentions of the target
//! apex and AWS S3 bucket references.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::url_utils;

// Label sequence of a hostname, prepended to the quoted apex at build time.
const SUB_LABELS: &str =
    r"(?i)(([a-zA-Z0-9]{1}|[_a-zA-Z0-9]{1}[_a-zA-Z0-9-]{0,61}[a-zA-Z0-9]{1})[.]{1})+";

static AWS_S3_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[a-z0-9.-]+\.s3\.amazonaws\.com|[a-z0-9.-]+\.s3-[a-z0-9-]\.amazonaws\.com|[a-z0-9.-]+\.s3-website[.-](?:eu|ap|us|ca|sa|cn)|//s3\.amazonaws\.com/[a-z0-9._-]+|//s3-[a-z0-9-]+\.amazonaws\.com/[a-z0-9._-]+",
    )
    .expect("aws s3 pattern")
});

// Percent-encoding residue that leaks into grepped names.
static NAME_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:20|25|2b|2f|3d|3a|40)+").expect("name strip pattern"));

/// Compile the subdomain pattern for a target apex. Dots in the apex match
/// literally.
pub fn subdomain_regex(domain: &str) -> Regex {
    let quoted = domain.replace('.', "[.]");
    Regex::new(&format!("{}{}", SUB_LABELS, quoted)).expect("subdomain pattern")
}

/// Find every subdomain of `domain` mentioned in a body, cleaned of
/// wildcard prefixes and encoding residue.
pub fn find_subdomains(source: &str, re: &Regex) -> Vec<String> {
    re.find_iter(source)
        .map(|m| clean_subdomain(m.as_str()))
        .collect()
}

/// Find AWS S3 bucket references in a body.
pub fn find_aws_s3(source: &str) -> Vec<String> {
    AWS_S3_RE
        .find_iter(source)
        .map(|m| url_utils::decode_escapes(m.as_str()))
        .collect()
}

pub fn clean_subdomain(s: &str) -> String {
    let mut name = s.trim().to_ascii_lowercase();
    if let Some(stripped) = name.strip_prefix("*.") {
        name = stripped.to_string();
    }
    loop {
        let end = match NAME_STRIP_RE.find(&name) {
            Some(m) if m.end() > 0 => m.end(),
            _ => break,
        };
        name = name[end..].to_string();
    }
    let name = name.trim_matches('-');
    let name = name.strip_prefix('.').unwrap_or(name);
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_grep() {
        let re = subdomain_regex("a.test");
        let body = r#"see https://api.a.test/v1 and "cdn.a.test" plus unrelated b.test"#;
        let subs = find_subdomains(body, &re);
        assert!(subs.contains(&"api.a.test".to_string()));
        assert!(subs.contains(&"cdn.a.test".to_string()));
        assert!(!subs.iter().any(|s| s == "b.test"));
    }

    #[test]
    fn test_subdomain_grep_case_insensitive() {
        let re = subdomain_regex("a.test");
        let subs = find_subdomains("API.A.TEST", &re);
        assert_eq!(subs, vec!["api.a.test".to_string()]);
    }

    #[test]
    fn test_clean_subdomain() {
        assert_eq!(clean_subdomain("*.api.a.test"), "api.a.test");
        assert_eq!(clean_subdomain("2fapi.a.test"), "api.a.test");
        assert_eq!(clean_subdomain("  Www.A.Test "), "www.a.test");
    }

    #[test]
    fn test_aws_s3_grep() {
        let body = r#"
            assets at https://my-bucket.s3.amazonaws.com/logo
            and //s3.amazonaws.com/other_bucket/key
        "#;
        let hits = find_aws_s3(body);
        assert!(hits.iter().any(|h| h.contains("my-bucket.s3.amazonaws.com")));
        assert!(hits.iter().any(|h| h.contains("//s3.amazonaws.com/other_bucket")));
    }

    #[test]
    fn test_aws_s3_no_false_positive() {
        assert!(find_aws_s3("nothing to see at https://a.test/").is_empty());
    }
}
