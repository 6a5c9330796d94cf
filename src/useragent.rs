//! User-agent selection: a small pool of current desktop and mobile browser
//! strings, or a literal operator-supplied value.

use rand::seq::SliceRandom;

const DESKTOP_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36 Edg/125.0.0.0",
];

const MOBILE_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-G991B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8 Pro) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36",
];

/// How the user-agent header is chosen for each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UaPolicy {
    /// Random desktop browser string per request.
    Web,
    /// Random mobile browser string per request.
    Mobile,
    /// Fixed operator-supplied string.
    Literal(String),
}

impl UaPolicy {
    /// `web` and `mobi` select the random pools; anything else is literal.
    pub fn parse(selector: &str) -> Self {
        match selector.to_ascii_lowercase().as_str() {
            "" | "web" => UaPolicy::Web,
            "mobi" => UaPolicy::Mobile,
            _ => UaPolicy::Literal(selector.to_string()),
        }
    }

    pub fn pick(&self) -> String {
        let mut rng = rand::thread_rng();
        match self {
            UaPolicy::Web => DESKTOP_AGENTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(DESKTOP_AGENTS[0])
                .to_string(),
            UaPolicy::Mobile => MOBILE_AGENTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(MOBILE_AGENTS[0])
                .to_string(),
            UaPolicy::Literal(ua) => ua.clone(),
        }
    }
}

impl Default for UaPolicy {
    fn default() -> Self {
        UaPolicy::Web
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector() {
        assert_eq!(UaPolicy::parse("web"), UaPolicy::Web);
        assert_eq!(UaPolicy::parse("MOBI"), UaPolicy::Mobile);
        assert_eq!(
            UaPolicy::parse("curl/8.0"),
            UaPolicy::Literal("curl/8.0".to_string())
        );
        assert_eq!(UaPolicy::parse(""), UaPolicy::Web);
    }

    #[test]
    fn test_pick_pools() {
        assert!(DESKTOP_AGENTS.contains(&UaPolicy::Web.pick().as_str()));
        assert!(MOBILE_AGENTS.contains(&UaPolicy::Mobile.pick().as_str()));
        assert_eq!(UaPolicy::Literal("x".into()).pick(), "x");
    }
}
