//! Pool of realistic browser identities rotated across fetch attempts.
//!
//! Blocking heuristics key on header fingerprints; a retry that looks like a
//! different browser has a real chance where a repeat of the same identity
//! does not. Rotation is deterministic per attempt index.

/// One browser identity: user agent plus the accept headers that normally
/// travel with it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BrowserProfile {
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
}

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

pub(crate) const PROFILES: &[BrowserProfile] = &[
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        accept: HTML_ACCEPT,
        accept_language: "pt-BR,pt;q=0.9",
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        accept: HTML_ACCEPT,
        accept_language: "pt-BR,pt;q=0.9,en;q=0.8",
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "pt-BR,pt;q=0.8,en-US;q=0.5",
    },
    BrowserProfile {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
        accept: HTML_ACCEPT,
        accept_language: "pt-BR,pt;q=0.9",
    },
];

/// Identity for the given attempt index (wraps around the pool).
pub(crate) fn profile_for_attempt(attempt: usize) -> &'static BrowserProfile {
    &PROFILES[attempt % PROFILES.len()]
}
