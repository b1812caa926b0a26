//! Resilient locator → raw content fetching.
//!
//! The fetcher runs an ordered ladder of named strategies, each attempted a
//! configured number of times with exponential backoff, and maps the final
//! outcome into a [`FetchResult`]. Every terminal result, including
//! failures, is cached by locator so a blocking upstream is never hammered;
//! Blocked/TransientError entries carry a shorter TTL than Success/NotFound.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

use docanswer_shared::{
    CacheConfig, ContentSource, DocAnswerError, FetchConfig, FetchResult, FetchStatus, Locator,
    Result, SiteConfig, TtlCache,
};

use crate::headers::{PROFILES, profile_for_attempt};

/// Body substrings that signal a bot challenge rather than real content.
const BLOCK_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "cf-chl",
    "challenge-platform",
    "just a moment",
    "attention required",
    "access denied",
];

/// Redirect hop limit for page fetches.
const MAX_REDIRECTS: usize = 5;

/// Upper bound on cached fetch results.
const CACHE_CAPACITY: u64 = 1_024;

// ---------------------------------------------------------------------------
// Strategy interface
// ---------------------------------------------------------------------------

/// Outcome of a single fetch attempt, before retry/strategy accounting.
enum Attempt {
    Success { body: String, source: ContentSource },
    Blocked,
    NotFound,
    Transient(String),
}

/// One way of resolving a locator into raw content.
///
/// Strategies are tried in registration order; each gets the uniform
/// retry/backoff treatment from the fetcher loop.
#[async_trait]
trait FetchStrategy: Send + Sync {
    /// Human-readable name for tracing.
    fn name(&self) -> &str;

    /// Whether this strategy can handle the given URL at all.
    fn applies(&self, url: &Url) -> bool;

    /// Perform one attempt. `attempt` is the zero-based attempt index,
    /// used to vary the browser identity.
    async fn attempt(&self, url: &Url, attempt: usize) -> Attempt;
}

// ---------------------------------------------------------------------------
// Strategy 1: article content API
// ---------------------------------------------------------------------------

/// Fetches article JSON straight from the help-center content API.
/// Bypasses bot heuristics entirely, so it goes first whenever the locator
/// carries a numeric article id.
struct ArticleApiStrategy {
    client: Client,
    base_url: String,
    locale: String,
}

#[async_trait]
impl FetchStrategy for ArticleApiStrategy {
    fn name(&self) -> &str {
        "article-api"
    }

    fn applies(&self, url: &Url) -> bool {
        article_id(url).is_some()
    }

    async fn attempt(&self, url: &Url, _attempt: usize) -> Attempt {
        let Some(id) = article_id(url) else {
            return Attempt::Transient("no article id in locator".into());
        };
        let api_url = format!(
            "{}/api/v2/help_center/{}/articles/{id}.json",
            self.base_url, self.locale
        );

        let response = match self.client.get(&api_url).send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Transient(e.to_string()),
        };

        match response.status() {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Attempt::Blocked,
            StatusCode::NOT_FOUND => Attempt::NotFound,
            status if status.is_success() => match response.text().await {
                Ok(body) => Attempt::Success {
                    body,
                    source: ContentSource::ArticleApi,
                },
                Err(e) => Attempt::Transient(e.to_string()),
            },
            status => Attempt::Transient(format!("HTTP {status}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy 2: browser-profile GET
// ---------------------------------------------------------------------------

/// Plain GET that mimics a real browser: rotating identity per attempt,
/// referer pointing at the site root, cookies and redirects honored by the
/// shared client.
struct BrowserGetStrategy {
    client: Client,
    referer: String,
}

#[async_trait]
impl FetchStrategy for BrowserGetStrategy {
    fn name(&self) -> &str {
        "browser-get"
    }

    fn applies(&self, _url: &Url) -> bool {
        true
    }

    async fn attempt(&self, url: &Url, attempt: usize) -> Attempt {
        let profile = profile_for_attempt(attempt);

        let response = match self
            .client
            .get(url.as_str())
            .header(USER_AGENT, profile.user_agent)
            .header(ACCEPT, profile.accept)
            .header(ACCEPT_LANGUAGE, profile.accept_language)
            .header(REFERER, self.referer.as_str())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Attempt::Transient(e.to_string()),
        };

        match response.status() {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Attempt::Blocked,
            StatusCode::NOT_FOUND => Attempt::NotFound,
            status if status.is_success() => match response.text().await {
                Ok(body) if contains_block_marker(&body) => Attempt::Blocked,
                Ok(body) => Attempt::Success {
                    body,
                    source: ContentSource::Page,
                },
                Err(e) => Attempt::Transient(e.to_string()),
            },
            status => Attempt::Transient(format!("HTTP {status}")),
        }
    }
}

/// Whether a 200 body is actually a bot-challenge page.
fn contains_block_marker(body: &str) -> bool {
    let haystack = body.to_lowercase();
    BLOCK_MARKERS.iter().any(|m| haystack.contains(m))
}

/// Numeric article id from a help-center document URL
/// (`…/articles/{id}[-slug]`).
fn article_id(url: &Url) -> Option<u64> {
    let mut segments = url.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "articles" {
            let next = segments.next()?;
            let digits: String = next.chars().take_while(char::is_ascii_digit).collect();
            return digits.parse().ok();
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Cache expiry policy
// ---------------------------------------------------------------------------

/// Per-entry TTL: degraded results (Blocked/TransientError) expire sooner so
/// an unblocked upstream is retried without waiting out the full window.
struct FetchExpiry {
    ok_ttl: Duration,
    degraded_ttl: Duration,
}

impl moka::Expiry<String, FetchResult> for FetchExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &FetchResult,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        match value.status {
            FetchStatus::Blocked | FetchStatus::TransientError => Some(self.degraded_ttl),
            FetchStatus::Success | FetchStatus::NotFound => Some(self.ok_ttl),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Resolves locators into raw content through the strategy ladder.
///
/// Owns the shared HTTP session (cookies included) and the fetch-result
/// cache namespace; construct once per process and inject wherever fetching
/// is needed.
pub struct Fetcher {
    strategies: Vec<Box<dyn FetchStrategy>>,
    retries: u32,
    backoff_base: Duration,
    cache: TtlCache<String, FetchResult>,
}

impl Fetcher {
    /// Build the fetcher for one documentation site.
    pub fn new(site: &SiteConfig, fetch: &FetchConfig, cache: &CacheConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(PROFILES[0].user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| DocAnswerError::Network(format!("failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(&site.base_url)
            .map_err(|e| DocAnswerError::config(format!("invalid site.base_url: {e}")))?;
        let referer = format!("{}/", base_url.origin().ascii_serialization());

        let strategies: Vec<Box<dyn FetchStrategy>> = vec![
            Box::new(ArticleApiStrategy {
                client: client.clone(),
                base_url: site.base_url.trim_end_matches('/').to_string(),
                locale: site.locale.clone(),
            }),
            Box::new(BrowserGetStrategy { client, referer }),
        ];

        Ok(Self {
            strategies,
            retries: fetch.retries_per_strategy.max(1),
            backoff_base: Duration::from_millis(fetch.backoff_base_ms),
            cache: TtlCache::with_expiry(
                CACHE_CAPACITY,
                FetchExpiry {
                    ok_ttl: Duration::from_secs(cache.ttl_secs),
                    degraded_ttl: Duration::from_secs(cache.blocked_ttl_secs),
                },
            ),
        })
    }

    /// Fetch a locator, serving from the cache when a live entry exists.
    pub async fn fetch(&self, locator: &Locator) -> FetchResult {
        self.fetch_url(locator.url()).await
    }

    /// Fetch an arbitrary URL with the same resilience ladder (used by the
    /// search-page scrape fallback).
    pub async fn fetch_url(&self, url: &Url) -> FetchResult {
        let key = url.to_string();
        if let Some(hit) = self.cache.get(&key) {
            debug!(url = %url, status = ?hit.status, "fetch cache hit");
            return hit;
        }

        let result = self.fetch_uncached(url).await;
        self.cache.insert(key, result.clone());
        result
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_uncached(&self, url: &Url) -> FetchResult {
        let mut saw_blocked = false;
        let mut saw_not_found = false;

        for strategy in &self.strategies {
            if !strategy.applies(url) {
                continue;
            }

            for attempt in 0..self.retries {
                if attempt > 0 {
                    let delay = self.backoff_base * 2u32.pow(attempt - 1);
                    debug!(
                        strategy = strategy.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "backing off before retry"
                    );
                    sleep(delay).await;
                }

                match strategy.attempt(url, attempt as usize).await {
                    Attempt::Success { body, source } => {
                        debug!(
                            strategy = strategy.name(),
                            attempt,
                            bytes = body.len(),
                            "fetch succeeded"
                        );
                        return FetchResult::success(url.to_string(), body, source);
                    }
                    Attempt::Blocked => {
                        saw_blocked = true;
                        warn!(
                            strategy = strategy.name(),
                            attempt, "blocking signal, rotating identity"
                        );
                    }
                    Attempt::NotFound => {
                        saw_not_found = true;
                        // Absence is definitive for this strategy; no retry.
                        break;
                    }
                    Attempt::Transient(reason) => {
                        warn!(
                            strategy = strategy.name(),
                            attempt,
                            %reason,
                            "transient fetch failure"
                        );
                    }
                }
            }
        }

        let status = if saw_blocked {
            FetchStatus::Blocked
        } else if saw_not_found {
            FetchStatus::NotFound
        } else {
            FetchStatus::TransientError
        };

        warn!(?status, "all fetch strategies exhausted");
        FetchResult::failed(url.to_string(), status)
    }
}
