//! Candidate retrieval: normalized query → ordered, deduplicated document
//! locators.
//!
//! Three independent strategies contribute (help-center search API,
//! domain-restricted web search, search-page scrape); a failure in one never
//! aborts the others. Merged results keep first-seen order, are filtered to
//! specific documents on the target host, and are capped at the configured
//! maximum. When every strategy comes back empty, the retriever returns a
//! single search-page locator: a terminal, content-less result the
//! extractor turns into an explicit sentinel.

pub mod strategies;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use url::Url;

use docanswer_fetch::Fetcher;
use docanswer_shared::{
    AppConfig, Locator, NormalizedQuery, Result, SiteConfig, TtlCache, normalize_url,
};

use strategies::{HelpCenterSearch, RetrievalStrategy, SearchPageScrape, WebSearch};

/// Marker a URL path must carry to count as a specific document.
const ARTICLE_PATH_MARKER: &str = "/articles/";

/// Upper bound on cached query results.
const CACHE_CAPACITY: u64 = 512;

/// Multi-strategy candidate retriever with a per-query result cache.
pub struct Retriever {
    strategies: Vec<Box<dyn RetrievalStrategy>>,
    cache: TtlCache<String, Vec<String>>,
    site: SiteConfig,
    domain: String,
    max_candidates: usize,
}

impl Retriever {
    /// Build the default strategy ladder for the configured site.
    pub fn new(config: &AppConfig, fetcher: Arc<Fetcher>) -> Result<Self> {
        let timeout = Duration::from_secs(config.fetch.timeout_secs);
        let strategies: Vec<Box<dyn RetrievalStrategy>> = vec![
            Box::new(HelpCenterSearch::new(&config.site, timeout)?),
            Box::new(WebSearch::new(&config.site, timeout)?),
            Box::new(SearchPageScrape::new(&config.site, fetcher)?),
        ];
        Self::with_strategies(config, strategies)
    }

    /// Build with an explicit strategy list (tests, custom ladders).
    pub fn with_strategies(
        config: &AppConfig,
        strategies: Vec<Box<dyn RetrievalStrategy>>,
    ) -> Result<Self> {
        Ok(Self {
            strategies,
            cache: TtlCache::new(
                CACHE_CAPACITY,
                Duration::from_secs(config.cache.ttl_secs),
            ),
            site: config.site.clone(),
            domain: config.site.domain()?,
            max_candidates: config.retrieval.max_candidates.max(1),
        })
    }

    /// Retrieve up to `max_candidates` distinct document locators.
    ///
    /// Never fails: strategy errors are logged and skipped, and an empty
    /// merge degrades to the search-page fallback locator.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn retrieve(&self, query: &NormalizedQuery) -> Vec<Locator> {
        let key = query.to_string();
        if let Some(urls) = self.cache.get(&key) {
            debug!(count = urls.len(), "retrieval cache hit");
            return self.to_locators(&urls, query);
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut found: Vec<String> = Vec::new();

        for strategy in &self.strategies {
            if found.len() >= self.max_candidates {
                break;
            }

            match strategy.attempt(query, self.max_candidates).await {
                Ok(urls) => {
                    let before = found.len();
                    for url in urls {
                        if found.len() >= self.max_candidates {
                            break;
                        }
                        if !self.is_document_url(&url) {
                            continue;
                        }
                        let dedup_key = normalize_url(&url);
                        if seen.insert(dedup_key.clone()) {
                            found.push(dedup_key);
                        }
                    }
                    debug!(
                        strategy = strategy.name(),
                        contributed = found.len() - before,
                        "strategy finished"
                    );
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "retrieval strategy failed");
                }
            }
        }

        info!(count = found.len(), "retrieval complete");
        self.cache.insert(key, found.clone());
        self.to_locators(&found, query)
    }

    /// Materialize locators from cached URL strings; an empty list becomes
    /// the single search-page fallback.
    fn to_locators(&self, urls: &[String], query: &NormalizedQuery) -> Vec<Locator> {
        let documents: Vec<Locator> = urls
            .iter()
            .filter_map(|s| Url::parse(s).ok())
            .map(Locator::Document)
            .collect();

        if documents.is_empty() {
            return vec![Locator::SearchPage(self.search_page_url(query))];
        }
        documents
    }

    /// The site's human-facing search page for this query.
    fn search_page_url(&self, query: &NormalizedQuery) -> Url {
        let endpoint = format!(
            "{}/hc/{}/search",
            self.site.base_url.trim_end_matches('/'),
            self.site.locale
        );
        Url::parse_with_params(&endpoint, &[("query", query.to_string())])
            .expect("site.base_url validated at construction")
    }

    /// Whether a URL points at a specific document on the target host
    /// (never a generic search page).
    fn is_document_url(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url.host_str() == Some(self.domain.as_str())
            && url.path().contains(ARTICLE_PATH_MARKER)
            && !url.path().contains("/search")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test strategy returning a fixed URL list.
    struct Static {
        urls: Vec<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RetrievalStrategy for Static {
        fn name(&self) -> &str {
            "static"
        }

        async fn attempt(&self, _query: &NormalizedQuery, _max: usize) -> Result<Vec<Url>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .urls
                .iter()
                .map(|s| Url::parse(s).expect("valid url"))
                .collect())
        }
    }

    /// Test strategy that always errors.
    struct Failing;

    #[async_trait]
    impl RetrievalStrategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn attempt(&self, _query: &NormalizedQuery, _max: usize) -> Result<Vec<Url>> {
            Err(docanswer_shared::DocAnswerError::Network("boom".into()))
        }
    }

    fn config() -> AppConfig {
        AppConfig::default()
    }

    fn query(tokens: &[&str]) -> NormalizedQuery {
        NormalizedQuery::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    fn retriever(strategies: Vec<Box<dyn RetrievalStrategy>>) -> Retriever {
        Retriever::with_strategies(&config(), strategies).expect("build retriever")
    }

    const A1: &str = "https://centraldeatendimento.totvs.com/hc/pt-br/articles/111-Danfe";
    const A2: &str = "https://centraldeatendimento.totvs.com/hc/pt-br/articles/222-Tss";
    const A3: &str = "https://centraldeatendimento.totvs.com/hc/pt-br/articles/333-Nfe";

    #[tokio::test]
    async fn merges_and_dedups_across_strategies() {
        let calls = Arc::new(AtomicUsize::new(0));
        let r = retriever(vec![
            Box::new(Static {
                urls: vec![A1, A2],
                calls: calls.clone(),
            }),
            Box::new(Static {
                urls: vec![A2, A3],
                calls: calls.clone(),
            }),
        ]);

        let locators = r.retrieve(&query(&["erro", "danfe"])).await;
        let strings: Vec<String> = locators.iter().map(|l| l.to_string()).collect();

        assert_eq!(strings, vec![A1, A2, A3]);
        assert!(locators.iter().all(Locator::is_document));
    }

    #[tokio::test]
    async fn never_exceeds_max_candidates() {
        let mut cfg = config();
        cfg.retrieval.max_candidates = 2;
        let r = Retriever::with_strategies(
            &cfg,
            vec![Box::new(Static {
                urls: vec![A1, A2, A3],
                calls: Arc::new(AtomicUsize::new(0)),
            })],
        )
        .unwrap();

        let locators = r.retrieve(&query(&["erro"])).await;
        assert_eq!(locators.len(), 2);
    }

    #[tokio::test]
    async fn strategy_failure_does_not_abort_others() {
        let r = retriever(vec![
            Box::new(Failing),
            Box::new(Static {
                urls: vec![A1],
                calls: Arc::new(AtomicUsize::new(0)),
            }),
        ]);

        let locators = r.retrieve(&query(&["erro"])).await;
        assert_eq!(locators.len(), 1);
        assert_eq!(locators[0].to_string(), A1);
    }

    #[tokio::test]
    async fn filters_non_document_urls() {
        let r = retriever(vec![Box::new(Static {
            urls: vec![
                A1,
                "https://centraldeatendimento.totvs.com/hc/pt-br/search?query=erro",
                "https://elsewhere.example.com/hc/pt-br/articles/999-Fora",
                "https://centraldeatendimento.totvs.com/hc/pt-br/categories/10",
            ],
            calls: Arc::new(AtomicUsize::new(0)),
        })]);

        let locators = r.retrieve(&query(&["erro"])).await;
        assert_eq!(locators.len(), 1);
        assert_eq!(locators[0].to_string(), A1);
    }

    #[tokio::test]
    async fn empty_merge_yields_search_page_fallback() {
        let r = retriever(vec![Box::new(Static {
            urls: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        })]);

        let locators = r.retrieve(&query(&["assunto", "inexistente"])).await;
        assert_eq!(locators.len(), 1);

        match &locators[0] {
            Locator::SearchPage(url) => {
                assert!(url.path().ends_with("/search"));
                assert!(url.query().unwrap().contains("query="));
            }
            other => panic!("expected SearchPage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repeated_queries_hit_the_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let r = retriever(vec![Box::new(Static {
            urls: vec![A1],
            calls: calls.clone(),
        })]);

        let q = query(&["erro", "danfe"]);
        let first = r.retrieve(&q).await;
        let second = r.retrieve(&q).await;

        assert_eq!(first.len(), second.len());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dedups_fragment_variants() {
        let r = retriever(vec![Box::new(Static {
            urls: vec![
                A1,
                "https://centraldeatendimento.totvs.com/hc/pt-br/articles/111-Danfe#comments",
            ],
            calls: Arc::new(AtomicUsize::new(0)),
        })]);

        let locators = r.retrieve(&query(&["erro"])).await;
        assert_eq!(locators.len(), 1);
    }
}
