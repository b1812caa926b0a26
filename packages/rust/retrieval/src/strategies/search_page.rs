//! Last-resort strategy: scrape the site's human-facing search results page.
//!
//! Goes through the resilient [`Fetcher`] because the search page sits
//! behind the same anti-automation defenses as the articles themselves.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use docanswer_fetch::Fetcher;
use docanswer_shared::{DocAnswerError, FetchStatus, NormalizedQuery, Result, SiteConfig};

use super::RetrievalStrategy;

/// Scrapes `{base}/hc/{locale}/search?query=…` for article links.
pub struct SearchPageScrape {
    fetcher: Arc<Fetcher>,
    base_url: Url,
    locale: String,
}

impl SearchPageScrape {
    pub fn new(site: &SiteConfig, fetcher: Arc<Fetcher>) -> Result<Self> {
        let base_url = Url::parse(&site.base_url)
            .map_err(|e| DocAnswerError::config(format!("invalid site.base_url: {e}")))?;

        Ok(Self {
            fetcher,
            base_url,
            locale: site.locale.clone(),
        })
    }

    fn search_url(&self, query: &NormalizedQuery) -> Result<Url> {
        let endpoint = format!(
            "{}/hc/{}/search",
            self.base_url.as_str().trim_end_matches('/'),
            self.locale
        );
        Url::parse_with_params(&endpoint, &[("query", query.to_string())])
            .map_err(|e| DocAnswerError::validation(format!("invalid search URL: {e}")))
    }
}

#[async_trait]
impl RetrievalStrategy for SearchPageScrape {
    fn name(&self) -> &str {
        "search-page-scrape"
    }

    async fn attempt(&self, query: &NormalizedQuery, max: usize) -> Result<Vec<Url>> {
        let url = self.search_url(query)?;
        let result = self.fetcher.fetch_url(&url).await;

        match result.status {
            FetchStatus::Success => {
                let body = result.body.unwrap_or_default();
                let mut urls = parse_article_links(&body, &self.base_url);
                urls.truncate(max);
                debug!(count = urls.len(), "search page scrape results");
                Ok(urls)
            }
            status => Err(DocAnswerError::Network(format!(
                "search page fetch failed: {status:?}"
            ))),
        }
    }
}

/// Article anchors from a search results page, resolved against the site
/// root and deduplicated in document order.
fn parse_article_links(html: &str, base_url: &Url) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse(r#"a[href*='/articles/']"#).expect("valid selector");

    let mut seen = std::collections::HashSet::new();
    let mut urls = Vec::new();

    for el in doc.select(&sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base_url.join(href) else {
            continue;
        };
        resolved.set_fragment(None);
        if resolved.host_str() == base_url.host_str() && seen.insert(resolved.to_string()) {
            urls.push(resolved);
        }
    }
    urls
}
