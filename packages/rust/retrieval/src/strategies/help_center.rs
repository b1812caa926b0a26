//! Structured search against the help center's own search API.
//!
//! The most precise strategy when the site is cooperative: results are
//! already scoped to published articles, no scraping involved.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use docanswer_shared::{DocAnswerError, NormalizedQuery, Result, SiteConfig};

use super::RetrievalStrategy;

/// Search response envelope (only the fields we read).
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    html_url: String,
}

/// Queries `{base}/api/v2/help_center/articles/search.json`.
pub struct HelpCenterSearch {
    client: Client,
    base_url: String,
    locale: String,
}

impl HelpCenterSearch {
    pub fn new(site: &SiteConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocAnswerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: site.base_url.trim_end_matches('/').to_string(),
            locale: site.locale.clone(),
        })
    }
}

#[async_trait]
impl RetrievalStrategy for HelpCenterSearch {
    fn name(&self) -> &str {
        "help-center-api"
    }

    async fn attempt(&self, query: &NormalizedQuery, max: usize) -> Result<Vec<Url>> {
        let endpoint = format!("{}/api/v2/help_center/articles/search.json", self.base_url);
        let url = Url::parse_with_params(
            &endpoint,
            &[
                ("query", query.to_string()),
                ("locale", self.locale.clone()),
                ("per_page", max.to_string()),
            ],
        )
        .map_err(|e| DocAnswerError::validation(format!("invalid search endpoint: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocAnswerError::Network(format!("help center search: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocAnswerError::Network(format!(
                "help center search: HTTP {status}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| DocAnswerError::parse(format!("help center search payload: {e}")))?;

        let urls: Vec<Url> = parsed
            .results
            .into_iter()
            .filter_map(|hit| Url::parse(&hit.html_url).ok())
            .collect();

        debug!(count = urls.len(), "help center search results");
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn site(uri: &str) -> SiteConfig {
        SiteConfig {
            base_url: uri.trim_end_matches('/').to_string(),
            locale: "pt-br".into(),
            product_keyword: "Protheus".into(),
        }
    }

    fn query(tokens: &[&str]) -> NormalizedQuery {
        NormalizedQuery::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[tokio::test]
    async fn parses_search_results() {
        let server = MockServer::start().await;

        let body = r#"{
            "results": [
                {"id": 1, "html_url": "https://help.example.com/hc/pt-br/articles/111-Danfe"},
                {"id": 2, "html_url": "https://help.example.com/hc/pt-br/articles/222-Tss"}
            ],
            "count": 2
        }"#;

        Mock::given(method("GET"))
            .and(path("/api/v2/help_center/articles/search.json"))
            .and(query_param("query", "erro danfe"))
            .and(query_param("locale", "pt-br"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let strategy = HelpCenterSearch::new(&site(&server.uri()), Duration::from_secs(5)).unwrap();
        let urls = strategy.attempt(&query(&["erro", "danfe"]), 5).await.unwrap();

        assert_eq!(urls.len(), 2);
        assert!(urls[0].as_str().contains("/articles/111-Danfe"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/help_center/articles/search.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let strategy = HelpCenterSearch::new(&site(&server.uri()), Duration::from_secs(5)).unwrap();
        let result = strategy.attempt(&query(&["erro"]), 5).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/help_center/articles/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>surprise</html>"))
            .mount(&server)
            .await;

        let strategy = HelpCenterSearch::new(&site(&server.uri()), Duration::from_secs(5)).unwrap();
        let result = strategy.attempt(&query(&["erro"]), 5).await;

        assert!(result.is_err());
    }
}
