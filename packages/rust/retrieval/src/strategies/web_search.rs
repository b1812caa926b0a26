//! Domain-restricted general web search (DuckDuckGo HTML endpoint).
//!
//! Used when the site's own search API is unreachable or thin. The query is
//! restricted with a `site:` operator and results are filtered down to
//! specific document URLs on the target host. DuckDuckGo wraps result links
//! in a `/l/?uddg=…` redirect, which is unwrapped here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use docanswer_shared::{DocAnswerError, NormalizedQuery, Result, SiteConfig};

use super::RetrievalStrategy;

/// Default search endpoint.
const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// The endpoint refuses clients with no user agent.
const SEARCH_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Marker a URL path must carry to count as a specific document.
const ARTICLE_PATH_MARKER: &str = "/articles/";

/// Web search restricted to the documentation site's domain.
pub struct WebSearch {
    client: Client,
    endpoint: Url,
    domain: String,
}

impl WebSearch {
    pub fn new(site: &SiteConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocAnswerError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("valid default endpoint"),
            domain: site.domain()?,
        })
    }

    /// Override the search endpoint (integration tests).
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait]
impl RetrievalStrategy for WebSearch {
    fn name(&self) -> &str {
        "web-search"
    }

    async fn attempt(&self, query: &NormalizedQuery, max: usize) -> Result<Vec<Url>> {
        let search_query = format!("site:{} {}", self.domain, query);
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", &search_query);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, SEARCH_USER_AGENT)
            .send()
            .await
            .map_err(|e| DocAnswerError::Network(format!("web search: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocAnswerError::Network(format!("web search: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocAnswerError::Network(format!("web search body: {e}")))?;

        let mut urls = parse_result_links(&body, &self.domain);
        urls.truncate(max);
        debug!(count = urls.len(), "web search results");
        Ok(urls)
    }
}

/// Pull document URLs for `domain` out of a search results page.
fn parse_result_links(html: &str, domain: &str) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("valid selector");

    let mut urls = Vec::new();
    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let Some(resolved) = resolve_result_href(href) else {
            continue;
        };
        if resolved.host_str() == Some(domain) && resolved.path().contains(ARTICLE_PATH_MARKER) {
            urls.push(resolved);
        }
    }
    urls
}

/// Turn a raw result href into the target URL, unwrapping the engine's
/// `/l/?uddg=…` redirect when present.
fn resolve_result_href(href: &str) -> Option<Url> {
    // Scheme-relative redirect links ("//duckduckgo.com/l/?uddg=…")
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;

    if url.path().starts_with("/l/") {
        let target = url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())?;
        return Url::parse(&target).ok();
    }

    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOMAIN: &str = "centraldeatendimento.totvs.com";

    #[test]
    fn parses_direct_links() {
        let html = r#"<html><body>
            <a class="result__a" href="https://centraldeatendimento.totvs.com/hc/pt-br/articles/111-Danfe">Danfe</a>
            <a class="result__a" href="https://outro-site.com/hc/pt-br/articles/222">Fora do domínio</a>
            <a href="https://centraldeatendimento.totvs.com/hc/pt-br/search?query=x">Busca</a>
        </body></html>"#;

        let urls = parse_result_links(html, DOMAIN);
        assert_eq!(urls.len(), 1);
        assert!(urls[0].path().contains("/articles/111-Danfe"));
    }

    #[test]
    fn unwraps_redirect_links() {
        let html = r#"<html><body>
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fcentraldeatendimento.totvs.com%2Fhc%2Fpt-br%2Farticles%2F333-Tss&rut=abc">TSS</a>
        </body></html>"#;

        let urls = parse_result_links(html, DOMAIN);
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0].as_str(),
            "https://centraldeatendimento.totvs.com/hc/pt-br/articles/333-Tss"
        );
    }

    #[test]
    fn ignores_unparseable_hrefs() {
        let html = r##"<a href="javascript:void(0)">x</a><a href="#top">y</a>"##;
        assert!(parse_result_links(html, DOMAIN).is_empty());
    }

    #[tokio::test]
    async fn attempt_queries_endpoint_and_filters() {
        let server = MockServer::start().await;

        let body = format!(
            r#"<html><body>
                <a class="result__a" href="https://{DOMAIN}/hc/pt-br/articles/111-Danfe">Um</a>
                <a class="result__a" href="https://{DOMAIN}/hc/pt-br/articles/222-Tss">Dois</a>
                <a class="result__a" href="https://elsewhere.example.com/articles/999">Três</a>
            </body></html>"#
        );

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let site = SiteConfig::default();
        let strategy = WebSearch::new(&site, Duration::from_secs(5))
            .unwrap()
            .with_endpoint(Url::parse(&format!("{}/html/", server.uri())).unwrap());

        let query = NormalizedQuery::new(vec!["erro".into(), "danfe".into()]);
        let urls = strategy.attempt(&query, 5).await.unwrap();

        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn respects_max() {
        let server = MockServer::start().await;

        let links: String = (0..10)
            .map(|i| format!(r#"<a href="https://{DOMAIN}/hc/pt-br/articles/{i}00-Doc">D</a>"#))
            .collect();

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<html><body>{links}</body></html>")),
            )
            .mount(&server)
            .await;

        let strategy = WebSearch::new(&SiteConfig::default(), Duration::from_secs(5))
            .unwrap()
            .with_endpoint(Url::parse(&format!("{}/html/", server.uri())).unwrap());

        let query = NormalizedQuery::new(vec!["erro".into()]);
        let urls = strategy.attempt(&query, 3).await.unwrap();

        assert_eq!(urls.len(), 3);
    }
}
