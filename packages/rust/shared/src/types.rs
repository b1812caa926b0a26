//! Core domain types for the retrieval and answer pipeline.

use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// NormalizedQuery
// ---------------------------------------------------------------------------

/// An ordered, deduplicated set of lowercase search tokens derived from a
/// raw question. Produced by the query normalizer; empty when the raw input
/// had no usable content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    tokens: Vec<String>,
}

impl NormalizedQuery {
    /// Build from a token list, dropping duplicates while preserving the
    /// first-seen order.
    pub fn new(tokens: Vec<String>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let tokens = tokens
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { tokens }
    }

    /// The tokens in order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Append a token if not already present.
    pub fn push_unique(&mut self, token: impl Into<String>) {
        let token = token.into();
        if !self.contains(&token) {
            self.tokens.push(token);
        }
    }
}

impl std::fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// Canonical identifier for one candidate document.
///
/// A locator pointing at the site's generic search page is a distinct kind:
/// it is terminal and never content-bearing, so the extractor maps it to a
/// fixed sentinel instead of attempting extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A specific help-center document.
    Document(Url),
    /// The site's human-facing search results page (no extractable content).
    SearchPage(Url),
}

impl Locator {
    pub fn url(&self) -> &Url {
        match self {
            Self::Document(url) | Self::SearchPage(url) => url,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document(_))
    }

    /// Key used for deduplication: exact string equality after scheme/host
    /// normalization (the `url` crate lowercases both on parse), fragment
    /// stripped, trailing slash removed for non-root paths.
    pub fn dedup_key(&self) -> String {
        normalize_url(self.url())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Normalize a URL for deduplication (strip fragment, trailing slash).
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let mut s = normalized.to_string();
    if s.ends_with('/') && s.matches('/').count() > 3 {
        s.pop();
    }
    s
}

// ---------------------------------------------------------------------------
// FetchResult
// ---------------------------------------------------------------------------

/// Terminal outcome of a fetch attempt chain for one locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    /// Raw content retrieved with no blocking signal.
    Success,
    /// The upstream refused automated access across all retries.
    Blocked,
    /// The document does not exist upstream.
    NotFound,
    /// Network-level failure persisted across retries.
    TransientError,
}

/// Which fetch strategy produced the raw content; drives the extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Structured JSON from the site's article content API.
    ArticleApi,
    /// Raw HTML from a page GET.
    Page,
}

/// The result of resolving a locator into raw content.
/// Immutable once produced; cached by locator regardless of status.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Locator string this result belongs to.
    pub locator: String,
    /// Terminal status after all strategies/retries.
    pub status: FetchStatus,
    /// Raw body; present only for `Success`.
    pub body: Option<String>,
    /// Origin of the raw body.
    pub source: ContentSource,
}

impl FetchResult {
    pub fn success(locator: impl Into<String>, body: String, source: ContentSource) -> Self {
        Self {
            locator: locator.into(),
            status: FetchStatus::Success,
            body: Some(body),
            source,
        }
    }

    pub fn failed(locator: impl Into<String>, status: FetchStatus) -> Self {
        debug_assert!(status != FetchStatus::Success);
        Self {
            locator: locator.into(),
            status,
            body: None,
            source: ContentSource::Page,
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A locator plus its extracted text and relevance score, tracked through
/// ranking and synthesis. Created once per retrieval pass; the reclassifier
/// may reorder candidates but never alters scores.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub locator: Locator,
    /// Cleaned, bounded text, or a sentinel when extraction was impossible.
    pub text: String,
    /// Relevance in [0, 1]; 0 for sentinel text.
    pub score: f64,
    /// Position in the retriever's original ordering; tie-breaker for the
    /// stable final sort.
    pub retrieval_rank: usize,
}

// ---------------------------------------------------------------------------
// FinalAnswer
// ---------------------------------------------------------------------------

/// The pipeline's output: answer text plus the citation list that was (or
/// would be) appended to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub text: String,
    pub citations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_query_dedups_preserving_order() {
        let q = NormalizedQuery::new(vec![
            "erro".into(),
            "danfe".into(),
            "erro".into(),
            "gerar".into(),
        ]);
        assert_eq!(q.tokens(), ["erro", "danfe", "gerar"]);
        assert_eq!(q.to_string(), "erro danfe gerar");
    }

    #[test]
    fn push_unique_ignores_duplicates() {
        let mut q = NormalizedQuery::new(vec!["erro".into()]);
        q.push_unique("protheus");
        q.push_unique("protheus");
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn locator_dedup_key_strips_fragment() {
        let a = Locator::Document(
            Url::parse("https://help.example.com/hc/pt-br/articles/123-Titulo#secao").unwrap(),
        );
        let b = Locator::Document(
            Url::parse("https://help.example.com/hc/pt-br/articles/123-Titulo").unwrap(),
        );
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn locator_dedup_key_trims_trailing_slash() {
        let a = Url::parse("https://help.example.com/hc/pt-br/articles/123/").unwrap();
        let b = Url::parse("https://help.example.com/hc/pt-br/articles/123").unwrap();
        assert_eq!(
            Locator::Document(a).dedup_key(),
            Locator::Document(b).dedup_key()
        );
    }

    #[test]
    fn search_page_is_not_document() {
        let loc = Locator::SearchPage(
            Url::parse("https://help.example.com/hc/pt-br/search?query=x").unwrap(),
        );
        assert!(!loc.is_document());
    }

    #[test]
    fn fetch_result_ctors() {
        let ok = FetchResult::success("https://x/1", "<html></html>".into(), ContentSource::Page);
        assert_eq!(ok.status, FetchStatus::Success);
        assert!(ok.body.is_some());

        let blocked = FetchResult::failed("https://x/2", FetchStatus::Blocked);
        assert_eq!(blocked.status, FetchStatus::Blocked);
        assert!(blocked.body.is_none());
    }
}
