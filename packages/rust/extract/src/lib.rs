//! Content extraction: raw fetch results → clean, bounded plain text.
//!
//! Two extraction paths share one cleaning pipeline:
//! - structured article-API JSON → title + body fields
//! - raw page HTML → main-region selection + chrome/boilerplate stripping
//!
//! Non-Success fetch results and search-page locators never reach either
//! path; they map to fixed sentinel strings that the scorer (score 0) and
//! the synthesizer (excluded from context) both recognize.

mod html;
mod text;

use serde::Deserialize;

use docanswer_shared::{ContentSource, FetchResult, FetchStatus, Locator};

/// Prefix marking text that stands in for unavailable content.
pub const ERROR_MARKER: &str = "[indisponível]";

/// Sentinel for the retriever's search-page fallback locator.
pub const SEARCH_PAGE_SENTINEL: &str = "Página de pesquisa - conteúdo não extraído";

// ---------------------------------------------------------------------------
// ExtractedContent
// ---------------------------------------------------------------------------

/// Cleaned text for one locator. `text` is either real content (bounded to
/// the configured maximum) or a sentinel.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub locator: String,
    pub text: String,
}

impl ExtractedContent {
    /// The fixed content for a search-page locator (terminal, never fetched).
    pub fn search_page(locator: &Locator) -> Self {
        Self {
            locator: locator.to_string(),
            text: SEARCH_PAGE_SENTINEL.to_string(),
        }
    }

    /// Whether the text is real content (not a sentinel, not empty).
    pub fn is_usable(&self) -> bool {
        !is_sentinel(&self.text)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Turn a fetch result into cleaned text bounded to `max_chars`.
///
/// Blocked/NotFound/TransientError results map to the error sentinel for
/// their status; they are never parsed.
pub fn extract(result: &FetchResult, max_chars: usize) -> ExtractedContent {
    let text = match result.status {
        FetchStatus::Success => {
            let body = result.body.as_deref().unwrap_or_default();
            match result.source {
                ContentSource::ArticleApi => match article_text(body) {
                    Some(raw) => text::run_pipeline(&raw, max_chars),
                    None => {
                        tracing::warn!(locator = %result.locator, "malformed article API payload");
                        format!("{ERROR_MARKER} conteúdo da API inválido")
                    }
                },
                ContentSource::Page => {
                    text::run_pipeline(&html::extract_page_text(body), max_chars)
                }
            }
        }
        status => error_sentinel(status),
    };

    ExtractedContent {
        locator: result.locator.clone(),
        text,
    }
}

/// The fixed sentinel text for a non-Success fetch status.
pub fn error_sentinel(status: FetchStatus) -> String {
    let reason = match status {
        FetchStatus::Blocked => "documento bloqueado pelo site",
        FetchStatus::NotFound => "documento não encontrado",
        FetchStatus::TransientError => "falha temporária ao acessar o documento",
        FetchStatus::Success => "sem conteúdo",
    };
    format!("{ERROR_MARKER} {reason}")
}

/// Whether `text` is a sentinel (or empty) rather than real content.
pub fn is_sentinel(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.starts_with(ERROR_MARKER) || trimmed == SEARCH_PAGE_SENTINEL
}

// ---------------------------------------------------------------------------
// Article API payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ArticleEnvelope {
    article: Article,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
}

/// Concatenated title + body from an article API payload, if it parses.
fn article_text(json: &str) -> Option<String> {
    let envelope: ArticleEnvelope = serde_json::from_str(json).ok()?;
    Some(format!("{} {}", envelope.article.title, envelope.article.body))
}
