//! Retrieval strategy trait and built-in strategies.
//!
//! Strategies are tried in priority order; each runs inside its own failure
//! boundary so one strategy erroring never aborts the others.

mod help_center;
mod search_page;
mod web_search;

use async_trait::async_trait;
use url::Url;

use docanswer_shared::{NormalizedQuery, Result};

pub use help_center::HelpCenterSearch;
pub use search_page::SearchPageScrape;
pub use web_search::WebSearch;

/// One way of turning a normalized query into candidate document URLs.
///
/// Implementations return raw URLs; the retriever filters them down to
/// specific documents, deduplicates, and caps the merged list.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    /// Human-readable name for tracing.
    fn name(&self) -> &str;

    /// Run one search pass, returning up to roughly `max` URLs.
    async fn attempt(&self, query: &NormalizedQuery, max: usize) -> Result<Vec<Url>>;
}
