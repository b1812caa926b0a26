//! Ranking and answer synthesis.
//!
//! This crate provides:
//! - [`relevance_score`] — deterministic lexical scoring of extracted text
//! - [`Reranker`] — optional model-assisted reordering with silent fallback
//! - [`Synthesizer`] — grounded answer generation with a citation block

mod rerank;
mod score;
mod synthesize;

pub use rerank::Reranker;
pub use score::relevance_score;
pub use synthesize::{
    GENERATION_FAILED_MESSAGE, NO_CONTEXT_MESSAGE, NOT_FOUND_ANSWER, Synthesizer,
    WEAK_MATCH_CAVEAT,
};
