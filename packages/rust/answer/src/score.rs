//! Deterministic lexical relevance scoring.
//!
//! Pure function of (query, text): no randomness, no external calls, so
//! identical inputs always produce identical scores and the final candidate
//! ordering is reproducible.

use std::collections::HashSet;

use docanswer_extract::is_sentinel;
use docanswer_query::is_technical_term;
use docanswer_shared::NormalizedQuery;

/// Increment per query token found as an exact substring of the text.
const SUBSTRING_BONUS: f64 = 0.05;

/// Increment per overlapping token on the technical-term allowlist.
const TECHNICAL_BONUS: f64 = 0.05;

/// Relevance of `text` to `query`, in [0, 1].
///
/// Base score is token overlap over query size; substring and
/// technical-term bonuses are added on top and the result is clamped.
/// Sentinel or empty text always scores 0.
pub fn relevance_score(query: &NormalizedQuery, text: &str) -> f64 {
    if query.is_empty() || is_sentinel(text) {
        return 0.0;
    }

    let lower = text.to_lowercase();
    let text_tokens: HashSet<&str> = lower.split_whitespace().collect();
    if text_tokens.is_empty() {
        return 0.0;
    }

    let mut overlap = 0usize;
    let mut technical_overlap = 0usize;
    let mut substring_hits = 0usize;

    for token in query.tokens() {
        if text_tokens.contains(token.as_str()) {
            overlap += 1;
            if is_technical_term(token) {
                technical_overlap += 1;
            }
        }
        if lower.contains(token.as_str()) {
            substring_hits += 1;
        }
    }

    let base = overlap as f64 / query.len() as f64;
    let score = base
        + substring_hits as f64 * SUBSTRING_BONUS
        + technical_overlap as f64 * TECHNICAL_BONUS;

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docanswer_extract::{SEARCH_PAGE_SENTINEL, error_sentinel};
    use docanswer_shared::FetchStatus;

    fn query(tokens: &[&str]) -> NormalizedQuery {
        NormalizedQuery::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(relevance_score(&query(&[]), "qualquer texto"), 0.0);
    }

    #[test]
    fn sentinel_text_scores_zero() {
        let q = query(&["erro", "danfe"]);
        assert_eq!(relevance_score(&q, &error_sentinel(FetchStatus::Blocked)), 0.0);
        assert_eq!(relevance_score(&q, SEARCH_PAGE_SENTINEL), 0.0);
        assert_eq!(relevance_score(&q, ""), 0.0);
    }

    #[test]
    fn score_is_always_in_unit_interval() {
        let q = query(&["erp", "sql", "api", "danfe"]);
        // Every token overlaps, is technical, and matches as substring:
        // base 1.0 plus bonuses must clamp to 1.0.
        let text = "erp sql api danfe";
        let score = relevance_score(&q, text);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn partial_overlap_scores_proportionally() {
        let q = query(&["erro", "gerar", "boleto", "financeiro"]);
        let text = "para gerar o boleto acesse o módulo";
        let score = relevance_score(&q, text);
        // 2 of 4 tokens overlap, plus 2 substring bonuses.
        assert!((score - (0.5 + 2.0 * 0.05)).abs() < 1e-9);
    }

    #[test]
    fn technical_overlap_earns_bonus() {
        // Same overlap shape; the allowlisted token earns one extra bonus.
        let technical = relevance_score(&query(&["danfe", "zzz"]), "emitir a danfe");
        let plain = relevance_score(&query(&["boleto", "zzz"]), "emitir o boleto");
        assert!((technical - plain - TECHNICAL_BONUS).abs() < 1e-9);
    }

    #[test]
    fn substring_only_match_scores_low_but_nonzero() {
        let q = query(&["fatur"]);
        let score = relevance_score(&q, "rotina de faturamento");
        assert!((score - 0.05).abs() < 1e-9);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let q = query(&["erro", "gerar", "danfe"]);
        let text = "erro conhecido ao gerar a danfe na rotina de saída";
        let first = relevance_score(&q, text);
        for _ in 0..10 {
            assert_eq!(relevance_score(&q, text), first);
        }
    }
}
