//! Optional model-assisted reordering of scored candidates.
//!
//! The model's free-text output is an untrusted, best-effort ranking: lines
//! are scanned for known locator strings, unmentioned candidates are
//! appended in their incoming (scored) order, and any failure (call error,
//! empty output, unrecognized lines) falls back silently to the incoming
//! order. Scores are never altered and no candidate is ever dropped.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use docanswer_llm::{LlmClient, LlmRequest};
use docanswer_shared::{Candidate, LlmSettings, TtlCache};

/// Ranking prompts are deterministic.
const RANKING_TEMPERATURE: f32 = 0.0;

/// The ranking answer is just a list of URLs; keep it short.
const RANKING_MAX_TOKENS: u32 = 256;

/// Characters of candidate text shown to the model per preview.
const PREVIEW_CHARS: usize = 200;

/// Upper bound on cached orderings.
const CACHE_CAPACITY: u64 = 256;

const RANKING_DIRECTIVE: &str = "Você ordena documentos de suporte por relevância para uma pergunta.\n\
     Responda apenas com as URLs dos documentos, da mais relevante para a menos relevante, uma por linha.\n\
     Não escreva comentários, numeração ou qualquer outro texto.";

/// Model-assisted candidate reordering with a per-(question, candidate-set)
/// cache.
pub struct Reranker {
    llm: Arc<dyn LlmClient>,
    model: String,
    cache: TtlCache<String, Vec<String>>,
}

impl Reranker {
    pub fn new(llm: Arc<dyn LlmClient>, settings: &LlmSettings, cache_ttl: Duration) -> Self {
        Self {
            llm,
            model: settings.model.clone(),
            cache: TtlCache::new(CACHE_CAPACITY, cache_ttl),
        }
    }

    /// Reorder `candidates` by model-judged relevance to `question`.
    ///
    /// Infallible by contract: every failure path returns the incoming
    /// order unchanged.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn rerank(&self, question: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if candidates.len() < 2 {
            return candidates;
        }

        let key = cache_key(question, &candidates);
        if let Some(order) = self.cache.get(&key) {
            debug!("rerank cache hit");
            return apply_order(candidates, &order);
        }

        let request = LlmRequest::new(self.build_prompt(question, &candidates), &self.model)
            .with_system(RANKING_DIRECTIVE)
            .with_temperature(RANKING_TEMPERATURE)
            .with_max_tokens(RANKING_MAX_TOKENS);

        let response = match self.llm.complete(&request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "rerank call failed, keeping score order");
                return candidates;
            }
        };

        let order = parse_ranking(&response.content, &candidates);
        if order.is_empty() {
            debug!("no locators recognized in rerank output, keeping score order");
            return candidates;
        }

        self.cache.insert(key, order.clone());
        apply_order(candidates, &order)
    }

    fn build_prompt(&self, question: &str, candidates: &[Candidate]) -> String {
        let previews: Vec<String> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!("{}. {}\n{}", i + 1, c.locator, preview(&c.text))
            })
            .collect();

        format!(
            "PERGUNTA:\n{question}\n\nDOCUMENTOS:\n{}",
            previews.join("\n\n")
        )
    }
}

/// First `PREVIEW_CHARS` characters of the text, on a char boundary.
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// SHA-256 over the question plus the sorted locator set.
fn cache_key(question: &str, candidates: &[Candidate]) -> String {
    let mut locators: Vec<String> = candidates.iter().map(|c| c.locator.to_string()).collect();
    locators.sort();

    let mut hasher = Sha256::new();
    hasher.update(question.as_bytes());
    for locator in &locators {
        hasher.update(b"\n");
        hasher.update(locator.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Scan response lines for known locators; the recognized locators in
/// response order become the ranking. Empty when nothing is recognized.
fn parse_ranking(response: &str, candidates: &[Candidate]) -> Vec<String> {
    let locators: Vec<String> = candidates.iter().map(|c| c.locator.to_string()).collect();
    let mut used: HashSet<usize> = HashSet::new();
    let mut order: Vec<String> = Vec::new();

    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for (i, locator) in locators.iter().enumerate() {
            if !used.contains(&i) && line.contains(locator.as_str()) {
                used.insert(i);
                order.push(locator.clone());
                break;
            }
        }
    }

    order
}

/// Rearrange candidates to follow `order`; anything the order does not
/// mention keeps its incoming relative position, appended afterward.
fn apply_order(candidates: Vec<Candidate>, order: &[String]) -> Vec<Candidate> {
    let mut remaining: Vec<Option<Candidate>> = candidates.into_iter().map(Some).collect();
    let mut result: Vec<Candidate> = Vec::with_capacity(remaining.len());

    for locator in order {
        if let Some(slot) = remaining
            .iter_mut()
            .find(|c| c.as_ref().is_some_and(|c| c.locator.to_string() == *locator))
        {
            result.push(slot.take().expect("checked above"));
        }
    }

    result.extend(remaining.into_iter().flatten());
    result
}
