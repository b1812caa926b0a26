//! Grounded answer synthesis with citations.
//!
//! The model is constrained to answer strictly from the supplied context and
//! to state a fixed "not found" sentence when the context is insufficient.
//! The citation block is appended here, deterministically; the model is
//! told not to produce one itself.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use docanswer_extract::is_sentinel;
use docanswer_llm::{LlmClient, LlmRequest};
use docanswer_shared::{Candidate, FinalAnswer, LlmSettings, RetrievalConfig};

/// Fixed sentence the model must state verbatim when the context does not
/// answer the question.
pub const NOT_FOUND_ANSWER: &str = "Não encontrei essa informação na documentação oficial";

/// Returned without a model call when no usable context exists.
pub const NO_CONTEXT_MESSAGE: &str =
    "Atenção: não foi possível validar essa informação específica na documentação oficial.";

/// Returned when the model call itself fails.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Não foi possível gerar uma resposta no momento. Tente novamente em instantes.";

/// Prefix applied when the best candidate scored below the minimum.
pub const WEAK_MATCH_CAVEAT: &str = "Observação: a documentação encontrada tem baixa \
     correspondência com a pergunta; a resposta abaixo usa o melhor conteúdo disponível.";

const CITATIONS_HEADER: &str = "Fontes consultadas:";

/// Answer fragments that mean "nothing found"; no citations are appended
/// when the model's answer matches one of these.
const NOT_FOUND_PATTERNS: &[&str] = &[
    "não encontrei essa informação",
    "nao encontrei essa informação",
    "não foi possível validar essa informação",
];

const ANSWER_DIRECTIVE: &str = "Você é um analista de suporte especializado na documentação oficial do produto.\n\
     Responda de forma técnica, precisa e baseada exclusivamente no contexto fornecido.\n\
     - Se a informação não estiver no contexto, responda apenas: \"Não encontrei essa informação na documentação oficial\".\n\
     - Seja objetivo e inclua passos acionáveis quando aplicável.\n\
     - Não inclua uma seção de fontes; ela será adicionada automaticamente.";

/// Builds the grounding context from top candidates and asks the model for
/// a constrained answer.
pub struct Synthesizer {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_k: usize,
    min_score: f64,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, settings: &LlmSettings, retrieval: &RetrievalConfig) -> Self {
        Self {
            llm,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_k: retrieval.top_k.max(1),
            min_score: retrieval.min_score,
        }
    }

    /// Produce the final answer for `question` from the ranked candidates.
    ///
    /// Infallible by contract: model failures map to a fixed message, never
    /// a propagated error.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn synthesize(&self, question: &str, candidates: &[Candidate]) -> FinalAnswer {
        let usable: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| !is_sentinel(&c.text))
            .take(self.top_k)
            .collect();

        if usable.is_empty() {
            debug!("no usable context, skipping model call");
            return FinalAnswer {
                text: NO_CONTEXT_MESSAGE.to_string(),
                citations: Vec::new(),
            };
        }

        let context = build_context(&usable);
        let prompt =
            format!("PERGUNTA DO USUÁRIO:\n{question}\n\nCONTEÚDO EXTRAÍDO:\n{context}");

        let request = LlmRequest::new(prompt, &self.model)
            .with_system(ANSWER_DIRECTIVE)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let answer = match self.llm.complete(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                warn!(error = %e, "answer synthesis failed");
                return FinalAnswer {
                    text: GENERATION_FAILED_MESSAGE.to_string(),
                    citations: Vec::new(),
                };
            }
        };

        // Weak documentation match: answer anyway, but say so up front.
        let weak_match = usable[0].score < self.min_score;

        let citations = if is_not_found_answer(&answer) {
            Vec::new()
        } else {
            citation_list(&usable)
        };

        let mut text = String::new();
        if weak_match {
            text.push_str(WEAK_MATCH_CAVEAT);
            text.push_str("\n\n");
        }
        text.push_str(answer.trim());
        if !citations.is_empty() {
            text.push_str("\n\n");
            text.push_str(CITATIONS_HEADER);
            for citation in &citations {
                text.push_str("\n- ");
                text.push_str(citation);
            }
        }

        FinalAnswer { text, citations }
    }
}

/// Concatenate candidate texts as labeled context blocks.
fn build_context(usable: &[&Candidate]) -> String {
    usable
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Documento {}]\n{}", i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Whether the model's answer matches a known "not found" pattern.
fn is_not_found_answer(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    NOT_FOUND_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Citation list from the context candidates: query/fragment/trailing slash
/// trimmed, duplicates removed, first-seen order.
fn citation_list(usable: &[&Candidate]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut citations = Vec::new();

    for candidate in usable {
        let trimmed = trim_citation(candidate.locator.url());
        if seen.insert(trimmed.clone()) {
            citations.push(trimmed);
        }
    }
    citations
}

/// Strip the non-informative parts of a document URL for display.
fn trim_citation(url: &Url) -> String {
    let mut trimmed = url.clone();
    trimmed.set_fragment(None);
    trimmed.set_query(None);
    trimmed.to_string().trim_end_matches('/').to_string()
}
