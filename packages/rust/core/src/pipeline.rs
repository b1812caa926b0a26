//! End-to-end question pipeline: normalize → retrieve → fetch/extract/score
//! per candidate → rank → synthesize.
//!
//! The pipeline owns one fetcher (HTTP session + fetch cache), one retriever
//! (strategy ladder + query cache), and the ranking/synthesis stages; all of
//! it is constructed once and injected, never reached through globals. Each
//! candidate's fetch/extract/score runs in its own task behind a small
//! semaphore; a failure there degrades that single candidate to sentinel
//! text with score 0 and never aborts its siblings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use docanswer_answer::{Reranker, Synthesizer, relevance_score};
use docanswer_extract::ExtractedContent;
use docanswer_fetch::Fetcher;
use docanswer_llm::LlmClient;
use docanswer_retrieval::Retriever;
use docanswer_shared::{AppConfig, Candidate, FinalAnswer, Locator, NormalizedQuery, Result};

/// Returned when normalization leaves nothing to search for.
pub const COULD_NOT_PROCESS_MESSAGE: &str = "Não foi possível processar a pergunta.";

/// Returned when the question only references an attachment/video/screenshot.
pub const MEDIA_REFERENCE_MESSAGE: &str = "A pergunta faz referência a vídeo, imagem ou anexo; \
     não será feita busca automática na documentação.";

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for the consumer-facing surface.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one candidate finished fetch/extract/score.
    fn candidate_processed(&self, locator: &str, current: usize, total: usize);
    /// Called with the final answer.
    fn done(&self, answer: &FinalAnswer);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn candidate_processed(&self, _locator: &str, _current: usize, _total: usize) {}
    fn done(&self, _answer: &FinalAnswer) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The question-answering pipeline for one configured documentation site.
pub struct Pipeline {
    config: AppConfig,
    fetcher: Arc<Fetcher>,
    retriever: Retriever,
    reranker: Reranker,
    synthesizer: Synthesizer,
}

impl Pipeline {
    /// Build the pipeline with the default retrieval strategy ladder.
    pub fn new(config: AppConfig, llm: Arc<dyn LlmClient>) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(&config.site, &config.fetch, &config.cache)?);
        let retriever = Retriever::new(&config, fetcher.clone())?;
        Ok(Self::assemble(config, llm, fetcher, retriever))
    }

    /// Build with an externally composed retriever (tests, custom ladders).
    pub fn with_retriever(
        config: AppConfig,
        llm: Arc<dyn LlmClient>,
        retriever: Retriever,
    ) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(&config.site, &config.fetch, &config.cache)?);
        Ok(Self::assemble(config, llm, fetcher, retriever))
    }

    fn assemble(
        config: AppConfig,
        llm: Arc<dyn LlmClient>,
        fetcher: Arc<Fetcher>,
        retriever: Retriever,
    ) -> Self {
        let reranker = Reranker::new(
            llm.clone(),
            &config.llm,
            Duration::from_secs(config.cache.ttl_secs),
        );
        let synthesizer = Synthesizer::new(llm, &config.llm, &config.retrieval);

        Self {
            config,
            fetcher,
            retriever,
            reranker,
            synthesizer,
        }
    }

    /// Answer a raw user question.
    ///
    /// Input problems (empty query, media-only question) come back as fixed
    /// user-facing messages, not errors; upstream failures degrade per
    /// candidate. `Err` is reserved for broken local state (bad config).
    #[instrument(skip_all)]
    pub async fn process_question(
        &self,
        question: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<FinalAnswer> {
        let query = docanswer_query::normalize(question, &self.config.site.product_keyword);
        if query.is_empty() {
            info!("question normalized to nothing, skipping retrieval");
            return Ok(message_answer(COULD_NOT_PROCESS_MESSAGE));
        }

        if docanswer_query::references_media(question) {
            info!("question references media, skipping retrieval");
            return Ok(message_answer(MEDIA_REFERENCE_MESSAGE));
        }

        progress.phase("Procurando artigos relevantes");
        let locators = self.retriever.retrieve(&query).await;
        info!(candidates = locators.len(), "retrieval finished");

        progress.phase("Extraindo conteúdo dos artigos");
        let mut candidates = self.gather_candidates(&query, locators, progress).await;
        sort_candidates(&mut candidates);

        if self.config.llm.rerank {
            progress.phase("Reordenando candidatos");
            candidates = self.reranker.rerank(question, candidates).await;
        }

        progress.phase("Gerando resposta");
        let answer = self.synthesizer.synthesize(question, &candidates).await;

        progress.done(&answer);
        Ok(answer)
    }

    /// Fetch, extract, and score every locator concurrently (bounded), each
    /// candidate isolated from the others' failures. Results come back in
    /// retrieval order regardless of completion order.
    async fn gather_candidates(
        &self,
        query: &NormalizedQuery,
        locators: Vec<Locator>,
        progress: &dyn ProgressReporter,
    ) -> Vec<Candidate> {
        let semaphore = Arc::new(Semaphore::new(self.config.fetch.concurrency.max(1)));
        let max_chars = self.config.extract.max_chars;
        let total = locators.len();

        let mut handles = Vec::with_capacity(total);
        for (rank, locator) in locators.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();
            let query = query.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");

                let content = match &locator {
                    // Terminal fallback locator: sentinel, never fetched.
                    Locator::SearchPage(_) => ExtractedContent::search_page(&locator),
                    Locator::Document(_) => {
                        let fetched = fetcher.fetch(&locator).await;
                        docanswer_extract::extract(&fetched, max_chars)
                    }
                };

                let score = relevance_score(&query, &content.text);
                Candidate {
                    locator,
                    text: content.text,
                    score,
                    retrieval_rank: rank,
                }
            }));
        }

        let mut candidates = Vec::with_capacity(total);
        for (i, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(candidate) => {
                    progress.candidate_processed(&candidate.locator.to_string(), i + 1, total);
                    candidates.push(candidate);
                }
                Err(e) => {
                    warn!(error = %e, "candidate task failed, dropping candidate");
                }
            }
        }
        candidates
    }
}

/// Stable final ordering: score descending, ties broken by retrieval order.
fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.retrieval_rank.cmp(&b.retrieval_rank))
    });
}

fn message_answer(text: &str) -> FinalAnswer {
    FinalAnswer {
        text: text.to_string(),
        citations: Vec::new(),
    }
}
