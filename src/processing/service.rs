//! Pipeline driver composing the chunker and the reducer.

use crate::{
    config::Config,
    processing::{
        chunking::{chunk_document, count_words},
        progress::ProgressObserver,
        reducer::Reducer,
        types::{FinalSummary, PipelineError, RunReport},
    },
    summarization::SummarizationClient,
};
use sha2::{Digest, Sha256};
use std::future::{Future, pending};
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::Instrument;
use uuid::Uuid;

/// Runs one document through chunking, per-chunk summarization, and the final merge.
///
/// The pipeline holds no per-run state; construct it once and reuse it for any number of
/// documents. Reading the document and persisting the summary stay with the caller.
pub struct SummarizationPipeline {
    reducer: Reducer,
}

impl SummarizationPipeline {
    /// Wrap a configured reducer.
    pub fn new(reducer: Reducer) -> Self {
        Self { reducer }
    }

    /// Build a pipeline using the concurrency and merge thresholds from `config`.
    pub fn from_config(
        client: Arc<dyn SummarizationClient>,
        config: &Config,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        let reducer = Reducer::new(client)
            .with_concurrency(config.summarizer_concurrency)
            .with_merge_input_warn_tokens(config.merge_input_warn_tokens)
            .with_observer(observer);
        Self::new(reducer)
    }

    /// Summarize `document` into a single final summary.
    pub async fn run(
        &self,
        document: &str,
        max_words_per_chunk: usize,
    ) -> Result<FinalSummary, PipelineError> {
        self.run_until(document, max_words_per_chunk, pending::<()>())
            .await
            .map(|(summary, _)| summary)
    }

    /// Summarize `document` and describe how the result was produced.
    pub async fn run_with_report(
        &self,
        document: &str,
        max_words_per_chunk: usize,
    ) -> Result<(FinalSummary, RunReport), PipelineError> {
        self.run_until(document, max_words_per_chunk, pending::<()>())
            .await
    }

    /// Like [`SummarizationPipeline::run_with_report`], abandoning the run once `shutdown`
    /// resolves.
    pub async fn run_until<F>(
        &self,
        document: &str,
        max_words_per_chunk: usize,
        shutdown: F,
    ) -> Result<(FinalSummary, RunReport), PipelineError>
    where
        F: Future<Output = ()>,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("summarize", %run_id);
        self.execute(run_id, document, max_words_per_chunk, shutdown)
            .instrument(span)
            .await
    }

    async fn execute<F>(
        &self,
        run_id: Uuid,
        document: &str,
        max_words_per_chunk: usize,
        shutdown: F,
    ) -> Result<(FinalSummary, RunReport), PipelineError>
    where
        F: Future<Output = ()>,
    {
        let chunks = chunk_document(document, max_words_per_chunk)?;
        let words = count_words(document);
        tracing::debug!(
            chunks = chunks.len(),
            words,
            max_words_per_chunk,
            "Chunked document"
        );
        self.reducer.observer().chunking_finished(chunks.len(), words);

        let reduction = self.reducer.reduce_until(&chunks, shutdown).await?;

        let completed_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let report = RunReport {
            run_id,
            document_sha256: document_fingerprint(document),
            words,
            chunk_count: chunks.len(),
            max_words_per_chunk,
            succeeded: reduction.batch.succeeded(),
            failed_chunks: reduction.batch.failed_indices(),
            merged: reduction.merged,
            completed_at,
        };
        tracing::info!(
            chunks = report.chunk_count,
            succeeded = report.succeeded,
            failed = report.failed_chunks.len(),
            merged = report.merged,
            "Summary generated"
        );

        Ok((reduction.summary, report))
    }
}

/// Hex-encoded SHA-256 of the document, identifying the input a summary was built from.
pub(crate) fn document_fingerprint(document: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    hex::encode(hasher.finalize())
}
