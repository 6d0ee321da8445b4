//! Core data types and error definitions for the summarization pipeline.

use crate::summarization::SummarizeError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Terminal artifact of a run.
pub type FinalSummary = String;

/// Contiguous, bounded slice of the document's word sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the document.
    pub index: usize,
    /// Words of the slice joined with single spaces.
    pub text: String,
}

/// Outcome of summarizing one chunk; `text` is `None` when the call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    /// Index of the chunk this summary belongs to.
    pub index: usize,
    /// Summary text, absent on failure.
    pub text: Option<String>,
}

impl ChunkSummary {
    pub(crate) fn succeeded(index: usize, text: String) -> Self {
        Self {
            index,
            text: Some(text),
        }
    }

    pub(crate) fn failed(index: usize) -> Self {
        Self { index, text: None }
    }
}

/// One [`ChunkSummary`] per chunk, in chunk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryBatch {
    summaries: Vec<ChunkSummary>,
}

impl SummaryBatch {
    /// Wrap index-ordered summaries.
    pub fn new(summaries: Vec<ChunkSummary>) -> Self {
        Self { summaries }
    }

    /// Number of entries, equal to the number of chunks.
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    /// Whether the batch holds no entries.
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// All entries in chunk order.
    pub fn summaries(&self) -> &[ChunkSummary] {
        &self.summaries
    }

    /// Successful summary texts in ascending chunk order.
    pub fn present(&self) -> Vec<&str> {
        self.summaries
            .iter()
            .filter_map(|summary| summary.text.as_deref())
            .collect()
    }

    /// Number of chunks summarized successfully.
    pub fn succeeded(&self) -> usize {
        self.summaries
            .iter()
            .filter(|summary| summary.text.is_some())
            .count()
    }

    /// Indices of chunks whose summarization failed.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.summaries
            .iter()
            .filter(|summary| summary.text.is_none())
            .map(|summary| summary.index)
            .collect()
    }
}

/// Result of a successful reduction.
#[derive(Debug, Clone)]
pub struct Reduction {
    /// Final summary text.
    pub summary: FinalSummary,
    /// Per-chunk outcomes the summary was built from.
    pub batch: SummaryBatch,
    /// Whether a merge call produced `summary`.
    pub merged: bool,
}

/// Errors produced while turning raw text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A chunk must hold at least one word.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Terminal failures of the reduce step.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// There were no chunks to summarize.
    #[error("nothing to summarize")]
    NothingToSummarize,
    /// Every chunk summarization call failed.
    #[error("all {failures} chunk summaries failed")]
    AllChunksFailed {
        /// Number of failed chunk calls.
        failures: usize,
    },
    /// The merge call over the chunk summaries failed.
    #[error("failed to merge chunk summaries: {cause}")]
    MergeFailed {
        /// Provider error returned by the merge call.
        #[source]
        cause: SummarizeError,
    },
    /// The run was cancelled before a final summary was produced.
    #[error("run cancelled after {} of {total} chunk summaries completed", .completed.len())]
    Cancelled {
        /// Chunk outcomes that finished before cancellation, in chunk order.
        completed: Vec<ChunkSummary>,
        /// Number of chunks in the run.
        total: usize,
    },
}

/// Failures surfaced by [`crate::processing::SummarizationPipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Chunking rejected its parameters.
    #[error("failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// The document contained no words.
    #[error("nothing to summarize: the document is empty")]
    NothingToSummarize,
    /// Every chunk summarization call failed.
    #[error("no valid summaries were generated: all {failures} chunks failed")]
    AllChunksFailed {
        /// Number of failed chunk calls.
        failures: usize,
    },
    /// The merge call over the chunk summaries failed.
    #[error("failed to create final summary: {cause}")]
    MergeFailed {
        /// Provider error returned by the merge call.
        #[source]
        cause: SummarizeError,
    },
    /// The run was cancelled before a final summary was produced.
    #[error("run cancelled after {} of {total} chunk summaries completed", .completed.len())]
    Cancelled {
        /// Chunk outcomes that finished before cancellation, in chunk order.
        completed: Vec<ChunkSummary>,
        /// Number of chunks in the run.
        total: usize,
    },
}

impl From<ReduceError> for PipelineError {
    fn from(error: ReduceError) -> Self {
        match error {
            ReduceError::NothingToSummarize => Self::NothingToSummarize,
            ReduceError::AllChunksFailed { failures } => Self::AllChunksFailed { failures },
            ReduceError::MergeFailed { cause } => Self::MergeFailed { cause },
            ReduceError::Cancelled { completed, total } => Self::Cancelled { completed, total },
        }
    }
}

/// Machine-readable record of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Identifier attached to every log line of the run.
    pub run_id: Uuid,
    /// SHA-256 of the input document, hex encoded.
    pub document_sha256: String,
    /// Number of words in the document.
    pub words: usize,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// Word budget per chunk.
    pub max_words_per_chunk: usize,
    /// Chunks summarized successfully.
    pub succeeded: usize,
    /// Indices of chunks whose summary is missing.
    pub failed_chunks: Vec<usize>,
    /// Whether a merge call produced the final summary.
    pub merged: bool,
    /// RFC 3339 completion timestamp.
    pub completed_at: String,
}
