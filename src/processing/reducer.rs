//! Map-reduce over chunk summaries.
//!
//! Every chunk is summarized independently (the map), then the surviving summaries are joined
//! in chunk order and merged by one more provider call (the reduce). A failed chunk is logged
//! and recorded as absent; only an empty input, a batch with no survivors, or a failed merge
//! ends the run.
//!
//! The merge input is never re-chunked. It must fit one provider call, and the reducer only
//! warns when its token estimate crosses the configured threshold.

use crate::config::DEFAULT_MERGE_INPUT_WARN_TOKENS;
use crate::summarization::{SummarizationClient, SummarizeError, SummaryMode};
use futures_util::stream::{self, StreamExt};
use std::future::{Future, pending};
use std::pin::{Pin, pin};
use std::sync::Arc;

use super::chunking::estimate_tokens;
use super::progress::{NoopProgress, ProgressObserver};
use super::types::{Chunk, ChunkSummary, FinalSummary, ReduceError, Reduction, SummaryBatch};

/// Marker placed between consecutive chunk summaries in the merge input.
pub const SUMMARY_DIVIDER: &str = "\n\n--- CHUNK SUMMARY ---\n\n";

/// Summarizes chunks through a [`SummarizationClient`] and folds the results into one summary.
pub struct Reducer {
    client: Arc<dyn SummarizationClient>,
    concurrency: usize,
    merge_input_warn_tokens: usize,
    observer: Arc<dyn ProgressObserver>,
}

impl Reducer {
    /// Create a reducer that summarizes one chunk at a time.
    pub fn new(client: Arc<dyn SummarizationClient>) -> Self {
        Self {
            client,
            concurrency: 1,
            merge_input_warn_tokens: DEFAULT_MERGE_INPUT_WARN_TOKENS,
            observer: Arc::new(NoopProgress),
        }
    }

    /// Allow up to `concurrency` chunk calls in flight (clamped to at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Warn when the merge input is estimated above `tokens`.
    pub fn with_merge_input_warn_tokens(mut self, tokens: usize) -> Self {
        self.merge_input_warn_tokens = tokens;
        self
    }

    /// Report progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub(crate) fn observer(&self) -> &dyn ProgressObserver {
        self.observer.as_ref()
    }

    /// Summarize every chunk and fold the results into a final summary.
    pub async fn reduce(&self, chunks: &[Chunk]) -> Result<FinalSummary, ReduceError> {
        self.reduce_until(chunks, pending::<()>())
            .await
            .map(|reduction| reduction.summary)
    }

    /// Like [`Reducer::reduce`], but stops as soon as `shutdown` resolves.
    ///
    /// On cancellation in-flight calls are dropped, nothing further is dispatched, and the
    /// outcomes that already completed are returned inside [`ReduceError::Cancelled`].
    pub async fn reduce_until<F>(
        &self,
        chunks: &[Chunk],
        shutdown: F,
    ) -> Result<Reduction, ReduceError>
    where
        F: Future<Output = ()>,
    {
        if chunks.is_empty() {
            return Err(ReduceError::NothingToSummarize);
        }

        let mut shutdown = pin!(shutdown);
        let batch = self.map_chunks(chunks, shutdown.as_mut()).await?;
        self.fold_until(batch, shutdown).await
    }

    /// Summarize every chunk, recording failures as absent entries.
    pub async fn summarize_chunks(&self, chunks: &[Chunk]) -> Result<SummaryBatch, ReduceError> {
        self.map_chunks(chunks, pin!(pending::<()>())).await
    }

    /// Fold an already computed batch into a final summary.
    pub async fn fold(&self, batch: SummaryBatch) -> Result<Reduction, ReduceError> {
        self.fold_until(batch, pin!(pending::<()>())).await
    }

    async fn map_chunks<F>(
        &self,
        chunks: &[Chunk],
        mut shutdown: Pin<&mut F>,
    ) -> Result<SummaryBatch, ReduceError>
    where
        F: Future<Output = ()>,
    {
        let total = chunks.len();
        let mut slots: Vec<Option<ChunkSummary>> = (0..total).map(|_| None).collect();

        let mut in_flight = stream::iter(chunks.iter().enumerate())
            .map(|(slot, chunk)| async move {
                self.observer.chunk_started(chunk.index, total);
                let result = self.client.summarize(&chunk.text, SummaryMode::Chunk).await;
                (slot, chunk.index, result)
            })
            .buffer_unordered(self.concurrency);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::warn!(total, "Run cancelled while summarizing chunks");
                    let completed = slots.into_iter().flatten().collect();
                    return Err(ReduceError::Cancelled { completed, total });
                }
                next = in_flight.next() => {
                    let Some((slot, index, result)) = next else {
                        break;
                    };
                    slots[slot] = Some(self.record(index, total, result));
                }
            }
        }

        let summaries = slots
            .into_iter()
            .zip(chunks)
            .map(|(slot, chunk)| slot.unwrap_or_else(|| ChunkSummary::failed(chunk.index)))
            .collect();
        Ok(SummaryBatch::new(summaries))
    }

    fn record(
        &self,
        index: usize,
        total: usize,
        result: Result<String, SummarizeError>,
    ) -> ChunkSummary {
        match result {
            Ok(text) => {
                self.observer.chunk_succeeded(index, total);
                ChunkSummary::succeeded(index, text)
            }
            Err(error) => {
                tracing::warn!(
                    chunk = index + 1,
                    total,
                    error = %error,
                    "Failed to summarize chunk"
                );
                self.observer.chunk_failed(index, total, &error);
                ChunkSummary::failed(index)
            }
        }
    }

    async fn fold_until<F>(
        &self,
        batch: SummaryBatch,
        shutdown: Pin<&mut F>,
    ) -> Result<Reduction, ReduceError>
    where
        F: Future<Output = ()>,
    {
        let present = batch.present();
        match present.len() {
            0 => Err(ReduceError::AllChunksFailed {
                failures: batch.len(),
            }),
            1 => {
                let summary = present[0].to_string();
                Ok(Reduction {
                    summary,
                    batch,
                    merged: false,
                })
            }
            count => {
                let combined = present.join(SUMMARY_DIVIDER);
                let estimated_tokens = estimate_tokens(&combined);
                if estimated_tokens > self.merge_input_warn_tokens {
                    tracing::warn!(
                        estimated_tokens,
                        threshold = self.merge_input_warn_tokens,
                        summaries = count,
                        "Merge input exceeds expected token budget; provider may truncate it"
                    );
                }

                self.observer.merge_started(count);
                let merged = tokio::select! {
                    biased;
                    () = shutdown => {
                        tracing::warn!("Run cancelled while merging chunk summaries");
                        return Err(ReduceError::Cancelled {
                            total: batch.len(),
                            completed: batch.summaries().to_vec(),
                        });
                    }
                    result = self.client.summarize(&combined, SummaryMode::Merge) => result,
                };
                self.observer.merge_finished(merged.is_ok());

                match merged {
                    Ok(summary) => Ok(Reduction {
                        summary,
                        batch,
                        merged: true,
                    }),
                    Err(cause) => Err(ReduceError::MergeFailed { cause }),
                }
            }
        }
    }
}
