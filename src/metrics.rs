use crate::processing::ProgressObserver;
use crate::summarization::SummarizeError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct RunMetrics {
    chunks_planned: AtomicU64,
    chunks_succeeded: AtomicU64,
    chunks_failed: AtomicU64,
    timeouts: AtomicU64,
    merge_calls: AtomicU64,
    merge_failures: AtomicU64,
}

impl RunMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_planned: self.chunks_planned.load(Ordering::Relaxed),
            chunks_succeeded: self.chunks_succeeded.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            merge_calls: self.merge_calls.load(Ordering::Relaxed),
            merge_failures: self.merge_failures.load(Ordering::Relaxed),
        }
    }
}

impl ProgressObserver for RunMetrics {
    fn chunking_finished(&self, chunks: usize, _words: usize) {
        self.chunks_planned
            .fetch_add(chunks as u64, Ordering::Relaxed);
    }

    fn chunk_succeeded(&self, _index: usize, _total: usize) {
        self.chunks_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn chunk_failed(&self, _index: usize, _total: usize, error: &SummarizeError) {
        self.chunks_failed.fetch_add(1, Ordering::Relaxed);
        if matches!(error, SummarizeError::Timeout) {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn merge_started(&self, _summaries: usize) {
        self.merge_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn merge_finished(&self, success: bool) {
        if !success {
            self.merge_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Immutable view of run counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Chunks produced by the chunker.
    pub chunks_planned: u64,
    /// Chunk calls that returned a summary.
    pub chunks_succeeded: u64,
    /// Chunk calls that failed and were recorded as absent.
    pub chunks_failed: u64,
    /// Failed chunk calls that hit the provider timeout.
    pub timeouts: u64,
    /// Merge calls issued.
    pub merge_calls: u64,
    /// Merge calls that failed.
    pub merge_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_chunk_outcomes() {
        let metrics = RunMetrics::new();
        metrics.chunking_finished(3, 30);
        metrics.chunk_succeeded(0, 3);
        metrics.chunk_failed(1, 3, &SummarizeError::Timeout);
        metrics.chunk_failed(2, 3, &SummarizeError::InvalidInput);
        metrics.merge_started(1);
        metrics.merge_finished(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.chunks_planned, 3);
        assert_eq!(snapshot.chunks_succeeded, 1);
        assert_eq!(snapshot.chunks_failed, 2);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.merge_calls, 1);
        assert_eq!(snapshot.merge_failures, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let snapshot = RunMetrics::new().snapshot();
        assert_eq!(snapshot.chunks_planned, 0);
        assert_eq!(snapshot.merge_calls, 0);
    }
}
