//! Progress callbacks emitted while a run is in flight.
//!
//! The reducer never prints; it notifies a [`ProgressObserver`]. Every method has a no-op
//! default so observers only implement the events they care about.

use crate::summarization::SummarizeError;
use std::sync::Arc;

/// Receives pipeline progress events. Calls happen on the task driving the run.
pub trait ProgressObserver: Send + Sync {
    /// The document was split into `chunks` chunks holding `words` words.
    fn chunking_finished(&self, _chunks: usize, _words: usize) {}
    /// A chunk call was dispatched.
    fn chunk_started(&self, _index: usize, _total: usize) {}
    /// A chunk call returned a summary.
    fn chunk_succeeded(&self, _index: usize, _total: usize) {}
    /// A chunk call failed; the chunk is recorded as absent.
    fn chunk_failed(&self, _index: usize, _total: usize, _error: &SummarizeError) {}
    /// The merge call over `summaries` chunk summaries was dispatched.
    fn merge_started(&self, _summaries: usize) {}
    /// The merge call returned.
    fn merge_finished(&self, _success: bool) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}

/// Observer that reports progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn chunking_finished(&self, chunks: usize, words: usize) {
        tracing::info!(chunks, words, "Processing chunks");
    }

    fn chunk_started(&self, index: usize, total: usize) {
        tracing::info!(chunk = index + 1, total, "Summarizing chunk");
    }

    fn chunk_succeeded(&self, index: usize, total: usize) {
        tracing::info!(chunk = index + 1, total, "Chunk summarized");
    }

    fn merge_started(&self, summaries: usize) {
        tracing::info!(summaries, "Creating final summary from chunk summaries");
    }

    fn merge_finished(&self, success: bool) {
        tracing::debug!(success, "Merge call finished");
    }
}

/// Fans each event out to several observers, in order.
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ObserverSet {
    /// Build a set from existing observers.
    pub fn new(observers: Vec<Arc<dyn ProgressObserver>>) -> Self {
        Self { observers }
    }

    /// Add another observer.
    pub fn with(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl ProgressObserver for ObserverSet {
    fn chunking_finished(&self, chunks: usize, words: usize) {
        for observer in &self.observers {
            observer.chunking_finished(chunks, words);
        }
    }

    fn chunk_started(&self, index: usize, total: usize) {
        for observer in &self.observers {
            observer.chunk_started(index, total);
        }
    }

    fn chunk_succeeded(&self, index: usize, total: usize) {
        for observer in &self.observers {
            observer.chunk_succeeded(index, total);
        }
    }

    fn chunk_failed(&self, index: usize, total: usize, error: &SummarizeError) {
        for observer in &self.observers {
            observer.chunk_failed(index, total, error);
        }
    }

    fn merge_started(&self, summaries: usize) {
        for observer in &self.observers {
            observer.merge_started(summaries);
        }
    }

    fn merge_finished(&self, success: bool) {
        for observer in &self.observers {
            observer.merge_finished(success);
        }
    }
}
