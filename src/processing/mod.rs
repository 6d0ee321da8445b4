//! Summarization pipeline: chunking, per-chunk summaries, and the final merge.

pub mod chunking;
pub mod io;
pub mod progress;
pub mod reducer;
mod service;
pub mod types;

pub use chunking::chunk_document;
pub use progress::{NoopProgress, ObserverSet, ProgressObserver, TracingProgress};
pub use reducer::{Reducer, SUMMARY_DIVIDER};
pub use service::SummarizationPipeline;
pub use types::{
    Chunk, ChunkSummary, ChunkingError, FinalSummary, PipelineError, ReduceError, Reduction,
    RunReport, SummaryBatch,
};
