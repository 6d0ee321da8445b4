#![deny(missing_docs)]

//! Core library for Rusty Summary, a map-reduce summarizer for arbitrarily long text.

/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Run counters fed by pipeline progress events.
pub mod metrics;
/// Chunking, reduction, and the pipeline driver.
pub mod processing;
/// Summarization provider abstraction and adapters.
pub mod summarization;
