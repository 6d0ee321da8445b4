use anyhow::{Context, Result};
use clap::Parser;
use rustysum::{
    config, logging,
    metrics::RunMetrics,
    processing::{ObserverSet, SummarizationPipeline, TracingProgress, io},
    summarization,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "rustysum",
    version,
    about = "Summarize arbitrarily long text by chunking, summarizing, and merging"
)]
struct Cli {
    /// Source document (defaults to RUSTYSUM_INPUT_PATH or input.txt).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Destination for the final summary (defaults to RUSTYSUM_OUTPUT_PATH or output.txt).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Word budget per chunk (defaults to MAX_WORDS_PER_CHUNK or 60000).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_words_per_chunk: Option<u64>,
    /// Chunk summaries allowed in flight (defaults to SUMMARIZER_CONCURRENCY or 1).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    concurrency: Option<u64>,
    /// Optional path for a JSON run report.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %format!("{err:#}"), "Failed to generate summary");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_tracing();

    let input = cli.input.unwrap_or_else(|| config.input_path.clone());
    let output = cli.output.unwrap_or_else(|| config.output_path.clone());
    let max_words_per_chunk = cli
        .max_words_per_chunk
        .map(|value| value as usize)
        .unwrap_or(config.max_words_per_chunk);
    let concurrency = cli
        .concurrency
        .map(|value| value as usize)
        .unwrap_or(config.summarizer_concurrency);

    tracing::info!(path = %input.display(), "Reading input");
    let document = io::load_document(&input).await?;

    let client = summarization::build_summarization_client(config)
        .context("failed to initialize summarization provider")?;
    let metrics = Arc::new(RunMetrics::new());
    let observer = ObserverSet::default()
        .with(Arc::new(TracingProgress))
        .with(metrics.clone());
    let mut pipeline_config = config.clone();
    pipeline_config.summarizer_concurrency = concurrency;
    let pipeline = SummarizationPipeline::from_config(client, &pipeline_config, Arc::new(observer));

    tracing::info!(max_words_per_chunk, concurrency, "Starting summarization process");
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        tracing::warn!("Interrupt received; abandoning in-flight requests");
    };
    let (summary, report) = pipeline
        .run_until(&document, max_words_per_chunk, shutdown)
        .await?;

    if let Err(error) = io::save_summary(&output, &summary).await {
        println!("{summary}");
        return Err(error).context("summary was generated but could not be saved; printed to stdout");
    }

    if let Some(path) = cli.report {
        io::save_report(&path, &report).await?;
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        chunks = snapshot.chunks_planned,
        failed = snapshot.chunks_failed,
        timeouts = snapshot.timeouts,
        merge_calls = snapshot.merge_calls,
        output = %output.display(),
        "Summary generated successfully"
    );
    Ok(())
}
