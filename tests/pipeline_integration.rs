use std::sync::Arc;
use std::time::Duration;

use httpmock::{Method::POST, MockServer};
use rustysum::{
    metrics::RunMetrics,
    processing::{PipelineError, Reducer, SummarizationPipeline, io},
    summarization::{OpenRouterSummarizationClient, PromptTemplates},
};
use serde_json::json;

fn client(server: &MockServer) -> Arc<OpenRouterSummarizationClient> {
    Arc::new(
        OpenRouterSummarizationClient::new(
            "sk-integration".into(),
            PromptTemplates::default(),
            Duration::from_secs(5),
        )
        .expect("client")
        .with_base_url(server.base_url())
        .with_model("test/model"),
    )
}

fn document() -> String {
    [
        vec!["red"; 4].join(" "),
        vec!["green"; 4].join(" "),
        vec!["blue"; 2].join(" "),
    ]
    .join("\n\n")
}

#[tokio::test]
async fn summarizes_chunks_and_merges_them_in_order() {
    let server = MockServer::start_async().await;
    let red = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Text to summarize:")
                .body_contains("red red red red");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "summary-red" } }] }));
        })
        .await;
    let green = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Text to summarize:")
                .body_contains("green green green green");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "summary-green" } }] }));
        })
        .await;
    let blue = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Text to summarize:")
                .body_contains("blue blue");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "summary-blue" } }] }));
        })
        .await;
    let merge = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Combine these summaries")
                .body_contains(
                    "summary-red\\n\\n--- CHUNK SUMMARY ---\\n\\nsummary-green\\n\\n--- CHUNK SUMMARY ---\\n\\nsummary-blue",
                );
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "final summary" } }] }));
        })
        .await;

    let metrics = Arc::new(RunMetrics::new());
    let pipeline = SummarizationPipeline::new(
        Reducer::new(client(&server))
            .with_concurrency(3)
            .with_observer(metrics.clone()),
    );

    let (summary, report) = pipeline
        .run_with_report(&document(), 4)
        .await
        .expect("summary");

    assert_eq!(summary, "final summary");
    red.assert_hits_async(1).await;
    green.assert_hits_async(1).await;
    blue.assert_hits_async(1).await;
    merge.assert_hits_async(1).await;
    assert_eq!(report.chunk_count, 3);
    assert!(report.merged);
    assert_eq!(metrics.snapshot().merge_calls, 1);
}

#[tokio::test]
async fn failed_chunk_is_skipped_and_survivors_are_merged() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Text to summarize:")
                .body_contains("red red red red");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "summary-red" } }] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Text to summarize:")
                .body_contains("green green green green");
            then.status(503).body("overloaded");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Text to summarize:")
                .body_contains("blue blue");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "summary-blue" } }] }));
        })
        .await;
    let merge = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("summary-red\\n\\n--- CHUNK SUMMARY ---\\n\\nsummary-blue");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "merged" } }] }));
        })
        .await;

    let pipeline = SummarizationPipeline::new(Reducer::new(client(&server)));
    let (summary, report) = pipeline
        .run_with_report(&document(), 4)
        .await
        .expect("summary");

    assert_eq!(summary, "merged");
    assert_eq!(report.failed_chunks, vec![1]);
    assert_eq!(report.succeeded, 2);
    merge.assert_hits_async(1).await;
}

#[tokio::test]
async fn every_chunk_failing_is_fatal() {
    let server = MockServer::start_async().await;
    let chunk_calls = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).body("boom");
        })
        .await;

    let pipeline = SummarizationPipeline::new(Reducer::new(client(&server)));
    let error = pipeline.run(&document(), 4).await.unwrap_err();

    assert!(matches!(error, PipelineError::AllChunksFailed { failures: 3 }));
    chunk_calls.assert_hits_async(3).await;
}

#[tokio::test]
async fn empty_input_file_makes_no_provider_calls() {
    let server = MockServer::start_async().await;
    let any_call = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "x" } }] }));
        })
        .await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.txt");
    std::fs::write(&path, "   \n\n  ").unwrap();

    let document = io::load_document(&path).await.unwrap();
    let pipeline = SummarizationPipeline::new(Reducer::new(client(&server)));
    let error = pipeline.run(&document, 60_000).await.unwrap_err();

    assert!(matches!(error, PipelineError::NothingToSummarize));
    assert_eq!(any_call.hits_async().await, 0);
}

#[tokio::test]
async fn merge_failure_surfaces_cause() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Text to summarize:");
            then.status(200)
                .json_body(json!({ "choices": [{ "message": { "content": "partial" } }] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Combine these summaries");
            then.status(502).body("bad gateway");
        })
        .await;

    let pipeline = SummarizationPipeline::new(Reducer::new(client(&server)));
    let error = pipeline.run(&document(), 4).await.unwrap_err();

    assert!(error.to_string().contains("failed to create final summary"));
    assert!(matches!(error, PipelineError::MergeFailed { .. }));
}
