//! End-to-end executor runs over the full pipeline: rules planning, step
//! execution with templating, citation collection, and output synthesis.

use async_trait::async_trait;
use sdk::tool::Tool;
use sdk::types::{ToolError, ToolId, ToolInput};
use serde_json::{json, Value};
use std::sync::Arc;
use strand_engine::config::{EngineConfig, PlannerMode};
use strand_engine::executor::{MemorySink, StepStatus};
use strand_engine::job::JobRunner;
use strand_engine::quota::{InMemoryQuotaGate, UnlimitedQuotaGate};
use strand_engine::tools::ToolRegistry;

/// Search double returning fixed results.
struct FakeSearchTool;

#[async_trait]
impl Tool for FakeSearchTool {
    fn id(&self) -> ToolId {
        ToolId::WebSearch
    }

    async fn invoke(&self, _input: &ToolInput) -> Result<Value, ToolError> {
        Ok(json!({
            "results": [
                {"url": "https://rust-lang.org/async", "title": "Async Rust", "snippet": "s"},
                {"url": "https://tokio.rs", "title": "Tokio", "snippet": "s"}
            ]
        }))
    }
}

/// Page-text double that requires a real (non-placeholder) URL.
struct FakePageTextTool;

#[async_trait]
impl Tool for FakePageTextTool {
    fn id(&self) -> ToolId {
        ToolId::WebPageText
    }

    async fn invoke(&self, input: &ToolInput) -> Result<Value, ToolError> {
        let url = input.param_str("url")?;
        if url.starts_with("{{") {
            return Err(ToolError::InvalidParameter {
                name: "url".to_string(),
                reason: "unresolved placeholder".to_string(),
            });
        }
        Ok(json!({
            "url": url,
            "title": "Async Rust",
            "text": "Asynchronous programming in Rust is built around futures. \
                     The executor polls futures until they complete their work.",
            "truncated": false,
        }))
    }
}

fn registry_with_fakes() -> ToolRegistry {
    let mut registry = ToolRegistry::with_builtins();
    registry.register(Arc::new(FakeSearchTool));
    registry.register(Arc::new(FakePageTextTool));
    registry
}

fn config(max_steps: usize) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.planner.mode = PlannerMode::Rules;
    config.planner.max_steps = max_steps;
    config
}

#[tokio::test]
async fn research_pipeline_threads_outputs_through_templates() {
    let sink = Arc::new(MemorySink::new());
    let runner = JobRunner::new(
        config(3),
        Arc::new(registry_with_fakes()),
        Arc::new(UnlimitedQuotaGate),
        sink.clone(),
        None,
    );

    let outcome = runner
        .run("search for rust async and summarize the result", "tenant-a")
        .await;

    assert!(outcome.result.success, "error: {:?}", outcome.result.error);
    assert_eq!(outcome.metadata.step_count, 3);

    let records = sink.latest_records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.status == StepStatus::Done));
    assert_eq!(records[0].tool, ToolId::WebSearch);
    assert_eq!(records[1].tool, ToolId::WebPageText);
    assert_eq!(records[2].tool, ToolId::WebSummarize);

    let payload: Value =
        serde_json::from_str(&outcome.result.final_output).expect("valid final payload");

    // One line per executed step
    let summary = payload.get("summary").and_then(|s| s.as_str()).expect("summary");
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("Found 2 search results"));
    assert!(summary.contains("Extracted text from 'Async Rust'"));

    // Search results and the fetched page are all cited, deduplicated
    let citations = payload.get("citations").and_then(|c| c.as_array()).expect("citations");
    let urls: Vec<&str> = citations
        .iter()
        .filter_map(|c| c.get("url").and_then(|u| u.as_str()))
        .collect();
    assert!(urls.contains(&"https://rust-lang.org/async"));
    assert!(urls.contains(&"https://tokio.rs"));
    let unique: std::collections::HashSet<&&str> = urls.iter().collect();
    assert_eq!(unique.len(), urls.len(), "citations must be deduplicated");
}

#[tokio::test]
async fn quota_exhaustion_mid_run_fails_with_step_number() {
    let sink = Arc::new(MemorySink::new());
    let runner = JobRunner::new(
        config(3),
        Arc::new(registry_with_fakes()),
        Arc::new(InMemoryQuotaGate::new(1)),
        sink.clone(),
        None,
    );

    let outcome = runner
        .run("search for rust async and summarize the result", "tenant-a")
        .await;

    assert!(!outcome.result.success);
    let error = outcome.result.error.expect("error message");
    assert!(error.starts_with("Step 2 failed: "), "got: {}", error);

    let records = sink.latest_records();
    assert_eq!(records[0].status, StepStatus::Done);
    assert_eq!(records[1].status, StepStatus::Pending);
    assert_eq!(records[2].status, StepStatus::Pending);
}

#[tokio::test]
async fn echo_only_run_produces_payload_without_citations() {
    let sink = Arc::new(MemorySink::new());
    let runner = JobRunner::new(
        config(3),
        Arc::new(ToolRegistry::with_builtins()),
        Arc::new(UnlimitedQuotaGate),
        sink.clone(),
        None,
    );

    let outcome = runner.run("echo hello world", "tenant-a").await;

    assert!(outcome.result.success);
    let payload: Value =
        serde_json::from_str(&outcome.result.final_output).expect("valid final payload");
    assert_eq!(payload.get("citations"), Some(&json!([])));
    assert!(payload
        .get("summary")
        .and_then(|s| s.as_str())
        .is_some_and(|s| s.starts_with("Echo result:")));
}

#[tokio::test]
async fn audit_trail_reaches_sink_in_order() {
    let sink = Arc::new(MemorySink::new());
    let runner = JobRunner::new(
        config(3),
        Arc::new(ToolRegistry::with_builtins()),
        Arc::new(UnlimitedQuotaGate),
        sink.clone(),
        None,
    );

    let outcome = runner.run("echo hello", "tenant-a").await;
    assert!(outcome.result.success);

    let (metadata, steps) = sink.plan().expect("plan recorded");
    assert_eq!(metadata.step_count, steps.len());

    // Snapshots arrive pending → running → done for the single step
    let snapshots = sink.snapshots();
    let statuses: Vec<StepStatus> = snapshots.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![StepStatus::Pending, StepStatus::Running, StepStatus::Done]
    );

    // Step N reaches a terminal state before anything later is emitted
    assert!(snapshots
        .iter()
        .zip(snapshots.iter().skip(1))
        .all(|(a, b)| a.step_number <= b.step_number));
}
