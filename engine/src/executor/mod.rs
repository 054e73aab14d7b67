//! Step executor
//!
//! Interprets a validated plan strictly in step order: resolves templated
//! references against prior outputs, reserves per-tenant quota, dispatches
//! the tool, and records every state transition. Execution is fail-fast: the
//! first failing step aborts the run, because later steps may structurally
//! depend on its output through templating. Step N's record reaches a
//! terminal state before step N+1 begins.

pub mod output;
pub mod sink;
pub mod template;

pub use sink::{MemorySink, NullSink, StepSink};

use crate::planner::{Plan, PlanMetadata};
use crate::tools::ToolRegistry;
use chrono::{DateTime, Utc};
use sdk::errors::CoreError;
use sdk::tool::{QuotaDecision, QuotaGate};
use sdk::types::{Citation, ToolId, ToolInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Lifecycle state of one step.
///
/// Transitions only `Pending → Running → {Done, Error}`; terminal states are
/// immutable. A step left `Pending` after a run ended was never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Done | StepStatus::Error)
    }

    fn can_transition_to(&self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::Running)
                | (StepStatus::Running, StepStatus::Done)
                | (StepStatus::Running, StepStatus::Error)
        )
    }
}

/// Audit record of one step's execution, mutated only by the executor.
#[derive(Debug, Clone, Serialize)]
pub struct StepExecutionRecord {
    pub id: Uuid,
    pub step_number: usize,
    pub tool: ToolId,
    pub status: StepStatus,

    /// Safe summary of the step input; never full payloads
    pub input_summary: Value,

    /// Scrubbed, capped summary of the tool output
    pub output_summary: Option<String>,

    /// Scrubbed, capped error message
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl StepExecutionRecord {
    fn new(step_number: usize, tool: ToolId, input_summary: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            step_number,
            tool,
            status: StepStatus::Pending,
            input_summary,
            output_summary: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            duration_ms: None,
        }
    }

    fn transition(&mut self, next: StepStatus) -> bool {
        if !self.status.can_transition_to(next) {
            error!(
                step = self.step_number,
                from = ?self.status,
                to = ?next,
                "illegal_step_transition"
            );
            return false;
        }
        self.status = next;
        true
    }

    fn begin(&mut self) {
        if self.transition(StepStatus::Running) {
            self.started_at = Some(Utc::now());
        }
    }

    fn finish(&mut self, output_summary: String) {
        if self.transition(StepStatus::Done) {
            let now = Utc::now();
            self.output_summary = Some(output_summary);
            self.completed_at = Some(now);
            self.duration_ms = self
                .started_at
                .map(|started| (now - started).num_milliseconds());
        }
    }

    fn fail(&mut self, error: String) {
        if self.transition(StepStatus::Error) {
            let now = Utc::now();
            self.error = Some(error);
            self.completed_at = Some(now);
            self.duration_ms = self
                .started_at
                .map(|started| (now - started).num_milliseconds());
        }
    }
}

/// Final outcome of one run.
///
/// `success` is true iff every attempted step reached `Done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,

    /// Serialized structured payload from the output synthesizer
    pub final_output: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            final_output: String::new(),
            error: Some(message),
        }
    }
}

/// Coarse, best-effort cancellation: prevents the next step from starting
/// but cannot interrupt a step already mid-invocation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes validated plans. One instance per job; owns no shared state of
/// its own. The quota gate and tool registry it borrows must be safe for
/// concurrent use across jobs.
pub struct Executor {
    tools: Arc<ToolRegistry>,
    quota: Arc<dyn QuotaGate>,
    sink: Arc<dyn StepSink>,
    cancel: CancelFlag,
}

impl Executor {
    pub fn new(tools: Arc<ToolRegistry>, quota: Arc<dyn QuotaGate>, sink: Arc<dyn StepSink>) -> Self {
        Self {
            tools,
            quota,
            sink,
            cancel: CancelFlag::new(),
        }
    }

    /// Attach a cancellation flag shared with the host.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute a plan step by step.
    ///
    /// Steps run strictly in order; the loop stops at the first quota
    /// denial, tool failure, or cancellation. Steps never attempted keep
    /// their `Pending` records.
    pub async fn execute(
        &self,
        plan: &Plan,
        prompt: &str,
        tenant_id: &str,
        metadata: Option<&PlanMetadata>,
    ) -> ExecutionResult {
        let mut results: Vec<Value> = Vec::new();
        let mut citations: Vec<Citation> = Vec::new();

        let derived_metadata;
        let metadata = match metadata {
            Some(metadata) => metadata,
            None => {
                derived_metadata = PlanMetadata {
                    mode: plan.mode,
                    step_count: plan.steps.len(),
                    fallback_reason: None,
                    error: plan.llm_error.clone(),
                };
                &derived_metadata
            }
        };
        self.sink.on_plan(metadata, &plan.steps);

        // All records exist up front so never-attempted steps are visible
        // as pending in the audit trail.
        let mut records: Vec<StepExecutionRecord> = plan
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                StepExecutionRecord::new(i + 1, step.tool, output::step_input_summary(step))
            })
            .collect();
        for record in &records {
            self.sink.on_step(record);
        }

        for (i, step) in plan.steps.iter().enumerate() {
            let step_number = i + 1;

            if self.cancel.is_cancelled() {
                info!(step = step_number, "run_cancelled");
                return ExecutionResult::failure(CoreError::Cancelled.to_string());
            }

            // Quota denial aborts the whole run; the denied step and all
            // later steps stay pending.
            if let QuotaDecision::Denied { reason } =
                self.quota.check_and_reserve(tenant_id).await
            {
                warn!(step = step_number, tenant_id, "tool_quota_exceeded");
                let err = CoreError::QuotaExceeded {
                    step: step_number,
                    reason,
                };
                return ExecutionResult::failure(err.to_string());
            }

            let resolved = template::resolve_input(&step.input, &results);
            let input = ToolInput::from_map(resolved);

            let record = &mut records[i];
            record.begin();
            self.sink.on_step(record);

            match self.tools.invoke(step.tool, &input).await {
                Ok(result) => {
                    extract_citations(step.tool, &result, &mut citations);

                    let summary =
                        output::scrub_and_cap(&output::step_output_summary(step.tool, &result));
                    record.finish(summary);
                    self.sink.on_step(record);

                    info!(
                        step = step_number,
                        tool = %step.tool,
                        duration_ms = record.duration_ms,
                        "step_done"
                    );
                    results.push(result);
                }
                Err(err) => {
                    let message = output::scrub_and_cap(&err.to_string());
                    record.fail(message.clone());
                    self.sink.on_step(record);

                    // Log the error class only; the capped message goes to
                    // the caller, never raw tool output.
                    error!(
                        step = step_number,
                        tool = %step.tool,
                        error_type = error_type_tag(&err),
                        "plan_execution_failed"
                    );
                    let failure = CoreError::ToolExecution {
                        step: step_number,
                        message,
                    };
                    return ExecutionResult::failure(failure.to_string());
                }
            }
        }

        let final_output = output::synthesize(prompt, &plan.steps, &results, &citations);
        self.sink.on_final(&final_output);

        ExecutionResult {
            success: true,
            final_output,
            error: None,
        }
    }
}

fn error_type_tag(err: &sdk::types::ToolError) -> &'static str {
    use sdk::types::ToolError;
    match err {
        ToolError::UnknownTool(_) => "unknown_tool",
        ToolError::NotEnabled(_) => "not_enabled",
        ToolError::MissingParameter(_) => "missing_parameter",
        ToolError::InvalidParameter { .. } => "invalid_parameter",
        ToolError::UrlBlocked(_) => "url_blocked",
        ToolError::Http(_) => "http",
        ToolError::Timeout => "timeout",
        ToolError::ResponseTooLarge { .. } => "response_too_large",
        ToolError::Execution(_) => "execution",
    }
}

/// Pull citations out of a tool result: https URLs with optional titles.
fn extract_citations(tool: ToolId, result: &Value, citations: &mut Vec<Citation>) {
    match tool {
        ToolId::WebSearch => {
            let Some(results) = result.get("results").and_then(|r| r.as_array()) else {
                return;
            };
            for entry in results {
                let url = entry.get("url").and_then(|u| u.as_str()).unwrap_or("");
                let title = entry.get("title").and_then(|t| t.as_str()).unwrap_or("");
                if url.starts_with("https://") {
                    citations.push(Citation::new(url, title));
                }
            }
        }
        ToolId::WebPageText | ToolId::HttpFetch => {
            let url = result.get("url").and_then(|u| u.as_str()).unwrap_or("");
            let title = result.get("title").and_then(|t| t.as_str()).unwrap_or("");
            if url.starts_with("https://") {
                citations.push(Citation::new(url, title));
            }
        }
        ToolId::Echo | ToolId::WebSummarize | ToolId::BuildRepo => {}
    }
}
