//! Job orchestration
//!
//! One [`JobRunner`] serves many jobs: each call to [`JobRunner::run`]
//! selects a plan for the prompt, executes it, and emits the audit trail
//! through the configured sink. Runs are independent; concurrency across
//! jobs is the host's scheduler's business.

use crate::config::EngineConfig;
use crate::executor::{CancelFlag, ExecutionResult, Executor, StepSink};
use crate::llm::LlmProvider;
use crate::planner::{PlanMetadata, PlanSelector};
use crate::tools::ToolRegistry;
use sdk::tool::QuotaGate;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Everything a host gets back from one run.
#[derive(Debug)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub result: ExecutionResult,
    pub metadata: PlanMetadata,
}

/// Runs prompts through the plan → execute pipeline.
pub struct JobRunner {
    config: EngineConfig,
    selector: PlanSelector,
    tools: Arc<ToolRegistry>,
    quota: Arc<dyn QuotaGate>,
    sink: Arc<dyn StepSink>,
}

impl JobRunner {
    /// Assemble a runner from caller-supplied parts.
    ///
    /// The provider handle is only consulted when the configured planner
    /// mode is `llm`; without one, LLM mode degrades to the fallback chain.
    pub fn new(
        config: EngineConfig,
        tools: Arc<ToolRegistry>,
        quota: Arc<dyn QuotaGate>,
        sink: Arc<dyn StepSink>,
        provider: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let selector = PlanSelector::from_mode(config.planner.mode, provider);
        Self {
            config,
            selector,
            tools,
            quota,
            sink,
        }
    }

    /// Run one prompt to completion.
    pub async fn run(&self, prompt: &str, tenant_id: &str) -> JobOutcome {
        self.run_with_cancel(prompt, tenant_id, CancelFlag::new()).await
    }

    /// Run one prompt with a host-held cancellation flag.
    pub async fn run_with_cancel(
        &self,
        prompt: &str,
        tenant_id: &str,
        cancel: CancelFlag,
    ) -> JobOutcome {
        let job_id = Uuid::new_v4();
        info!(job_id = %job_id, tenant_id, "job_started");

        let (plan, metadata) = self
            .selector
            .create_plan(
                prompt,
                &self.config.planner.allowed_tools,
                self.config.planner.max_steps,
            )
            .await;

        let executor = Executor::new(
            Arc::clone(&self.tools),
            Arc::clone(&self.quota),
            Arc::clone(&self.sink),
        )
        .with_cancel_flag(cancel);

        let result = executor
            .execute(&plan, prompt, tenant_id, Some(&metadata))
            .await;

        info!(
            job_id = %job_id,
            success = result.success,
            mode = %metadata.mode,
            steps = metadata.step_count,
            "job_finished"
        );

        JobOutcome {
            job_id,
            result,
            metadata,
        }
    }
}
