//! Planning
//!
//! Turns a prompt into a validated [`Plan`]: either deterministically
//! ([`rules`]) or via an LLM provider whose output is re-validated through
//! the security gate ([`llm`]). The [`PlanSelector`] drives the configured
//! mode and the LLM → rules fallback chain.

pub mod llm;
pub mod rules;
pub mod security;

pub use llm::LlmPlanner;

use crate::config::PlannerMode;
use crate::llm::LlmProvider;
use sdk::types::ToolId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Template placeholder referencing the top search result's URL.
pub const SEARCH_RESULT_0_URL: &str = "{{search_result_0_url}}";

/// Template placeholder referencing the previous step's text output.
pub const PREVIOUS_TEXT: &str = "{{previous_text}}";

/// Which path produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Rule-based planner
    Rules,

    /// Validated LLM plan
    Llm,

    /// Rule-based plan produced after an LLM planning failure
    LlmFallback,
}

impl fmt::Display for PlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanMode::Rules => write!(f, "rules"),
            PlanMode::Llm => write!(f, "llm"),
            PlanMode::LlmFallback => write!(f, "llm_fallback"),
        }
    }
}

/// A single step in an execution plan.
///
/// Input values may contain deferred template placeholders that the executor
/// resolves from earlier step outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub tool: ToolId,
    pub input: serde_json::Map<String, serde_json::Value>,
    pub description: String,
}

/// Validated execution plan for one job.
///
/// Ephemeral: created once per invocation and handed to the executor; only
/// [`PlanMetadata`] and the flattened step list reach the audit sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,

    /// Brief explanation of why this plan was chosen
    pub reasoning: String,

    pub mode: PlanMode,

    /// Error from the LLM planner if this plan is a fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_error: Option<String>,
}

/// Metadata about the planning process.
///
/// Safe to persist and log: never contains secrets or raw LLM text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub mode: PlanMode,
    pub step_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured fallback signal from the LLM planner.
///
/// `reason` is a safe classification of what went wrong; `error` is an
/// optional diagnostic, also scrubbed of raw LLM text.
#[derive(Debug, Clone)]
pub struct PlanFallback {
    pub reason: String,
    pub error: Option<String>,
}

/// Orchestrates the LLM → rules fallback chain based on the configured mode.
pub struct PlanSelector {
    mode: PlannerMode,
    llm_planner: Option<LlmPlanner>,
}

impl PlanSelector {
    /// Selector that always uses the rule-based planner.
    pub fn rules() -> Self {
        Self {
            mode: PlannerMode::Rules,
            llm_planner: None,
        }
    }

    /// Selector that tries the LLM planner first, falling back to rules.
    pub fn llm(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            mode: PlannerMode::Llm,
            llm_planner: Some(LlmPlanner::new(provider)),
        }
    }

    /// Build from the configured mode and an optional provider handle.
    ///
    /// LLM mode without a provider is valid configuration: every plan then
    /// takes the fallback path with a "not configured" reason.
    pub fn from_mode(mode: PlannerMode, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        match (mode, provider) {
            (PlannerMode::Llm, Some(provider)) => Self::llm(provider),
            (mode, _) => Self {
                mode,
                llm_planner: None,
            },
        }
    }

    /// Create an execution plan for the given prompt.
    ///
    /// Never fails: LLM planning failures are absorbed into the fallback
    /// chain and surface only through the returned metadata.
    pub async fn create_plan(
        &self,
        prompt: &str,
        allowed_tools: &[ToolId],
        max_steps: usize,
    ) -> (Plan, PlanMetadata) {
        if self.mode == PlannerMode::Llm {
            let fallback = match &self.llm_planner {
                Some(planner) => match planner.plan(prompt, allowed_tools, max_steps).await {
                    Ok(plan) => {
                        let metadata = PlanMetadata {
                            mode: PlanMode::Llm,
                            step_count: plan.steps.len(),
                            fallback_reason: None,
                            error: None,
                        };
                        info!(steps = plan.steps.len(), "planner_llm_success");
                        return (plan, metadata);
                    }
                    Err(fallback) => fallback,
                },
                None => PlanFallback {
                    reason: "LLM planner not configured".to_string(),
                    error: None,
                },
            };

            info!(reason = %fallback.reason, "planner_llm_fallback");

            let mut plan = rules::create_plan(prompt, allowed_tools, max_steps);
            plan.mode = PlanMode::LlmFallback;
            plan.llm_error = fallback.error.clone();

            let metadata = PlanMetadata {
                mode: PlanMode::LlmFallback,
                step_count: plan.steps.len(),
                fallback_reason: Some(fallback.reason),
                error: fallback.error,
            };
            return (plan, metadata);
        }

        let plan = rules::create_plan(prompt, allowed_tools, max_steps);
        let metadata = PlanMetadata {
            mode: PlanMode::Rules,
            step_count: plan.steps.len(),
            fallback_reason: None,
            error: None,
        };
        info!(steps = plan.steps.len(), "planner_rules");
        (plan, metadata)
    }
}
