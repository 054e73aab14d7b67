//! LLM planner
//!
//! Requests a plan from an injected LLM provider and re-validates the
//! response through the security gate. The raw provider text is an untrusted
//! input: the only path from it to a [`Plan`] is [`parse_response`], a total
//! function that either yields a fully validated plan or a structured
//! [`PlanFallback`]. Fallback reasons classify the failure; they never embed
//! the raw text itself.

use super::security::{check_url, is_tool_allowed, step_count_ok, UrlPolicyViolation};
use super::{Plan, PlanFallback, PlanMode, PlanStep};
use crate::llm::LlmProvider;
use sdk::types::ToolId;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_GOAL_LEN: usize = 1000;
const MAX_WHY_LEN: usize = 500;

/// Untrusted plan shape as the provider claims it. Private to this module:
/// nothing outside can hold one.
#[derive(Debug, Deserialize)]
struct RawLlmPlan {
    goal: String,
    steps: Vec<RawLlmStep>,
}

#[derive(Debug, Deserialize)]
struct RawLlmStep {
    id: u64,
    tool: String,
    #[serde(default)]
    input: serde_json::Map<String, serde_json::Value>,
    why: String,
}

/// Plans via an external LLM provider, validating everything it returns.
pub struct LlmPlanner {
    provider: Arc<dyn LlmProvider>,
}

impl LlmPlanner {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Request and validate a plan.
    ///
    /// Provider failures (including timeouts) and every validation failure
    /// produce a [`PlanFallback`]; callers recover via the rule-based
    /// planner.
    pub async fn plan(
        &self,
        prompt: &str,
        allowed_tools: &[ToolId],
        max_steps: usize,
    ) -> Result<Plan, PlanFallback> {
        let system = system_prompt(allowed_tools, max_steps);
        let user = user_prompt(prompt, allowed_tools, max_steps);

        let text = match self.provider.complete(&system, &user).await {
            Ok(text) => text,
            Err(err) => {
                warn!(provider = self.provider.name(), error = %err, "llm_provider_error");
                return Err(PlanFallback {
                    reason: format!("LLM provider error: {}", err),
                    error: Some(err.to_string()),
                });
            }
        };

        parse_response(&text, allowed_tools, max_steps)
    }
}

fn system_prompt(allowed_tools: &[ToolId], max_steps: usize) -> String {
    let tools = tool_list(allowed_tools);
    format!(
        "You are a task planning assistant. Your ONLY job is to create a safe execution plan.\n\
        \n\
        STRICT RULES (NEVER VIOLATE):\n\
        1. Output ONLY valid JSON matching the schema below - no markdown, no explanations, no code blocks\n\
        2. You can ONLY use these tools: {tools}\n\
        3. NEVER suggest shell commands, code execution, or file operations\n\
        4. URLs MUST use https:// only - NEVER http://, file://, or localhost\n\
        5. NEVER access private/local networks (127.0.0.1, 192.168.x.x, 10.x.x.x, 172.16-31.x.x)\n\
        6. Maximum {max_steps} steps allowed\n\
        7. If the request is unclear, use echo to ask for clarification\n\
        8. If the request requires unavailable tools, use echo to explain what's needed\n\
        \n\
        OUTPUT SCHEMA (STRICT JSON ONLY):\n\
        {{\n\
          \"goal\": \"brief description of what we're accomplishing\",\n\
          \"steps\": [\n\
            {{\"id\": 1, \"tool\": \"<tool name>\", \"input\": {{...}}, \"why\": \"reason for this step\"}}\n\
          ]\n\
        }}\n\
        \n\
        SECURITY: Never include API keys, passwords, or secrets in your plan."
    )
}

fn user_prompt(prompt: &str, allowed_tools: &[ToolId], max_steps: usize) -> String {
    let tools = tool_list(allowed_tools);
    format!(
        "Create a plan for this request:\n\
        \n\
        REQUEST: {prompt}\n\
        \n\
        CONSTRAINTS:\n\
        - Available tools: {tools}\n\
        - Maximum steps: {max_steps}\n\
        - Only https:// URLs\n\
        \n\
        Respond with ONLY the JSON plan, nothing else."
    )
}

fn tool_list(allowed_tools: &[ToolId]) -> String {
    allowed_tools
        .iter()
        .map(|t| t.wire_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Remove a markdown code fence wrapper if present.
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines = Vec::new();
    let mut in_block = false;
    for line in trimmed.lines() {
        if line.starts_with("```") && !in_block {
            in_block = true;
        } else if line.starts_with("```") && in_block {
            break;
        } else if in_block {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Parse and validate raw provider text into a plan.
///
/// Total over its input: every malformed or insecure response maps to a
/// [`PlanFallback`] carrying the failure class, never the text itself.
pub(crate) fn parse_response(
    text: &str,
    allowed_tools: &[ToolId],
    max_steps: usize,
) -> Result<Plan, PlanFallback> {
    if text.trim().is_empty() {
        return Err(PlanFallback {
            reason: "Empty response from LLM".to_string(),
            error: Some("Empty LLM response".to_string()),
        });
    }

    let json_text = strip_code_fence(text);

    let value: serde_json::Value = match serde_json::from_str(&json_text) {
        Ok(value) => value,
        Err(err) => {
            warn!(error_class = "json", "llm_parse_error");
            return Err(PlanFallback {
                reason: "LLM returned invalid JSON".to_string(),
                error: Some(format!("Invalid JSON at line {}", err.line())),
            });
        }
    };

    let raw: RawLlmPlan = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error_class = "shape", "llm_parse_error");
            return Err(PlanFallback {
                reason: "LLM plan failed validation".to_string(),
                error: Some(format!("Validation error: {}", err)),
            });
        }
    };

    validate(raw, allowed_tools, max_steps)
}

fn validate(
    raw: RawLlmPlan,
    allowed_tools: &[ToolId],
    max_steps: usize,
) -> Result<Plan, PlanFallback> {
    if raw.steps.is_empty() {
        return Err(PlanFallback {
            reason: "LLM plan failed validation".to_string(),
            error: Some("Plan must contain at least one step".to_string()),
        });
    }

    if raw.goal.chars().count() > MAX_GOAL_LEN {
        return Err(PlanFallback {
            reason: "LLM plan failed validation".to_string(),
            error: Some("Goal exceeds length cap".to_string()),
        });
    }

    let mut steps = Vec::with_capacity(raw.steps.len());
    for raw_step in &raw.steps {
        if raw_step.id == 0 || raw_step.id > 100 {
            return Err(PlanFallback {
                reason: "LLM plan failed validation".to_string(),
                error: Some(format!("Step id out of range: {}", raw_step.id)),
            });
        }

        if raw_step.why.chars().count() > MAX_WHY_LEN {
            return Err(PlanFallback {
                reason: "LLM plan failed validation".to_string(),
                error: Some("Step rationale exceeds length cap".to_string()),
            });
        }

        // Allowlist gate: reject at the first violation, naming the tool.
        let tool = match ToolId::from_str(&raw_step.tool) {
            Ok(tool) if is_tool_allowed(tool, allowed_tools) => tool,
            _ => {
                warn!(tool = %raw_step.tool, rejected = "not_allowed", "llm_security");
                return Err(PlanFallback {
                    reason: format!("LLM suggested disallowed tool: {}", raw_step.tool),
                    error: Some(format!("Disallowed tool: {}", raw_step.tool)),
                });
            }
        };

        // Network gate: tools reaching caller-chosen destinations carry a
        // URL field that must pass the destination policy.
        if let Some(field) = tool.url_field() {
            let url = raw_step
                .input
                .get(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            match check_url(url) {
                Ok(()) => {}
                Err(UrlPolicyViolation::NotHttps) => {
                    warn!(tool = %tool, rejected = "non_https", "llm_security");
                    return Err(PlanFallback {
                        reason: "LLM suggested non-HTTPS URL".to_string(),
                        error: Some(format!("{} requires an https:// URL", tool)),
                    });
                }
                Err(UrlPolicyViolation::PrivateDestination) => {
                    warn!(tool = %tool, rejected = "private_network", "llm_security");
                    return Err(PlanFallback {
                        reason: "LLM suggested private network access".to_string(),
                        error: Some("Cannot access private/local networks".to_string()),
                    });
                }
            }
        }

        steps.push(PlanStep {
            tool,
            input: raw_step.input.clone(),
            description: raw_step.why.clone(),
        });
    }

    if !step_count_ok(steps.len(), max_steps) {
        warn!(count = steps.len(), rejected = "too_many_steps", "llm_security");
        return Err(PlanFallback {
            reason: "LLM plan has too many steps".to_string(),
            error: Some(format!("Too many steps: {} > {}", steps.len(), max_steps)),
        });
    }

    info!(steps = steps.len(), "llm_plan_valid");
    Ok(Plan {
        steps,
        reasoning: raw.goal,
        mode: PlanMode::Llm,
        llm_error: None,
    })
}
