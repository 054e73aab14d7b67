//! Configuration management
//!
//! The engine never reads the environment or the filesystem itself: the
//! embedding host constructs an [`EngineConfig`] (directly or via
//! [`EngineConfig::from_toml_str`]) and hands it in. All sections have
//! serde defaults so partial TOML documents are valid.

use anyhow::{Context, Result};
use sdk::errors::CoreError;
use sdk::types::ToolId;
use serde::{Deserialize, Serialize};

/// Which planner produces plans for incoming prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerMode {
    /// Deterministic rule-based planning only
    Rules,

    /// LLM planning with rule-based fallback
    Llm,
}

impl Default for PlannerMode {
    fn default() -> Self {
        PlannerMode::Rules
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Planner settings
    #[serde(default)]
    pub planner: PlannerConfig,

    /// LLM provider settings (ignored in rules mode)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Per-tenant quota settings
    #[serde(default)]
    pub quota: QuotaConfig,
}

/// Planner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Planner selection mode
    #[serde(default)]
    pub mode: PlannerMode,

    /// Tools plans may reference; anything else is rejected at validation
    #[serde(default = "default_allowed_tools")]
    pub allowed_tools: Vec<ToolId>,

    /// Upper bound on steps per plan
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_allowed_tools() -> Vec<ToolId> {
    vec![
        ToolId::Echo,
        ToolId::HttpFetch,
        ToolId::WebSearch,
        ToolId::WebPageText,
        ToolId::WebSummarize,
    ]
}

fn default_max_steps() -> usize {
    3
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mode: PlannerMode::default(),
            allowed_tools: default_allowed_tools(),
            max_steps: default_max_steps(),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider kind
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// Base URL of the provider API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key; absent means LLM planning is not configured
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// OpenAI-compatible chat completions API
    OpenAi,

    /// Anthropic messages API
    Anthropic,
}

impl Default for LlmProviderKind {
    fn default() -> Self {
        LlmProviderKind::OpenAi
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    20
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Quota configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Tool invocations allowed per tenant per day
    #[serde(default = "default_daily_step_limit")]
    pub daily_step_limit: u64,
}

fn default_daily_step_limit() -> u64 {
    500
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_step_limit: default_daily_step_limit(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            llm: LlmConfig::default(),
            quota: QuotaConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document supplied by the caller.
    pub fn from_toml_str(doc: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(doc).context("failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.planner.max_steps == 0 {
            return Err(CoreError::Config("max_steps must be at least 1".to_string()).into());
        }
        if self.llm.timeout_secs == 0 {
            return Err(CoreError::Config("llm timeout must be at least 1s".to_string()).into());
        }
        if self.quota.daily_step_limit == 0 {
            return Err(
                CoreError::Config("daily_step_limit must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.planner.mode, PlannerMode::Rules);
        assert_eq!(config.planner.max_steps, 3);
        assert!(config.planner.allowed_tools.contains(&ToolId::Echo));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [planner]
            mode = "llm"
            max_steps = 5
            "#,
        )
        .expect("parses");

        assert_eq!(config.planner.mode, PlannerMode::Llm);
        assert_eq!(config.planner.max_steps, 5);
        assert_eq!(config.quota.daily_step_limit, 500);
        assert_eq!(config.llm.timeout_secs, 20);
    }

    #[test]
    fn test_allowed_tools_parse_wire_names() {
        let config = EngineConfig::from_toml_str(
            r#"
            [planner]
            allowed_tools = ["echo", "web_page_text"]
            "#,
        )
        .expect("parses");

        assert_eq!(
            config.planner.allowed_tools,
            vec![ToolId::Echo, ToolId::WebPageText]
        );
    }

    #[test]
    fn test_zero_max_steps_rejected() {
        let result = EngineConfig::from_toml_str(
            r#"
            [planner]
            max_steps = 0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_tool_name_rejected() {
        let result = EngineConfig::from_toml_str(
            r#"
            [planner]
            allowed_tools = ["shell_exec"]
            "#,
        );
        assert!(result.is_err());
    }
}
