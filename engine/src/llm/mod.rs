//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the LLM providers the planner
//! can draw plans from (OpenAI-compatible, Anthropic). The `LlmProvider`
//! trait is the contract; the planner receives a provider handle at
//! construction time, so tests can inject doubles without global state.

use async_trait::async_trait;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LlmError {
    /// Map a reqwest failure into the matching error class.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::ProviderUnavailable(err.to_string())
        } else {
            LlmError::NetworkError(err.to_string())
        }
    }
}

/// LLM provider trait for plan generation
///
/// Implementations own their per-call timeout; expiry surfaces as
/// [`LlmError::Timeout`], which the planner treats exactly like any other
/// provider failure.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Request a single completion for the given system and user prompts.
    ///
    /// Returns the raw response text. Callers must treat it as untrusted
    /// input.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(LlmError::Timeout.to_string(), "Timeout");
        assert_eq!(
            LlmError::ParseError("bad json".to_string()).to_string(),
            "Parse error: bad json"
        );
    }
}
