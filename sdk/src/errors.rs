//! Error types and handling
//!
//! This module provides the error types used throughout the Strand engine.
//! All errors implement the `CoreErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! All error messages are scrubbed before being surfaced:
//! - No secrets (API keys, tokens) are included
//! - Raw LLM text never appears in an error, only its failure class
//! - Tool failure detail is length-capped before storage

use thiserror::Error;

/// Trait for Strand error extensions
///
/// Provides additional context for errors: a user-friendly hint that is safe
/// to display, and whether the error is recoverable.
pub trait CoreErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller or worked around.
    /// Non-recoverable errors typically indicate a configuration problem.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid caller-supplied configuration
/// - **Planning**: LLM plan generation/validation failures. These are always
///   absorbed by the fallback chain and never surface to the end user.
/// - **Quota**: Per-tenant step reservation denied; aborts the run
/// - **Tool**: Tool dispatch and execution failures; abort the run fail-fast
/// - **LLM Provider**: Provider call failures (network, timeout, parse)
#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Planning errors (recovered via fallback, recorded in metadata only)
    #[error("Planning failed: {0}")]
    Planning(String),

    // Quota errors
    #[error("Step {step} failed: {reason}")]
    QuotaExceeded { step: usize, reason: String },

    // Tool errors
    #[error("Step {step} failed: {message}")]
    ToolExecution { step: usize, message: String },

    #[error("Tool not enabled: {0}")]
    ToolNotEnabled(String),

    // Run control
    #[error("Run cancelled")]
    Cancelled,

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("LLM call timed out")]
    LlmTimeout,

    // Serialization of emitted payloads
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreErrorExt for CoreError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check the engine configuration supplied by the caller",
            Self::Planning(_) => "The planner fell back to rule-based planning",
            Self::QuotaExceeded { .. } => "The tenant's step quota is exhausted, try again later",
            Self::ToolExecution { .. } => "A tool failed during execution, the run was stopped",
            Self::ToolNotEnabled(_) => "The requested tool is not registered with the engine",
            Self::Cancelled => "The run was cancelled before completion",
            Self::LlmProvider(_) => "The LLM provider could not be reached or returned an error",
            Self::LlmTimeout => "The LLM provider did not answer within the configured timeout",
            Self::Serialization(_) => "The final payload could not be serialized",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Planning(_) => true,
            Self::QuotaExceeded { .. } => true,
            Self::ToolExecution { .. } => true,
            Self::ToolNotEnabled(_) => false,
            Self::Cancelled => true,
            Self::LlmProvider(_) => true,
            Self::LlmTimeout => true,
            Self::Serialization(_) => false,
        }
    }
}

impl From<crate::types::ToolError> for CoreError {
    fn from(err: crate::types::ToolError) -> Self {
        match err {
            crate::types::ToolError::UnknownTool(name)
            | crate::types::ToolError::NotEnabled(name) => CoreError::ToolNotEnabled(name),
            other => CoreError::ToolExecution {
                step: 0,
                message: other.to_string(),
            },
        }
    }
}
