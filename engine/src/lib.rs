//! Strand Engine Library
//!
//! This library provides the core of the Strand agent planning & execution
//! engine: planners, the plan security gate, the step executor, the output
//! synthesizer, and the built-in tool set.

/// Configuration surface consumed from the caller
pub mod config;

/// Job orchestration: plan selection through execution
pub mod job;

/// LLM provider abstraction layer
pub mod llm;

/// Planning: rule-based and LLM planners plus the security gate
pub mod planner;

/// Per-tenant step quota gate
pub mod quota;

/// Step executor and output synthesis
pub mod executor;

/// Telemetry and observability
pub mod telemetry;

/// Built-in tools and the tool registry
pub mod tools;
