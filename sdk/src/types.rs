//! Tool identifiers and input/output types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed enumeration of tools the engine can plan and dispatch.
///
/// Representing tools as an enum (rather than free-form strings) makes an
/// unknown tool a rejectable case at plan-validation time instead of a
/// runtime lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// Return the input back to the caller
    Echo,

    /// Fetch raw content from an HTTPS URL
    HttpFetch,

    /// Search the web for a query
    WebSearch,

    /// Fetch a page and extract readable text
    WebPageText,

    /// Summarize text into bullet points
    WebSummarize,

    /// Run build/test operations against a repository
    BuildRepo,
}

impl ToolId {
    /// All tool identifiers, in a stable order.
    pub const ALL: [ToolId; 6] = [
        ToolId::Echo,
        ToolId::HttpFetch,
        ToolId::WebSearch,
        ToolId::WebPageText,
        ToolId::WebSummarize,
        ToolId::BuildRepo,
    ];

    /// Wire name used in plans, logs, and persisted step records.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ToolId::Echo => "echo",
            ToolId::HttpFetch => "http_fetch",
            ToolId::WebSearch => "web_search",
            ToolId::WebPageText => "web_page_text",
            ToolId::WebSummarize => "web_summarize",
            ToolId::BuildRepo => "build_repo",
        }
    }

    /// Input field carrying a URL that must pass the network security policy,
    /// if this tool reaches out to a caller-chosen destination.
    pub fn url_field(&self) -> Option<&'static str> {
        match self {
            ToolId::HttpFetch | ToolId::WebPageText => Some("url"),
            ToolId::BuildRepo => Some("repo_url"),
            ToolId::Echo | ToolId::WebSearch | ToolId::WebSummarize => None,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ToolId {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "echo" => Ok(ToolId::Echo),
            "http_fetch" => Ok(ToolId::HttpFetch),
            "web_search" => Ok(ToolId::WebSearch),
            "web_page_text" => Ok(ToolId::WebPageText),
            "web_summarize" => Ok(ToolId::WebSummarize),
            "build_repo" => Ok(ToolId::BuildRepo),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// Input to a tool invocation
///
/// A thin wrapper over a JSON object with typed parameter accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInput(pub serde_json::Map<String, serde_json::Value>);

impl ToolInput {
    /// Create an empty input
    pub fn new() -> Self {
        Self(serde_json::Map::new())
    }

    /// Build from an existing JSON object
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Get a required string parameter
    pub fn param_str(&self, key: &str) -> Result<&str, ToolError> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))
    }

    /// Get an optional string parameter
    pub fn param_str_opt(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional u64 parameter
    pub fn param_u64_opt(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(|v| v.as_u64())
    }

    /// Get a parameter as a raw JSON value
    pub fn param_json(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

/// Errors produced by tool implementations
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool not enabled: {0}")]
    NotEnabled(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Blocked URL: {0}")]
    UrlBlocked(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Tool invocation timed out")]
    Timeout,

    #[error("Response size exceeded: {size} bytes > {limit} bytes")]
    ResponseTooLarge { size: usize, limit: usize },

    #[error("Tool execution failed: {0}")]
    Execution(String),
}

/// A (url, title) provenance pair surfaced in the final output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Citation {
    /// Create a citation, treating an empty title as absent.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            url: url.into(),
            title: if title.is_empty() { None } else { Some(title) },
        }
    }
}
