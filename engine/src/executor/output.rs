//! Output synthesis and summary helpers
//!
//! Everything here is pure: the same plan, results, and citations always
//! produce the same payload. Summaries destined for storage are scrubbed of
//! secret-looking material and length-capped first.

use crate::planner::PlanStep;
use regex::Regex;
use sdk::types::{Citation, ToolId};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Cap applied to stored output summaries and error messages.
pub const MAX_SUMMARY_LENGTH: usize = 500;

/// Citations surfaced in a final payload.
const MAX_CITATIONS: usize = 10;

static SECRET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=\-]+").expect("static pattern compiles"),
            "Bearer [REDACTED]",
        ),
        (
            Regex::new(r"sk-[A-Za-z0-9_\-]{8,}").expect("static pattern compiles"),
            "[REDACTED]",
        ),
        (
            Regex::new(r#"(?i)(api[_-]?key|token|secret|password)\s*[=:]\s*[^\s&"']+"#)
                .expect("static pattern compiles"),
            "$1=[REDACTED]",
        ),
    ]
});

/// Redact secret-looking material from text bound for logs or storage.
pub fn scrub_secrets(text: &str) -> String {
    let mut scrubbed = text.to_string();
    for (pattern, replacement) in SECRET_PATTERNS.iter() {
        scrubbed = pattern.replace_all(&scrubbed, *replacement).into_owned();
    }
    scrubbed
}

/// Truncate to at most `max` characters.
pub fn cap_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Scrub then cap, the combination applied to everything the sink sees.
pub fn scrub_and_cap(text: &str) -> String {
    cap_chars(&scrub_secrets(text), MAX_SUMMARY_LENGTH)
}

/// Create a short excerpt of content, preferring sentence boundaries.
pub fn summarize_content(content: &str, max_length: usize) -> String {
    if content.is_empty() {
        return String::new();
    }

    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_length {
        return collapsed;
    }

    let truncated = cap_chars(&collapsed, max_length);
    let halfway = truncated.len() / 2;

    for end in [". ", "! ", "? "] {
        if let Some(pos) = truncated.rfind(end) {
            if pos > halfway {
                return format!("{}...", truncated[..pos + 1].trim());
            }
        }
    }

    if let Some(pos) = truncated.rfind(' ') {
        if pos > halfway {
            return format!("{}...", truncated[..pos].trim());
        }
    }

    format!("{}...", truncated)
}

/// Safe, storable summary of a step's input. Never carries full payloads.
pub fn step_input_summary(step: &PlanStep) -> Value {
    match step.tool {
        ToolId::HttpFetch | ToolId::WebPageText => {
            json!({"url": step.input.get("url").and_then(|v| v.as_str()).unwrap_or("?")})
        }
        ToolId::WebSearch => {
            let query = step.input.get("query").and_then(|v| v.as_str()).unwrap_or("?");
            json!({"query": cap_chars(query, 50)})
        }
        ToolId::WebSummarize => {
            let text_len = step
                .input
                .get("text")
                .and_then(|v| v.as_str())
                .map_or(0, |t| t.chars().count());
            json!({"text_len": text_len})
        }
        ToolId::Echo => {
            json!({"action": step.input.get("action").and_then(|v| v.as_str()).unwrap_or("echo")})
        }
        ToolId::BuildRepo => {
            json!({"repo_url": step.input.get("repo_url").and_then(|v| v.as_str()).unwrap_or("?")})
        }
    }
}

/// Safe, storable summary of a tool's output.
pub fn step_output_summary(tool: ToolId, result: &Value) -> String {
    let summary = match tool {
        ToolId::HttpFetch => json!({
            "status_code": result.get("status_code").cloned().unwrap_or(json!("?")),
            "body_length": result.get("body").and_then(|b| b.as_str()).map_or(0, |b| b.len()),
            "content_type": result.get("content_type").cloned().unwrap_or(json!("unknown")),
        }),
        ToolId::Echo => {
            let keys: Vec<String> = result
                .get("result")
                .and_then(|r| r.as_object())
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default();
            json!({"echoed": true, "keys": keys})
        }
        ToolId::WebSearch => {
            let results = result.get("results").and_then(|r| r.as_array());
            let urls: Vec<&str> = results
                .map(|rs| {
                    rs.iter()
                        .take(5)
                        .filter_map(|r| r.get("url").and_then(|u| u.as_str()))
                        .collect()
                })
                .unwrap_or_default();
            json!({
                "result_count": results.map_or(0, |r| r.len()),
                "urls": urls,
            })
        }
        ToolId::WebPageText => json!({
            "url": result.get("url").cloned().unwrap_or(json!("")),
            "title": cap_chars(result.get("title").and_then(|t| t.as_str()).unwrap_or(""), 100),
            "text_length": result.get("text").and_then(|t| t.as_str()).map_or(0, |t| t.len()),
            "truncated": result.get("truncated").cloned().unwrap_or(json!(false)),
        }),
        ToolId::WebSummarize => json!({
            "bullet_count": result.get("bullets").and_then(|b| b.as_array()).map_or(0, |b| b.len()),
            "method": result.get("method").cloned().unwrap_or(json!("unknown")),
        }),
        ToolId::BuildRepo => json!({"completed": true}),
    };

    serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Debug, Serialize)]
struct FinalPayload {
    summary: String,
    bullets: Vec<String>,
    citations: Vec<Citation>,
}

/// Build the final payload from executed steps.
///
/// One summary line per executed step, bullets from the last summarize step,
/// citations deduplicated by URL (first occurrence wins) and capped.
pub fn synthesize(
    _prompt: &str,
    steps: &[PlanStep],
    results: &[Value],
    citations: &[Citation],
) -> String {
    if results.is_empty() {
        return r#"{"summary":"No results generated.","citations":[]}"#.to_string();
    }

    let mut output_parts: Vec<String> = Vec::new();
    let mut bullets: Vec<String> = Vec::new();

    for (i, (step, result)) in steps.iter().zip(results.iter()).enumerate() {
        match step.tool {
            ToolId::HttpFetch => {
                let status = result
                    .get("status_code")
                    .map_or("?".to_string(), |s| s.to_string());
                let body = result.get("body").and_then(|b| b.as_str()).unwrap_or("");
                let excerpt = summarize_content(body, 400);
                output_parts.push(format!("Fetched URL (status {}): {}", status, excerpt));
            }
            ToolId::Echo => match result.get("result") {
                Some(echoed) => {
                    let rendered = serde_json::to_string(echoed).unwrap_or_default();
                    output_parts.push(format!("Echo result: {}", cap_chars(&rendered, 300)));
                }
                None => output_parts.push(format!("Step {} completed", i + 1)),
            },
            ToolId::WebSearch => {
                let count = result
                    .get("results")
                    .and_then(|r| r.as_array())
                    .map_or(0, |r| r.len());
                if count > 0 {
                    output_parts.push(format!("Found {} search results", count));
                }
            }
            ToolId::WebPageText => {
                let title = result.get("title").and_then(|t| t.as_str()).unwrap_or("");
                let text_len = result
                    .get("text")
                    .and_then(|t| t.as_str())
                    .map_or(0, |t| t.chars().count());
                output_parts.push(format!(
                    "Extracted text from '{}' ({} chars)",
                    title, text_len
                ));
            }
            ToolId::WebSummarize => {
                bullets = result
                    .get("bullets")
                    .and_then(|b| b.as_array())
                    .map(|b| {
                        b.iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default();
                let method = result
                    .get("method")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown");
                output_parts.push(format!(
                    "Generated {} summary bullets ({})",
                    bullets.len(),
                    method
                ));
            }
            ToolId::BuildRepo => {
                let status = result
                    .get("status")
                    .and_then(|s| s.as_str())
                    .unwrap_or("completed");
                output_parts.push(format!("Ran build/test operations ({})", status));
            }
        }
    }

    let summary = if output_parts.is_empty() {
        "Execution completed.".to_string()
    } else {
        output_parts.join("\n")
    };

    let payload = FinalPayload {
        summary,
        bullets,
        citations: dedupe_citations(citations),
    };

    serde_json::to_string(&payload)
        .unwrap_or_else(|_| r#"{"summary":"Execution completed.","citations":[]}"#.to_string())
}

/// Deduplicate by exact URL, preserving insertion order; first title wins.
pub fn dedupe_citations(citations: &[Citation]) -> Vec<Citation> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for citation in citations {
        if seen.insert(citation.url.clone()) {
            unique.push(citation.clone());
            if unique.len() == MAX_CITATIONS {
                break;
            }
        }
    }
    unique
}
