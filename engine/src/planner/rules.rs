//! Rule-based planner
//!
//! Deterministic, network-free heuristic classifier turning a prompt into a
//! plan. This is the default planner and the fallback target when LLM
//! planning fails; it never errs. Classification follows a fixed precedence
//! order over intent keywords and extracted URLs, and the resulting step
//! list is always truncated to the configured bound.

use super::security::is_tool_allowed;
use super::{Plan, PlanMode, PlanStep, PREVIOUS_TEXT, SEARCH_RESULT_0_URL};
use regex::Regex;
use sdk::types::ToolId;
use serde_json::json;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https://[^\s<>"'\)\]]+"#).expect("static pattern compiles")
});

static REPO_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https://(?:github\.com|gitlab\.com)/[a-zA-Z0-9_.-]+/[a-zA-Z0-9_.-]+")
        .expect("static pattern compiles")
});

const FETCH_KEYWORDS: &[&str] = &[
    "fetch", "get", "retrieve", "download", "read", "load", "scrape", "crawl", "access", "visit",
    "open", "check", "what is at", "what's at", "content of", "contents of", "summarize",
    "summary of",
];

const ECHO_KEYWORDS: &[&str] = &[
    "echo", "repeat", "say", "return", "format", "transform", "convert", "rephrase", "reword",
];

const SEARCH_KEYWORDS: &[&str] = &[
    "search", "find", "look up", "lookup", "research", "discover", "what is", "what are",
    "who is", "when did", "where is", "how to", "latest", "recent", "news about",
    "information about", "info about", "tell me about", "learn about",
];

const SUMMARIZE_KEYWORDS: &[&str] = &[
    "summarize", "summary", "summarise", "brief", "tldr", "tl;dr", "key points", "main points",
    "overview", "digest",
];

const BUILD_KEYWORDS: &[&str] = &[
    "run tests", "run the tests", "execute tests", "run test", "verify build", "check build",
    "build project", "build the project", "run ci", "run pipeline", "execute pipeline",
    "test this repo", "test the repo", "test repository", "run pytest", "run npm test",
    "npm test", "pytest", "verify code", "check tests", "run lint", "lint code",
    "build and test", "test and build",
];

/// Leading phrases stripped from the prompt when deriving a search query.
const QUERY_PREFIXES: &[&str] = &[
    "search for", "find", "look up", "research", "tell me about", "what is", "what are",
];

/// Extract https URLs from text, trailing punctuation stripped.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', '!', '?', ';', ':'])
                .to_string()
        })
        .filter(|u| !u.is_empty())
        .collect()
}

/// Extract a GitHub/GitLab repository URL for build operations.
pub fn extract_repo_url(prompt: &str) -> Option<String> {
    REPO_URL_PATTERN.find(prompt).map(|m| {
        let url = m.as_str();
        url.strip_suffix(".git").unwrap_or(url).to_string()
    })
}

fn contains_any(prompt: &str, keywords: &[&str]) -> bool {
    let lower = prompt.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw))
}

/// Prompt asks to fetch/get/retrieve content from a URL.
pub fn is_fetch_request(prompt: &str) -> bool {
    contains_any(prompt, FETCH_KEYWORDS)
}

/// Prompt asks for echo/repeat/format.
pub fn is_echo_request(prompt: &str) -> bool {
    contains_any(prompt, ECHO_KEYWORDS)
}

/// Prompt asks for web search/research.
pub fn is_search_request(prompt: &str) -> bool {
    contains_any(prompt, SEARCH_KEYWORDS)
}

/// Prompt asks for summarization.
pub fn is_summarize_request(prompt: &str) -> bool {
    contains_any(prompt, SUMMARIZE_KEYWORDS)
}

/// Prompt asks for build/test/verify operations.
pub fn is_build_request(prompt: &str) -> bool {
    contains_any(prompt, BUILD_KEYWORDS)
}

/// Truncate a string to at most `max` characters (not bytes).
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Strip known leading phrases from the prompt to derive a search query.
fn strip_query_prefixes(prompt: &str) -> String {
    let mut query = prompt.to_string();
    for prefix in QUERY_PREFIXES {
        if query.len() >= prefix.len()
            && query.is_char_boundary(prefix.len())
            && query[..prefix.len()].eq_ignore_ascii_case(prefix)
        {
            query = query[prefix.len()..].trim().to_string();
        }
    }
    query
}

fn input_map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// Create a plan using rule-based heuristics.
///
/// Total over its inputs: no network, no errors. Precedence order is fixed
/// and observable, so changes here are behavior changes.
pub fn create_plan(prompt: &str, allowed_tools: &[ToolId], max_steps: usize) -> Plan {
    let urls = extract_urls(prompt);
    let mut steps: Vec<PlanStep> = Vec::new();
    let reasoning: String;

    let has_web_search = is_tool_allowed(ToolId::WebSearch, allowed_tools);
    let has_web_page_text = is_tool_allowed(ToolId::WebPageText, allowed_tools);
    let has_web_summarize = is_tool_allowed(ToolId::WebSummarize, allowed_tools);
    let has_http_fetch = is_tool_allowed(ToolId::HttpFetch, allowed_tools);
    let has_echo = is_tool_allowed(ToolId::Echo, allowed_tools);
    let has_build = is_tool_allowed(ToolId::BuildRepo, allowed_tools);

    let want_summary = is_summarize_request(prompt);
    let want_search = is_search_request(prompt);
    let want_fetch = is_fetch_request(prompt);
    let want_build = is_build_request(prompt);

    if want_search && has_web_search && urls.is_empty() {
        // Web research: search, optionally read the top hit, optionally summarize
        let query = strip_query_prefixes(prompt);

        steps.push(PlanStep {
            tool: ToolId::WebSearch,
            input: input_map(json!({"query": query, "max_results": 3})),
            description: format!("Search the web for: {}", truncate_chars(&query, 50)),
        });

        if has_web_page_text && steps.len() < max_steps {
            steps.push(PlanStep {
                tool: ToolId::WebPageText,
                input: input_map(json!({"url": SEARCH_RESULT_0_URL, "max_chars": 15000})),
                description: "Fetch and extract text from top search result".to_string(),
            });
        }

        if want_summary && has_web_summarize && steps.len() < max_steps {
            steps.push(PlanStep {
                tool: ToolId::WebSummarize,
                input: input_map(json!({"text": PREVIOUS_TEXT, "max_bullets": 5})),
                description: "Summarize the fetched content".to_string(),
            });
        }

        reasoning = format!("Web research plan for query: {}", truncate_chars(&query, 50));
    } else if !urls.is_empty() && (want_fetch || want_summary) {
        // URL provided with fetch/summarize intent. Prefer the text
        // extraction tool over a raw fetch when both are allowed.
        let url = &urls[0];

        if has_web_page_text {
            steps.push(PlanStep {
                tool: ToolId::WebPageText,
                input: input_map(json!({"url": url, "max_chars": 20000})),
                description: format!("Fetch and extract text from {}", url),
            });
        } else if has_http_fetch {
            steps.push(PlanStep {
                tool: ToolId::HttpFetch,
                input: input_map(json!({"url": url})),
                description: format!("Fetch content from {}", url),
            });
        }

        if want_summary && has_web_summarize && steps.len() < max_steps {
            steps.push(PlanStep {
                tool: ToolId::WebSummarize,
                input: input_map(json!({"text": PREVIOUS_TEXT, "max_bullets": 5})),
                description: "Summarize the fetched content".to_string(),
            });
        }

        reasoning = format!("Fetch and process URL: {}", url);
    } else if want_build && has_build {
        // Build/test request; needs a recognizable repository URL
        match extract_repo_url(prompt) {
            Some(repo_url) => {
                steps.push(PlanStep {
                    tool: ToolId::BuildRepo,
                    input: input_map(json!({"repo_url": repo_url})),
                    description: format!(
                        "Run build/test operations for repository: {}",
                        repo_url
                    ),
                });
                reasoning = format!("Build/test plan for repository: {}", repo_url);
            }
            None => {
                if has_echo {
                    steps.push(PlanStep {
                        tool: ToolId::Echo,
                        input: input_map(json!({
                            "prompt": prompt,
                            "note": "Unable to determine repository URL for build/test operations",
                            "suggestion": "Try including a GitHub/GitLab repository URL in the prompt"
                        })),
                        description: "Return clarification for build/test request".to_string(),
                    });
                }
                reasoning = "Could not determine repository URL for build/test request".to_string();
            }
        }
    } else if !urls.is_empty() {
        // URL with no specific intent
        let url = &urls[0];
        if has_web_page_text {
            steps.push(PlanStep {
                tool: ToolId::WebPageText,
                input: input_map(json!({"url": url, "max_chars": 20000})),
                description: format!("Fetch and extract text from {}", url),
            });
        } else if has_http_fetch {
            steps.push(PlanStep {
                tool: ToolId::HttpFetch,
                input: input_map(json!({"url": url})),
                description: format!("Fetch content from {}", url),
            });
        }
        reasoning = format!("Found URL in prompt, fetching: {}", url);
    } else if is_echo_request(prompt) && has_echo {
        steps.push(PlanStep {
            tool: ToolId::Echo,
            input: input_map(json!({"prompt": prompt, "action": "process"})),
            description: "Process and return the requested content".to_string(),
        });
        reasoning = "Detected echo/format request".to_string();
    } else if want_search && has_web_search {
        // General search without a URL
        steps.push(PlanStep {
            tool: ToolId::WebSearch,
            input: input_map(json!({"query": prompt, "max_results": 5})),
            description: format!("Search the web for: {}", truncate_chars(prompt, 50)),
        });
        reasoning = format!("General web search for: {}", truncate_chars(prompt, 50));
    } else {
        // Could not classify; ask for clarification
        if has_echo {
            steps.push(PlanStep {
                tool: ToolId::Echo,
                input: input_map(json!({
                    "prompt": prompt,
                    "note": "Unable to determine specific action from prompt",
                    "suggestion": "Try: 'search for X', 'summarize URL', or include a URL"
                })),
                description: "Return clarification with the prompt".to_string(),
            });
        }
        reasoning = "Could not determine specific action, returning clarification".to_string();
    }

    steps.truncate(max_steps);

    Plan {
        steps,
        reasoning,
        mode: PlanMode::Rules,
        llm_error: None,
    }
}
