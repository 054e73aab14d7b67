//! Summarization tool
//!
//! Extractive, heuristic summarizer: scores sentences by position, length,
//! and signal keywords, then picks the top ones with near-duplicate
//! filtering. No network, no LLM; deterministic for a given input.

use async_trait::async_trait;
use sdk::tool::Tool;
use sdk::types::{ToolError, ToolId, ToolInput};
use serde_json::json;
use std::collections::HashSet;

const DEFAULT_MAX_BULLETS: u64 = 8;
const MAX_BULLETS_CAP: u64 = 15;

const SIGNAL_KEYWORDS: &[&str] = &[
    "important", "key", "main", "significant", "research", "study", "found", "shows", "according",
];

const BOILERPLATE_MARKERS: &[&str] = &[
    "click here", "read more", "subscribe", "cookie", "privacy policy",
];

pub struct SummarizeTool;

#[async_trait]
impl Tool for SummarizeTool {
    fn id(&self) -> ToolId {
        ToolId::WebSummarize
    }

    async fn invoke(&self, input: &ToolInput) -> Result<serde_json::Value, ToolError> {
        let text = input.param_str("text")?;
        if text.is_empty() {
            return Err(ToolError::MissingParameter("text".to_string()));
        }

        let max_bullets = input
            .param_u64_opt("max_bullets")
            .unwrap_or(DEFAULT_MAX_BULLETS)
            .min(MAX_BULLETS_CAP) as usize;

        let bullets = heuristic_summarize(text, max_bullets);

        Ok(json!({
            "bullets": bullets,
            "method": "heuristic",
            "notes": "Summary generated using text extraction heuristics.",
        }))
    }
}

/// Split text into sentences at `.`, `!`, `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|n| n.is_whitespace()) {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Extract key sentences, scored by position, length, and keywords.
pub fn heuristic_summarize(text: &str, max_bullets: usize) -> Vec<String> {
    let sentences = split_sentences(text);

    let mut candidates: Vec<(i32, String)> = Vec::new();
    for (i, sentence) in sentences.iter().enumerate() {
        let len = sentence.chars().count();
        if !(20..=300).contains(&len) {
            continue;
        }

        let lower = sentence.to_lowercase();
        if BOILERPLATE_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }

        let mut score = 0i32;
        if i < 5 {
            score += 5 - i as i32;
        }
        if len > 50 && len < 200 {
            score += 2;
        }
        for keyword in SIGNAL_KEYWORDS {
            if lower.contains(keyword) {
                score += 1;
            }
        }

        candidates.push((score, sentence.clone()));
    }

    // Stable sort keeps document order among equal scores
    candidates.sort_by_key(|(score, _)| -score);

    let mut selected: Vec<String> = Vec::new();
    for (_, sentence) in candidates {
        if selected.len() >= max_bullets {
            break;
        }

        let words: HashSet<String> = sentence
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        let is_duplicate = selected.iter().any(|existing| {
            let existing_words: HashSet<String> = existing
                .to_lowercase()
                .split_whitespace()
                .map(String::from)
                .collect();
            let overlap = words.intersection(&existing_words).count() as f64
                / words.len().max(1) as f64;
            overlap > 0.7
        });

        if !is_duplicate {
            selected.push(sentence);
        }
    }

    selected
}
