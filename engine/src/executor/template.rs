//! Cross-step templating
//!
//! A closed grammar of deferred references resolved from the most recent
//! step's output at execution time:
//!
//! - `{{search_result_<idx>_url}}` — the `url` of entry `<idx>` in the
//!   previous step's `results` array
//! - `{{previous_text}}` — the previous step's `text` field, else `body`
//!
//! A placeholder only counts when it is the entire field value. Anything
//! unrecognized, and any reference whose source field is absent, is left in
//! place as the literal string.

use serde_json::Value;

/// A parsed template reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRef {
    /// `{{search_result_<idx>_url}}`
    SearchResultUrl(usize),

    /// `{{previous_text}}`
    PreviousText,
}

/// Parse a field value as a template reference.
///
/// Returns `None` for anything outside the closed grammar.
pub fn parse_ref(value: &str) -> Option<TemplateRef> {
    let inner = value.strip_prefix("{{")?.strip_suffix("}}")?;

    if inner == "previous_text" {
        return Some(TemplateRef::PreviousText);
    }

    let idx = inner
        .strip_prefix("search_result_")?
        .strip_suffix("_url")?
        .parse::<usize>()
        .ok()?;
    Some(TemplateRef::SearchResultUrl(idx))
}

/// Resolve a reference against the most recent step result.
///
/// Returns `None` when the source field is absent; callers then keep the
/// literal placeholder.
fn resolve_ref(reference: TemplateRef, results: &[Value]) -> Option<Value> {
    let last = results.last()?;

    match reference {
        TemplateRef::SearchResultUrl(idx) => {
            let url = last.get("results")?.as_array()?.get(idx)?.get("url")?;
            url.as_str().map(|u| Value::String(u.to_string()))
        }
        TemplateRef::PreviousText => {
            let text = last.get("text").or_else(|| last.get("body"))?;
            text.as_str().map(|t| Value::String(t.to_string()))
        }
    }
}

/// Resolve every templated field of a step input against prior results.
///
/// Fields that are not string-valued full placeholders pass through
/// untouched; unresolvable placeholders stay as their literal text.
pub fn resolve_input(
    input: &serde_json::Map<String, Value>,
    results: &[Value],
) -> serde_json::Map<String, Value> {
    let mut resolved = input.clone();

    for (_, value) in resolved.iter_mut() {
        let Some(text) = value.as_str() else {
            continue;
        };
        let Some(reference) = parse_ref(text) else {
            continue;
        };
        if let Some(substituted) = resolve_ref(reference, results) {
            *value = substituted;
        }
    }

    resolved
}
