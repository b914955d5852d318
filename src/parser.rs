use crate::plan::RawPlan;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static TRAILING_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Prefixes the generator sometimes puts in front of the JSON body.
const KNOWN_PREFIXES: [&str; 4] = ["plan:", "here is the plan:", "here's the plan:", "json:"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanParseError {
    /// Something parsed, but the top-level value is not a JSON object. The
    /// core never invents a plan from a bare array or scalar.
    #[error("recovered JSON is not an object")]
    NotAnObject,
    #[error("could not recover a JSON object from model output")]
    Unparsable,
}

/// Best-effort recovery of a plan object from free-form model output.
///
/// Strategies are tried in order: fence/prefix-stripped direct parse,
/// first-`{`-to-last-`}` substring parse, json5 reparse (absorbs single
/// quotes, unquoted keys, and trailing commas), and finally a
/// punctuation-repaired substring parse. The first strategy producing a JSON
/// object wins.
pub fn parse_plan(raw: &str) -> Result<RawPlan, PlanParseError> {
    let value = recover_value(raw)?;
    serde_json::from_value(value).map_err(|_| PlanParseError::Unparsable)
}

fn recover_value(raw: &str) -> Result<Value, PlanParseError> {
    let stripped = strip_code_fences(raw);
    let stripped = strip_known_prefixes(&stripped);

    let mut saw_value = false;
    for candidate in parse_candidates(&stripped) {
        let parsed = serde_json::from_str::<Value>(&candidate)
            .ok()
            .or_else(|| json5::from_str::<Value>(&candidate).ok());
        let Some(value) = parsed else {
            continue;
        };
        saw_value = true;
        if value.is_object() {
            return Ok(value);
        }
    }

    if saw_value {
        Err(PlanParseError::NotAnObject)
    } else {
        Err(PlanParseError::Unparsable)
    }
}

fn parse_candidates(stripped: &str) -> Vec<String> {
    let mut candidates = vec![stripped.to_string()];
    if let Some(span) = extract_object_span(stripped) {
        candidates.push(span.to_string());
    }
    let repaired = repair_punctuation(stripped);
    if let Some(span) = extract_object_span(&repaired) {
        candidates.push(span.to_string());
    }
    candidates.dedup();
    candidates
}

fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|line| line.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim() == "```") {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn strip_known_prefixes(text: &str) -> String {
    let mut rest = text.trim();
    let lower = rest.to_ascii_lowercase();
    for prefix in KNOWN_PREFIXES {
        if lower.starts_with(prefix) {
            rest = rest[prefix.len()..].trim_start();
            break;
        }
    }
    rest.to_string()
}

fn extract_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start { Some(&text[start..=end]) } else { None }
}

/// Last-resort repair: swap single quotes for double quotes and drop
/// trailing commas. Destroys apostrophes inside prose, which is acceptable
/// for a fallback that only runs when every cleaner parse failed.
fn repair_punctuation(text: &str) -> String {
    let swapped = text.replace('\'', "\"");
    TRAILING_COMMA_RE.replace_all(&swapped, "$1").into_owned()
}
