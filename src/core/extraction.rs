//! Tolerant parsing of model output into college records.
//!
//! Model responses are loosely shaped: JSON may be fenced, wrapped in prose,
//! or wrapped in an object, and numeric fields arrive as numbers or as
//! strings like `"$56,000"` or `"4%"`. Everything here is pure so the
//! recovery rules can be tested without a model.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::College;
use crate::models::domain::{GPA_RANGE, SAT_RANGE};

static FENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fenced block regex is valid")
});

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array regex is valid"));

static OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object regex is valid"));

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number regex is valid"));

/// Keys under which a model sometimes nests the college list
const WRAPPER_KEYS: &[&str] = &["colleges", "universities", "results", "data"];

/// Errors that can occur while parsing model output
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Response was empty")]
    EmptyResponse,

    #[error("No JSON array of records found in response")]
    NoRecords,

    #[error("No JSON object found in response")]
    NoObject,
}

/// Candidate JSON snippets, in the order they should be tried
fn json_snippets<'a>(text: &'a str, fallback: &'a Regex) -> Vec<&'a str> {
    let mut snippets = Vec::with_capacity(3);

    if let Some(block) = FENCED_BLOCK_RE.captures(text).and_then(|c| c.get(1)) {
        snippets.push(block.as_str().trim());
    }
    snippets.push(text.trim());
    if let Some(m) = fallback.find(text) {
        snippets.push(m.as_str());
    }

    snippets
}

/// Interpret a parsed value as a list of records
fn as_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.into_iter().filter(Value::is_object).collect(),
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if let Some(Value::Array(items)) = map.remove(*key) {
                    return items.into_iter().filter(Value::is_object).collect();
                }
            }
            if map.contains_key("name") {
                vec![Value::Object(map)]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// Pull the list of record objects out of a model response
///
/// Tries, in order: a fenced code block, the whole response, then the span
/// from the first `[` to the last `]`. The first non-empty list wins.
pub fn parse_record_array(text: &str) -> Result<Vec<Value>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    json_snippets(text, &ARRAY_RE)
        .into_iter()
        .filter_map(|snippet| serde_json::from_str::<Value>(snippet).ok())
        .map(as_records)
        .find(|records| !records.is_empty())
        .ok_or(ParseError::NoRecords)
}

/// Pull a single JSON object out of a model response
pub fn parse_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    json_snippets(text, &OBJECT_RE)
        .into_iter()
        .filter_map(|snippet| serde_json::from_str::<Value>(snippet).ok())
        .find_map(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .ok_or(ParseError::NoObject)
}

/// Read a non-negative integer, tolerating strings such as `"$56,000"`
pub fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let digits: String = s.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Read a float, tolerating strings such as `"3.9"` or `"15%"`
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER_RE
            .find(&s.replace(',', ""))
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Read a trimmed string field
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Read a list of strings, accepting an array or a comma-separated string
pub fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_string).collect(),
        Value::String(s) => s
            .split([',', '，', ';', '、'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Acceptance rates written with `%` or above 1 are percentages
fn coerce_rate(value: &Value) -> Option<f64> {
    let rate = coerce_f64(value)?;
    let percent = matches!(value, Value::String(s) if s.contains('%'));
    let rate = if percent || rate > 1.0 { rate / 100.0 } else { rate };
    (0.0..=1.0).contains(&rate).then_some(rate)
}

/// Build a college from one loosely-typed record
///
/// Returns `None` when the record lacks a usable name or location. Optional
/// fields that are missing or out of range are left empty.
pub fn coerce_college(record: &Value) -> Option<College> {
    let field = |key: &str| record.get(key).filter(|v| !v.is_null());

    let name = field("name").and_then(coerce_string)?;
    let location = field("location").and_then(coerce_string)?;

    let college = College {
        ranking: field("ranking")
            .and_then(coerce_u64)
            .filter(|r| *r > 0)
            .and_then(|r| u32::try_from(r).ok()),
        tuition: field("tuition").and_then(coerce_u64),
        acceptance_rate: field("acceptance_rate").and_then(coerce_rate),
        avg_sat: field("avg_sat")
            .and_then(coerce_u64)
            .and_then(|s| u32::try_from(s).ok())
            .filter(|s| SAT_RANGE.contains(s)),
        avg_gpa: field("avg_gpa")
            .and_then(coerce_f64)
            .filter(|g| GPA_RANGE.contains(g)),
        majors: field("majors").map(coerce_string_list).unwrap_or_default(),
        description: field("description").and_then(coerce_string).unwrap_or_default(),
        ..College::new(name, location)
    };

    college.is_valid().then_some(college)
}

/// Parse a model response straight into valid colleges
pub fn parse_colleges(text: &str) -> Result<Vec<College>, ParseError> {
    let records = parse_record_array(text)?;
    let total = records.len();
    let colleges: Vec<College> = records.iter().filter_map(coerce_college).collect();

    if colleges.len() < total {
        tracing::debug!("Dropped {} of {} extracted records as invalid", total - colleges.len(), total);
    }

    Ok(colleges)
}
