//! Parsing of model output into findings.
//!
//! Models wrap JSON in prose or code fences, use string numbers and
//! invent extra keys. Parsing tolerates all of that; it rejects output
//! only when no in-range score (or question) can be recovered, or when a
//! value that is present is out of range.

use crate::error::AgentError;
use crate::models::{AgentKind, Category, DiligenceQuestion, Finding, QuestionPriority};
use serde_json::{Map, Value};
use tracing::debug;

/// Characters of document text treated as one chunk of evidence.
const CHUNK_CHARS: usize = 4000;

/// Confidence derived from evidence volume when the model gives none.
pub fn evidence_confidence(rationale_chars: usize, document_chars: usize) -> f64 {
    let chunks = document_chars.div_ceil(CHUNK_CHARS);
    let rationale_part = (rationale_chars as f64 / 1000.0).min(1.0);
    let chunk_part = (chunks as f64 / 5.0).min(1.0);
    (0.6 * rationale_part + 0.4 * chunk_part).clamp(0.1, 0.95)
}

/// Turn a provider response into a JSON object.
fn into_object(value: Value) -> Result<Map<String, Value>, AgentError> {
    let value = match value {
        Value::String(text) => salvage_json(&text)
            .ok_or_else(|| AgentError::Validation("response is not JSON".to_string()))?,
        other => other,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(AgentError::Validation(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

/// Find a JSON object inside free text (code fences, leading prose).
fn salvage_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn first_of<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Read an optional confidence; present values must lie in [0, 1].
fn confidence_field(map: &Map<String, Value>) -> Result<Option<f64>, AgentError> {
    match map.get("confidence") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let c = as_number(v)
                .ok_or_else(|| AgentError::Validation("confidence is not a number".to_string()))?;
            if (0.0..=1.0).contains(&c) {
                Ok(Some(c))
            } else {
                Err(AgentError::Validation(format!("confidence {} outside [0, 1]", c)))
            }
        }
    }
}

/// Parse a scoring response, keeping only `focus` categories.
pub fn parse_scores(
    kind: AgentKind,
    value: Value,
    focus: &[Category],
    document_chars: usize,
) -> Result<Finding, AgentError> {
    let map = into_object(value)?;

    let scores = first_of(&map, &["scores", "category_scores"])
        .and_then(Value::as_object)
        .ok_or_else(|| AgentError::Validation("missing \"scores\" object".to_string()))?;
    let rationale = first_of(&map, &["rationale", "rationales"]).and_then(Value::as_object);

    let mut finding = Finding::new(kind, 0.0);
    for (key, raw) in scores {
        let Some(category) = Category::parse(key) else {
            debug!("{}: ignoring unknown category {:?}", kind, key);
            continue;
        };
        if !focus.contains(&category) {
            debug!("{}: ignoring out-of-focus category {}", kind, category);
            continue;
        }

        let score = as_number(raw).ok_or_else(|| {
            AgentError::Validation(format!("score for {} is not a number", category))
        })?;
        if !(0.0..=100.0).contains(&score) {
            return Err(AgentError::Validation(format!(
                "score {} for {} outside [0, 100]",
                score, category
            )));
        }

        let text = rationale
            .and_then(|r| r.iter().find(|(k, _)| Category::parse(k) == Some(category)))
            .and_then(|(_, v)| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();

        finding.category_scores.insert(category, score);
        finding.rationale.insert(category, text);
    }

    if finding.category_scores.is_empty() {
        return Err(AgentError::Validation(
            "no recognizable category scores".to_string(),
        ));
    }

    finding.raw_insights = string_list(first_of(&map, &["insights", "key_insights"]));

    finding.confidence = match confidence_field(&map)? {
        Some(c) => c,
        None => {
            let rationale_chars = finding.rationale.values().map(|r| r.len()).sum();
            evidence_confidence(rationale_chars, document_chars)
        }
    };

    Ok(finding)
}

/// Parse a question-generation response.
pub fn parse_questions(value: Value, document_chars: usize) -> Result<Finding, AgentError> {
    let map = into_object(value)?;

    let items = map
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::Validation("missing \"questions\" array".to_string()))?;

    let mut questions = Vec::new();
    for item in items {
        let (text, obj) = match item {
            Value::String(s) => (s.trim().to_string(), None),
            Value::Object(obj) => (
                obj.get("question")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                Some(obj),
            ),
            _ => continue,
        };
        if text.is_empty() {
            continue;
        }

        let field = |key: &str| {
            obj.and_then(|o| o.get(key))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        questions.push(DiligenceQuestion {
            priority: field("priority")
                .and_then(|p| QuestionPriority::parse(&p))
                .unwrap_or(QuestionPriority::FollowUp),
            category: field("category").and_then(|c| Category::parse(&c)),
            question: text,
            validates: field("validates").unwrap_or_default(),
            red_flags: field("red_flags"),
            source: Some(AgentKind::Question),
        });
    }

    if questions.is_empty() {
        return Err(AgentError::Validation("no questions in response".to_string()));
    }

    let gaps = string_list(map.get("gaps"));
    let confidence = match confidence_field(&map)? {
        Some(c) => c,
        None => {
            let question_chars = questions.iter().map(|q| q.question.len()).sum();
            evidence_confidence(question_chars, document_chars)
        }
    };

    let mut finding = Finding::new(AgentKind::Question, confidence);
    finding.raw_insights = gaps;
    finding.questions = questions;
    Ok(finding)
}
