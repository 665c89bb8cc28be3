use serde_json::{Map, Value};

use crate::error::AiError;

use super::{FunctionDeclaration, GenerateResponse, Part};

/// Name of the function a report request forces upstream.
pub const REPORT_FUNCTION_NAME: &str = "submit_nutrition_report";

/// A parsed, non-empty report object. The field schema is owned by the
/// report consumers; this crate's contract ends at "non-empty object".
pub type StructuredReport = Map<String, Value>;

/// Function declaration for the forced report call.
///
/// The parameter schema mirrors the externally-owned report contract so the
/// model fills the expected field set; extraction does not re-validate it.
#[must_use]
pub fn report_function_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: REPORT_FUNCTION_NAME.to_string(),
        description: Some(
            "Submit the full nutrition progress report for the user's tracked data".to_string(),
        ),
        parameters: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string" },
                "weight_trend": {
                    "type": "object",
                    "properties": {
                        "direction": { "type": "string", "enum": ["down", "stable", "up"] },
                        "series": { "type": "array", "items": { "type": "number" } }
                    }
                },
                "calories": {
                    "type": "object",
                    "properties": {
                        "daily_average": { "type": "number" },
                        "target": { "type": "number" },
                        "status": { "type": "string", "enum": ["under", "on_track", "over"] }
                    }
                },
                "macros": {
                    "type": "object",
                    "properties": {
                        "protein_g": { "type": "number" },
                        "carbs_g": { "type": "number" },
                        "fat_g": { "type": "number" },
                        "status": { "type": "string", "enum": ["unbalanced", "acceptable", "balanced"] }
                    }
                },
                "insights": { "type": "array", "items": { "type": "string" } },
                "actions": { "type": "array", "items": { "type": "string" } },
                "goal_prediction": {
                    "type": "object",
                    "properties": {
                        "on_track": { "type": "boolean" },
                        "estimated_weeks": { "type": "number" }
                    }
                },
                "consistency": {
                    "type": "object",
                    "properties": {
                        "logged_days": { "type": "number" },
                        "streak": { "type": "number" }
                    }
                },
                "food_quality": {
                    "type": "object",
                    "properties": {
                        "score": { "type": "number" },
                        "notes": { "type": "string" }
                    }
                }
            },
            "required": ["summary"]
        })),
    }
}

/// Extract the structured report from a complete upstream response.
///
/// Search order, first match wins, no merging:
/// 1. the legacy top-level function call naming the report function;
/// 2. a `functionCall` part inside the first candidate's content;
/// 3. each text part, one fenced-code marker stripped if present, parsed as
///    a JSON object.
///
/// # Errors
///
/// Returns [`AiError::EmptyReport`] when no branch yields a non-empty
/// object. Callers treat this as terminal and non-retryable.
pub fn extract_report(response: &GenerateResponse) -> Result<StructuredReport, AiError> {
    if let Some(call) = &response.function_call {
        if call.name == REPORT_FUNCTION_NAME {
            if let Some(report) = non_empty_object(&call.args) {
                return Ok(report);
            }
        }
    }

    let parts = response
        .candidates
        .as_deref()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.content.as_ref())
        .map_or(&[][..], |content| content.parts.as_slice());

    for part in parts {
        if let Part::FunctionCall { name, args } = part {
            if name == REPORT_FUNCTION_NAME {
                if let Some(report) = non_empty_object(args) {
                    return Ok(report);
                }
            }
        }
    }

    for part in parts {
        if let Part::Text(text) = part {
            if let Some(report) = parse_embedded_object(text) {
                return Ok(report);
            }
        }
    }

    Err(AiError::EmptyReport)
}

fn non_empty_object(value: &Value) -> Option<StructuredReport> {
    match value {
        Value::Object(map) if !map.is_empty() => Some(map.clone()),
        _ => None,
    }
}

/// Parse a text part into a non-empty JSON object, preferring the body of a
/// fenced code block (with or without a language tag) when one is present.
fn parse_embedded_object(text: &str) -> Option<StructuredReport> {
    let candidate = fenced_block_body(text).unwrap_or(text);
    let value: Value = serde_json::from_str(candidate.trim()).ok()?;
    non_empty_object(&value)
}

/// Locate the body of the first fenced code block, tolerating a language tag
/// after the opening fence and prose around the block.
fn fenced_block_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}
