use serde_json::Value;
use smallvec::SmallVec;

use crate::stream::DeltaEvent;

/// A shape matcher inspects one parsed upstream object. It returns `true`
/// when the object carries its shape (even with zero text parts), so later
/// matchers only run for genuinely unrecognized layouts.
type ShapeMatcher = fn(&Value, &mut SmallVec<[DeltaEvent; 2]>) -> bool;

/// Known upstream response shapes, newest first. Adding a historical shape
/// means appending a matcher here.
const SHAPE_MATCHERS: &[ShapeMatcher] = &[match_candidate_parts, match_legacy_candidate_text];

/// Map one extracted upstream object to zero-or-more text delta events.
///
/// Objects matching no known shape (metadata-only chunks, safety feedback)
/// produce no events; that is not an error.
#[must_use]
pub fn map_delta_events(object: &Value) -> SmallVec<[DeltaEvent; 2]> {
    let mut events = SmallVec::new();
    for matcher in SHAPE_MATCHERS {
        if matcher(object, &mut events) {
            break;
        }
    }
    events
}

/// Current shape: `candidates[0].content.parts[*].text`.
fn match_candidate_parts(object: &Value, out: &mut SmallVec<[DeltaEvent; 2]>) -> bool {
    let Some(parts) = object
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
    else {
        return false;
    };

    for part in parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.is_empty() {
                out.push(DeltaEvent::Text(text.to_owned()));
            }
        }
    }
    true
}

/// Older shape: `candidates[0].text`.
fn match_legacy_candidate_text(object: &Value, out: &mut SmallVec<[DeltaEvent; 2]>) -> bool {
    let Some(text) = object
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("text"))
        .and_then(Value::as_str)
    else {
        return false;
    };

    if !text.is_empty() {
        out.push(DeltaEvent::Text(text.to_owned()));
    }
    true
}
