//! Decoder for server-sent event streams with JSON-encoded step lists.
//!
//! Each `data:` payload is a JSON object whose `text` field holds the steps
//! of the answer so far, encoded as a JSON string. The answer lives in the
//! step whose `step_type` is `FINAL`, under `content.answer`, which may itself
//! be a JSON object with an `answer` field.

use serde_json::Value;
use tracing::trace;

const DATA_PREFIX: &str = "data:";
const FINAL_STEP: &str = "FINAL";

/// Last final-step answer in the stream, or an empty string.
///
/// An empty result means no answer was found.
pub fn decode_event_stream(raw_body: &str) -> String {
    let mut answer = String::new();
    for payload in raw_body
        .lines()
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .map(str::trim)
    {
        if let Some(found) = decode_event(payload) {
            answer = found;
        }
    }
    answer
}

fn decode_event(payload: &str) -> Option<String> {
    let event: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            trace!(error = %e, "Skipping unparsable event");
            return None;
        }
    };
    let steps = steps_of(&event)?;
    steps
        .as_array()?
        .iter()
        .filter(|step| step.get("step_type").and_then(Value::as_str) == Some(FINAL_STEP))
        .filter_map(final_answer)
        .last()
}

/// Steps are normally a JSON string; an already-decoded array is accepted.
fn steps_of(event: &Value) -> Option<Value> {
    match event.get("text")? {
        Value::String(encoded) => match serde_json::from_str(encoded) {
            Ok(steps) => Some(steps),
            Err(e) => {
                trace!(error = %e, "Skipping event with unparsable steps");
                None
            }
        },
        steps @ Value::Array(_) => Some(steps.clone()),
        _ => None,
    }
}

/// Answer carried by a final step, `None` when the step has no content.
///
/// The raw content is only used when it holds no nested string `answer`. An
/// empty nested answer is still the step's answer and supersedes earlier ones.
fn final_answer(step: &Value) -> Option<String> {
    let raw = step.get("content")?.get("answer")?.as_str()?;
    if raw.is_empty() {
        return None;
    }
    let nested = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|value| value.get("answer")?.as_str().map(str::to_string));
    Some(nested.unwrap_or_else(|| raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// One `data:` line whose steps are JSON-encoded into `text`.
    fn event_line(steps: Value) -> String {
        format!("data: {}", json!({ "text": steps.to_string() }))
    }

    #[test]
    fn test_final_step_with_json_answer() {
        let body = [
            event_line(json!([{ "step_type": "SEARCH_WEB", "content": { "queries": ["x"] } }])),
            event_line(json!([
                { "step_type": "SEARCH_WEB", "content": {} },
                { "step_type": "FINAL", "content": { "answer": "{\"answer\":\"final text\"}" } }
            ])),
        ]
        .join("\n");
        assert_eq!(decode_event_stream(&body), "final text");
    }

    #[test]
    fn test_final_step_with_plain_answer() {
        let body = [
            event_line(json!([{ "step_type": "INITIAL_QUERY", "content": {} }])),
            event_line(json!([{ "step_type": "FINAL", "content": { "answer": "final text" } }])),
        ]
        .join("\n");
        assert_eq!(decode_event_stream(&body), "final text");
    }

    #[test]
    fn test_json_answer_without_answer_field_falls_back_to_raw() {
        let body = event_line(json!([
            { "step_type": "FINAL", "content": { "answer": "[1, 2]" } }
        ]));
        assert_eq!(decode_event_stream(&body), "[1, 2]");
    }

    #[test]
    fn test_last_final_answer_wins() {
        let body = [
            event_line(json!([{ "step_type": "FINAL", "content": { "answer": "draft" } }])),
            event_line(json!([{ "step_type": "FINAL", "content": { "answer": "complete" } }])),
        ]
        .join("\r\n");
        assert_eq!(decode_event_stream(&body), "complete");
    }

    #[test]
    fn test_tolerates_noise_and_partial_lines() {
        let body = [
            "event: message".to_string(),
            "data: {not json".to_string(),
            "data: {\"text\": \"[{\\\"step_type\\\"".to_string(),
            "data: {\"status\": \"pending\"}".to_string(),
            event_line(json!([{ "step_type": "FINAL", "content": { "answer": "ok" } }])),
            "data: [DONE]".to_string(),
            ": keep-alive".to_string(),
            "data: {\"text\": \"[{\\\"step_type\\\": \\\"FINAL\\\"".to_string(),
        ]
        .join("\n");
        assert_eq!(decode_event_stream(&body), "ok");
    }

    #[test]
    fn test_decoded_steps_array_accepted() {
        let body = format!(
            "data:{}",
            json!({ "text": [{ "step_type": "FINAL", "content": { "answer": "inline" } }] })
        );
        assert_eq!(decode_event_stream(&body), "inline");
    }

    #[test]
    fn test_no_final_step_is_empty() {
        let body = event_line(json!([{ "step_type": "SEARCH_RESULTS", "content": { "answer": "nope" } }]));
        assert_eq!(decode_event_stream(&body), "");
    }

    #[test]
    fn test_empty_nested_answer_is_not_an_answer() {
        let body = event_line(json!([
            { "step_type": "FINAL", "content": { "answer": "{\"answer\":\"\"}" } }
        ]));
        assert_eq!(decode_event_stream(&body), "");
    }

    #[test]
    fn test_later_empty_nested_answer_supersedes_draft() {
        let body = [
            event_line(json!([{ "step_type": "FINAL", "content": { "answer": "draft" } }])),
            event_line(json!([
                { "step_type": "FINAL", "content": { "answer": "{\"answer\":\"\"}" } }
            ])),
        ]
        .join("\n");
        assert_eq!(decode_event_stream(&body), "");
    }

    #[test]
    fn test_empty_final_answer_ignored() {
        let body = event_line(json!([{ "step_type": "FINAL", "content": { "answer": "" } }]));
        assert_eq!(decode_event_stream(&body), "");
    }
}
