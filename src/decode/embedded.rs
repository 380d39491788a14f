//! Decoder for bodies that embed the answer in a nested JSON string.
//!
//! The payload line looks like `[["wrb.fr",null,"<json>"]]`, where `<json>`
//! is itself an encoded array holding the answer text at `[4][0][1][0]`.

use serde_json::Value;
use tracing::trace;

const ENVELOPE_MARKER: &str = "wrb.fr";
const ANSWER_PATH: [usize; 4] = [4, 0, 1, 0];

/// First non-empty answer found in the body, or an empty string.
pub fn decode_embedded(raw_body: &str) -> String {
    raw_body
        .split('\n')
        .filter(|line| line.contains(ENVELOPE_MARKER))
        .find_map(decode_line)
        .unwrap_or_default()
}

fn decode_line(line: &str) -> Option<String> {
    let outer: Value = match serde_json::from_str(line.trim()) {
        Ok(value) => value,
        Err(e) => {
            trace!(error = %e, "Skipping unparsable envelope line");
            return None;
        }
    };
    let payload = envelope_payload(&outer)?;
    let inner: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            trace!(error = %e, "Skipping envelope with unparsable payload");
            return None;
        }
    };

    let text = ANSWER_PATH
        .iter()
        .try_fold(&inner, |node, &index| node.get(index))?
        .as_str()?
        .replace("\\n", "\n");
    (!text.is_empty()).then_some(text)
}

/// The encoded payload string of the first `wrb.fr` envelope.
///
/// Envelopes usually arrive wrapped in an outer array, but a bare envelope is
/// accepted too.
fn envelope_payload(outer: &Value) -> Option<&str> {
    let items = outer.as_array()?;
    let envelope = if is_envelope(outer) {
        items
    } else {
        items.iter().find(|item| is_envelope(item))?.as_array()?
    };
    envelope.iter().skip(1).find_map(Value::as_str)
}

fn is_envelope(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_str)
        == Some(ENVELOPE_MARKER)
}
