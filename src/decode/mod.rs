//! Answer extraction from raw backend response bodies.
//!
//! Upstream formats are undocumented and change without notice, so decoders
//! treat malformed lines and missing fields as the normal case: every failure
//! is local to the candidate being examined, and only a body with no usable
//! candidate at all decodes to the empty string.

mod embedded;
mod event_stream;

pub use embedded::decode_embedded;
pub use event_stream::decode_event_stream;

use crate::backend::{Backend, DecodeStrategy};

/// Extract the answer text; empty means no answer was found.
pub fn decode(backend: Backend, raw_body: &str) -> String {
    match backend.decode_strategy() {
        DecodeStrategy::EmbeddedStructure => decode_embedded(raw_body),
        DecodeStrategy::EventStream => decode_event_stream(raw_body),
    }
}
