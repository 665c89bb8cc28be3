//! Outbound event-frame serializer.
//!
//! The relay guarantees frame order and content; wire framing beyond the
//! SSE-style `data:` lines produced here is owned by the transport layer.

use bytes::Bytes;

use crate::stream::DeltaEvent;
use crate::util::push_json_string_escaped;

const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// Encode one delta event as an SSE text frame.
#[must_use]
pub fn encode_event_frame(event: &DeltaEvent) -> Bytes {
    match event {
        DeltaEvent::Text(text) => {
            let mut out = String::with_capacity(32 + text.len());
            out.push_str("data: {\"delta\":{\"text\":");
            push_json_string_escaped(&mut out, text);
            out.push_str("}}\n\n");
            Bytes::from(out)
        }
        DeltaEvent::Done => Bytes::from_static(DONE_FRAME),
        DeltaEvent::Error(message) => {
            let mut out = String::with_capacity(40 + message.len());
            out.push_str("data: {\"error\":{\"message\":");
            push_json_string_escaped(&mut out, message);
            out.push_str("}}\n\n");
            Bytes::from(out)
        }
    }
}
