use engine_logging::engine_debug;
use serde::{Deserialize, Serialize};

pub const SEND_MESSAGE_ACTION: &str = "sendMessage";

#[derive(Serialize)]
struct OutboundFrame<'a> {
    action: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct InboundFrame {
    message: String,
}

/// Encodes `{"action":"sendMessage","message":text}`.
pub fn encode_send_message(text: &str) -> String {
    let frame = OutboundFrame {
        action: SEND_MESSAGE_ACTION,
        message: text,
    };
    // A struct of two string fields always serializes.
    serde_json::to_string(&frame).unwrap_or_default()
}

/// Returns the text of an inbound frame, or `None` for empty, malformed or blank frames.
pub fn decode_inbound(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        engine_debug!("discarding empty frame");
        return None;
    }
    match serde_json::from_str::<InboundFrame>(raw) {
        Ok(frame) if !frame.message.trim().is_empty() => Some(frame.message),
        Ok(_) => {
            engine_debug!("discarding frame with blank message");
            None
        }
        Err(err) => {
            engine_debug!("discarding malformed frame: {}", err);
            None
        }
    }
}
