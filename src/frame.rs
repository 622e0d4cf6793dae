//! Line-based wire frame codec.
//!
//! Every inbound line begins with a one-byte type tag. Frames are decoded per
//! read and never retained.

use serde_json::Value;

/// One decoded wire frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// Session accepted by the server.
    Open,
    /// Session closed by the server; any trailing body is ignored.
    Close,
    /// Keepalive; never surfaced to consumers.
    Heartbeat,
    /// Single JSON payload.
    Message(Value),
    /// Ordered batch of JSON payloads.
    Array(Vec<Value>),
}

impl Frame {
    /// Decodes one wire line.
    ///
    /// Returns `Ok(None)` for empty lines and unknown type tags: servers emit
    /// prelude and vendor frames this client does not understand, and the read
    /// loop must stay alive through them, so they are dropped rather than
    /// treated as errors.
    pub fn parse(line: &str) -> Result<Option<Frame>, serde_json::Error> {
        let Some(tag) = line.chars().next() else {
            return Ok(None);
        };
        let body = &line[tag.len_utf8()..];
        match tag {
            'o' => Ok(Some(Frame::Open)),
            'c' => Ok(Some(Frame::Close)),
            'h' => Ok(Some(Frame::Heartbeat)),
            'm' => Ok(Some(Frame::Message(serde_json::from_str(body)?))),
            'a' => Ok(Some(Frame::Array(serde_json::from_str(body)?))),
            _ => Ok(None),
        }
    }
}

/// Encodes an outbound payload for the send path.
///
/// The payload goes out as a bare JSON document, not wrapped in the tagged
/// array framing the server uses inbound. Strict servers reject the unframed
/// body; the behavior is kept as-is until the correct outbound framing is
/// settled server-side.
pub fn encode_payload(payload: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(payload)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{encode_payload, Frame};

    #[test]
    fn open_close_heartbeat_carry_no_payload() {
        assert_eq!(Frame::parse("o").expect("parse"), Some(Frame::Open));
        assert_eq!(Frame::parse("c").expect("parse"), Some(Frame::Close));
        assert_eq!(Frame::parse("h").expect("parse"), Some(Frame::Heartbeat));
    }

    #[test]
    fn close_ignores_trailing_body() {
        let frame = Frame::parse(r#"c[3000,"Go away!"]"#).expect("parse");
        assert_eq!(frame, Some(Frame::Close));
    }

    #[test]
    fn heartbeat_prelude_line_is_a_heartbeat() {
        let prelude = "h".repeat(2048);
        assert_eq!(Frame::parse(&prelude).expect("parse"), Some(Frame::Heartbeat));
    }

    #[test]
    fn message_frame_yields_exactly_the_encoded_value() {
        let frame = Frame::parse(r#"m{"type":"status","progress":42}"#).expect("parse");
        assert_eq!(
            frame,
            Some(Frame::Message(json!({"type": "status", "progress": 42})))
        );

        let scalar = Frame::parse("m3.5").expect("parse");
        assert_eq!(scalar, Some(Frame::Message(json!(3.5))));
    }

    #[test]
    fn array_frame_preserves_element_order() {
        let frame = Frame::parse(r#"a[{"x":1},{"x":2},{"x":3}]"#).expect("parse");
        assert_eq!(
            frame,
            Some(Frame::Array(vec![
                json!({"x": 1}),
                json!({"x": 2}),
                json!({"x": 3}),
            ]))
        );
    }

    #[test]
    fn unknown_tags_and_empty_lines_are_dropped() {
        assert_eq!(Frame::parse("").expect("parse"), None);
        assert_eq!(Frame::parse("z{\"x\":1}").expect("parse"), None);
        assert_eq!(Frame::parse("!").expect("parse"), None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Frame::parse("m{not json").is_err());
        assert!(Frame::parse("a{\"not\":\"an array\"}").is_err());
        assert!(Frame::parse("m").is_err());
    }

    #[test]
    fn encode_is_bare_json_with_no_framing() {
        let encoded = encode_payload(&json!({"throttle": 10})).expect("encode");
        assert_eq!(encoded, r#"{"throttle":10}"#);
    }
}
