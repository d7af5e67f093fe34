//! Content blocks and result normalization.
//!
//! Handlers return a [`ToolOutput`]; [`normalize`] turns it into the
//! [`ResultEnvelope`] written back to the caller. Normalization is total:
//! every output has a defined envelope and there is no failure mode.

use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

// =============================================================================
// Content blocks
// =============================================================================

/// A typed unit of result payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    Image { data: Bytes, mime_type: String },
    Structured(Value),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(text.into())
    }

    /// Image block with the MIME type sniffed from the payload.
    pub fn image(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let mime_type = sniff_mime_type(&data).to_string();
        ContentBlock::Image { data, mime_type }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Wire form. Structured blocks travel as text holding their JSON.
    pub fn to_wire(&self) -> Value {
        match self {
            ContentBlock::Text(text) => json!({"type": "text", "text": text}),
            ContentBlock::Image { data, mime_type } => json!({
                "type": "image",
                "data": base64::engine::general_purpose::STANDARD.encode(data),
                "mimeType": mime_type,
            }),
            ContentBlock::Structured(value) => json!({"type": "text", "text": pretty_json(value)}),
        }
    }
}

fn sniff_mime_type(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        "image/gif"
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "application/octet-stream"
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

// =============================================================================
// Result envelope
// =============================================================================

/// Ordered content returned for one invocation.
///
/// Never empty. A failed invocation carries exactly one text block holding
/// an [`ErrorPayload`](crate::tools::ErrorPayload).
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    blocks: Vec<ContentBlock>,
    is_error: bool,
}

impl ResultEnvelope {
    pub(crate) fn success(blocks: Vec<ContentBlock>) -> Self {
        debug_assert!(!blocks.is_empty());
        Self {
            blocks,
            is_error: false,
        }
    }

    pub(crate) fn failure(block: ContentBlock) -> Self {
        Self {
            blocks: vec![block],
            is_error: true,
        }
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<ContentBlock> {
        self.blocks
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// `tools/call` result body.
    pub fn to_wire(&self) -> Value {
        let content: Vec<Value> = self.blocks.iter().map(ContentBlock::to_wire).collect();
        json!({
            "content": content,
            "isError": self.is_error,
        })
    }
}

// =============================================================================
// Handler output
// =============================================================================

/// Raw value returned by a tool handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Binary(Bytes),
    Content(Vec<ContentBlock>),
    Json(Value),
}

impl ToolOutput {
    /// Serialize any value into a JSON output. Values serde cannot represent
    /// (e.g. maps with non-string keys) fall back to their `Debug` string.
    pub fn json<T>(value: &T) -> Self
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(v) => ToolOutput::Json(v),
            Err(e) => {
                tracing::debug!("serialization fallback to string: {}", e);
                ToolOutput::Json(Value::String(format!("{:?}", value)))
            }
        }
    }
}

impl From<String> for ToolOutput {
    fn from(s: String) -> Self {
        ToolOutput::Text(s)
    }
}

impl From<&str> for ToolOutput {
    fn from(s: &str) -> Self {
        ToolOutput::Text(s.to_string())
    }
}

impl From<Bytes> for ToolOutput {
    fn from(b: Bytes) -> Self {
        ToolOutput::Binary(b)
    }
}

impl From<Vec<u8>> for ToolOutput {
    fn from(b: Vec<u8>) -> Self {
        ToolOutput::Binary(Bytes::from(b))
    }
}

impl From<Vec<ContentBlock>> for ToolOutput {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        ToolOutput::Content(blocks)
    }
}

impl From<Value> for ToolOutput {
    fn from(v: Value) -> Self {
        ToolOutput::Json(v)
    }
}

// =============================================================================
// Normalizer
// =============================================================================

/// Map a handler's output to a non-empty envelope.
///
/// - text → one text block
/// - binary → one image block
/// - content blocks → returned unchanged
/// - JSON string → one text block with the bare string
/// - any other JSON (and an empty block list) → one text block with its
///   pretty-printed serialization
pub fn normalize(output: ToolOutput) -> ResultEnvelope {
    let blocks = match output {
        ToolOutput::Text(text) => vec![ContentBlock::Text(text)],
        ToolOutput::Binary(data) => vec![ContentBlock::image(data)],
        ToolOutput::Content(blocks) if !blocks.is_empty() => blocks,
        ToolOutput::Content(_) => vec![ContentBlock::Text(pretty_json(&json!([])))],
        ToolOutput::Json(Value::String(text)) => vec![ContentBlock::Text(text)],
        ToolOutput::Json(value) => vec![ContentBlock::Text(pretty_json(&value))],
    };
    ResultEnvelope::success(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_string_becomes_single_text() {
        let envelope = normalize("Echo: hi".into());
        assert_eq!(envelope.blocks(), &[ContentBlock::text("Echo: hi")]);
        assert!(!envelope.is_error());
    }

    #[test]
    fn test_mapping_becomes_json_text() {
        let value = json!({"a": 1, "b": [1, 2]});
        let envelope = normalize(value.clone().into());
        assert_eq!(envelope.len(), 1);
        let text = envelope.blocks()[0].as_text().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_numbers_and_sequences_serialize() {
        let envelope = normalize(json!(42).into());
        assert_eq!(envelope.blocks()[0].as_text(), Some("42"));

        let envelope = normalize(json!([1, "two", null]).into());
        let parsed: Value = serde_json::from_str(envelope.blocks()[0].as_text().unwrap()).unwrap();
        assert_eq!(parsed, json!([1, "two", null]));
    }

    #[test]
    fn test_binary_becomes_image() {
        let png = b"\x89PNG\r\n\x1a\nrest".to_vec();
        let envelope = normalize(png.clone().into());
        match &envelope.blocks()[0] {
            ContentBlock::Image { data, mime_type } => {
                assert_eq!(data.as_ref(), png.as_slice());
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_content_is_never_empty_envelope() {
        let envelope = normalize(ToolOutput::Content(Vec::new()));
        assert_eq!(envelope.len(), 1);
        assert_eq!(envelope.blocks()[0].as_text(), Some("[]"));
    }

    #[test]
    fn test_non_string_keys_fall_back_to_debug() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");
        let output = ToolOutput::json(&map);
        let envelope = normalize(output);
        assert!(envelope.blocks()[0].as_text().unwrap().contains("pair"));
    }

    #[test]
    fn test_image_wire_is_base64() {
        let block = ContentBlock::image(vec![0xFF, 0xD8, 0xFF, 0x00]);
        let wire = block.to_wire();
        assert_eq!(wire["type"], "image");
        assert_eq!(wire["mimeType"], "image/jpeg");
        assert_eq!(wire["data"], "/9j/AA==");
    }

    #[test]
    fn test_structured_wire_is_text() {
        let wire = ContentBlock::Structured(json!({"k": "v"})).to_wire();
        assert_eq!(wire["type"], "text");
        assert!(wire["text"].as_str().unwrap().contains("\"k\""));
    }

    fn arb_block() -> impl Strategy<Value = ContentBlock> {
        prop_oneof![
            ".*".prop_map(ContentBlock::Text),
            proptest::collection::vec(any::<u8>(), 0..64).prop_map(ContentBlock::image),
            any::<i64>().prop_map(|n| ContentBlock::Structured(json!({"n": n}))),
        ]
    }

    proptest! {
        #[test]
        fn prop_normalize_content_is_identity(blocks in proptest::collection::vec(arb_block(), 1..8)) {
            let envelope = normalize(ToolOutput::Content(blocks.clone()));
            prop_assert_eq!(envelope.into_blocks(), blocks);
        }

        #[test]
        fn prop_normalize_is_idempotent(text in ".*") {
            let once = normalize(ToolOutput::Text(text)).into_blocks();
            let twice = normalize(ToolOutput::Content(once.clone())).into_blocks();
            prop_assert_eq!(once, twice);
        }
    }
}
