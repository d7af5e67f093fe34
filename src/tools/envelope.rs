//! Error envelopes: failures as data.
//!
//! Every failure discovered during an invocation becomes one text block whose
//! text is the JSON form of an [`ErrorPayload`].

use crate::tools::content::{ContentBlock, ResultEnvelope};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// `{error, tool, timestamp}` carried inside a failed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub tool: String,
    /// ISO-8601, UTC.
    pub timestamp: String,
}

impl ErrorPayload {
    pub fn new(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            tool: tool.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Wrap into a single-block failed envelope.
    pub fn into_envelope(self) -> ResultEnvelope {
        let text = serde_json::to_string_pretty(&self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": {:?}, \"tool\": {:?}, \"timestamp\": {:?}}}",
                self.error, self.tool, self.timestamp
            )
        });
        ResultEnvelope::failure(ContentBlock::Text(text))
    }

    /// Recover the payload from a failed envelope.
    pub fn from_envelope(envelope: &ResultEnvelope) -> Option<Self> {
        if !envelope.is_error() {
            return None;
        }
        match envelope.blocks() {
            [ContentBlock::Text(text)] => serde_json::from_str(text).ok(),
            _ => None,
        }
    }
}
