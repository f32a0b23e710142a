//! Generation events: the closed set of shapes a research stream produces.
//!
//! The streaming Responses API emits dozens of event types, but only three
//! carry report text. Each is a variant of [`GenerationEvent`]; everything
//! else (reasoning summaries, tool-call progress, status pings) collapses into
//! [`GenerationEvent::Other`]. Text extraction is a single exhaustive `match`
//! in [`GenerationEvent::fragment`], so a new variant cannot be added without
//! deciding what text it yields.
//!
//! ## Wire decoding
//!
//! [`decode_event`] maps one JSON event record onto a variant, and
//! [`read_events`] does the same for a recorded stream (JSON lines or SSE
//! `data:` framing). Failure events reported by the service decode to
//! [`StreamError::Service`]; malformed records to [`StreamError::Unexpected`].

use crate::error::StreamError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::BufRead;

/// One piece of content inside an output item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentPart {
    /// Text of the part; empty for non-text parts.
    #[serde(default)]
    pub text: String,
}

/// An output item (message, delta) holding zero or more content parts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl OutputItem {
    /// An item with a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart { text: text.into() }],
        }
    }

    fn first_text(&self) -> Option<&str> {
        self.content.first().map(|part| part.text.as_str())
    }
}

/// One unit of streamed output from a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// Carries the response object; text of interest is the last output item.
    ResponseCreated { output: Vec<OutputItem> },
    /// A single output item was added.
    ItemAdded { item: OutputItem },
    /// An incremental delta with content.
    ItemDelta { delta: OutputItem },
    /// Reasoning, status, tool progress: nothing to extract.
    Other { kind: String },
}

impl GenerationEvent {
    pub fn response_created<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GenerationEvent::ResponseCreated {
            output: texts.into_iter().map(OutputItem::text).collect(),
        }
    }

    pub fn item_added(text: impl Into<String>) -> Self {
        GenerationEvent::ItemAdded {
            item: OutputItem::text(text),
        }
    }

    pub fn item_delta(text: impl Into<String>) -> Self {
        GenerationEvent::ItemDelta {
            delta: OutputItem::text(text),
        }
    }

    pub fn other(kind: impl Into<String>) -> Self {
        GenerationEvent::Other { kind: kind.into() }
    }

    /// The text fragment this event contributes, if any.
    ///
    /// Empty text counts as no fragment.
    pub fn fragment(&self) -> Option<&str> {
        let text = match self {
            GenerationEvent::ResponseCreated { output } => {
                output.last().and_then(OutputItem::first_text)
            }
            GenerationEvent::ItemAdded { item } => item.first_text(),
            GenerationEvent::ItemDelta { delta } => delta.first_text(),
            GenerationEvent::Other { .. } => None,
        };
        text.filter(|t| !t.is_empty())
    }
}

// ── Wire decoding ────────────────────────────────────────────────────────

/// Decode one JSON event record.
///
/// Precedence mirrors how the service nests text: a `response` object wins
/// over an `item`, which wins over a `delta`. Items and deltas only count
/// when they carry a non-empty `content` array.
pub fn decode_event(json: &str) -> Result<GenerationEvent, StreamError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| StreamError::unexpected(format!("malformed event: {e}")))?;
    let Some(obj) = value.as_object() else {
        return Err(StreamError::unexpected(format!(
            "event is not a JSON object: {}",
            truncate(json, 80)
        )));
    };

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    match kind.as_str() {
        "error" => {
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| obj.get("error").and_then(error_message))
                .unwrap_or("unknown service error");
            return Err(StreamError::service(message));
        }
        "response.failed" => {
            let message = obj
                .get("response")
                .and_then(|r| r.get("error"))
                .and_then(error_message)
                .unwrap_or("response failed");
            return Err(StreamError::service(message));
        }
        _ => {}
    }

    if let Some(response) = obj.get("response").filter(|r| r.is_object()) {
        let output = response
            .get("output")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(item_from_value).collect())
            .unwrap_or_default();
        return Ok(GenerationEvent::ResponseCreated { output });
    }

    if let Some(item) = obj.get("item").map(item_from_value) {
        if !item.content.is_empty() {
            return Ok(GenerationEvent::ItemAdded { item });
        }
    }

    // Text deltas arrive as bare strings; only structured deltas carry content.
    if let Some(delta) = obj.get("delta").filter(|d| d.is_object()).map(item_from_value) {
        if !delta.content.is_empty() {
            return Ok(GenerationEvent::ItemDelta { delta });
        }
    }

    Ok(GenerationEvent::Other { kind })
}

/// Decode every event in a recorded stream.
///
/// Accepts one JSON object per line, or Server-Sent-Events framing where
/// each payload sits on a `data:` line. `event:`/`id:`/`retry:` fields,
/// comments, blank lines and the `[DONE]` sentinel are skipped.
pub fn read_events<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<GenerationEvent, StreamError>> {
    reader.lines().filter_map(|line| match line {
        Err(e) => Some(Err(StreamError::unexpected(format!(
            "failed to read event stream: {e}"
        )))),
        Ok(line) => event_payload(&line).map(decode_event),
    })
}

fn event_payload(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty()
        || line.starts_with(':')
        || line.starts_with("event:")
        || line.starts_with("id:")
        || line.starts_with("retry:")
    {
        return None;
    }
    let payload = line.strip_prefix("data:").map(str::trim_start).unwrap_or(line);
    if payload.is_empty() || payload == "[DONE]" {
        None
    } else {
        Some(payload)
    }
}

fn item_from_value(value: &Value) -> OutputItem {
    let content = value
        .get("content")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|part| ContentPart {
                    text: part
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    OutputItem { content }
}

fn error_message(error: &Value) -> Option<&str> {
    error.get("message").and_then(Value::as_str)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
