//! Tagged-command wire protocol between the page and the backend process.
//!
//! Every message is a JSON object tagged on `"cmd"` with typed fields — a
//! closed command set dispatched by `match`. The predecessor of this
//! protocol shipped raw executable directives over the channel and
//! evaluated them on arrival; that mode is deliberately unrepresentable
//! here: unknown tags and malformed payloads are codec errors, never code.
//!
//! Directions:
//! - [`ServerCommand`]: backend → page, drives the screen model and the
//!   frame manager.
//! - [`ClientCommand`]: page → backend, reports viewport geometry and
//!   requests history trims.
//! - [`FrameResizeRequest`]: an embedded frame document → backend, over the
//!   request/response fallback transport (frames have no channel of their
//!   own).

use serde::{Deserialize, Serialize};

use crate::line::FrameId;

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

/// Errors produced while encoding or decoding protocol messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload is not valid JSON or does not match any known command shape
    /// (unknown `cmd` tag, missing or mistyped fields).
    Malformed(String),
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed protocol message: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// Inbound commands (backend → page)
// ---------------------------------------------------------------------------

/// Commands the backend sends to drive the rendered terminal.
///
/// Line indices are 0-based positions in the current line sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ServerCommand {
    /// Replace the content of the existing line at `index`.
    SetLine { index: usize, content: String },
    /// Insert a new line before `index` (append when past the end).
    InsertLine { index: usize, content: String },
    /// Append a new line at the end of the sequence.
    AppendLine { content: String },
    /// Remove the line at `index`.
    RemoveLine { index: usize },
    /// Remove the last line.
    RemoveLastLine,
    /// Move the history/screen cursor.
    SetScreen0 { index: usize },
    /// Clear the whole sequence, history included.
    Reset,
    /// Acknowledge a trim: drop the first `n` lines.
    RemoveHistoryLines { n: usize },
    /// Re-measure the rendered history and emit a trim request if it has
    /// outgrown its budget. The backend schedules these after refreshes.
    CheckHistorySize,
    /// Replace the line at `index` with an embedded frame.
    InsertFrame {
        index: usize,
        frame_id: FrameId,
        uri: String,
    },
    /// Set the rendered height of the frame `frame_id`.
    FrameResize { frame_id: FrameId, height: f64 },
    /// Stream markup into the current frame's document.
    FrameWrite { content: String },
    /// Leave frame-interactive mode (the frame itself stays).
    LeaveFrame,
    /// Close the current frame's document. Reserved extension point; the
    /// contract is not yet specified upstream and the page treats it as a
    /// no-op hook.
    FrameCloseDocument,
}

// ---------------------------------------------------------------------------
// Outbound commands (page → backend)
// ---------------------------------------------------------------------------

/// Commands the page sends to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Report the viewport cell size after a (re)measure.
    Resize { width: u16, height: u16 },
    /// Ask the backend to drop the first `n` history lines.
    #[serde(rename = "removehistory")]
    RemoveHistory { n: usize },
}

// ---------------------------------------------------------------------------
// Frame fallback transport
// ---------------------------------------------------------------------------

/// Height report from an embedded frame's own document.
///
/// Frames do not own a message channel; they report their content height
/// through the request/response fallback transport instead. The shape is
/// fixed by that transport: `{"command": "resize", "height": px}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResizeRequest {
    pub command: FrameResizeTag,
    pub height: f64,
}

/// The constant `"resize"` tag of [`FrameResizeRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameResizeTag {
    Resize,
}

impl FrameResizeRequest {
    #[must_use]
    pub fn new(height: f64) -> Self {
        Self {
            command: FrameResizeTag::Resize,
            height,
        }
    }
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Decode one inbound message.
pub fn decode_server_command(raw: &str) -> Result<ServerCommand, CodecError> {
    serde_json::from_str(raw).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Encode one outbound message.
pub fn encode_client_command(cmd: &ClientCommand) -> String {
    // Serialization of a closed enum of plain fields cannot fail.
    serde_json::to_string(cmd).unwrap_or_default()
}

/// Encode a frame height report for the fallback transport.
pub fn encode_frame_resize(height: f64) -> String {
    serde_json::to_string(&FrameResizeRequest::new(height)).unwrap_or_default()
}
