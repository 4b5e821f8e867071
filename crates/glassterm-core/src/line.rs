//! A single renderable line in the terminal's line sequence.
//!
//! A line is either ordinary markup content occupying one row slot, or the
//! anchor for an embedded frame (a nested sub-document hosted in that slot).
//! The line sequence owns the slot; frame lifecycle transitions are managed
//! by the frame manager in the web crate.

/// Identifier of an embedded frame, as assigned by the backend.
///
/// Frame ids double as element ids on the rendering surface, so they are
/// plain strings rather than numeric handles.
pub type FrameId = String;

/// One row slot in the line sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Rendered content (markup). Empty for frame lines, whose visible
    /// content lives in the embedded sub-document.
    pub content: String,
    /// The embedded frame bound to this slot, if any.
    pub frame: Option<FrameId>,
}

impl Line {
    /// Create an ordinary content line.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            frame: None,
        }
    }

    /// Create a line hosting an embedded frame.
    #[must_use]
    pub fn frame(id: impl Into<FrameId>) -> Self {
        Self {
            content: String::new(),
            frame: Some(id.into()),
        }
    }

    /// Whether this line hosts an embedded frame.
    #[must_use]
    pub fn is_frame(&self) -> bool {
        self.frame.is_some()
    }
}
