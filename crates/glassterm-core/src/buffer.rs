//! The terminal line sequence: scrollback history plus the visible screen.
//!
//! [`LineBuffer`] stores the full ordered sequence of rendered lines. A
//! cursor value `screen0` partitions it into a history prefix (lines above
//! the visible viewport) and a screen suffix (the viewport itself). All
//! structural mutation is driven serially by inbound channel commands; the
//! buffer is plain `&mut self` state and hosts with parallel callback
//! delivery must serialize access externally.
//!
//! Pixel layout is never measured here. Decisions that depend on rendered
//! geometry (history trimming, viewport-bottom adjustment) are computed
//! against a [`LineMetrics`] capability supplied by the rendering surface,
//! so the model is fully testable without one.

use tracing::warn;

use crate::line::{FrameId, Line};

/// History height budget in pixels. When the rendered history grows past
/// this, a trim request is emitted for the backend.
pub const MAX_HISTORY_PX: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Contract violations on the line sequence.
///
/// These indicate a desynchronized backend rather than a recoverable
/// condition; callers log and skip the operation instead of terminating the
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Index does not address an existing line.
    IndexOutOfRange { index: usize, len: usize },
    /// `screen0` would fall outside `0..=len`.
    InvalidScreen0 { index: usize, len: usize },
    /// Operation requires at least one line.
    Empty,
}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "line index {index} out of range (len {len})")
            }
            Self::InvalidScreen0 { index, len } => {
                write!(f, "screen0 {index} out of range (len {len})")
            }
            Self::Empty => write!(f, "line sequence is empty"),
        }
    }
}

impl std::error::Error for BufferError {}

// ---------------------------------------------------------------------------
// Metrics capability
// ---------------------------------------------------------------------------

/// Pixel metrics for rendered lines, supplied by the rendering surface.
///
/// `offset_top(i)` is the distance in pixels from the top of the line
/// container to line `i`. Index `0` is therefore always at offset `0`, and
/// `offset_top(screen0)` is the rendered height of the history. An index
/// equal to the line count is valid and means the bottom edge of the last
/// line (the screen may be empty with all lines in history).
pub trait LineMetrics {
    fn offset_top(&self, index: usize) -> f64;
}

// ---------------------------------------------------------------------------
// Line buffer
// ---------------------------------------------------------------------------

/// Ordered line sequence with a history/screen partition and trim state.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    lines: Vec<Line>,
    /// Index of the first line belonging to the visible screen. Always in
    /// `0..=lines.len()`.
    screen0: usize,
    /// Whether a history-trim request is outstanding. At most one request
    /// may be in flight; cleared only by [`LineBuffer::remove_history_lines`].
    ///
    /// There is no timeout: if the backend never acknowledges a trim, the
    /// history check stays disabled for the rest of the session. Known
    /// liveness risk, kept deliberately — the channel is assumed reliable.
    pending_trim: bool,
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of lines (history + screen).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the sequence holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the first screen line.
    #[must_use]
    pub fn screen0(&self) -> usize {
        self.screen0
    }

    /// Whether a history-trim request is outstanding.
    #[must_use]
    pub fn trim_pending(&self) -> bool {
        self.pending_trim
    }

    /// Line at `index`, if present.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Iterate over all lines in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    fn oob(&self, index: usize) -> BufferError {
        BufferError::IndexOutOfRange {
            index,
            len: self.lines.len(),
        }
    }

    /// Replace the content of the existing line at `index`.
    pub fn set_line(&mut self, index: usize, content: impl Into<String>) -> Result<(), BufferError> {
        match self.lines.get_mut(index) {
            Some(line) => {
                line.content = content.into();
                line.frame = None;
                Ok(())
            }
            None => Err(self.oob(index)),
        }
    }

    /// Insert a new line before `index`; appends when `index >= len`.
    ///
    /// Returns the index the line actually landed at.
    pub fn insert_line(&mut self, index: usize, content: impl Into<String>) -> usize {
        let at = index.min(self.lines.len());
        self.lines.insert(at, Line::text(content));
        if at < self.screen0 {
            self.screen0 += 1;
        }
        at
    }

    /// Append a line at the end of the sequence.
    pub fn append_line(&mut self, content: impl Into<String>) {
        self.lines.push(Line::text(content));
    }

    /// Remove the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> Result<Line, BufferError> {
        if index >= self.lines.len() {
            return Err(self.oob(index));
        }
        let line = self.lines.remove(index);
        if index < self.screen0 {
            self.screen0 -= 1;
        }
        self.screen0 = self.screen0.min(self.lines.len());
        Ok(line)
    }

    /// Remove the last line.
    pub fn remove_last_line(&mut self) -> Result<Line, BufferError> {
        match self.lines.pop() {
            Some(line) => {
                self.screen0 = self.screen0.min(self.lines.len());
                Ok(line)
            }
            None => Err(BufferError::Empty),
        }
    }

    /// Move the history/screen cursor to `index`.
    ///
    /// Idempotent; `index == len` is valid and denotes an empty screen.
    pub fn set_screen0(&mut self, index: usize) -> Result<(), BufferError> {
        if index > self.lines.len() {
            return Err(BufferError::InvalidScreen0 {
                index,
                len: self.lines.len(),
            });
        }
        self.screen0 = index;
        Ok(())
    }

    /// Replace the line at `index` with a frame anchor bound to `frame_id`.
    pub fn bind_frame(&mut self, index: usize, frame_id: impl Into<FrameId>) -> Result<(), BufferError> {
        match self.lines.get_mut(index) {
            Some(line) => {
                *line = Line::frame(frame_id);
                Ok(())
            }
            None => Err(self.oob(index)),
        }
    }

    /// Clear the whole sequence, history and screen, unconditionally.
    ///
    /// The pending-trim flag survives a reset: the backend may still answer
    /// an earlier trim request, and that answer must find the flag set.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.screen0 = 0;
    }

    /// Remove the first `n` lines (backend-acknowledged trim).
    ///
    /// Unconditional: clamps `n` to the sequence length and always clears
    /// the pending-trim flag, whether or not a request was outstanding.
    /// `screen0` shifts down by the removed count so the history/screen
    /// partition stays put relative to the surviving lines.
    ///
    /// Returns the number of lines actually removed.
    pub fn remove_history_lines(&mut self, n: usize) -> usize {
        let removed = n.min(self.lines.len());
        if removed < n {
            warn!(requested = n, removed, "history trim larger than sequence");
        }
        self.lines.drain(..removed);
        self.screen0 = self.screen0.saturating_sub(removed);
        self.pending_trim = false;
        removed
    }

    /// Check whether rendered history exceeds `max_px` and pick a trim cut.
    ///
    /// Returns `Some(n)` — "ask the backend to drop the first `n` lines" —
    /// for the earliest cut that brings the remaining history back under
    /// `max_px`, and marks a trim as outstanding. Returns `None` (and emits
    /// nothing) while a previous request is unacknowledged, or when the
    /// history is within budget.
    pub fn check_history_size(&mut self, metrics: &dyn LineMetrics, max_px: f64) -> Option<usize> {
        if self.pending_trim || self.screen0 == 0 || self.screen0 > self.lines.len() {
            return None;
        }
        let history_height = metrics.offset_top(self.screen0);
        if history_height <= max_px {
            return None;
        }
        for i in 0..self.screen0 {
            if history_height - metrics.offset_top(i) < max_px {
                self.pending_trim = true;
                return Some(i);
            }
        }
        None
    }

    /// Compute the viewport-bottom adjustment, if one is needed.
    ///
    /// When the screen part of the sequence fits within `viewport_rows`,
    /// returns the rendered history height in pixels. The surface applies
    /// it as a negative top offset on the line container and an equal top
    /// margin on its parent, keeping history lines out of the visible area
    /// while reserving scroll space for them. Must be re-run after every
    /// structural mutation that can change layout.
    #[must_use]
    pub fn trailing_adjustment(
        &self,
        metrics: &dyn LineMetrics,
        viewport_rows: usize,
    ) -> Option<f64> {
        if self.lines.is_empty() || self.screen0 >= self.lines.len() {
            return None;
        }
        if self.lines.len() - self.screen0 <= viewport_rows {
            Some(metrics.offset_top(self.screen0))
        } else {
            None
        }
    }
}
