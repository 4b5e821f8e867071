//! Deterministic test doubles for the rendering surface and the transport.
//!
//! [`FakeSurface`] models the line container as plain records with explicit
//! per-line pixel heights, so layout-dependent behavior (history trimming,
//! viewport-bottom adjustment, frame sizing) is exercised with exact,
//! reproducible geometry. [`RecordingTransport`] captures outbound channel
//! traffic. Both are used by this crate's own tests and are public so host
//! integrations can drive the terminal headless.

use std::collections::HashMap;

use glassterm_core::CharBox;

use crate::channel::{Transport, TransportError};
use crate::surface::Surface;

/// Default rendered height of a fake line, in pixels.
pub const DEFAULT_LINE_PX: f64 = 16.0;

/// One line node on the fake surface.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeLine {
    pub markup: String,
    /// Frame id when this node hosts an embedded frame.
    pub frame: Option<String>,
    /// Rendered height used for offset computation.
    pub height: f64,
}

impl FakeLine {
    fn text(markup: &str, height: f64) -> Self {
        Self {
            markup: markup.to_string(),
            frame: None,
            height,
        }
    }
}

/// In-memory rendering surface with scripted geometry.
#[derive(Debug, Clone)]
pub struct FakeSurface {
    pub lines: Vec<FakeLine>,
    /// Last applied viewport-bottom adjustment, if any.
    pub overlap: Option<f64>,
    /// Character box reported by the probe.
    pub probe_box: CharBox,
    /// Client size of the viewport.
    pub client: (f64, f64),
    /// Scrollbar thickness for this fake platform.
    pub scrollbar_px: f64,
    /// Height assigned to newly created lines.
    pub line_px: f64,
    /// Heights of frames resized via the surface, by frame id.
    pub frame_heights: HashMap<String, f64>,
    /// Scripted content heights of frame documents, by frame id. Frames
    /// without an entry report an unmeasurable document.
    pub frame_doc_heights: HashMap<String, f64>,
    /// Content written into frame documents, in order.
    pub frame_writes: Vec<(String, String)>,
    /// Frame ids whose documents were closed, in order.
    pub closed_documents: Vec<String>,
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            overlap: None,
            probe_box: CharBox {
                width: 8.0,
                height: 16.0,
            },
            client: (800.0, 640.0),
            scrollbar_px: 15.0,
            line_px: DEFAULT_LINE_PX,
            frame_heights: HashMap::new(),
            frame_doc_heights: HashMap::new(),
            frame_writes: Vec::new(),
            closed_documents: Vec::new(),
        }
    }
}

impl FakeSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the rendered height of the line at `index`.
    pub fn set_line_height(&mut self, index: usize, px: f64) {
        self.lines[index].height = px;
    }

    /// Script the content height reported by the frame `frame_id`'s
    /// document.
    pub fn set_frame_document_height(&mut self, frame_id: &str, px: f64) {
        self.frame_doc_heights.insert(frame_id.to_string(), px);
    }

    fn drop_frame_state(&mut self, frame_id: &str) {
        self.frame_heights.remove(frame_id);
        self.frame_doc_heights.remove(frame_id);
    }

    /// Markup of every line, in document order.
    #[must_use]
    pub fn markups(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.markup.as_str()).collect()
    }

    /// The frame id hosted at `index`, if any.
    #[must_use]
    pub fn frame_at(&self, index: usize) -> Option<&str> {
        self.lines.get(index).and_then(|l| l.frame.as_deref())
    }
}

impl Surface for FakeSurface {
    fn set_line(&mut self, index: usize, markup: &str) {
        let height = self.lines[index].height;
        self.lines[index] = FakeLine::text(markup, height);
    }

    fn insert_line(&mut self, index: usize, markup: &str) {
        let line = FakeLine::text(markup, self.line_px);
        self.lines.insert(index, line);
    }

    fn append_line(&mut self, markup: &str) {
        let line = FakeLine::text(markup, self.line_px);
        self.lines.push(line);
    }

    fn remove_line(&mut self, index: usize) {
        let removed = self.lines.remove(index);
        if let Some(id) = removed.frame {
            self.drop_frame_state(&id);
        }
    }

    fn remove_first_lines(&mut self, n: usize) {
        let removed: Vec<FakeLine> = self.lines.drain(..n.min(self.lines.len())).collect();
        for id in removed.into_iter().filter_map(|l| l.frame) {
            self.drop_frame_state(&id);
        }
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.overlap = None;
        self.frame_heights.clear();
        self.frame_doc_heights.clear();
    }

    fn line_offset_top(&self, index: usize) -> f64 {
        self.lines[..index.min(self.lines.len())]
            .iter()
            .map(|l| l.height)
            .sum()
    }

    fn set_history_overlap(&mut self, px: f64) {
        self.overlap = Some(px);
    }

    fn insert_frame(&mut self, index: usize, frame_id: &str, uri: &str, min_height: f64) {
        self.lines[index] = FakeLine {
            markup: format!("<frame src={uri}>"),
            frame: Some(frame_id.to_string()),
            height: min_height.max(self.line_px),
        };
        self.frame_heights
            .insert(frame_id.to_string(), min_height);
    }

    fn set_frame_height(&mut self, frame_id: &str, height: f64) -> bool {
        let hosted = self
            .lines
            .iter_mut()
            .find(|l| l.frame.as_deref() == Some(frame_id));
        match hosted {
            Some(line) => {
                line.height = height;
                self.frame_heights.insert(frame_id.to_string(), height);
                true
            }
            None => false,
        }
    }

    fn write_frame_document(&mut self, frame_id: &str, content: &str) {
        self.frame_writes
            .push((frame_id.to_string(), content.to_string()));
    }

    fn frame_document_height(&self, frame_id: &str) -> Option<f64> {
        self.frame_doc_heights.get(frame_id).copied()
    }

    fn close_frame_document(&mut self, frame_id: &str) {
        self.closed_documents.push(frame_id.to_string());
    }

    fn char_box(&self) -> CharBox {
        self.probe_box
    }

    fn client_size(&self) -> (f64, f64) {
        self.client
    }

    fn scrollbar_thickness(&self) -> f64 {
        self.scrollbar_px
    }
}

/// Transport double that records outbound traffic.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    pub sent: Vec<String>,
    pub closed: bool,
    /// When set, every send fails with [`TransportError::Failed`].
    pub fail_sends: bool,
}

impl Transport for RecordingTransport {
    fn send(&mut self, data: &str) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Failed("scripted failure".to_string()));
        }
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.sent.push(data.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
