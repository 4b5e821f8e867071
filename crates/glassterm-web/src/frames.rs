//! Embedded-frame lifecycle: nested sub-terminals hosted in line slots.
//!
//! A frame replaces one line of the terminal with an isolated sub-document
//! that can run its own nested terminal session. The line sequence owns the
//! node; this manager owns only the lifecycle transitions — which frame is
//! "current" (interactive), entering, leaving, and resizing. Leaving a
//! frame clears the current reference without touching the node: "no
//! current frame" and "frame exists but unfocused" are distinct states.

use glassterm_core::FrameId;
use tracing::warn;

use crate::screen::ScreenView;
use crate::surface::Surface;

/// Lifecycle manager for embedded frames.
#[derive(Debug, Default)]
pub struct FrameManager {
    current: Option<FrameId>,
}

impl FrameManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame currently in interactive mode, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Replace the line at `index` with a frame loaded from `uri` and make
    /// it the current frame.
    ///
    /// The frame gets the full terminal width and a minimum height of one
    /// scrollbar thickness; anything less shows artifacts while the frame
    /// animates its own first resize. A previously current frame has its
    /// document closed before being displaced.
    pub fn insert_frame(
        &mut self,
        screen: &mut ScreenView,
        surface: &mut impl Surface,
        index: usize,
        frame_id: &str,
        uri: &str,
    ) {
        if let Err(e) = screen.bind_frame(index, frame_id) {
            warn!(%e, frame_id, "skipping insert_frame: backend out of sync");
            return;
        }
        if let Some(old) = self.current.take() {
            surface.close_frame_document(&old);
        }
        let min_height = surface.scrollbar_thickness();
        surface.insert_frame(index, frame_id, uri, min_height);
        self.current = Some(frame_id.to_string());
        screen.adjust(surface);
    }

    /// Leave frame-interactive mode.
    ///
    /// Only drops the current reference; the frame's node and line binding
    /// stay untouched.
    pub fn leave(&mut self) {
        self.current = None;
    }

    /// Stream markup into the current frame's document and grow the frame
    /// to the document's new content height.
    ///
    /// The frame is resized after every write so streamed content is
    /// visible without waiting for an explicit resize command; the viewport
    /// adjustment is re-run because the resize changes layout. A document
    /// that cannot be measured keeps its current height.
    pub fn write(&self, screen: &ScreenView, surface: &mut impl Surface, content: &str) {
        let Some(id) = self.current.as_deref() else {
            warn!("skipping frame write: no current frame");
            return;
        };
        surface.write_frame_document(id, content);
        if let Some(height) = surface.frame_document_height(id) {
            surface.set_frame_height(id, height);
        }
        screen.adjust(surface);
    }

    /// Set the rendered height of the frame `frame_id`.
    ///
    /// An unknown id means the backend and the page disagree about which
    /// frames exist; the operation is logged and skipped.
    pub fn resize_frame(&self, surface: &mut impl Surface, frame_id: &str, height: f64) {
        if !surface.set_frame_height(frame_id, height) {
            warn!(frame_id, height, "skipping frame resize: unknown frame");
        }
    }

    /// Close the current frame's document.
    ///
    /// Reserved extension point: upstream never specified teardown
    /// behavior, so this is a deliberate no-op. Downstream integrations
    /// layer real teardown on top once the contract exists.
    pub fn close_document(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::FakeSurface;
    use crate::screen::{ScreenConfig, ScreenView};

    fn setup() -> (FakeSurface, ScreenView, FrameManager) {
        let mut surface = FakeSurface::new();
        let mut screen = ScreenView::new(ScreenConfig::default());
        screen.set_viewport_rows(24);
        for i in 0..3 {
            screen.append_line(&mut surface, &format!("l{i}"));
        }
        (surface, screen, FrameManager::new())
    }

    #[test]
    fn insert_frame_binds_line_and_sets_current() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 1, "f1", "http://localhost/f1");
        assert_eq!(frames.current(), Some("f1"));
        assert_eq!(surface.frame_at(1), Some("f1"));
        assert!(screen.buffer().line(1).unwrap().is_frame());
        // Minimum height is the scrollbar thickness.
        assert_eq!(surface.frame_heights["f1"], surface.scrollbar_px);
    }

    #[test]
    fn insert_frame_out_of_range_is_skipped() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 9, "f1", "http://localhost/f1");
        assert_eq!(frames.current(), None);
        assert_eq!(surface.frame_at(9), None);
    }

    #[test]
    fn leave_keeps_frame_in_place() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 1, "f1", "http://localhost/f1");
        frames.leave();
        assert_eq!(frames.current(), None);
        // The node and its binding survive; only focus is dropped.
        assert_eq!(surface.frame_at(1), Some("f1"));
        assert!(screen.buffer().line(1).unwrap().is_frame());
    }

    #[test]
    fn new_frame_closes_previous_document() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 0, "f1", "http://localhost/f1");
        frames.insert_frame(&mut screen, &mut surface, 2, "f2", "http://localhost/f2");
        assert_eq!(surface.closed_documents, vec!["f1".to_string()]);
        assert_eq!(frames.current(), Some("f2"));
    }

    #[test]
    fn resize_unknown_frame_is_skipped() {
        let (mut surface, _screen, frames) = setup();
        frames.resize_frame(&mut surface, "ghost", 400.0);
        assert!(surface.frame_heights.is_empty());
    }

    #[test]
    fn resize_known_frame_applies_height() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 1, "f1", "http://localhost/f1");
        frames.resize_frame(&mut surface, "f1", 480.0);
        assert_eq!(surface.frame_heights["f1"], 480.0);
    }

    #[test]
    fn write_targets_current_frame_only() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.write(&screen, &mut surface, "ignored");
        assert!(surface.frame_writes.is_empty());

        frames.insert_frame(&mut screen, &mut surface, 1, "f1", "http://localhost/f1");
        frames.write(&screen, &mut surface, "<p>hi</p>");
        assert_eq!(
            surface.frame_writes,
            vec![("f1".to_string(), "<p>hi</p>".to_string())]
        );
    }

    #[test]
    fn write_grows_frame_to_content_height() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 1, "f1", "http://localhost/f1");
        surface.set_frame_document_height("f1", 300.0);
        frames.write(&screen, &mut surface, "<p>tall content</p>");
        assert_eq!(surface.frame_heights["f1"], 300.0);
        // The hosting line grows with the frame.
        assert_eq!(surface.lines[1].height, 300.0);
    }

    #[test]
    fn write_without_measurable_document_keeps_height() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 1, "f1", "http://localhost/f1");
        frames.write(&screen, &mut surface, "<p>hi</p>");
        assert_eq!(surface.frame_heights["f1"], surface.scrollbar_px);
    }

    #[test]
    fn resize_after_frame_line_removed_is_skipped() {
        let (mut surface, mut screen, mut frames) = setup();
        frames.insert_frame(&mut screen, &mut surface, 1, "f1", "http://localhost/f1");
        screen.remove_line(&mut surface, 1);
        frames.resize_frame(&mut surface, "f1", 480.0);
        assert!(!surface.frame_heights.contains_key("f1"));
    }
}
