//! Projection of the line model onto the rendering surface.
//!
//! [`ScreenView`] owns the [`LineBuffer`] and keeps the surface in lockstep
//! with it: every structural command mutates the model first (which
//! validates indices) and is mirrored onto the surface only on success.
//! Contract violations — out-of-range indices from a desynchronized
//! backend — are logged and skipped so the rendering surface degrades
//! instead of ending the session.
//!
//! After every mutation that can change layout, the viewport-bottom
//! adjustment is re-applied: while the screen part of the sequence fits in
//! the viewport, the container is shifted up by the rendered history height
//! so history stays out of sight but keeps its scroll space.

use glassterm_core::{BufferError, LineBuffer, MAX_HISTORY_PX, protocol::ClientCommand};
use tracing::warn;

use crate::surface::{Surface, SurfaceMetrics};

/// Tuning for the screen projection.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// History pixel budget before a trim request is emitted.
    pub max_history_px: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            max_history_px: MAX_HISTORY_PX,
        }
    }
}

/// The screen/history model bound to a rendering surface.
#[derive(Debug, Default)]
pub struct ScreenView {
    buffer: LineBuffer,
    config: ScreenConfig,
    /// Viewport row count from the last geometry probe. Zero until the
    /// first resize; the adjustment is skipped in that window.
    viewport_rows: usize,
}

impl ScreenView {
    #[must_use]
    pub fn new(config: ScreenConfig) -> Self {
        Self {
            buffer: LineBuffer::new(),
            config,
            viewport_rows: 0,
        }
    }

    /// The underlying line model.
    #[must_use]
    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// Viewport rows used for the bottom adjustment.
    #[must_use]
    pub fn viewport_rows(&self) -> usize {
        self.viewport_rows
    }

    /// Record a new viewport row count (after a geometry probe).
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows;
    }

    fn skip(op: &'static str, err: BufferError) {
        warn!(%err, "skipping {op}: backend out of sync");
    }

    /// Replace the content of the line at `index`.
    pub fn set_line(&mut self, surface: &mut impl Surface, index: usize, content: &str) {
        match self.buffer.set_line(index, content) {
            Ok(()) => surface.set_line(index, content),
            Err(e) => Self::skip("set_line", e),
        }
    }

    /// Insert a line before `index` (append when past the end).
    pub fn insert_line(&mut self, surface: &mut impl Surface, index: usize, content: &str) {
        let at = self.buffer.insert_line(index, content);
        surface.insert_line(at, content);
        self.adjust(surface);
    }

    /// Append a line at the end.
    pub fn append_line(&mut self, surface: &mut impl Surface, content: &str) {
        self.buffer.append_line(content);
        surface.append_line(content);
        self.adjust(surface);
    }

    /// Remove the line at `index`.
    pub fn remove_line(&mut self, surface: &mut impl Surface, index: usize) {
        match self.buffer.remove_line(index) {
            Ok(_) => {
                surface.remove_line(index);
                self.adjust(surface);
            }
            Err(e) => Self::skip("remove_line", e),
        }
    }

    /// Remove the last line.
    pub fn remove_last_line(&mut self, surface: &mut impl Surface) {
        match self.buffer.remove_last_line() {
            Ok(_) => {
                surface.remove_line(self.buffer.len());
                self.adjust(surface);
            }
            Err(e) => Self::skip("remove_last_line", e),
        }
    }

    /// Move the history/screen cursor.
    pub fn set_screen0(&mut self, surface: &mut impl Surface, index: usize) {
        match self.buffer.set_screen0(index) {
            Ok(()) => self.adjust(surface),
            Err(e) => Self::skip("set_screen0", e),
        }
    }

    /// Clear the sequence and the surface unconditionally.
    pub fn reset(&mut self, surface: &mut impl Surface) {
        self.buffer.reset();
        surface.clear();
    }

    /// Backend-acknowledged trim: drop the first `n` lines and clear the
    /// pending-trim flag.
    pub fn remove_history_lines(&mut self, surface: &mut impl Surface, n: usize) {
        let removed = self.buffer.remove_history_lines(n);
        surface.remove_first_lines(removed);
        self.adjust(surface);
    }

    /// Replace the line at `index` with a frame anchor in the model.
    ///
    /// The surface-side replacement is the frame manager's job; this only
    /// records the binding. Fails on an out-of-range index.
    pub fn bind_frame(&mut self, index: usize, frame_id: &str) -> Result<(), BufferError> {
        self.buffer.bind_frame(index, frame_id)
    }

    /// Measure the rendered history and request a trim when it exceeds the
    /// budget. At most one request is outstanding at a time; while one is
    /// pending this is a no-op.
    pub fn check_history_size(&mut self, surface: &impl Surface) -> Option<ClientCommand> {
        let metrics = SurfaceMetrics(surface);
        self.buffer
            .check_history_size(&metrics, self.config.max_history_px)
            .map(|n| ClientCommand::RemoveHistory { n })
    }

    /// Re-apply the viewport-bottom adjustment.
    pub fn adjust(&self, surface: &mut impl Surface) {
        let overlap = {
            let metrics = SurfaceMetrics(&*surface);
            self.buffer.trailing_adjustment(&metrics, self.viewport_rows)
        };
        if let Some(px) = overlap {
            surface.set_history_overlap(px);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::FakeSurface;

    fn view() -> ScreenView {
        let mut v = ScreenView::new(ScreenConfig::default());
        v.set_viewport_rows(24);
        v
    }

    #[test]
    fn mutations_mirror_to_surface() {
        let mut s = FakeSurface::new();
        let mut v = view();
        v.append_line(&mut s, "a");
        v.append_line(&mut s, "b");
        v.insert_line(&mut s, 1, "mid");
        v.set_line(&mut s, 0, "A");
        assert_eq!(s.markups(), vec!["A", "mid", "b"]);
        v.remove_line(&mut s, 1);
        v.remove_last_line(&mut s);
        assert_eq!(s.markups(), vec!["A"]);
        assert_eq!(v.buffer().len(), 1);
    }

    #[test]
    fn out_of_range_ops_degrade() {
        let mut s = FakeSurface::new();
        let mut v = view();
        v.append_line(&mut s, "a");
        v.set_line(&mut s, 9, "x");
        v.remove_line(&mut s, 9);
        v.set_screen0(&mut s, 9);
        assert_eq!(s.markups(), vec!["a"]);
        assert_eq!(v.buffer().screen0(), 0);
    }

    #[test]
    fn adjustment_applied_when_screen_fits() {
        let mut s = FakeSurface::new();
        let mut v = view();
        for _ in 0..10 {
            v.append_line(&mut s, "x");
        }
        v.set_screen0(&mut s, 6);
        // History of 6 lines at 16 px each.
        assert_eq!(s.overlap, Some(96.0));
    }

    #[test]
    fn adjustment_skipped_before_first_resize() {
        let mut s = FakeSurface::new();
        let mut v = ScreenView::new(ScreenConfig::default());
        v.append_line(&mut s, "x");
        assert_eq!(s.overlap, None);
    }

    #[test]
    fn trim_requested_once_then_acknowledged() {
        let mut s = FakeSurface::new();
        let mut v = view();
        for _ in 0..4 {
            v.append_line(&mut s, "x");
        }
        s.set_line_height(0, 4000.0);
        s.set_line_height(1, 7000.0);
        s.set_line_height(2, 1000.0);
        v.set_screen0(&mut s, 3);

        // Offsets: [0, 4000, 11000], history height 12000.
        assert_eq!(
            v.check_history_size(&s),
            Some(ClientCommand::RemoveHistory { n: 1 })
        );
        assert_eq!(v.check_history_size(&s), None);

        v.remove_history_lines(&mut s, 1);
        assert!(!v.buffer().trim_pending());
        assert_eq!(s.markups().len(), 3);
        assert_eq!(v.buffer().screen0(), 2);
    }

    #[test]
    fn reset_clears_model_and_surface() {
        let mut s = FakeSurface::new();
        let mut v = view();
        v.append_line(&mut s, "a");
        v.reset(&mut s);
        assert!(v.buffer().is_empty());
        assert!(s.lines.is_empty());
    }
}
