//! The rendering-surface capability.
//!
//! Everything the terminal needs from the page is collected behind the
//! [`Surface`] trait: line node creation and mutation, pixel measurement
//! (line offsets, client box, probed character box, scrollbar thickness),
//! the history-overlap layout trick, and frame hosting. The screen model,
//! frame manager, and resize coordinator depend only on this trait, so the
//! whole stack runs against [`FakeSurface`](crate::harness::FakeSurface) in
//! tests and against the DOM-backed implementation on wasm.

use glassterm_core::{CharBox, LineMetrics};

/// Capability interface of the page the terminal renders into.
///
/// Mutating methods are infallible by contract: the model validates indices
/// before mirroring, so an implementation receives only indices it has a
/// node for. Measurement methods reflect current rendered layout and go
/// stale on any DOM change.
pub trait Surface {
    /// Replace the markup of the line node at `index`.
    fn set_line(&mut self, index: usize, markup: &str);

    /// Insert a new line node before `index`.
    fn insert_line(&mut self, index: usize, markup: &str);

    /// Append a new line node at the end of the container.
    fn append_line(&mut self, markup: &str);

    /// Remove the line node at `index`.
    fn remove_line(&mut self, index: usize);

    /// Remove the first `n` line nodes (history trim).
    fn remove_first_lines(&mut self, n: usize);

    /// Remove every line node.
    fn clear(&mut self);

    /// Pixel offset of the line node at `index` from the container top.
    ///
    /// `index == line count` is valid and yields the bottom edge of the
    /// last line (total content height).
    fn line_offset_top(&self, index: usize) -> f64;

    /// Apply the viewport-bottom adjustment: shift the line container up by
    /// `px` (negative top offset) while giving its parent an equal top
    /// margin, so history stays above the visible area but keeps its
    /// scroll space.
    fn set_history_overlap(&mut self, px: f64);

    /// Replace the line node at `index` with a container hosting an
    /// isolated sub-document loaded from `uri`. The frame spans the full
    /// terminal width; `min_height` avoids layout flicker during the
    /// frame's own first resize.
    fn insert_frame(&mut self, index: usize, frame_id: &str, uri: &str, min_height: f64);

    /// Set the rendered height of the frame `frame_id`.
    ///
    /// Returns `false` when no such frame exists on the surface.
    fn set_frame_height(&mut self, frame_id: &str, height: f64) -> bool;

    /// Stream markup into the document of the frame `frame_id`.
    fn write_frame_document(&mut self, frame_id: &str, content: &str);

    /// Content height of the frame `frame_id`'s document in pixels,
    /// including the scrollbar allowance when the content overflows
    /// horizontally. `None` when the document cannot be measured (no such
    /// frame, not yet loaded, or cross-origin).
    fn frame_document_height(&self, frame_id: &str) -> Option<f64>;

    /// Close the document of the frame `frame_id`.
    fn close_frame_document(&mut self, frame_id: &str);

    /// Measure the rendered box of a single character inside the line
    /// container, margins and borders included. The probe this requires
    /// must leave no visible trace, even when measurement fails.
    fn char_box(&self) -> CharBox;

    /// Client (inner) size of the terminal viewport in pixels.
    fn client_size(&self) -> (f64, f64);

    /// Pixels a vertical scrollbar consumes on this platform; `0.0` when
    /// scrollbars reserve no space. Implementations cache the measurement
    /// for the lifetime of the process.
    fn scrollbar_thickness(&self) -> f64;
}

/// Adapter exposing a [`Surface`]'s line offsets as the core model's
/// [`LineMetrics`] capability.
pub struct SurfaceMetrics<'a, S: Surface + ?Sized>(pub &'a S);

impl<S: Surface + ?Sized> LineMetrics for SurfaceMetrics<'_, S> {
    fn offset_top(&self, index: usize) -> f64 {
        self.0.line_offset_top(index)
    }
}
