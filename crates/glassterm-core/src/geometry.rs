//! Cell geometry: translating pixel boxes into terminal rows and columns.
//!
//! The rendering surface probes a single character's rendered box and the
//! container's client size; this module turns those pixels into integer
//! cell counts for the resize protocol.

use serde::{Deserialize, Serialize};

/// Rendered box of a single character, margins and borders included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharBox {
    pub width: f64,
    pub height: f64,
}

/// Viewport size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    pub cols: u16,
    pub rows: u16,
}

impl CellSize {
    pub const ZERO: Self = Self { cols: 0, rows: 0 };
}

/// Correction applied to the probed character height before the row
/// division.
///
/// The box height reported for a character inside a `pre` container reads
/// one pixel taller than the step the engine actually advances per line;
/// dividing by the raw height undercounts rows on large windows and leaves
/// trailing blank rows. This is a calibration constant verified empirically
/// against WebKit, not a universal law — re-verify when targeting another
/// rendering engine.
pub const ROW_HEIGHT_CALIBRATION_PX: f64 = 1.0;

/// Derive the viewport cell count from a probed character box and the
/// container's client size, using floor division.
///
/// Degenerate boxes (zero or negative after calibration) yield zero in the
/// affected dimension rather than dividing by zero.
#[must_use]
pub fn viewport_cells(char_box: CharBox, client_width: f64, client_height: f64) -> CellSize {
    let cols = floor_div(client_width, char_box.width);
    let rows = floor_div(client_height, char_box.height - ROW_HEIGHT_CALIBRATION_PX);
    CellSize { cols, rows }
}

fn floor_div(extent: f64, step: f64) -> u16 {
    if step <= 0.0 || extent <= 0.0 {
        return 0;
    }
    let cells = (extent / step).floor();
    if cells >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        cells as u16
    }
}
