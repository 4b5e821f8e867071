#![forbid(unsafe_code)]

//! Host-agnostic model for a web-embedded terminal.
//!
//! This crate holds everything that does not need a rendering surface or a
//! network: the line sequence with its history/screen partition and trim
//! state ([`buffer`]), cell geometry arithmetic ([`geometry`]), and the
//! tagged-command wire protocol ([`protocol`]). The browser integration
//! (DOM projection, message channel, frames) lives in `glassterm-web`.

pub mod buffer;
pub mod geometry;
pub mod line;
pub mod protocol;

pub use buffer::{BufferError, LineBuffer, LineMetrics, MAX_HISTORY_PX};
pub use geometry::{CellSize, CharBox, ROW_HEIGHT_CALIBRATION_PX, viewport_cells};
pub use line::{FrameId, Line};
pub use protocol::{ClientCommand, CodecError, ServerCommand};
