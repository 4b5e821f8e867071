#![forbid(unsafe_code)]

//! Browser frontend for GlassTerm.
//!
//! Renders the terminal's line sequence into a page and negotiates geometry
//! with the backend process over a message channel:
//!
//! - [`surface`]: the rendering-surface capability the rest of the crate is
//!   written against,
//! - [`channel`]: queue-until-open duplex channel over a [`channel::Transport`],
//! - [`screen`]: projection of the core line model onto the surface,
//! - [`frames`]: embedded sub-terminal (frame) lifecycle,
//! - [`terminal`]: the assembled session (dispatch + resize coordination),
//! - [`harness`]: deterministic surface/transport doubles for headless use.
//!
//! The DOM- and WebSocket-backed implementations are wasm-only; everything
//! else compiles and tests natively against the harness doubles.

pub mod channel;
pub mod frames;
pub mod harness;
pub mod screen;
pub mod surface;
pub mod terminal;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{DomSurface, GlassTerm, WebSocketTransport};

pub use channel::{ChannelState, MessageChannel, Transport, TransportError};
pub use frames::FrameManager;
pub use screen::{ScreenConfig, ScreenView};
pub use surface::{Surface, SurfaceMetrics};
pub use terminal::Terminal;
