//! The assembled terminal: dispatch, resize coordination, trim reporting.
//!
//! [`Terminal`] wires the screen projection, the frame manager, and the
//! message channel over one rendering surface. Inbound payloads are decoded
//! into the closed [`ServerCommand`] set and dispatched by `match`; there
//! is no path by which a payload is treated as code. Malformed traffic is
//! logged and skipped.

use glassterm_core::protocol::{ClientCommand, ServerCommand};
use glassterm_core::{CellSize, viewport_cells};
use tracing::{debug, warn};

use crate::channel::{MessageChannel, Transport};
use crate::frames::FrameManager;
use crate::screen::{ScreenConfig, ScreenView};
use crate::surface::Surface;

/// A terminal session bound to a surface and a transport.
pub struct Terminal<S: Surface, T: Transport> {
    surface: S,
    channel: MessageChannel<T>,
    screen: ScreenView,
    frames: FrameManager,
    /// Cell size from the last probe. Stale after any reflow; recomputed by
    /// [`Terminal::on_resize`] before being trusted again.
    size: CellSize,
}

impl<S: Surface, T: Transport> Terminal<S, T> {
    /// Create a terminal with default screen configuration.
    #[must_use]
    pub fn new(surface: S, transport: T) -> Self {
        Self::with_config(surface, transport, ScreenConfig::default())
    }

    #[must_use]
    pub fn with_config(surface: S, transport: T, config: ScreenConfig) -> Self {
        Self {
            surface,
            channel: MessageChannel::new(transport),
            screen: ScreenView::new(config),
            frames: FrameManager::new(),
            size: CellSize::ZERO,
        }
    }

    /// Viewport size from the last probe.
    #[must_use]
    pub fn size(&self) -> CellSize {
        self.size
    }

    /// The screen projection (model + viewport state).
    #[must_use]
    pub fn screen(&self) -> &ScreenView {
        &self.screen
    }

    /// The frame lifecycle manager.
    #[must_use]
    pub fn frames(&self) -> &FrameManager {
        &self.frames
    }

    /// The rendering surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The rendering surface, mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The message channel.
    #[must_use]
    pub fn channel(&self) -> &MessageChannel<T> {
        &self.channel
    }

    /// The message channel, mutably (close handler registration).
    pub fn channel_mut(&mut self) -> &mut MessageChannel<T> {
        &mut self.channel
    }

    /// Transport reported ready: flush queued traffic.
    pub fn on_open(&mut self) {
        self.channel.handle_open();
    }

    /// Transport reported closure. The session is over; no reconnect.
    pub fn on_close(&mut self) {
        self.channel.handle_close();
    }

    /// Decode and dispatch one inbound payload.
    pub fn on_message(&mut self, raw: &str) {
        match self.channel.decode(raw) {
            Ok(cmd) => self.apply(cmd),
            Err(e) => warn!(%e, "dropping inbound message"),
        }
    }

    /// Dispatch one decoded command.
    pub fn apply(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::SetLine { index, content } => {
                self.screen.set_line(&mut self.surface, index, &content);
            }
            ServerCommand::InsertLine { index, content } => {
                self.screen.insert_line(&mut self.surface, index, &content);
            }
            ServerCommand::AppendLine { content } => {
                self.screen.append_line(&mut self.surface, &content);
            }
            ServerCommand::RemoveLine { index } => {
                self.screen.remove_line(&mut self.surface, index);
            }
            ServerCommand::RemoveLastLine => {
                self.screen.remove_last_line(&mut self.surface);
            }
            ServerCommand::SetScreen0 { index } => {
                self.screen.set_screen0(&mut self.surface, index);
            }
            ServerCommand::Reset => {
                self.screen.reset(&mut self.surface);
            }
            ServerCommand::RemoveHistoryLines { n } => {
                self.screen.remove_history_lines(&mut self.surface, n);
            }
            ServerCommand::CheckHistorySize => {
                if let Some(request) = self.screen.check_history_size(&self.surface) {
                    self.channel.send(&request);
                }
            }
            ServerCommand::InsertFrame {
                index,
                frame_id,
                uri,
            } => {
                self.frames
                    .insert_frame(&mut self.screen, &mut self.surface, index, &frame_id, &uri);
            }
            ServerCommand::FrameResize { frame_id, height } => {
                self.frames.resize_frame(&mut self.surface, &frame_id, height);
            }
            ServerCommand::FrameWrite { content } => {
                self.frames.write(&self.screen, &mut self.surface, &content);
            }
            ServerCommand::LeaveFrame => {
                self.frames.leave();
            }
            ServerCommand::FrameCloseDocument => {
                self.frames.close_document();
            }
        }
    }

    /// Resize coordinator: probe the surface, derive the cell size, report
    /// it to the backend.
    ///
    /// Invoked on initial attach and whenever the host observes a viewport
    /// resize. Rapid-fire host events are reported as-is; hosts that see
    /// resize storms should coalesce before calling.
    pub fn on_resize(&mut self) {
        let char_box = self.surface.char_box();
        let (width, height) = self.surface.client_size();
        self.size = viewport_cells(char_box, width, height);
        self.screen.set_viewport_rows(self.size.rows as usize);
        debug!(cols = self.size.cols, rows = self.size.rows, "viewport resized");
        self.channel.send(&ClientCommand::Resize {
            width: self.size.cols,
            height: self.size.rows,
        });
        self.screen.adjust(&mut self.surface);
    }
}
