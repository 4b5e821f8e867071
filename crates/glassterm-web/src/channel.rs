//! Duplex message channel to the backend terminal process.
//!
//! Wraps a [`Transport`] (a browser WebSocket, or a host-provided bridge
//! satisfying the same contract) and adds the one behavior the transport
//! does not give us: sends issued before the connection reports ready are
//! buffered in FIFO order and flushed the moment it opens, after which the
//! send path is a direct pass-through.
//!
//! Connection failure is terminal. Errors and closure surface as a state
//! transition plus the optional close callback; there is no retry and no
//! reconnect — session restart is the host's concern.

use std::collections::VecDeque;

use glassterm_core::protocol::{
    ClientCommand, CodecError, ServerCommand, decode_server_command, encode_client_command,
};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Errors raised by the underlying transport on send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport is no longer connected.
    Closed,
    /// The transport failed to deliver the payload.
    Failed(String),
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Closed => write!(f, "transport closed"),
            Self::Failed(msg) => write!(f, "transport send failed: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Message-oriented duplex connection to the backend.
///
/// Implemented by the wasm WebSocket wrapper and by recording doubles in
/// tests. A host bridge substituting for the socket implements the same
/// contract and is indistinguishable to the channel.
pub trait Transport {
    /// Deliver one outbound message.
    fn send(&mut self, data: &str) -> Result<(), TransportError>;

    /// Begin the closing handshake.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// Channel state
// ---------------------------------------------------------------------------

/// Connection lifecycle, mirroring the WebSocket ready states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Queue-until-open message channel over a [`Transport`].
///
/// The host forwards transport events into `handle_open` / `handle_close`;
/// inbound payloads go through [`MessageChannel::decode`] and are
/// dispatched by the caller.
pub struct MessageChannel<T: Transport> {
    transport: T,
    state: ChannelState,
    /// Outbound FIFO, only populated while `Connecting`. Dropped for good
    /// after the open flush.
    queue: VecDeque<String>,
    on_close: Option<Box<dyn FnMut()>>,
}

impl<T: Transport> MessageChannel<T> {
    /// Create a channel over a transport that is still connecting.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ChannelState::Connecting,
            queue: VecDeque::new(),
            on_close: None,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Register the close callback. Fired once, on the transition out of
    /// `Connecting`/`Open`.
    pub fn set_close_handler(&mut self, handler: impl FnMut() + 'static) {
        self.on_close = Some(Box::new(handler));
    }

    /// Send a protocol command, queueing while the connection is pending.
    pub fn send(&mut self, cmd: &ClientCommand) {
        self.send_raw(encode_client_command(cmd));
    }

    /// Send a pre-encoded payload.
    pub fn send_raw(&mut self, raw: String) {
        match self.state {
            ChannelState::Connecting => self.queue.push_back(raw),
            ChannelState::Open => {
                if let Err(e) = self.transport.send(&raw) {
                    warn!(error = %e, "dropping outbound message");
                }
            }
            ChannelState::Closing | ChannelState::Closed => {
                warn!("dropping outbound message on closed channel");
            }
        }
    }

    /// Transport signalled ready: flush the queue in original order and
    /// switch to pass-through.
    pub fn handle_open(&mut self) {
        if self.state != ChannelState::Connecting {
            debug!(state = ?self.state, "ignoring open on non-connecting channel");
            return;
        }
        self.state = ChannelState::Open;
        let queued = std::mem::take(&mut self.queue);
        for raw in queued {
            if let Err(e) = self.transport.send(&raw) {
                warn!(error = %e, "dropping queued message during open flush");
            }
        }
    }

    /// Decode one inbound payload into a command.
    pub fn decode(&self, raw: &str) -> Result<ServerCommand, CodecError> {
        decode_server_command(raw)
    }

    /// Transport signalled closure. Idempotent.
    pub fn handle_close(&mut self) {
        if self.state == ChannelState::Closed {
            return;
        }
        self.state = ChannelState::Closed;
        if let Some(cb) = self.on_close.as_mut() {
            cb();
        }
    }

    /// Close the channel from this side.
    pub fn close(&mut self) {
        match self.state {
            ChannelState::Closing | ChannelState::Closed => {}
            ChannelState::Open | ChannelState::Connecting => {
                self.state = ChannelState::Closing;
                self.transport.close();
                self.state = ChannelState::Closed;
                if let Some(cb) = self.on_close.as_mut() {
                    cb();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::RecordingTransport;
    use std::cell::Cell;
    use std::rc::Rc;

    fn resize(cols: u16, rows: u16) -> ClientCommand {
        ClientCommand::Resize {
            width: cols,
            height: rows,
        }
    }

    #[test]
    fn sends_before_open_are_queued_then_flushed_in_order() {
        let mut chan = MessageChannel::new(RecordingTransport::default());
        chan.send(&resize(80, 24));
        chan.send(&ClientCommand::RemoveHistory { n: 3 });
        assert!(chan.transport.sent.is_empty());

        chan.handle_open();
        assert_eq!(
            chan.transport.sent,
            vec![
                r#"{"cmd":"resize","width":80,"height":24}"#.to_string(),
                r#"{"cmd":"removehistory","n":3}"#.to_string(),
            ]
        );
    }

    #[test]
    fn send_after_open_is_pass_through() {
        let mut chan = MessageChannel::new(RecordingTransport::default());
        chan.handle_open();
        chan.send(&resize(100, 42));
        assert_eq!(chan.transport.sent.len(), 1);
    }

    #[test]
    fn send_after_close_is_dropped() {
        let mut chan = MessageChannel::new(RecordingTransport::default());
        chan.handle_open();
        chan.handle_close();
        chan.send(&resize(80, 24));
        assert!(chan.transport.sent.is_empty());
        assert_eq!(chan.state(), ChannelState::Closed);
    }

    #[test]
    fn close_fires_callback_once_and_closes_transport() {
        let fired = Rc::new(Cell::new(0));
        let observed = Rc::clone(&fired);
        let mut chan = MessageChannel::new(RecordingTransport::default());
        chan.set_close_handler(move || observed.set(observed.get() + 1));
        chan.handle_open();
        chan.close();
        chan.close();
        assert!(chan.transport.closed);
        assert_eq!(fired.get(), 1);
        assert_eq!(chan.state(), ChannelState::Closed);
    }

    #[test]
    fn remote_close_fires_callback() {
        let fired = Rc::new(Cell::new(0));
        let observed = Rc::clone(&fired);
        let mut chan = MessageChannel::new(RecordingTransport::default());
        chan.set_close_handler(move || observed.set(observed.get() + 1));
        chan.handle_open();
        chan.handle_close();
        chan.handle_close();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn failed_send_is_dropped_not_fatal() {
        let mut chan = MessageChannel::new(RecordingTransport {
            fail_sends: true,
            ..RecordingTransport::default()
        });
        chan.handle_open();
        chan.send(&resize(80, 24));
        assert!(chan.transport.sent.is_empty());
        assert_eq!(chan.state(), ChannelState::Open);
    }

    #[test]
    fn decode_delegates_to_protocol() {
        let chan = MessageChannel::new(RecordingTransport::default());
        assert!(chan.decode(r#"{"cmd":"reset"}"#).is_ok());
        assert!(chan.decode("not json").is_err());
    }
}
