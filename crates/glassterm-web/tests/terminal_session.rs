//! End-to-end terminal sessions driven through the wire protocol.
//!
//! Every test feeds raw JSON payloads through `Terminal::on_message` — the
//! same path a live WebSocket uses — against the deterministic harness
//! surface, and observes outbound traffic on the recording transport.

use glassterm_web::harness::{FakeSurface, RecordingTransport};
use glassterm_web::{ChannelState, Terminal};
use pretty_assertions::assert_eq;

fn term() -> Terminal<FakeSurface, RecordingTransport> {
    let mut term = Terminal::new(FakeSurface::new(), RecordingTransport::default());
    term.on_open();
    term
}

fn markups(term: &Terminal<FakeSurface, RecordingTransport>) -> Vec<&str> {
    term.surface().markups()
}

fn sent(term: &Terminal<FakeSurface, RecordingTransport>) -> &[String] {
    &term.channel().transport().sent
}

#[test]
fn attach_reports_viewport_cells() {
    // 800x640 client, 8x16 character box, one-pixel row calibration.
    let mut term = term();
    term.on_resize();
    assert_eq!(
        sent(&term),
        &[r#"{"cmd":"resize","width":100,"height":42}"#.to_string()]
    );
    assert_eq!(term.size().cols, 100);
    assert_eq!(term.size().rows, 42);
}

#[test]
fn resize_queued_while_connecting_flushes_on_open() {
    let mut term = Terminal::new(FakeSurface::new(), RecordingTransport::default());
    term.on_resize();
    assert!(sent(&term).is_empty());

    term.on_open();
    assert_eq!(
        sent(&term),
        &[r#"{"cmd":"resize","width":100,"height":42}"#.to_string()]
    );
}

#[test]
fn line_commands_update_surface_in_document_order() {
    let mut term = term();
    term.on_message(r#"{"cmd":"append_line","content":"a"}"#);
    term.on_message(r#"{"cmd":"append_line","content":"b"}"#);
    term.on_message(r#"{"cmd":"insert_line","index":1,"content":"mid"}"#);
    term.on_message(r#"{"cmd":"set_line","index":0,"content":"A"}"#);
    assert_eq!(markups(&term), vec!["A", "mid", "b"]);

    term.on_message(r#"{"cmd":"remove_line","index":0}"#);
    assert_eq!(markups(&term), vec!["mid", "b"]);
    term.on_message(r#"{"cmd":"remove_last_line"}"#);
    assert_eq!(markups(&term), vec!["mid"]);
}

#[test]
fn append_then_remove_first_leaves_second_line() {
    let mut term = term();
    term.on_message(r#"{"cmd":"append_line","content":"a"}"#);
    term.on_message(r#"{"cmd":"append_line","content":"b"}"#);
    term.on_message(r#"{"cmd":"remove_line","index":0}"#);
    assert_eq!(markups(&term), vec!["b"]);
}

#[test]
fn malformed_and_code_like_payloads_are_dropped() {
    let mut term = term();
    term.on_message(r#"term.appendLine("a");"#);
    term.on_message(r#"{"cmd":"eval","js":"alert(1)"}"#);
    term.on_message(r#"{"cmd":"append_line"}"#);
    assert!(markups(&term).is_empty());

    // The session survives and keeps processing valid traffic.
    term.on_message(r#"{"cmd":"append_line","content":"ok"}"#);
    assert_eq!(markups(&term), vec!["ok"]);
}

#[test]
fn out_of_range_commands_degrade_without_ending_session() {
    let mut term = term();
    term.on_message(r#"{"cmd":"append_line","content":"a"}"#);
    term.on_message(r#"{"cmd":"set_line","index":42,"content":"x"}"#);
    term.on_message(r#"{"cmd":"remove_line","index":42}"#);
    term.on_message(r#"{"cmd":"set_screen0","index":42}"#);
    assert_eq!(markups(&term), vec!["a"]);
    assert_eq!(term.screen().buffer().screen0(), 0);
}

#[test]
fn screen0_adjustment_offsets_history() {
    let mut term = term();
    term.on_resize();
    for i in 0..10 {
        term.on_message(&format!(r#"{{"cmd":"append_line","content":"l{i}"}}"#));
    }
    term.on_message(r#"{"cmd":"set_screen0","index":6}"#);
    // Six 16px history lines shifted out of the visible area.
    assert_eq!(term.surface().overlap, Some(96.0));
}

#[test]
fn history_trim_negotiation_round_trip() {
    let mut term = term();
    term.on_resize();
    for i in 0..4 {
        term.on_message(&format!(r#"{{"cmd":"append_line","content":"l{i}"}}"#));
    }
    // Script history offsets [0, 4000, 11000] with the screen line at 12000.
    {
        let surface = term.surface_mut();
        surface.set_line_height(0, 4000.0);
        surface.set_line_height(1, 7000.0);
        surface.set_line_height(2, 1000.0);
    }
    term.on_message(r#"{"cmd":"set_screen0","index":3}"#);
    let before = sent(&term).len();

    term.on_message(r#"{"cmd":"check_history_size"}"#);
    assert_eq!(
        &sent(&term)[before..],
        &[r#"{"cmd":"removehistory","n":1}"#.to_string()]
    );

    // No second request while the first is unacknowledged.
    term.on_message(r#"{"cmd":"check_history_size"}"#);
    assert_eq!(sent(&term).len(), before + 1);

    // The acknowledgement trims and re-arms the check.
    term.on_message(r#"{"cmd":"remove_history_lines","n":1}"#);
    assert!(!term.screen().buffer().trim_pending());
    assert_eq!(markups(&term), vec!["l1", "l2", "l3"]);
    assert_eq!(term.screen().buffer().screen0(), 2);
}

#[test]
fn frame_lifecycle_over_the_wire() {
    let mut term = term();
    term.on_resize();
    for i in 0..3 {
        term.on_message(&format!(r#"{{"cmd":"append_line","content":"l{i}"}}"#));
    }

    term.on_message(
        r#"{"cmd":"insert_frame","index":1,"frame_id":"f1","uri":"http://localhost:8000/f1"}"#,
    );
    assert_eq!(term.frames().current(), Some("f1"));
    assert_eq!(term.surface().frame_at(1), Some("f1"));

    term.on_message(r#"{"cmd":"frame_resize","frame_id":"f1","height":480.0}"#);
    assert_eq!(term.surface().frame_heights["f1"], 480.0);

    // Unknown frame: logged and skipped, session intact.
    term.on_message(r#"{"cmd":"frame_resize","frame_id":"ghost","height":480.0}"#);

    // Leaving clears focus but not the frame itself.
    term.on_message(r#"{"cmd":"leave_frame"}"#);
    assert_eq!(term.frames().current(), None);
    assert_eq!(term.surface().frame_at(1), Some("f1"));

    // The close-document hook is reserved and must not tear anything down.
    term.on_message(r#"{"cmd":"frame_close_document"}"#);
    assert_eq!(term.surface().frame_at(1), Some("f1"));
}

#[test]
fn frame_write_streams_into_current_frame() {
    let mut term = term();
    term.on_message(r#"{"cmd":"append_line","content":"l0"}"#);
    term.on_message(
        r#"{"cmd":"insert_frame","index":0,"frame_id":"f1","uri":"http://localhost:8000/f1"}"#,
    );
    term.on_message(r#"{"cmd":"frame_write","content":"<h1>report</h1>"}"#);
    assert_eq!(
        term.surface().frame_writes,
        vec![("f1".to_string(), "<h1>report</h1>".to_string())]
    );

    // Once the frame document is measurable, each write grows the frame to
    // the document's content height without waiting for a resize command.
    term.surface_mut().set_frame_document_height("f1", 220.0);
    term.on_message(r#"{"cmd":"frame_write","content":"<p>more</p>"}"#);
    assert_eq!(term.surface().frame_heights["f1"], 220.0);
}

#[test]
fn reset_clears_everything() {
    let mut term = term();
    term.on_resize();
    for _ in 0..5 {
        term.on_message(r#"{"cmd":"append_line","content":"x"}"#);
    }
    term.on_message(r#"{"cmd":"set_screen0","index":2}"#);
    term.on_message(r#"{"cmd":"reset"}"#);
    assert!(markups(&term).is_empty());
    assert_eq!(term.screen().buffer().screen0(), 0);
}

#[test]
fn remote_close_ends_session_without_reconnect() {
    let mut term = term();
    term.on_close();
    assert_eq!(term.channel().state(), ChannelState::Closed);
    let before = sent(&term).len();
    term.on_resize();
    assert_eq!(sent(&term).len(), before);
}
