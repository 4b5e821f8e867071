//! DOM-backed surface, WebSocket transport, and the wasm-bindgen export.
//!
//! The line container is a `<pre>` of one `<span>` per line; frames replace
//! a span with a `<div>` hosting an `<iframe>`. All geometry the model
//! needs is measured here: a transient probe span for the character box
//! (removed again no matter what, via an RAII guard) and a one-time
//! offscreen measurement of the scrollbar thickness, cached for the
//! process lifetime.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glassterm_core::CharBox;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CssStyleDeclaration, Document, HtmlElement, HtmlIFrameElement, MessageEvent, WebSocket,
};

use crate::channel::{Transport, TransportError};
use crate::surface::Surface;
use crate::terminal::Terminal;

// ---------------------------------------------------------------------------
// Geometry probing
// ---------------------------------------------------------------------------

thread_local! {
    /// Lazily measured scrollbar thickness. Wasm is single-threaded, so a
    /// thread-local cell is the whole singleton.
    static SCROLLBAR_PX: Cell<Option<f64>> = const { Cell::new(None) };
}

/// Transient probe element, removed from its parent on drop.
///
/// Keeps the "no visible side effects" guarantee even when a measurement
/// bails out early.
struct ProbeGuard {
    parent: HtmlElement,
    node: HtmlElement,
}

impl ProbeGuard {
    fn mount(document: &Document, parent: &HtmlElement, markup: &str) -> Option<Self> {
        let node = create_html_element(document, "span")?;
        node.set_inner_html(markup);
        parent.append_child(&node).ok()?;
        Some(Self {
            parent: parent.clone(),
            node,
        })
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        let _ = self.parent.remove_child(&self.node);
    }
}

fn create_html_element(document: &Document, tag: &str) -> Option<HtmlElement> {
    document
        .create_element(tag)
        .ok()
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
}

fn computed_px(style: &CssStyleDeclaration, property: &str) -> f64 {
    style
        .get_property_value(property)
        .ok()
        .and_then(|v| v.trim_end_matches("px").parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Measure the rendered box of one character inside `container`, including
/// margin and border contributions on all four sides.
fn measure_char_box(document: &Document, container: &HtmlElement) -> Option<CharBox> {
    let window = web_sys::window()?;
    let probe = ProbeGuard::mount(document, container, "x")?;
    let style = window.get_computed_style(&probe.node).ok().flatten()?;
    let extra_h = computed_px(&style, "margin-top")
        + computed_px(&style, "border-top-width")
        + computed_px(&style, "border-bottom-width")
        + computed_px(&style, "margin-bottom");
    let extra_w = computed_px(&style, "margin-left")
        + computed_px(&style, "border-left-width")
        + computed_px(&style, "border-right-width")
        + computed_px(&style, "margin-right");
    Some(CharBox {
        width: f64::from(probe.node.offset_width()) + extra_w,
        height: f64::from(probe.node.offset_height()) + extra_h,
    })
}

/// Measure how many pixels a scrollbar consumes, once per process.
///
/// An offscreen 100px scrollable container with 200px content loses exactly
/// the scrollbar thickness from its client box; overlay-scrollbar platforms
/// report 0.
fn scrollbar_thickness(document: &Document) -> f64 {
    if let Some(px) = SCROLLBAR_PX.with(Cell::get) {
        return px;
    }
    let px = compute_scrollbar_thickness(document).unwrap_or(0.0);
    SCROLLBAR_PX.with(|cache| cache.set(Some(px)));
    px
}

fn compute_scrollbar_thickness(document: &Document) -> Option<f64> {
    let body = document.body()?;
    let outer = create_html_element(document, "div")?;
    let style = outer.style();
    let _ = style.set_property("width", "100px");
    let _ = style.set_property("height", "100px");
    let _ = style.set_property("overflow", "scroll");
    let _ = style.set_property("position", "absolute");
    let _ = style.set_property("left", "-9999px");

    let content = create_html_element(document, "div")?;
    let _ = content.style().set_property("width", "200px");
    let _ = content.style().set_property("height", "200px");
    outer.append_child(&content).ok()?;
    body.append_child(&outer).ok()?;

    let thickness = 100.0 - f64::from(outer.client_height());
    let _ = body.remove_child(&outer);
    Some(thickness.max(0.0))
}

// ---------------------------------------------------------------------------
// DOM surface
// ---------------------------------------------------------------------------

/// [`Surface`] projected onto real DOM nodes.
pub struct DomSurface {
    document: Document,
    /// The `<pre>` holding one node per line.
    container: HtmlElement,
    /// The container's parent, which absorbs the history top margin.
    parent: HtmlElement,
    /// Mirror of the container's child nodes, in document order.
    lines: Vec<HtmlElement>,
    /// Live frames by id.
    frames: HashMap<String, HtmlIFrameElement>,
}

impl DomSurface {
    /// Attach to the line container element with id `container_id`.
    pub fn attach(container_id: &str) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str("line container not found"))?
            .dyn_into::<HtmlElement>()?;
        let parent = container
            .parent_element()
            .ok_or_else(|| JsValue::from_str("line container has no parent"))?
            .dyn_into::<HtmlElement>()?;
        Ok(Self {
            document,
            container,
            parent,
            lines: Vec::new(),
            frames: HashMap::new(),
        })
    }

    fn new_line_node(&self, markup: &str) -> Option<HtmlElement> {
        let node = create_html_element(&self.document, "span")?;
        node.set_inner_html(&format!("{markup}\n"));
        Some(node)
    }

    /// Drop frame entries whose hosting node left the container, so a later
    /// resize for a removed frame hits the unknown-frame path instead of
    /// touching a detached element.
    fn prune_detached_frames(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        let container: web_sys::Node = self.container.clone().into();
        self.frames.retain(|_, frame| {
            let node: &web_sys::Node = frame.as_ref();
            container.contains(Some(node))
        });
    }
}

impl Surface for DomSurface {
    fn set_line(&mut self, index: usize, markup: &str) {
        self.lines[index].set_inner_html(&format!("{markup}\n"));
    }

    fn insert_line(&mut self, index: usize, markup: &str) {
        let Some(node) = self.new_line_node(markup) else {
            return;
        };
        let anchor = self.lines.get(index);
        let mounted = match anchor {
            Some(anchor) => self.container.insert_before(&node, Some(anchor)).is_ok(),
            None => self.container.append_child(&node).is_ok(),
        };
        if mounted {
            self.lines.insert(index.min(self.lines.len()), node);
        }
    }

    fn append_line(&mut self, markup: &str) {
        let Some(node) = self.new_line_node(markup) else {
            return;
        };
        if self.container.append_child(&node).is_ok() {
            self.lines.push(node);
        }
    }

    fn remove_line(&mut self, index: usize) {
        let node = self.lines.remove(index);
        let _ = self.container.remove_child(&node);
        self.prune_detached_frames();
    }

    fn remove_first_lines(&mut self, n: usize) {
        for node in self.lines.drain(..n.min(self.lines.len())) {
            let _ = self.container.remove_child(&node);
        }
        self.prune_detached_frames();
    }

    fn clear(&mut self) {
        self.container.set_inner_html("");
        self.lines.clear();
        self.frames.clear();
    }

    fn line_offset_top(&self, index: usize) -> f64 {
        match self.lines.get(index) {
            Some(node) => f64::from(node.offset_top()),
            // Index == len: the bottom edge of the last line.
            None => match self.lines.last() {
                Some(last) => f64::from(last.offset_top() + last.offset_height()),
                None => 0.0,
            },
        }
    }

    fn set_history_overlap(&mut self, px: f64) {
        let _ = self
            .container
            .style()
            .set_property("top", &format!("-{px}px"));
        let _ = self
            .parent
            .style()
            .set_property("margin-top", &format!("{px}px"));
    }

    fn insert_frame(&mut self, index: usize, frame_id: &str, uri: &str, min_height: f64) {
        let Some(div) = create_html_element(&self.document, "div") else {
            return;
        };
        let Some(iframe) = self
            .document
            .create_element("iframe")
            .ok()
            .and_then(|e| e.dyn_into::<HtmlIFrameElement>().ok())
        else {
            warn!(frame_id, "failed to create frame element");
            return;
        };
        iframe.set_name(frame_id);
        iframe.set_id(frame_id);
        let _ = iframe.style().set_property("width", "100%");
        let _ = iframe
            .style()
            .set_property("min-height", &format!("{min_height}px"));
        let _ = div.append_child(&iframe);
        if let Some(newline) = self.new_line_node("") {
            let _ = div.append_child(&newline);
        }
        if self
            .container
            .replace_child(&div, &self.lines[index])
            .is_err()
        {
            warn!(frame_id, index, "failed to mount frame container");
            return;
        }
        self.lines[index] = div;
        iframe.set_src(uri);
        self.frames.insert(frame_id.to_string(), iframe);
    }

    fn set_frame_height(&mut self, frame_id: &str, height: f64) -> bool {
        match self.frames.get(frame_id) {
            Some(iframe) => {
                let _ = iframe
                    .style()
                    .set_property("height", &format!("{height}px"));
                true
            }
            None => false,
        }
    }

    fn write_frame_document(&mut self, frame_id: &str, content: &str) {
        let Some(doc) = self.frames.get(frame_id).and_then(|f| f.content_document()) else {
            warn!(frame_id, "frame document unreachable for write");
            return;
        };
        let payload = js_sys::Array::of1(&JsValue::from_str(content));
        if doc.write(&payload).is_err() {
            warn!(frame_id, "frame document write failed");
        }
    }

    fn frame_document_height(&self, frame_id: &str) -> Option<f64> {
        let iframe = self.frames.get(frame_id)?;
        let body = iframe.content_document()?.body()?;
        let mut height = f64::from(body.scroll_height());
        // Horizontally overflowing content gets a scrollbar inside the
        // frame; grow by its thickness so it does not eat content height.
        if body.scroll_width() > iframe.client_width() {
            height += scrollbar_thickness(&self.document);
        }
        Some(height)
    }

    fn close_frame_document(&mut self, frame_id: &str) {
        if let Some(doc) = self.frames.get(frame_id).and_then(|f| f.content_document()) {
            let _ = doc.close();
        }
    }

    fn char_box(&self) -> CharBox {
        measure_char_box(&self.document, &self.container).unwrap_or(CharBox {
            width: 0.0,
            height: 0.0,
        })
    }

    fn client_size(&self) -> (f64, f64) {
        (
            f64::from(self.parent.client_width()),
            f64::from(self.parent.client_height()),
        )
    }

    fn scrollbar_thickness(&self) -> f64 {
        scrollbar_thickness(&self.document)
    }
}

// ---------------------------------------------------------------------------
// WebSocket transport
// ---------------------------------------------------------------------------

/// [`Transport`] over a browser WebSocket.
///
/// A host bridge that proxies the socket API is a drop-in replacement: the
/// channel only sees this contract.
pub struct WebSocketTransport {
    socket: WebSocket,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, data: &str) -> Result<(), TransportError> {
        self.socket
            .send_with_str(data)
            .map_err(|e| TransportError::Failed(format!("{e:?}")))
    }

    fn close(&mut self) {
        let _ = self.socket.close();
    }
}

// ---------------------------------------------------------------------------
// Page-facing export
// ---------------------------------------------------------------------------

type WebTerminal = Terminal<DomSurface, WebSocketTransport>;

/// The terminal as exposed to the page via wasm-bindgen.
///
/// Owns the socket callbacks for the lifetime of the terminal; dropping the
/// export tears the wiring down.
#[wasm_bindgen]
pub struct GlassTerm {
    inner: Rc<RefCell<WebTerminal>>,
    _callbacks: Vec<Closure<dyn FnMut(JsValue)>>,
}

#[wasm_bindgen]
impl GlassTerm {
    /// Attach to the line container `container_id` and connect to `ws_url`.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, ws_url: &str) -> Result<GlassTerm, JsValue> {
        let surface = DomSurface::attach(container_id)?;
        let socket = WebSocket::new(ws_url)?;
        let inner = Rc::new(RefCell::new(Terminal::new(
            surface,
            WebSocketTransport::new(socket.clone()),
        )));

        let mut callbacks: Vec<Closure<dyn FnMut(JsValue)>> = Vec::new();

        let on_open = {
            let inner = Rc::clone(&inner);
            Closure::wrap(Box::new(move |_event: JsValue| {
                let mut term = inner.borrow_mut();
                term.on_open();
                // First geometry report as soon as the channel is live.
                term.on_resize();
            }) as Box<dyn FnMut(JsValue)>)
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        callbacks.push(on_open);

        let on_message = {
            let inner = Rc::clone(&inner);
            Closure::wrap(Box::new(move |event: JsValue| {
                let Ok(event) = event.dyn_into::<MessageEvent>() else {
                    return;
                };
                if let Some(data) = event.data().as_string() {
                    inner.borrow_mut().on_message(&data);
                }
            }) as Box<dyn FnMut(JsValue)>)
        };
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        callbacks.push(on_message);

        let on_close = {
            let inner = Rc::clone(&inner);
            Closure::wrap(Box::new(move |_event: JsValue| {
                inner.borrow_mut().on_close();
            }) as Box<dyn FnMut(JsValue)>)
        };
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        callbacks.push(on_close);

        Ok(GlassTerm {
            inner,
            _callbacks: callbacks,
        })
    }

    /// Report the current viewport geometry (hook this to window resize).
    pub fn on_resize(&self) {
        self.inner.borrow_mut().on_resize();
    }

    /// Close the channel from the page side.
    pub fn close(&self) {
        self.inner.borrow_mut().channel_mut().close();
    }
}
