// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM element management.
//!
//! [`DomBackend`] maps every scene node to one fixed-position HTML element
//! under a container. Style writes go straight to the element's inline
//! style; raw listeners translate DOM events into [`RawEvent`]s and post them
//! to an [`EventInbox`].
//!
//! Elements nest like their units, but `left`/`top` are absolute viewport
//! pixels, which only holds while no ancestor has a `transform`. The core
//! clears the transform of unrotated units for this reason. A rotated frame
//! becomes the containing block of its descendants, so they are placed
//! relative to it and rotate with it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use kurbo::{Point, Size};
use tessera_core::backend::{
    Backend, ControlCommand, ControlReply, ListenTarget, StyleProperty, StyleValue,
};
use tessera_core::id::{NodeId, UnitId};
use tessera_core::input::{EventName, KeyKind, PointerKind, RawEvent};
use tessera_core::pool::SlotPool;
use tessera_core::time::Duration;
use tessera_core::unit::{UnitContent, UnitKind};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Document, HtmlElement, HtmlImageElement, HtmlInputElement, HtmlMediaElement, KeyboardEvent,
    MouseEvent, Window,
};

use crate::timer::TimerLoop;

type ListenerClosure = Closure<dyn FnMut(web_sys::Event)>;

/// The element tag created for a unit kind.
#[must_use]
pub fn element_tag(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Frame | UnitKind::Text => "div",
        UnitKind::Image => "img",
        UnitKind::Entry => "input",
        UnitKind::Button => "button",
        UnitKind::Video => "video",
    }
}

/// The DOM event type a raw listener for `name` subscribes to.
///
/// Returns `None` for events that never come from the DOM.
#[must_use]
pub fn dom_event_type(name: EventName) -> Option<&'static str> {
    Some(match name {
        EventName::PointerIn => "mouseover",
        EventName::PointerOut => "mouseout",
        EventName::PointerDown => "mousedown",
        EventName::PointerUp => "mouseup",
        EventName::PointerMotion => "mousemove",
        EventName::KeyDown => "keydown",
        EventName::KeyUp => "keyup",
        EventName::Press => "click",
        EventName::TextChange => "input",
        EventName::TimeUpdate => "timeupdate",
        EventName::AnimationStopped => return None,
    })
}

/// Raw events posted by DOM listeners, waiting to be dispatched.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct EventInbox {
    queue: Rc<RefCell<VecDeque<RawEvent>>>,
    pump: Rc<RefCell<Option<Box<dyn FnMut()>>>>,
}

impl EventInbox {
    /// Creates an empty inbox with no pump.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the function that drains the inbox.
    pub fn set_pump(&self, pump: impl FnMut() + 'static) {
        *self.pump.borrow_mut() = Some(Box::new(pump));
    }

    /// Removes the pump. Queued events stay queued.
    pub fn clear_pump(&self) {
        if let Ok(mut slot) = self.pump.try_borrow_mut() {
            slot.take();
        }
    }

    /// Queues `event` and runs the pump.
    pub fn post(&self, event: RawEvent) {
        self.queue.borrow_mut().push_back(event);
        self.pump();
    }

    /// Runs the pump. A nested call while it is already running returns at
    /// once; the outer run drains whatever was queued meanwhile.
    pub fn pump(&self) {
        if let Ok(mut slot) = self.pump.try_borrow_mut()
            && let Some(pump) = slot.as_mut()
        {
            pump();
        }
    }

    /// Takes the oldest queued event.
    pub fn pop(&self) -> Option<RawEvent> {
        self.queue.borrow_mut().pop_front()
    }

    /// Puts an event back at the head of the queue.
    pub fn push_front(&self, event: RawEvent) {
        self.queue.borrow_mut().push_front(event);
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl core::fmt::Debug for EventInbox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventInbox")
            .field("queued", &self.len())
            .field("pump", &self.pump.try_borrow().map(|p| p.is_some()).ok())
            .finish()
    }
}

struct DomNode {
    element: Option<HtmlElement>,
    listeners: Vec<(EventName, ListenerClosure)>,
}

impl DomNode {
    fn detach_listeners(&mut self) {
        let Some(element) = &self.element else {
            return;
        };
        for (name, closure) in self.listeners.drain(..) {
            if let Some(event_type) = dom_event_type(name) {
                let _ = element
                    .remove_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
            }
        }
    }
}

/// A [`Backend`] rendering into the DOM.
///
/// The container becomes the root node. Every unit element is positioned
/// with `position: fixed`, because the scene resolves geometry to absolute
/// viewport coordinates.
pub struct DomBackend {
    window: Option<Window>,
    document: Option<Document>,
    container: HtmlElement,
    nodes: SlotPool<DomNode>,
    root: Option<NodeId>,
    global: Vec<(EventName, ListenerClosure)>,
    scratch: Option<HtmlElement>,
    timer: TimerLoop,
    inbox: EventInbox,
}

impl core::fmt::Debug for DomBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomBackend")
            .field("container", &"HtmlElement")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("global_listeners", &self.global.len())
            .field("timer", &self.timer)
            .field("inbox", &self.inbox)
            .finish_non_exhaustive()
    }
}

impl DomBackend {
    /// Creates a back end that manages elements under `container`.
    ///
    /// Listeners post their events to `inbox`.
    #[must_use]
    pub fn new(container: HtmlElement, inbox: EventInbox) -> Self {
        Self {
            window: web_sys::window(),
            document: container.owner_document(),
            container,
            nodes: SlotPool::new(),
            root: None,
            global: Vec::new(),
            scratch: None,
            timer: TimerLoop::new(),
            inbox,
        }
    }

    /// Returns a reference to the container element.
    #[must_use]
    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    /// The animation timer.
    #[must_use]
    pub fn timer(&self) -> &TimerLoop {
        &self.timer
    }

    /// The inbox listeners post to.
    #[must_use]
    pub fn inbox(&self) -> &EventInbox {
        &self.inbox
    }

    /// Returns the element behind `node`, if it exists.
    #[must_use]
    pub fn element(&self, node: NodeId) -> Option<&HtmlElement> {
        self.nodes.get(node.0)?.element.as_ref()
    }

    fn create_element(&self, tag: &str) -> Option<HtmlElement> {
        let document = self.document.as_ref()?;
        match document.create_element(tag) {
            Ok(element) => element.dyn_into::<HtmlElement>().ok(),
            Err(err) => {
                log::warn!("create_element({tag}) failed: {err:?}");
                None
            }
        }
    }

    fn build_element(&self, content: &UnitContent) -> Option<HtmlElement> {
        let element = self.create_element(element_tag(content.kind()))?;
        let s = element.style();
        let _ = s.set_property("position", "fixed");
        let _ = s.set_property("left", "0");
        let _ = s.set_property("top", "0");
        let _ = s.set_property("margin", "0");
        let _ = s.set_property("box-sizing", "border-box");
        let _ = s.set_property("transform-origin", "50% 50%");

        match content {
            UnitContent::Frame { color } => {
                if let Some(color) = color {
                    let _ = s.set_property("background-color", color);
                }
            }
            UnitContent::Image { source } => {
                if let (Some(image), Some(source)) =
                    (element.dyn_ref::<HtmlImageElement>(), source)
                {
                    image.set_src(source);
                }
            }
            UnitContent::Text { content, color } => {
                let _ = s.set_property("font-family", "monospace");
                let _ = s.set_property("white-space", "pre");
                let _ = s.set_property("overflow", "hidden");
                if let Some(color) = color {
                    let _ = s.set_property("color", color);
                }
                element.set_text_content(Some(content));
            }
            UnitContent::Entry { placeholder, size } => {
                if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                    input.set_type("text");
                    if let Some(placeholder) = placeholder {
                        input.set_placeholder(placeholder);
                    }
                    if let Some(size) = size {
                        let _ = input.set_attribute("size", &size.to_string());
                    }
                }
            }
            UnitContent::Button { label } => {
                element.set_text_content(Some(label));
            }
            UnitContent::Video { source } => {
                if let (Some(media), Some(source)) =
                    (element.dyn_ref::<HtmlMediaElement>(), source)
                {
                    media.set_src(source);
                }
            }
        }
        Some(element)
    }

    fn install(&self, target: ListenTarget, name: EventName) -> Option<ListenerClosure> {
        let event_type = dom_event_type(name)?;
        let inbox = self.inbox.clone();
        let closure = match target {
            ListenTarget::Global => {
                let kind = match name {
                    EventName::KeyUp => KeyKind::Up,
                    _ => KeyKind::Down,
                };
                Closure::wrap(Box::new(move |event: web_sys::Event| {
                    if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                        inbox.post(RawEvent::Key {
                            kind,
                            code: key.key_code(),
                            ctrl: key.ctrl_key(),
                            shift: key.shift_key(),
                            alt: key.alt_key(),
                            meta: key.meta_key(),
                        });
                    }
                }) as Box<dyn FnMut(web_sys::Event)>)
            }
            ListenTarget::Unit { unit, node } => {
                let element = self.element(node)?.clone();
                Closure::wrap(Box::new(move |event: web_sys::Event| {
                    if let Some(raw) = translate_dom_event(unit, name, &element, &event) {
                        inbox.post(raw);
                    }
                }) as Box<dyn FnMut(web_sys::Event)>)
            }
        };

        let installed = match target {
            ListenTarget::Global => self.document.as_ref().map(|document| {
                document.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
            }),
            ListenTarget::Unit { node, .. } => self.element(node).map(|element| {
                element.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
            }),
        };
        match installed {
            Some(Ok(())) => Some(closure),
            Some(Err(err)) => {
                log::warn!("add_event_listener({event_type}) failed: {err:?}");
                None
            }
            None => None,
        }
    }
}

fn translate_dom_event(
    unit: UnitId,
    name: EventName,
    element: &HtmlElement,
    event: &web_sys::Event,
) -> Option<RawEvent> {
    let pointer = |kind| {
        event.dyn_ref::<MouseEvent>().map(|mouse| RawEvent::Pointer {
            unit,
            kind,
            position: Point::new(f64::from(mouse.client_x()), f64::from(mouse.client_y())),
        })
    };
    match name {
        EventName::PointerIn => pointer(PointerKind::Enter),
        EventName::PointerOut => pointer(PointerKind::Leave),
        EventName::PointerDown => pointer(PointerKind::Down),
        EventName::PointerUp => pointer(PointerKind::Up),
        EventName::PointerMotion => pointer(PointerKind::Move),
        EventName::Press => Some(RawEvent::Press { unit }),
        EventName::TextChange => element
            .dyn_ref::<HtmlInputElement>()
            .map(|input| RawEvent::TextChange {
                unit,
                text: input.value(),
            }),
        EventName::TimeUpdate => element
            .dyn_ref::<HtmlMediaElement>()
            .map(|media| RawEvent::TimeUpdate {
                unit,
                position_ms: media.current_time() * 1000.0,
            }),
        EventName::KeyDown | EventName::KeyUp | EventName::AnimationStopped => None,
    }
}

impl Backend for DomBackend {
    fn root_node(&mut self) -> Option<NodeId> {
        if self.document.is_none() {
            return None;
        }
        if self.root.is_none() {
            let container = self.container.clone();
            let _ = container.style().set_property("position", "fixed");
            let _ = container.style().set_property("overflow", "hidden");
            self.root = Some(NodeId(self.nodes.allocate(DomNode {
                element: Some(container),
                listeners: Vec::new(),
            })));
        }
        self.root
    }

    fn viewport(&self) -> Option<Size> {
        let window = self.window.as_ref()?;
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        Some(Size::new(width, height))
    }

    fn create_node(&mut self, content: &UnitContent) -> NodeId {
        let element = self.build_element(content);
        NodeId(self.nodes.allocate(DomNode {
            element,
            listeners: Vec::new(),
        }))
    }

    fn release_node(&mut self, node: NodeId) {
        if Some(node) == self.root {
            return;
        }
        if let Some(mut released) = self.nodes.free(node.0) {
            released.detach_listeners();
            if let Some(element) = released.element {
                element.remove();
            }
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let (Some(parent), Some(child)) = (self.element(parent), self.element(child)) {
            let _ = parent.append_child(child);
        }
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if let (Some(parent), Some(child)) = (self.element(parent), self.element(child)) {
            let _ = parent.remove_child(child);
        }
    }

    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: StyleValue) {
        let Some(element) = self.element(node) else {
            return;
        };
        let style = element.style();
        let _ = match value {
            StyleValue::Unset => style.remove_property(property.css_name()).map(drop),
            _ => style.set_property(property.css_name(), &value.to_string()),
        };
    }

    fn probe_style(&mut self, property: StyleProperty, value: StyleValue) -> bool {
        if self.scratch.is_none() {
            self.scratch = self.create_element("div");
        }
        let Some(scratch) = &self.scratch else {
            return false;
        };
        let style = scratch.style();
        let name = property.css_name();
        let _ = style.set_property(name, &value.to_string());
        let kept = style
            .get_property_value(name)
            .is_ok_and(|read| !read.is_empty());
        let _ = style.remove_property(name);
        kept
    }

    fn measure_glyph(&mut self, glyph: char, font_size: f64) -> Option<f64> {
        let body = self.document.as_ref()?.body()?;
        let probe = self.create_element("span")?;
        let s = probe.style();
        let _ = s.set_property("position", "absolute");
        let _ = s.set_property("visibility", "hidden");
        let _ = s.set_property("white-space", "pre");
        let _ = s.set_property("font-family", "monospace");
        let _ = s.set_property("font-size", &StyleValue::Pixels(font_size).to_string());
        probe.set_text_content(Some(&*glyph.encode_utf8(&mut [0; 4])));
        let _ = body.append_child(&probe);
        let width = probe.offset_width();
        probe.remove();
        (width > 0).then(|| f64::from(width))
    }

    fn control(&mut self, node: NodeId, command: &ControlCommand) -> ControlReply {
        let Some(element) = self.element(node) else {
            return ControlReply::Done;
        };
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            match command {
                ControlCommand::GetValue => return ControlReply::Text(input.value()),
                ControlCommand::SetValue(text) => input.set_value(text),
                ControlCommand::SetPlaceholder(text) => input.set_placeholder(text),
                _ => {}
            }
        } else if let Some(media) = element.dyn_ref::<HtmlMediaElement>() {
            match command {
                ControlCommand::Load(source) => {
                    media.set_src(source);
                    media.load();
                }
                ControlCommand::Play => {
                    let _ = media.play();
                }
                ControlCommand::Pause => {
                    let _ = media.pause();
                }
                ControlCommand::SetPosition(ms) => media.set_current_time(ms.max(0.0) / 1000.0),
                ControlCommand::GetPosition => {
                    return ControlReply::Number(media.current_time() * 1000.0);
                }
                ControlCommand::GetDuration => {
                    let seconds = media.duration();
                    let ms = if seconds.is_finite() { seconds * 1000.0 } else { 0.0 };
                    return ControlReply::Number(ms);
                }
                ControlCommand::GetVolume => return ControlReply::Number(media.volume() * 100.0),
                ControlCommand::SetVolume(volume) => {
                    media.set_volume(volume.clamp(0.0, 100.0) / 100.0);
                }
                _ => {}
            }
        } else if let ControlCommand::SetLabel(label) = command {
            element.set_text_content(Some(label));
        }
        ControlReply::Done
    }

    fn listen(&mut self, target: ListenTarget, event: EventName, enabled: bool) {
        if enabled {
            let Some(closure) = self.install(target, event) else {
                return;
            };
            match target {
                ListenTarget::Global => self.global.push((event, closure)),
                ListenTarget::Unit { node, .. } => {
                    if let Some(entry) = self.nodes.get_mut(node.0) {
                        entry.listeners.push((event, closure));
                    }
                }
            }
            return;
        }

        let Some(event_type) = dom_event_type(event) else {
            return;
        };
        match target {
            ListenTarget::Global => {
                let Some(document) = &self.document else {
                    return;
                };
                self.global.retain(|(name, closure)| {
                    if *name != event {
                        return true;
                    }
                    let _ = document
                        .remove_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
                    false
                });
            }
            ListenTarget::Unit { node, .. } => {
                let Some(entry) = self.nodes.get_mut(node.0) else {
                    return;
                };
                let Some(element) = &entry.element else {
                    return;
                };
                entry.listeners.retain(|(name, closure)| {
                    if *name != event {
                        return true;
                    }
                    let _ = element
                        .remove_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
                    false
                });
            }
        }
    }

    fn request_tick(&mut self, after: Duration) {
        self.timer.schedule(after);
    }
}

impl Drop for DomBackend {
    fn drop(&mut self) {
        self.timer.cancel();
        if let Some(document) = &self.document {
            for (name, closure) in self.global.drain(..) {
                if let Some(event_type) = dom_event_type(name) {
                    let _ = document
                        .remove_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref());
                }
            }
        }
        for id in self.nodes.ids() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.detach_listeners();
            }
        }
    }
}
