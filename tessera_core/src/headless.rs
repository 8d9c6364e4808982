// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory back end.
//!
//! [`HeadlessBackend`] keeps a plain node tree with the last value written to
//! every style property, the installed listeners and every timer request.
//! It backs the crate's own tests and suits hosts that want to drive a scene
//! without rendering it.
//!
//! Glyphs measure half their font size, so a 16 px probe yields a weight of
//! 0.5 unless overridden with [`HeadlessBackend::with_glyph_ratio`].

use std::collections::{HashMap, HashSet};

use kurbo::Size;

use crate::backend::{
    Backend, ControlCommand, ControlReply, ListenTarget, StyleProperty, StyleValue,
    TransformProperty,
};
use crate::id::NodeId;
use crate::input::EventName;
use crate::pool::SlotPool;
use crate::time::Duration;
use crate::unit::UnitContent;

/// Interactive state kept for entry, button and video nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlState {
    /// Entry text.
    pub value: String,
    /// Entry placeholder.
    pub placeholder: Option<String>,
    /// Button label.
    pub label: String,
    /// Media source.
    pub source: Option<String>,
    /// Whether media is playing.
    pub playing: bool,
    /// Playback position in milliseconds.
    pub position_ms: f64,
    /// Media duration in milliseconds.
    pub duration_ms: f64,
    /// Volume, 0 to 100.
    pub volume: f64,
}

/// One node of the in-memory tree.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessNode {
    /// The content the node was created for; `None` for the host root.
    pub content: Option<UnitContent>,
    /// Parent node, if appended.
    pub parent: Option<NodeId>,
    /// Children in append order.
    pub children: Vec<NodeId>,
    /// Last value written per property.
    pub styles: HashMap<StyleProperty, StyleValue>,
    /// Interactive state.
    pub control: ControlState,
}

impl HeadlessNode {
    fn new(content: Option<UnitContent>) -> Self {
        let mut control = ControlState {
            volume: 100.0,
            ..ControlState::default()
        };
        match &content {
            Some(UnitContent::Entry { placeholder, .. }) => control.placeholder.clone_from(placeholder),
            Some(UnitContent::Button { label }) => control.label.clone_from(label),
            Some(UnitContent::Video { source }) => control.source.clone_from(source),
            _ => {}
        }
        Self {
            content,
            parent: None,
            children: Vec::new(),
            styles: HashMap::new(),
            control,
        }
    }
}

/// A [`Backend`] that renders into memory.
#[derive(Debug)]
pub struct HeadlessBackend {
    viewport: Option<Size>,
    host_available: bool,
    root: Option<NodeId>,
    nodes: SlotPool<HeadlessNode>,
    opacity: bool,
    transforms: Vec<TransformProperty>,
    glyph_ratio: Option<f64>,
    listeners: HashSet<(ListenTarget, EventName)>,
    tick_requests: Vec<Duration>,
}

impl HeadlessBackend {
    /// Creates a fully capable host with the given viewport.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Some(Size::new(width, height)),
            host_available: true,
            root: None,
            nodes: SlotPool::new(),
            opacity: true,
            transforms: TransformProperty::CANDIDATES.to_vec(),
            glyph_ratio: Some(0.5),
            listeners: HashSet::new(),
            tick_requests: Vec::new(),
        }
    }

    /// Sets whether opacity writes are honored.
    #[must_use]
    pub fn with_opacity(mut self, supported: bool) -> Self {
        self.opacity = supported;
        self
    }

    /// Sets which rotation property names are honored.
    #[must_use]
    pub fn with_supported_transforms(mut self, supported: &[TransformProperty]) -> Self {
        self.transforms = supported.to_vec();
        self
    }

    /// Sets the glyph advance per pixel of font size, or `None` to fail
    /// measurement.
    #[must_use]
    pub fn with_glyph_ratio(mut self, ratio: Option<f64>) -> Self {
        self.glyph_ratio = ratio;
        self
    }

    /// Makes [`root_node`](Backend::root_node) fail.
    #[must_use]
    pub fn without_host(mut self) -> Self {
        self.host_available = false;
        self
    }

    /// Makes [`viewport`](Backend::viewport) fail.
    #[must_use]
    pub fn without_viewport(mut self) -> Self {
        self.viewport = None;
        self
    }

    /// Changes the reported viewport size.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = Some(size);
    }

    /// Returns the node behind `id`, if live.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&HeadlessNode> {
        self.nodes.get(id.0)
    }

    /// Mutable access to a node, for simulating host-side state changes.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut HeadlessNode> {
        self.nodes.get_mut(id.0)
    }

    /// Number of live nodes, host root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The last value written to `property` on `node`.
    #[must_use]
    pub fn style(&self, node: NodeId, property: StyleProperty) -> Option<StyleValue> {
        self.node(node)?.styles.get(&property).copied()
    }

    /// Whether a listener is installed.
    #[must_use]
    pub fn is_listening(&self, target: ListenTarget, event: EventName) -> bool {
        self.listeners.contains(&(target, event))
    }

    /// Number of installed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Every timer request so far.
    #[must_use]
    pub fn tick_requests(&self) -> &[Duration] {
        &self.tick_requests
    }

    fn detach_node(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node.0).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.retain(|&c| c != node);
        }
    }
}

impl Backend for HeadlessBackend {
    fn root_node(&mut self) -> Option<NodeId> {
        if !self.host_available {
            return None;
        }
        if self.root.is_none() {
            self.root = Some(NodeId(self.nodes.allocate(HeadlessNode::new(None))));
        }
        self.root
    }

    fn viewport(&self) -> Option<Size> {
        self.viewport
    }

    fn create_node(&mut self, content: &UnitContent) -> NodeId {
        NodeId(self.nodes.allocate(HeadlessNode::new(Some(content.clone()))))
    }

    fn release_node(&mut self, node: NodeId) {
        self.detach_node(node);
        if let Some(released) = self.nodes.free(node.0) {
            for child in released.children {
                if let Some(child) = self.nodes.get_mut(child.0) {
                    child.parent = None;
                }
            }
        }
        self.listeners.retain(|(target, _)| {
            !matches!(target, ListenTarget::Unit { node: n, .. } if *n == node)
        });
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains(parent.0) {
            return;
        }
        self.detach_node(child);
        let Some(child_node) = self.nodes.get_mut(child.0) else {
            return;
        };
        child_node.parent = Some(parent);
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.push(child);
        }
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.nodes.get(child.0).and_then(|n| n.parent) == Some(parent) {
            self.detach_node(child);
        }
    }

    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: StyleValue) {
        if let Some(node) = self.nodes.get_mut(node.0) {
            if value == StyleValue::Unset {
                node.styles.remove(&property);
            } else {
                node.styles.insert(property, value);
            }
        }
    }

    fn probe_style(&mut self, property: StyleProperty, _value: StyleValue) -> bool {
        match property {
            StyleProperty::Opacity => self.opacity,
            StyleProperty::Transform(name) => self.transforms.contains(&name),
            _ => true,
        }
    }

    fn measure_glyph(&mut self, _glyph: char, font_size: f64) -> Option<f64> {
        self.glyph_ratio.map(|ratio| ratio * font_size)
    }

    fn control(&mut self, node: NodeId, command: &ControlCommand) -> ControlReply {
        let Some(node) = self.nodes.get_mut(node.0) else {
            return ControlReply::Done;
        };
        let state = &mut node.control;
        match command {
            ControlCommand::GetValue => return ControlReply::Text(state.value.clone()),
            ControlCommand::SetValue(text) => state.value.clone_from(text),
            ControlCommand::SetPlaceholder(text) => state.placeholder = Some(text.clone()),
            ControlCommand::SetLabel(text) => state.label.clone_from(text),
            ControlCommand::Load(source) => {
                state.source = Some(source.clone());
                state.position_ms = 0.0;
                state.playing = false;
            }
            ControlCommand::Play => state.playing = true,
            ControlCommand::Pause => state.playing = false,
            ControlCommand::SetPosition(ms) => state.position_ms = ms.max(0.0),
            ControlCommand::GetPosition => return ControlReply::Number(state.position_ms),
            ControlCommand::GetDuration => return ControlReply::Number(state.duration_ms),
            ControlCommand::GetVolume => return ControlReply::Number(state.volume),
            ControlCommand::SetVolume(volume) => state.volume = volume.clamp(0.0, 100.0),
        }
        ControlReply::Done
    }

    fn listen(&mut self, target: ListenTarget, event: EventName, enabled: bool) {
        if enabled {
            self.listeners.insert((target, event));
        } else {
            self.listeners.remove(&(target, event));
        }
    }

    fn request_tick(&mut self, after: Duration) {
        self.tick_requests.push(after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_created_once() {
        let mut backend = HeadlessBackend::new(10.0, 10.0);
        let root = backend.root_node();
        assert!(root.is_some());
        assert_eq!(backend.root_node(), root);
        assert_eq!(backend.node_count(), 1);
        assert!(HeadlessBackend::new(1.0, 1.0).without_host().root_node().is_none());
    }

    #[test]
    fn append_moves_between_parents() {
        let mut backend = HeadlessBackend::new(10.0, 10.0);
        let a = backend.create_node(&UnitContent::frame());
        let b = backend.create_node(&UnitContent::frame());
        let c = backend.create_node(&UnitContent::frame());
        backend.append_child(a, c);
        backend.append_child(b, c);
        assert!(backend.node(a).unwrap().children.is_empty());
        assert_eq!(backend.node(b).unwrap().children, [c]);
        assert_eq!(backend.node(c).unwrap().parent, Some(b));

        backend.remove_child(a, c);
        assert_eq!(backend.node(c).unwrap().parent, Some(b));
        backend.remove_child(b, c);
        assert_eq!(backend.node(c).unwrap().parent, None);
    }

    #[test]
    fn release_drops_node_and_listeners() {
        let mut backend = HeadlessBackend::new(10.0, 10.0);
        let root = backend.root_node().unwrap();
        let a = backend.create_node(&UnitContent::frame());
        backend.append_child(root, a);
        let target = ListenTarget::Unit {
            unit: crate::id::UnitId(1),
            node: a,
        };
        backend.listen(target, EventName::PointerDown, true);
        backend.release_node(a);
        assert!(backend.node(a).is_none());
        assert!(backend.node(root).unwrap().children.is_empty());
        assert!(!backend.is_listening(target, EventName::PointerDown));
    }

    #[test]
    fn controls_keep_state() {
        let mut backend = HeadlessBackend::new(10.0, 10.0);
        let video = backend.create_node(&UnitContent::Video {
            source: Some("a.webm".into()),
        });
        backend.control(video, &ControlCommand::SetVolume(140.0));
        assert_eq!(
            backend.control(video, &ControlCommand::GetVolume),
            ControlReply::Number(100.0)
        );
        backend.control(video, &ControlCommand::SetPosition(1500.0));
        assert_eq!(
            backend.control(video, &ControlCommand::GetPosition),
            ControlReply::Number(1500.0)
        );
        backend.control(video, &ControlCommand::Play);
        assert!(backend.node(video).unwrap().control.playing);
    }
}
